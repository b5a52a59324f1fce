pub mod fallback_bank;
pub mod grading;
pub mod llm_service;
pub mod question_source;

pub use fallback_bank::FallbackBank;
pub use grading::{Explainer, Grader, ReviewHint, Verdict, NO_ANSWER_MARKER};
pub use llm_service::LlmService;
pub use question_source::{GenerationRequest, QuestionGenerator, QuestionSource};
