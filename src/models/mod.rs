pub mod loaders;
pub mod question;
pub mod result;
pub mod status;
pub mod subject;

pub use loaders::{load_builtin_bank, load_question_bank, parse_question_bank};
pub use question::{Answer, Question, OPTION_COUNT};
pub use result::{ExamResult, QuestionFeedback, SubjectScore};
pub use status::ExamStatus;
pub use subject::Subject;
