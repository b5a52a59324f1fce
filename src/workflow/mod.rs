pub mod exam_session;
pub mod session_snapshot;

pub use exam_session::{ExamSession, GENERATION_FAILED_NOTICE, TICK_PERIOD};
pub use session_snapshot::SessionSnapshot;
