use serde::{Deserialize, Serialize};

/// 考试状态
///
/// 状态流转：
/// - `NotStarted` -> `GeneratingQuestions` -> `InProgress` -> `Loading` -> `Finished`
/// - `GeneratingQuestions` -> `NotStarted`（出题失败）
/// - `Finished` -> `NotStarted`（重新开始）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamStatus {
    #[default]
    NotStarted,
    GeneratingQuestions,
    InProgress,
    /// 阅卷中
    Loading,
    Finished,
}

impl ExamStatus {
    pub fn name(self) -> &'static str {
        match self {
            ExamStatus::NotStarted => "not_started",
            ExamStatus::GeneratingQuestions => "generating_questions",
            ExamStatus::InProgress => "in_progress",
            ExamStatus::Loading => "loading",
            ExamStatus::Finished => "finished",
        }
    }

    /// 已经交卷（阅卷中或已出成绩）
    pub fn is_submitted(self) -> bool {
        matches!(self, ExamStatus::Loading | ExamStatus::Finished)
    }
}

impl std::fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
