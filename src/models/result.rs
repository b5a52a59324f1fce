use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单科得分，`score <= total`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectScore {
    pub score: usize,
    pub total: usize,
}

/// 单题批改结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFeedback {
    pub question_id: String,
    pub question: String,
    pub subject: String,
    /// 所选选项文本，未作答时为 [`NO_ANSWER_MARKER`](crate::services::grading::NO_ANSWER_MARKER)
    pub student_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// 考试成绩
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub total_score: usize,
    pub total_questions: usize,
    pub subject_scores: BTreeMap<String, SubjectScore>,
    /// 与题目顺序一致
    pub feedback: Vec<QuestionFeedback>,
    pub neo_message: String,
}

impl ExamResult {
    /// 正确率（0-100），没有题目时为 None
    pub fn percentage(&self) -> Option<f64> {
        if self.total_questions == 0 {
            return None;
        }
        Some(self.total_score as f64 / self.total_questions as f64 * 100.0)
    }

    /// 是否需要展示分科报告（多于一个科目时）
    pub fn has_subject_breakdown(&self) -> bool {
        self.subject_scores.len() > 1
    }
}
