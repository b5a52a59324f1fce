//! 考试快照
//!
//! 展示层读取的只读视图

use serde::Serialize;

use crate::models::{Answer, ExamResult, ExamStatus, Question};
use crate::utils::time_fmt::format_clock;

/// 某一时刻的考试状态
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: ExamStatus,
    pub current_index: usize,
    pub total_questions: usize,
    pub time_remaining_seconds: u64,
    pub duration_minutes: u32,
    /// 仅考试进行中存在
    pub current_question: Option<Question>,
    /// 按题目顺序排列
    pub answers: Vec<Answer>,
    /// 仅交卷后存在
    pub result: Option<ExamResult>,
}

impl SessionSnapshot {
    /// 剩余时间（MM:SS）
    pub fn clock(&self) -> String {
        format_clock(self.time_remaining_seconds)
    }

    /// 当前题目已选的选项
    pub fn selected_option(&self) -> Option<usize> {
        let question = self.current_question.as_ref()?;
        self.answers
            .iter()
            .find(|a| a.question_id == question.id())
            .map(|a| a.answer_index)
    }

    pub fn is_last_question(&self) -> bool {
        self.total_questions > 0 && self.current_index + 1 == self.total_questions
    }
}
