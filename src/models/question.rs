use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// 每道题固定的选项数量
pub const OPTION_COUNT: usize = 4;

/// 单选题
///
/// 只能通过 [`Question::new`] 或反序列化得到，两条路径都会校验：
/// - 恰好 4 个选项
/// - `correct_option_index` 指向合法选项
/// - id / 题干 / 科目非空
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawQuestion")]
pub struct Question {
    id: String,
    text: String,
    options: [String; OPTION_COUNT],
    correct_option_index: usize,
    subject: String,
}

/// 未经校验的题目（LLM 返回 / TOML 文件）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    id: String,
    text: String,
    options: Vec<String>,
    correct_option_index: i64,
    subject: String,
}

impl TryFrom<RawQuestion> for Question {
    type Error = AppError;

    fn try_from(raw: RawQuestion) -> AppResult<Self> {
        let index = usize::try_from(raw.correct_option_index).map_err(|_| {
            AppError::schema_violation(
                &raw.id,
                format!("正确答案序号 {} 为负数", raw.correct_option_index),
            )
        })?;
        Question::new(raw.id, raw.text, raw.options, index, raw.subject)
    }
}

impl Question {
    /// 创建并校验题目
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        options: Vec<String>,
        correct_option_index: usize,
        subject: impl Into<String>,
    ) -> AppResult<Self> {
        let id = id.into();
        let text = text.into();
        let subject = subject.into();

        if id.trim().is_empty() {
            return Err(AppError::schema_violation("<空>", "题目 id 为空"));
        }
        if text.trim().is_empty() {
            return Err(AppError::schema_violation(&id, "题干为空"));
        }
        if subject.trim().is_empty() {
            return Err(AppError::schema_violation(&id, "科目为空"));
        }

        let option_count = options.len();
        let options: [String; OPTION_COUNT] = options.try_into().map_err(|_| {
            AppError::schema_violation(
                &id,
                format!("选项数量应为 {}，实际为 {}", OPTION_COUNT, option_count),
            )
        })?;

        if correct_option_index >= OPTION_COUNT {
            return Err(AppError::schema_violation(
                &id,
                format!(
                    "正确答案序号 {} 超出范围 [0, {}]",
                    correct_option_index,
                    OPTION_COUNT - 1
                ),
            ));
        }

        Ok(Self {
            id,
            text,
            options,
            correct_option_index,
            subject,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    /// 按序号取选项文本，越界返回 None
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    pub fn correct_option_index(&self) -> usize {
        self.correct_option_index
    }

    /// 正确选项的文本
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_option_index]
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// 学生对某道题的作答
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub answer_index: usize,
}
