use thiserror::Error;

use crate::models::ExamStatus;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 出题相关错误
    #[error("出题错误: {0}")]
    Generation(#[from] GenerationError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 考试流程错误
    #[error("考试错误: {0}")]
    Exam(#[from] ExamError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 出题错误
///
/// 除 `NoQuestionsAvailable` 外都会在题目来源内部被兜底题库吸收
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 请求参数不合法（科目为空或题量为 0）
    #[error("出题请求不合法: {reason}")]
    InvalidRequest { reason: String },
    /// 返回内容无法解析为 JSON
    #[error("无法解析出题结果: {source}")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
    },
    /// 返回的题目列表为空
    #[error("出题结果为空")]
    EmptyResponse,
    /// 题目结构不符合要求
    #[error("题目 {question_id} 结构不合法: {reason}")]
    SchemaViolation { question_id: String, reason: String },
    /// 兜底题库也没有可用题目
    #[error("没有可用的题目 (科目: {subjects:?})")]
    NoQuestionsAvailable { subjects: Vec<String> },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// 未配置 API Key
    #[error("未配置 LLM API Key")]
    MissingCredentials,
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 考试流程错误
///
/// 除 `GenerationAborted` 外都属于调用方违约，不应展示给学生
#[derive(Debug, Error)]
pub enum ExamError {
    /// 当前状态不允许该操作
    #[error("状态 {status} 下不能执行 {action}")]
    InvalidTransition {
        action: &'static str,
        status: ExamStatus,
    },
    /// 题目不属于本场考试
    #[error("题目 {question_id} 不属于本场考试")]
    UnknownQuestion { question_id: String },
    /// 选项序号超出范围
    #[error("题目 {question_id} 的选项序号 {answer_index} 超出范围 [0, 3]")]
    AnswerOutOfRange {
        question_id: String,
        answer_index: usize,
    },
    /// 出题失败，考试未能开始
    #[error("{notice}")]
    GenerationAborted {
        notice: String,
        #[source]
        source: Box<AppError>,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置值不合法
    #[error("配置项 {name} 的值 '{value}' 不合法: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Generation(GenerationError::MalformedResponse { source: err })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建LLM API调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 创建题目结构错误
    pub fn schema_violation(question_id: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Generation(GenerationError::SchemaViolation {
            question_id: question_id.into(),
            reason: reason.into(),
        })
    }

    /// 创建状态转换错误
    pub fn invalid_transition(action: &'static str, status: ExamStatus) -> Self {
        AppError::Exam(ExamError::InvalidTransition { action, status })
    }

    /// 出题请求不合法
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        AppError::Generation(GenerationError::InvalidRequest {
            reason: reason.into(),
        })
    }

    /// 是否为"兜底题库也无题可出"（包括因此中止的考试）
    pub fn is_no_questions(&self) -> bool {
        match self {
            AppError::Generation(GenerationError::NoQuestionsAvailable { .. }) => true,
            AppError::Exam(ExamError::GenerationAborted { source, .. }) => source.is_no_questions(),
            _ => false,
        }
    }

    /// 是否为答题记录不合法（题目不存在或选项越界）
    pub fn is_invalid_answer(&self) -> bool {
        matches!(
            self,
            AppError::Exam(ExamError::UnknownQuestion { .. } | ExamError::AnswerOutOfRange { .. })
        )
    }

    /// 是否为非法状态转换
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, AppError::Exam(ExamError::InvalidTransition { .. }))
    }

    /// 面向学生的提示语，仅出题失败时存在
    pub fn user_notice(&self) -> Option<&str> {
        match self {
            AppError::Exam(ExamError::GenerationAborted { notice, .. }) => Some(notice),
            _ => None,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
