use crate::error::ConfigError;

/// 程序配置
///
/// 出题服务的地址与凭证都在这里显式给出，由 [`LlmService::new`](crate::services::LlmService::new)
/// 在构造时读取，核心逻辑不依赖任何全局环境
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    // --- 考试配置 ---
    /// 每场考试的题量
    pub question_count: usize,
    /// 默认考试时长（分钟）
    pub duration_minutes: u32,
    /// 学生所在年级，用于出题提示词
    pub grade_level: String,
    /// 选考科目，为空时表示全部科目
    pub subjects: Vec<String>,
    /// 兜底题库 TOML 文件，不设置时使用内置题库
    pub fallback_bank_path: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-2.5-flash".to_string(),
            llm_temperature: 0.8,
            question_count: 10,
            duration_minutes: 30,
            grade_level: "الصف الثالث الثانوي".to_string(),
            subjects: Vec::new(),
            fallback_bank_path: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_temperature: std::env::var("LLM_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_temperature),
            question_count: std::env::var("EXAM_QUESTION_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.question_count),
            duration_minutes: std::env::var("EXAM_DURATION_MINUTES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.duration_minutes),
            grade_level: std::env::var("EXAM_GRADE_LEVEL").unwrap_or(default.grade_level),
            subjects: std::env::var("EXAM_SUBJECTS").map(|v| parse_subject_list(&v)).unwrap_or(default.subjects),
            fallback_bank_path: std::env::var("FALLBACK_BANK_PATH").ok().filter(|v| !v.trim().is_empty()),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.question_count == 0 {
            return Err(ConfigError::InvalidValue {
                name: "EXAM_QUESTION_COUNT",
                value: self.question_count.to_string(),
                reason: "题量必须大于 0",
            });
        }
        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err(ConfigError::InvalidValue {
                name: "LLM_TEMPERATURE",
                value: self.llm_temperature.to_string(),
                reason: "取值范围为 [0, 2]",
            });
        }
        Ok(())
    }
}

/// 解析逗号分隔的科目列表（支持阿拉伯逗号 "،"）
fn parse_subject_list(raw: &str) -> Vec<String> {
    raw.split([',', '،'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
