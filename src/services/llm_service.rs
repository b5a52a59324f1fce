//! LLM 服务 - 业务能力层
//!
//! 只负责"让 LLM 出一套题"能力，不关心兜底与考试流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Gemini, Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, GenerationError, LlmError};
use crate::models::Question;
use crate::services::question_source::{GenerationRequest, QuestionGenerator};

/// LLM 返回的整套试题
#[derive(Debug, Deserialize)]
struct GeneratedExam {
    questions: Vec<Question>,
}

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 一次性生成整套试题
/// - 校验返回结构
/// - 不重试、不兜底（由 `QuestionSource` 负责）
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    has_credentials: bool,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            temperature: config.llm_temperature,
            has_credentials: !config.llm_api_key.trim().is_empty(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> AppResult<String> {
        if !self.has_credentials {
            return Err(LlmError::MissingCredentials.into());
        }

        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(4096u32)
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

impl QuestionGenerator for LlmService {
    async fn generate(&self, request: &GenerationRequest) -> AppResult<Vec<Question>> {
        debug!(
            "请求 LLM 出题: 科目 {:?}, 题量 {}, 年级 {}",
            request.subjects, request.count, request.grade_level
        );

        let (user_message, system_message) = build_exam_messages(request);
        let response = self.send_to_llm(&user_message, Some(system_message)).await?;

        parse_generation_response(&response, request.count)
    }
}

/// 构建出题提示词
///
/// 返回 (user_message, system_message)
fn build_exam_messages(request: &GenerationRequest) -> (String, &'static str) {
    let system_message = "أنت خبير في إعداد الاختبارات لمركز تعليمي في مصر. \
                          تُخرج JSON صالحًا فقط دون أي نص إضافي.";

    let user_message = format!(
        r#"أعدّ اختبار اختيار من متعدد عالي الجودة وفق التعليمات التالية:
1. عدد الأسئلة: {count} سؤالًا بالضبط.
2. المرحلة الدراسية للطالب: "{grade}".
3. وزّع الأسئلة على المواد: {subjects}.
4. لكل سؤال 4 خيارات بالضبط.
5. اللغة: العربية.
6. correctOptionIndex هو فهرس الإجابة الصحيحة في مصفوفة options ويبدأ من 0.
7. يجب أن يكون id فريدًا لكل سؤال، وأن تكون قيمة subject أحد أسماء المواد أعلاه حرفيًا.

أعد كائن JSON واحدًا بهذا الشكل فقط:
{{"questions": [{{"id": "q1", "text": "...", "options": ["...", "...", "...", "..."], "correctOptionIndex": 0, "subject": "..."}}]}}"#,
        count = request.count,
        grade = request.grade_level,
        subjects = request.subjects.join("، "),
    );

    (user_message, system_message)
}

/// 去掉 Markdown 代码块包裹，取出 JSON 正文
fn extract_json_body(response: &str) -> &str {
    let trimmed = response.trim();

    if let Ok(re) = Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```") {
        if let Some(body) = re.captures(trimmed).and_then(|cap| cap.get(1)) {
            return body.as_str();
        }
    }

    // 没有代码块时，截取第一个 '{' 到最后一个 '}'
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// 解析并校验 LLM 返回的试题
///
/// 任何结构问题都视为整批失败；超出 `count` 的部分被截断
fn parse_generation_response(response: &str, count: usize) -> AppResult<Vec<Question>> {
    let body = extract_json_body(response);
    let exam: GeneratedExam = serde_json::from_str(body)?;

    if exam.questions.is_empty() {
        return Err(GenerationError::EmptyResponse.into());
    }

    let mut seen = HashSet::new();
    for question in &exam.questions {
        if !seen.insert(question.id()) {
            return Err(AppError::schema_violation(question.id(), "题目 id 重复"));
        }
    }

    let mut questions = exam.questions;
    if questions.len() > count {
        warn!("LLM 返回 {} 道题，超出请求的 {} 道，已截断", questions.len(), count);
        questions.truncate(count);
    }

    Ok(questions)
}
