//! 题目来源 - 业务能力层
//!
//! 出题流程：
//! 1. 远程出题（只尝试一次，不重试）
//! 2. 兜底题库抽题
//! 3. 兜底也没有题目 → `NoQuestionsAvailable`

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::future::Future;
use std::path::Path;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, GenerationError};
use crate::models::{load_question_bank, Question};
use crate::services::fallback_bank::FallbackBank;
use crate::services::llm_service::LlmService;

/// 远程出题请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub subjects: Vec<String>,
    pub count: usize,
    pub grade_level: String,
}

/// 远程出题能力
///
/// 返回的题目必须已通过结构校验；任何错误都会触发兜底
pub trait QuestionGenerator: Send + Sync {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = AppResult<Vec<Question>>> + Send;
}

/// 题目来源
pub struct QuestionSource<G> {
    generator: G,
    bank: FallbackBank,
}

impl QuestionSource<LlmService> {
    /// 按配置创建：LLM 出题 + 兜底题库（配置文件或内置）
    pub async fn from_config(config: &Config) -> AppResult<Self> {
        let bank = match &config.fallback_bank_path {
            Some(path) => FallbackBank::new(load_question_bank(Path::new(path)).await?),
            None => FallbackBank::builtin()?,
        };
        Ok(Self::new(LlmService::new(config), bank))
    }
}

impl<G: QuestionGenerator> QuestionSource<G> {
    pub fn new(generator: G, bank: FallbackBank) -> Self {
        Self { generator, bank }
    }

    pub fn bank(&self) -> &FallbackBank {
        &self.bank
    }

    /// 为一场考试准备题目
    ///
    /// # 参数
    /// - `subjects`: 选考科目（不能为空）
    /// - `count`: 题量（大于 0）
    /// - `grade_level`: 年级
    ///
    /// # 返回
    /// 不超过 `count` 道题；远程失败时来自兜底题库
    pub async fn generate_questions(
        &self,
        subjects: &BTreeSet<String>,
        count: usize,
        grade_level: &str,
    ) -> AppResult<Vec<Question>> {
        if subjects.is_empty() {
            return Err(AppError::invalid_request("至少需要选择一个科目"));
        }
        if count == 0 {
            return Err(AppError::invalid_request("题量必须大于 0"));
        }

        let request = GenerationRequest {
            subjects: subjects.iter().cloned().collect(),
            count,
            grade_level: grade_level.to_string(),
        };

        info!("🤖 正在生成试题: {} 道, 科目 {:?}", count, request.subjects);

        match self.generator.generate(&request).await {
            Ok(mut questions) if !questions.is_empty() => {
                questions.truncate(count);
                info!("✓ 远程出题成功: {} 道", questions.len());
                return Ok(questions);
            }
            Ok(_) => warn!("⚠️ 远程出题结果为空，改用兜底题库"),
            Err(e) => warn!("⚠️ 远程出题失败: {}，改用兜底题库", e),
        }

        let questions = self.bank.draw(subjects, count);
        if questions.is_empty() {
            return Err(GenerationError::NoQuestionsAvailable {
                subjects: request.subjects,
            }
            .into());
        }

        info!("✓ 兜底题库抽题: {} 道", questions.len());
        Ok(questions)
    }
}
