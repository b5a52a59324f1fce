//! 兜底题库 - 业务能力层
//!
//! 只负责"从本地题库抽题"能力，远程出题失败时使用

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::models::{load_builtin_bank, Question};

/// 本地兜底题库
///
/// 抽题规则：
/// 1. 按科目过滤
/// 2. 均匀随机打乱（Fisher–Yates）
/// 3. 取前 `count` 道
///
/// 过滤结果为空时改为在整个题库中抽题
#[derive(Debug, Clone)]
pub struct FallbackBank {
    questions: Vec<Question>,
}

impl FallbackBank {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// 使用内置题库
    pub fn builtin() -> AppResult<Self> {
        Ok(Self::new(load_builtin_bank()?))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// 抽题
    pub fn draw(&self, subjects: &BTreeSet<String>, count: usize) -> Vec<Question> {
        self.draw_with_rng(subjects, count, &mut rand::rng())
    }

    /// 使用指定随机源抽题
    pub fn draw_with_rng<R: Rng + ?Sized>(
        &self,
        subjects: &BTreeSet<String>,
        count: usize,
        rng: &mut R,
    ) -> Vec<Question> {
        let mut candidates: Vec<&Question> = self
            .questions
            .iter()
            .filter(|q| subjects.contains(q.subject()))
            .collect();

        if candidates.is_empty() {
            warn!(
                "⚠️ 兜底题库中没有科目 {:?} 的题目，改为从全部 {} 道题中抽取",
                subjects,
                self.questions.len()
            );
            candidates = self.questions.iter().collect();
        }

        candidates.shuffle(rng);

        let drawn: Vec<Question> = candidates.into_iter().take(count).cloned().collect();
        debug!("兜底题库抽取 {} 道题 (请求 {} 道)", drawn.len(), count);
        drawn
    }
}
