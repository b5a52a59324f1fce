//! # Neo Exam
//!
//! 面向高中生的 AI 模拟考试引擎：按科目出题、限时作答、自动阅卷
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有运行时资源，只暴露能力
//! - `Countdown` - 按周期回调的定时任务，drop 即取消
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心考试状态
//! - `LlmService` - 远程出题能力
//! - `FallbackBank` - 本地题库抽题能力
//! - `QuestionSource` - 远程出题 + 兜底
//! - `Grader` - 阅卷能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一场考试"的完整生命周期
//! - `ExamSession` - 状态机（出题 → 作答 → 交卷 → 成绩）
//! - `SessionSnapshot` - 展示层读取的只读视图
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/console` - 终端交互界面
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::Countdown;
pub use models::{Answer, ExamResult, ExamStatus, Question, Subject};
pub use orchestrator::App;
pub use services::{FallbackBank, Grader, LlmService, QuestionGenerator, QuestionSource};
pub use utils::format_clock;
pub use workflow::{ExamSession, SessionSnapshot};
