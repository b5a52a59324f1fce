//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层是整个系统的"指挥中心"，持有配置和考试会话，
//! 把终端输入转换为会话命令并展示结果。
//!
//! ## 层次关系
//!
//! ```text
//! console::App (终端交互)
//!     ↓
//! workflow::ExamSession (一场考试的生命周期)
//!     ↓
//! services (能力层：出题 / 兜底题库 / 阅卷)
//!     ↓
//! infrastructure (基础设施：Countdown)
//! ```
//!
//! ## 设计原则
//!
//! 1. **向下依赖**：编排层 → workflow → services → infrastructure
//! 2. **无业务逻辑**：只做调度和展示，不判分也不计时

pub mod console;

pub use console::App;
