/// 日志工具模块
///
/// 提供日志初始化和考试关键节点的输出
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::ExamResult;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info 级别。
/// 重复调用时静默忽略
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录考试开始信息
///
/// # 参数
/// - `subjects`: 选考科目
/// - `question_count`: 题量
/// - `duration_minutes`: 考试时长
pub fn log_exam_start(subjects: &[String], question_count: usize, duration_minutes: u32) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 考试开始 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📚 科目: {}", subjects.join("، "));
    info!("📝 题量: {} | ⏱️ 时长: {} 分钟", question_count, duration_minutes);
    info!("{}", "=".repeat(60));
}

/// 记录考试成绩
///
/// # 参数
/// - `result`: 阅卷结果
pub fn log_exam_finished(result: &ExamResult) {
    info!("\n{}", "=".repeat(60));
    info!("📊 阅卷完成");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 得分: {}/{}", result.total_score, result.total_questions);
    for (subject, score) in &result.subject_scores {
        info!("   {}: {}/{}", subject, score.score, score.total);
    }
    info!("💬 {}", truncate_text(&result.neo_message, 40));
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("رياضيات", 10), "رياضيات");
        assert_eq!(truncate_text("رياضيات", 3), "ريا...");
    }
}
