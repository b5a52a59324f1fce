/// 把秒数格式化为 `MM:SS`
///
/// 分钟数超过 99 时照常增长位数
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
