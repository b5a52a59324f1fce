use crate::error::{AppError, AppResult, FileError};
use crate::models::question::Question;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

/// 随程序打包的默认兜底题库
const BUILTIN_BANK: &str = include_str!("../../../data/fallback_bank.toml");

/// TOML 题库文件结构
///
/// ```toml
/// [[questions]]
/// id = "q2"
/// subject = "رياضيات"
/// text = "ما هو حاصل ضرب 5 في 8؟"
/// options = ["35", "40", "45", "50"]
/// correctOptionIndex = 1
/// ```
#[derive(Debug, Deserialize)]
struct BankFile {
    #[serde(default)]
    questions: Vec<Question>,
}

/// 解析题库内容
///
/// 每道题都会经过 [`Question`] 的结构校验，id 重复视为错误
pub fn parse_question_bank(content: &str, origin: &str) -> AppResult<Vec<Question>> {
    let bank: BankFile = toml::from_str(content).map_err(|e| FileError::TomlParseFailed {
        path: origin.to_string(),
        source: e,
    })?;

    let mut seen = HashSet::new();
    for question in &bank.questions {
        if !seen.insert(question.id()) {
            return Err(AppError::schema_violation(question.id(), "题库中 id 重复"));
        }
    }

    Ok(bank.questions)
}

/// 从 TOML 文件加载题库
pub async fn load_question_bank(path: &Path) -> AppResult<Vec<Question>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| FileError::ReadFailed {
            path: path.display().to_string(),
            source: e,
        })?;

    let questions = parse_question_bank(&content, &path.display().to_string())?;
    tracing::info!(
        "成功加载题库 {}: {} 道题",
        path.file_name().unwrap_or_default().to_string_lossy(),
        questions.len()
    );

    Ok(questions)
}

/// 加载内置题库
pub fn load_builtin_bank() -> AppResult<Vec<Question>> {
    parse_question_bank(BUILTIN_BANK, "<builtin>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_bank_is_valid() {
        let questions = load_builtin_bank().unwrap();
        assert_eq!(questions.len(), 27);
        assert!(questions.iter().any(|q| q.subject() == "رياضيات"));
    }

    #[test]
    fn test_parse_rejects_duplicate_ids() {
        let content = r#"
[[questions]]
id = "a"
subject = "دين"
text = "س1"
options = ["1", "2", "3", "4"]
correctOptionIndex = 0

[[questions]]
id = "a"
subject = "دين"
text = "س2"
options = ["1", "2", "3", "4"]
correctOptionIndex = 1
"#;
        assert!(parse_question_bank(content, "test").is_err());
    }

    #[test]
    fn test_parse_rejects_invalid_question() {
        let content = r#"
[[questions]]
id = "a"
subject = "دين"
text = "س1"
options = ["1", "2", "3"]
correctOptionIndex = 0
"#;
        assert!(parse_question_bank(content, "test").is_err());
    }

    #[test]
    fn test_parse_empty_bank() {
        assert!(parse_question_bank("", "empty").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = load_question_bank(Path::new("does/not/exist.toml")).await;
        assert!(matches!(
            result,
            Err(AppError::File(FileError::ReadFailed { .. }))
        ));
    }
}
