//! 终端考试界面 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：校验配置、加载兜底题库、创建 LLM 服务与考试会话
//! 2. **交互循环**：展示题目和剩余时间，把键盘输入翻译成会话命令
//! 3. **成绩展示**：交卷后输出总分、分科成绩和逐题反馈
//!
//! 本模块不做任何判分或计时，只读取 [`SessionSnapshot`] 并调用会话命令

use anyhow::Result;
use tokio::io::{stdin, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{ExamResult, ExamStatus, Subject, OPTION_COUNT};
use crate::services::{LlmService, QuestionGenerator, QuestionSource};
use crate::workflow::{ExamSession, SessionSnapshot};

type InputLines = Lines<BufReader<Stdin>>;

const OPTION_LABELS: [&str; 4] = ["أ", "ب", "ج", "د"];

/// 界面提供的考试时长（分钟）
pub const DURATION_CHOICES: [u32; 4] = [15, 30, 45, 60];

/// 终端应用
pub struct App {
    config: Config,
    default_subjects: Vec<String>,
    session: ExamSession<LlmService>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        log_startup(&config);

        let source = QuestionSource::from_config(&config).await?;
        info!("✓ 兜底题库已加载: {} 道题", source.bank().len());

        let default_subjects = resolve_subjects(&config.subjects);
        let session = ExamSession::new(source, config.question_count);

        Ok(Self {
            config,
            default_subjects,
            session,
        })
    }

    /// 运行交互循环，直到学生选择退出
    pub async fn run(&self) -> Result<()> {
        let mut lines = BufReader::new(stdin()).lines();
        let mut status_rx = self.session.subscribe();

        loop {
            let Some(subjects) = self.choose_subjects(&mut lines).await? else {
                break;
            };
            let Some(duration) = self.choose_duration(&mut lines).await? else {
                break;
            };

            println!("\n⏳ جاري إعداد الاختبار...");
            let started = self
                .session
                .start(&subjects, duration, &self.config.grade_level)
                .await;

            match started {
                Ok(()) => {
                    self.run_exam(&mut lines, &mut status_rx).await?;
                    if let Some(result) = self.session.result() {
                        print_report(&result);
                    }
                }
                Err(e) => match e.user_notice() {
                    Some(notice) => println!("\n❌ {}", notice),
                    None => return Err(e.into()),
                },
            }

            println!("\nاكتب r لبدء اختبار جديد، أو أي شيء آخر للخروج:");
            match lines.next_line().await? {
                Some(line) if line.trim().eq_ignore_ascii_case("r") => {
                    if self.session.status() == ExamStatus::Finished {
                        self.session.restart()?;
                    }
                }
                _ => break,
            }
        }

        info!("👋 程序结束");
        Ok(())
    }

    /// 选科界面，输入关闭时返回 None
    async fn choose_subjects(&self, lines: &mut InputLines) -> Result<Option<Vec<String>>> {
        let mut picker = SubjectPicker::new(self.default_subjects.clone());

        loop {
            print_subject_menu(&picker);
            let Some(line) = lines.next_line().await? else {
                return Ok(None);
            };
            match picker.apply(&line) {
                PickerStep::Confirmed => return Ok(Some(picker.into_selected())),
                PickerStep::Edited => {}
                PickerStep::NothingSelected => println!("⚠️ اختر مادة واحدة على الأقل."),
                PickerStep::Invalid => println!("⚠️ اختيار غير صالح: {}", line.trim()),
            }
        }
    }

    /// 时长选择界面，输入关闭时返回 None
    async fn choose_duration(&self, lines: &mut InputLines) -> Result<Option<u32>> {
        let default = self.config.duration_minutes;

        loop {
            print_duration_menu(default);
            let Some(line) = lines.next_line().await? else {
                return Ok(None);
            };
            match parse_duration_choice(&line, default) {
                Some(minutes) => return Ok(Some(minutes)),
                None => println!("⚠️ اختيار غير صالح: {}", line.trim()),
            }
        }
    }

    /// 单场考试的输入循环
    async fn run_exam(
        &self,
        lines: &mut InputLines,
        status_rx: &mut watch::Receiver<ExamStatus>,
    ) -> Result<()> {
        print_help();

        loop {
            let snapshot = self.session.snapshot();
            if snapshot.status != ExamStatus::InProgress {
                break;
            }
            print_question(&snapshot);

            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(input) => {
                            dispatch_command(&self.session, input.trim(), &snapshot).await?
                        }
                        None => {
                            warn!("⚠️ 输入已关闭，自动交卷");
                            self.session.finish().await?;
                        }
                    }
                }
                _ = status_rx.wait_for(|s| s.is_submitted()) => {
                    println!("\n⏰ انتهى الوقت! تم تسليم الاختبار تلقائياً.");
                }
            }
        }

        Ok(())
    }
}

/// 把一行输入翻译成会话命令
///
/// `snapshot` 在等待输入前取得，计时器可能已在此期间交卷；
/// 这种情况下命令被忽略，由外层循环展示成绩
async fn dispatch_command<G: QuestionGenerator>(
    session: &ExamSession<G>,
    input: &str,
    snapshot: &SessionSnapshot,
) -> AppResult<()> {
    let Some(question) = snapshot.current_question.as_ref() else {
        return Ok(());
    };

    let outcome = match input {
        "n" => session.advance(),
        "p" => session.retreat(),
        "f" => session.finish().await,
        "h" => {
            print_help();
            Ok(())
        }
        other => match parse_answer_choice(other) {
            Some(index) => session.record_answer(question.id(), index),
            None => {
                println!("⚠️ أمر غير معروف: {}", other);
                Ok(())
            }
        },
    };

    match outcome {
        Err(e) if e.is_invalid_transition() => {
            debug!("考试已交卷，忽略命令 '{}'", input);
            Ok(())
        }
        other => other,
    }
}

/// "1".."4" → 选项序号 0..3
fn parse_answer_choice(input: &str) -> Option<usize> {
    match input.parse::<usize>() {
        Ok(choice @ 1..=OPTION_COUNT) => Some(choice - 1),
        _ => None,
    }
}

/// 选科输入的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PickerStep {
    Confirmed,
    Edited,
    NothingSelected,
    Invalid,
}

/// 选科状态
///
/// - 输入编号切换对应科目
/// - `0` 切换"全部科目"：已全选时清空，否则全选
/// - 空行确认
#[derive(Debug, Clone, PartialEq, Eq)]
struct SubjectPicker {
    selected: Vec<String>,
}

impl SubjectPicker {
    fn new(selected: Vec<String>) -> Self {
        Self { selected }
    }

    fn is_selected(&self, name: &str) -> bool {
        self.selected.iter().any(|s| s == name)
    }

    fn is_all_selected(&self) -> bool {
        Subject::ALL.iter().all(|s| self.is_selected(s.name()))
    }

    fn toggle(&mut self, name: &str) {
        if self.is_selected(name) {
            self.selected.retain(|s| s != name);
        } else {
            self.selected.push(name.to_string());
        }
    }

    fn toggle_all(&mut self) {
        if self.is_all_selected() {
            self.selected.clear();
        } else {
            self.selected = Subject::all_names();
        }
    }

    /// 处理一行输入；有任何非法编号时不做修改
    fn apply(&mut self, input: &str) -> PickerStep {
        let input = input.trim();
        if input.is_empty() {
            return if self.selected.is_empty() {
                PickerStep::NothingSelected
            } else {
                PickerStep::Confirmed
            };
        }
        if input == "0" || input.eq_ignore_ascii_case("all") || input == "الكل" {
            self.toggle_all();
            return PickerStep::Edited;
        }

        let picks: Option<Vec<Subject>> = input
            .split(|c: char| c.is_whitespace() || c == ',' || c == '،')
            .filter(|token| !token.is_empty())
            .map(|token| {
                let number = token.parse::<usize>().ok()?;
                Subject::ALL.get(number.checked_sub(1)?).copied()
            })
            .collect();

        match picks {
            Some(picks) => {
                for subject in picks {
                    self.toggle(subject.name());
                }
                PickerStep::Edited
            }
            None => PickerStep::Invalid,
        }
    }

    fn into_selected(self) -> Vec<String> {
        self.selected
    }
}

/// 时长选择：空行取默认值，也接受菜单编号或分钟数
fn parse_duration_choice(input: &str, default: u32) -> Option<u32> {
    let input = input.trim();
    if input.is_empty() {
        return Some(default);
    }

    let value = input.parse::<u32>().ok()?;
    if DURATION_CHOICES.contains(&value) {
        return Some(value);
    }
    let index = usize::try_from(value).ok()?.checked_sub(1)?;
    DURATION_CHOICES.get(index).copied()
}

/// 配置中没有科目时使用全部科目
fn resolve_subjects(configured: &[String]) -> Vec<String> {
    if configured.is_empty() {
        return Subject::all_names();
    }
    for name in configured {
        if Subject::from_name(name).is_none() {
            warn!("⚠️ 未知科目 '{}'，仅远程出题可能覆盖", name);
        }
    }
    configured.to_vec()
}

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 模拟考试");
    info!("🤖 模型: {}", config.llm_model_name);
    if config.llm_api_key.is_empty() {
        warn!("⚠️ 未配置 LLM_API_KEY，将只使用兜底题库");
    }
    info!("{}", "=".repeat(60));
}

fn print_help() {
    println!("\nالأوامر: 1-4 لاختيار إجابة | n التالي | p السابق | f تسليم | h مساعدة");
}

fn print_subject_menu(picker: &SubjectPicker) {
    println!("\nاختر المواد (أرقام لتبديل الاختيار، 0 لجميع المواد، سطر فارغ للمتابعة):");
    for (i, subject) in Subject::ALL.iter().enumerate() {
        let marker = if picker.is_selected(subject.name()) { "●" } else { "○" };
        println!("  {} {:>2}. {}", marker, i + 1, subject.name());
    }
    let marker = if picker.is_all_selected() { "●" } else { "○" };
    println!("  {}  0. اختبار شامل (جميع المواد)", marker);
}

fn print_duration_menu(default: u32) {
    println!("\nاختر مدة الاختبار (سطر فارغ = {} دقيقة):", default);
    for (i, minutes) in DURATION_CHOICES.iter().enumerate() {
        let marker = if *minutes == default { "●" } else { "○" };
        println!("  {} {}. {} دقيقة", marker, i + 1, minutes);
    }
}

fn print_question(snapshot: &SessionSnapshot) {
    let Some(question) = snapshot.current_question.as_ref() else {
        return;
    };
    let selected = snapshot.selected_option();

    println!("\n{}", "─".repeat(60));
    println!(
        "السؤال {}/{} | {} | ⏱️ {}",
        snapshot.current_index + 1,
        snapshot.total_questions,
        question.subject(),
        snapshot.clock()
    );
    println!("{}", question.text());
    for (i, option) in question.options().iter().enumerate() {
        let marker = if selected == Some(i) { "●" } else { "○" };
        println!("  {} {}) {} [{}]", marker, OPTION_LABELS[i], option, i + 1);
    }
    if snapshot.is_last_question() {
        println!("(السؤال الأخير: n يسلّم الاختبار)");
    }
}

fn print_report(result: &ExamResult) {
    println!("\n{}", "=".repeat(60));
    println!("📊 النتيجة: {}/{}", result.total_score, result.total_questions);
    if let Some(percentage) = result.percentage() {
        println!("   {:.0}%", percentage);
    }
    println!("💬 {}", result.neo_message);

    if result.has_subject_breakdown() {
        println!("\nالنتائج حسب المادة:");
        for (subject, score) in &result.subject_scores {
            println!("  {}: {}/{}", subject, score.score, score.total);
        }
    }

    println!("\nمراجعة الإجابات:");
    for (i, feedback) in result.feedback.iter().enumerate() {
        let mark = if feedback.is_correct { "✓" } else { "✗" };
        println!("\n{} {}. {}", mark, i + 1, feedback.question);
        println!("   إجابتك: {}", feedback.student_answer);
        if !feedback.is_correct {
            println!("   الإجابة الصحيحة: {}", feedback.correct_answer);
        }
        if let Some(explanation) = &feedback.explanation {
            println!("   {}", explanation);
        }
    }
    println!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Question;
    use crate::services::{FallbackBank, GenerationRequest};
    use std::time::Duration;

    const MATH: &str = "رياضيات";

    struct Fixed;

    impl QuestionGenerator for Fixed {
        async fn generate(&self, _request: &GenerationRequest) -> AppResult<Vec<Question>> {
            (0..3)
                .map(|i| {
                    let options = ["1", "2", "3", "4"].iter().map(|s| s.to_string()).collect();
                    Question::new(format!("q{}", i), "سؤال", options, 0, MATH)
                })
                .collect()
        }
    }

    fn session() -> ExamSession<Fixed> {
        ExamSession::new(QuestionSource::new(Fixed, FallbackBank::new(Vec::new())), 3)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_subjects_defaults_to_all() {
        let subjects = resolve_subjects(&[]);
        assert_eq!(subjects.len(), Subject::ALL.len());
    }

    #[test]
    fn test_resolve_subjects_keeps_configured() {
        let configured = names(&[MATH, "غير معروف"]);
        assert_eq!(resolve_subjects(&configured), configured);
    }

    #[test]
    fn test_parse_answer_choice() {
        assert_eq!(parse_answer_choice("1"), Some(0));
        assert_eq!(parse_answer_choice("4"), Some(3));
        assert_eq!(parse_answer_choice("0"), None);
        assert_eq!(parse_answer_choice("5"), None);
        assert_eq!(parse_answer_choice("x"), None);
    }

    #[test]
    fn test_picker_toggles_by_number() {
        let mut picker = SubjectPicker::new(Vec::new());

        assert_eq!(picker.apply("1 5"), PickerStep::Edited);
        assert_eq!(picker.selected, names(&["الفيزياء", MATH]));

        assert_eq!(picker.apply("1"), PickerStep::Edited);
        assert_eq!(picker.selected, names(&[MATH]));

        assert_eq!(picker.apply(""), PickerStep::Confirmed);
        assert_eq!(picker.into_selected(), names(&[MATH]));
    }

    #[test]
    fn test_picker_all_toggle() {
        let mut picker = SubjectPicker::new(names(&[MATH]));

        assert_eq!(picker.apply("0"), PickerStep::Edited);
        assert!(picker.is_all_selected());
        assert_eq!(picker.selected, Subject::all_names());

        assert_eq!(picker.apply("الكل"), PickerStep::Edited);
        assert!(picker.selected.is_empty());
        assert_eq!(picker.apply("  "), PickerStep::NothingSelected);
    }

    #[test]
    fn test_picker_rejects_bad_numbers_without_change() {
        let mut picker = SubjectPicker::new(names(&[MATH]));

        assert_eq!(picker.apply("2, 12"), PickerStep::Invalid);
        assert_eq!(picker.apply("abc"), PickerStep::Invalid);
        assert_eq!(picker.selected, names(&[MATH]));

        assert_eq!(picker.apply("2،3"), PickerStep::Edited);
        assert_eq!(picker.selected.len(), 3);
    }

    #[test]
    fn test_parse_duration_choice() {
        assert_eq!(parse_duration_choice("", 30), Some(30));
        assert_eq!(parse_duration_choice("", 7), Some(7));
        assert_eq!(parse_duration_choice("1", 30), Some(15));
        assert_eq!(parse_duration_choice("4", 30), Some(60));
        assert_eq!(parse_duration_choice(" 45 ", 30), Some(45));
        assert_eq!(parse_duration_choice("5", 30), None);
        assert_eq!(parse_duration_choice("20", 30), None);
        assert_eq!(parse_duration_choice("0", 30), None);
        assert_eq!(parse_duration_choice("-1", 30), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_after_timeout_are_ignored() {
        let session = session();
        session.start(&names(&[MATH]), 1, "").await.unwrap();
        let snapshot = session.snapshot();

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(session.status(), ExamStatus::Finished);

        for input in ["1", "n", "p", "f", "h", "zzz"] {
            assert!(dispatch_command(&session, input, &snapshot).await.is_ok());
        }
        assert_eq!(session.status(), ExamStatus::Finished);
        assert!(session.result().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_drive_session() {
        let session = session();
        session.start(&names(&[MATH]), 10, "").await.unwrap();

        dispatch_command(&session, "2", &session.snapshot()).await.unwrap();
        dispatch_command(&session, "n", &session.snapshot()).await.unwrap();
        assert_eq!(session.current_index(), 1);
        dispatch_command(&session, "p", &session.snapshot()).await.unwrap();
        assert_eq!(session.snapshot().selected_option(), Some(1));

        dispatch_command(&session, "f", &session.snapshot()).await.unwrap();
        assert_eq!(session.status(), ExamStatus::Finished);
    }
}
