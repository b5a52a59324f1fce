//! 考试会话 - 流程层
//!
//! 核心职责：定义"一场考试"的完整生命周期
//!
//! 流程顺序：
//! 1. start → 出题 → 开始倒计时
//! 2. 作答 / 翻页
//! 3. 时间到或手动交卷 → 阅卷 → 出成绩
//! 4. restart 回到初始状态
//!
//! 会话状态放在 `std::sync::Mutex` 中，任何 `.await` 期间都不持有锁。
//! 倒计时任务每次回调都会核对会话代数（generation）和状态，
//! 离开 `in_progress` 后的残留回调不会修改任何数据。

use std::collections::{BTreeSet, HashMap};
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult, ExamError};
use crate::infrastructure::Countdown;
use crate::models::{Answer, ExamResult, ExamStatus, Question, OPTION_COUNT};
use crate::services::{Grader, QuestionGenerator, QuestionSource};
use crate::utils::logging;
use crate::workflow::session_snapshot::SessionSnapshot;

/// 倒计时周期
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// 出题失败时展示给学生的提示
pub const GENERATION_FAILED_NOTICE: &str =
    "حدث خطأ أثناء إعداد الاختبار. الرجاء المحاولة مرة أخرى.";

/// 会话内部状态
#[derive(Debug, Default)]
struct SessionState {
    status: ExamStatus,
    questions: Vec<Question>,
    answers: HashMap<String, usize>,
    current_index: usize,
    time_remaining_seconds: u64,
    duration_minutes: u32,
    result: Option<ExamResult>,
    /// 每次离开 `in_progress` 或开始新考试时递增
    generation: u64,
    countdown: Option<Countdown>,
}

impl SessionState {
    fn require(&self, action: &'static str, expected: ExamStatus) -> AppResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(AppError::invalid_transition(action, self.status))
        }
    }

    fn stop_countdown(&mut self) {
        self.generation += 1;
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
    }

    fn answers_in_order(&self) -> Vec<Answer> {
        self.questions
            .iter()
            .filter_map(|q| {
                self.answers.get(q.id()).map(|&answer_index| Answer {
                    question_id: q.id().to_string(),
                    answer_index,
                })
            })
            .collect()
    }
}

/// 会话与倒计时任务共享的部分
struct Shared {
    state: Mutex<SessionState>,
    status_tx: watch::Sender<ExamStatus>,
    grader: Grader,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, state: &mut SessionState, status: ExamStatus) {
        debug!("考试状态: {} -> {}", state.status, status);
        state.status = status;
        self.status_tx.send_replace(status);
    }

    /// 交卷并阅卷，调用方保证当前为 `in_progress`
    fn finish_locked(&self, state: &mut SessionState) {
        self.set_status(state, ExamStatus::Loading);
        state.stop_countdown();

        info!(
            "📤 交卷: 已作答 {}/{}，剩余 {} 秒",
            state.answers.len(),
            state.questions.len(),
            state.time_remaining_seconds
        );

        let result = self.grader.grade(&state.questions, &state.answers);
        logging::log_exam_finished(&result);
        state.result = Some(result);

        self.set_status(state, ExamStatus::Finished);
    }

    /// 倒计时回调
    fn on_tick(&self, generation: u64) -> ControlFlow<()> {
        let mut state = self.lock();
        if state.generation != generation || state.status != ExamStatus::InProgress {
            debug!("忽略过期的倒计时回调 (代数 {})", generation);
            return ControlFlow::Break(());
        }

        state.time_remaining_seconds = state.time_remaining_seconds.saturating_sub(1);
        if state.time_remaining_seconds > 0 {
            return ControlFlow::Continue(());
        }

        info!("⏰ 考试时间到，自动交卷");
        self.finish_locked(&mut state);
        ControlFlow::Break(())
    }
}

/// 考试会话
///
/// - 持有题目来源和阅卷服务
/// - 同一时间只有一场考试
/// - `start` / `finish` 为异步命令，其余为同步命令
pub struct ExamSession<G> {
    source: QuestionSource<G>,
    question_count: usize,
    shared: Arc<Shared>,
}

impl<G: QuestionGenerator> ExamSession<G> {
    /// 创建新的考试会话
    pub fn new(source: QuestionSource<G>, question_count: usize) -> Self {
        Self::with_grader(source, question_count, Grader::new())
    }

    /// 使用自定义阅卷服务创建
    pub fn with_grader(source: QuestionSource<G>, question_count: usize, grader: Grader) -> Self {
        let (status_tx, _) = watch::channel(ExamStatus::NotStarted);
        Self {
            source,
            question_count,
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::default()),
                status_tx,
                grader,
            }),
        }
    }

    /// 开始考试
    ///
    /// # 参数
    /// - `subjects`: 选考科目
    /// - `duration_minutes`: 考试时长，0 表示立即交卷
    /// - `grade_level`: 年级
    ///
    /// # 返回
    /// 出题失败时返回带学生提示语的错误，状态回到 `not_started`
    pub async fn start(
        &self,
        subjects: &[String],
        duration_minutes: u32,
        grade_level: &str,
    ) -> AppResult<()> {
        let subjects: BTreeSet<String> = subjects
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        {
            let mut state = self.shared.lock();
            state.require("start", ExamStatus::NotStarted)?;
            self.shared
                .set_status(&mut state, ExamStatus::GeneratingQuestions);
        }

        let generated = self
            .source
            .generate_questions(&subjects, self.question_count, grade_level)
            .await;

        let mut state = self.shared.lock();
        let questions = match generated {
            Ok(questions) => questions,
            Err(e) => {
                error!("❌ 出题失败: {}", e);
                warn!("⚠️ {}", GENERATION_FAILED_NOTICE);
                self.shared.set_status(&mut state, ExamStatus::NotStarted);
                return Err(ExamError::GenerationAborted {
                    notice: GENERATION_FAILED_NOTICE.to_string(),
                    source: Box::new(e),
                }
                .into());
            }
        };

        let subject_list: Vec<String> = subjects.into_iter().collect();
        logging::log_exam_start(&subject_list, questions.len(), duration_minutes);

        state.generation += 1;
        let generation = state.generation;
        state.questions = questions;
        state.answers.clear();
        state.current_index = 0;
        state.result = None;
        state.duration_minutes = duration_minutes;
        state.time_remaining_seconds = u64::from(duration_minutes) * 60;
        self.shared.set_status(&mut state, ExamStatus::InProgress);

        if state.time_remaining_seconds == 0 {
            info!("⏰ 考试时长为 0，直接交卷");
            self.shared.finish_locked(&mut state);
        } else {
            let shared = Arc::clone(&self.shared);
            state.countdown = Some(Countdown::spawn(TICK_PERIOD, move || {
                shared.on_tick(generation)
            }));
        }

        Ok(())
    }

    /// 记录答案（同一题以最后一次为准）
    pub fn record_answer(&self, question_id: &str, answer_index: usize) -> AppResult<()> {
        let mut state = self.shared.lock();
        state.require("record_answer", ExamStatus::InProgress)?;

        if !state.questions.iter().any(|q| q.id() == question_id) {
            return Err(ExamError::UnknownQuestion {
                question_id: question_id.to_string(),
            }
            .into());
        }
        if answer_index >= OPTION_COUNT {
            return Err(ExamError::AnswerOutOfRange {
                question_id: question_id.to_string(),
                answer_index,
            }
            .into());
        }

        if let Some(previous) = state.answers.insert(question_id.to_string(), answer_index) {
            debug!("题目 {} 改选: {} -> {}", question_id, previous, answer_index);
        }
        Ok(())
    }

    /// 下一题；已是最后一题时交卷
    pub fn advance(&self) -> AppResult<()> {
        let mut state = self.shared.lock();
        state.require("advance", ExamStatus::InProgress)?;

        if state.current_index + 1 < state.questions.len() {
            state.current_index += 1;
        } else {
            self.shared.finish_locked(&mut state);
        }
        Ok(())
    }

    /// 上一题，停在第一题
    pub fn retreat(&self) -> AppResult<()> {
        let mut state = self.shared.lock();
        state.require("retreat", ExamStatus::InProgress)?;
        state.current_index = state.current_index.saturating_sub(1);
        Ok(())
    }

    /// 手动交卷
    ///
    /// 已在阅卷中或已出成绩时什么也不做，避免重复阅卷
    pub async fn finish(&self) -> AppResult<()> {
        let mut state = self.shared.lock();
        if state.status.is_submitted() {
            debug!("已经交卷，忽略重复的交卷请求");
            return Ok(());
        }
        state.require("finish", ExamStatus::InProgress)?;
        self.shared.finish_locked(&mut state);
        Ok(())
    }

    /// 重新开始：清空题目、答案和成绩
    pub fn restart(&self) -> AppResult<()> {
        let mut state = self.shared.lock();
        state.require("restart", ExamStatus::Finished)?;

        state.stop_countdown();
        state.questions.clear();
        state.answers.clear();
        state.result = None;
        state.current_index = 0;
        state.time_remaining_seconds = 0;
        self.shared.set_status(&mut state, ExamStatus::NotStarted);
        info!("🔄 考试已重置");
        Ok(())
    }

    // ========== 查询 ==========

    pub fn status(&self) -> ExamStatus {
        self.shared.lock().status
    }

    pub fn current_index(&self) -> usize {
        self.shared.lock().current_index
    }

    pub fn time_remaining_seconds(&self) -> u64 {
        self.shared.lock().time_remaining_seconds
    }

    /// 当前题目，仅考试进行中存在
    pub fn current_question(&self) -> Option<Question> {
        let state = self.shared.lock();
        if state.status != ExamStatus::InProgress {
            return None;
        }
        state.questions.get(state.current_index).cloned()
    }

    /// 成绩，仅交卷后存在
    pub fn result(&self) -> Option<ExamResult> {
        self.shared.lock().result.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.shared.lock();
        let current_question = if state.status == ExamStatus::InProgress {
            state.questions.get(state.current_index).cloned()
        } else {
            None
        };

        SessionSnapshot {
            status: state.status,
            current_index: state.current_index,
            total_questions: state.questions.len(),
            time_remaining_seconds: state.time_remaining_seconds,
            duration_minutes: state.duration_minutes,
            current_question,
            answers: state.answers_in_order(),
            result: state.result.clone(),
        }
    }

    /// 订阅状态变化（例如时间到自动交卷）
    pub fn subscribe(&self) -> watch::Receiver<ExamStatus> {
        self.shared.status_tx.subscribe()
    }
}

impl<G> Drop for ExamSession<G> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.stop_countdown();
    }
}
