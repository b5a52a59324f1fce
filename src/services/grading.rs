//! 阅卷服务 - 业务能力层
//!
//! 纯计算，不做 I/O：对照正确答案逐题批改、按科目汇总、给出评语

use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::models::{ExamResult, Question, QuestionFeedback, SubjectScore};

/// 未作答时展示的答案文本
pub const NO_ANSWER_MARKER: &str = "لم تتم الإجابة";

/// 答错时默认附带的复习提示
pub const REVIEW_HINT: &str = "راجع الدرس المتعلق بهذا السؤال لتحسين فهمك.";

/// 单题讲解策略
pub trait Explainer: Send + Sync {
    fn explain(&self, question: &Question, is_correct: bool) -> Option<String>;
}

/// 默认讲解：答错时给出固定的复习提示
#[derive(Debug, Default, Clone, Copy)]
pub struct ReviewHint;

impl Explainer for ReviewHint {
    fn explain(&self, _question: &Question, is_correct: bool) -> Option<String> {
        (!is_correct).then(|| REVIEW_HINT.to_string())
    }
}

/// 成绩档位，自上而下取第一个满足的
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// 100%
    Perfect,
    /// >= 80%
    Excellent,
    /// >= 60%
    Good,
    /// < 60%
    KeepTrying,
    /// 没有题目，不计算正确率
    Completed,
}

impl Verdict {
    /// 按得分定档（整数比较，避免浮点误差）
    pub fn from_score(score: usize, total: usize) -> Self {
        if total == 0 {
            return Verdict::Completed;
        }
        let scaled = score * 100;
        if score == total {
            Verdict::Perfect
        } else if scaled >= 80 * total {
            Verdict::Excellent
        } else if scaled >= 60 * total {
            Verdict::Good
        } else {
            Verdict::KeepTrying
        }
    }

    /// Neo 的评语
    pub fn message(self) -> &'static str {
        match self {
            Verdict::Perfect => {
                "رائع! لقد أجبت على جميع الأسئلة بشكل صحيح. عمل ممتاز واستمر على هذا المنوال!"
            }
            Verdict::Excellent => {
                "نتيجة ممتازة! أنت تظهر فهمًا قويًا للمادة. استمر في العمل الجيد."
            }
            Verdict::Good => {
                "نتيجة جيدة. هناك بعض النقاط التي تحتاج إلى مراجعة بسيطة لتحقيق التميز."
            }
            Verdict::KeepTrying => {
                "لا بأس، كل اختبار هو فرصة للتعلم. راجع إجاباتك الخاطئة وحاول مرة أخرى. يمكنك تحقيق الأفضل!"
            }
            Verdict::Completed => "أنهيت الاختبار بنجاح! تفقد تقريرك المفصل.",
        }
    }
}

/// 阅卷服务
pub struct Grader {
    explainer: Box<dyn Explainer>,
}

impl Grader {
    pub fn new() -> Self {
        Self::with_explainer(ReviewHint)
    }

    /// 使用自定义讲解策略
    pub fn with_explainer(explainer: impl Explainer + 'static) -> Self {
        Self {
            explainer: Box::new(explainer),
        }
    }

    /// 批改试卷
    ///
    /// # 参数
    /// - `questions`: 本场考试的题目（按出题顺序）
    /// - `answers`: 题目 id -> 所选选项序号
    ///
    /// # 返回
    /// 成绩；反馈顺序与 `questions` 一致
    pub fn grade(&self, questions: &[Question], answers: &HashMap<String, usize>) -> ExamResult {
        let mut subject_scores: BTreeMap<String, SubjectScore> = BTreeMap::new();
        let mut total_score = 0;

        let feedback: Vec<QuestionFeedback> = questions
            .iter()
            .map(|q| {
                let chosen = answers.get(q.id()).copied();
                let is_correct = chosen == Some(q.correct_option_index());

                let student_answer = chosen
                    .and_then(|index| q.option(index))
                    .unwrap_or(NO_ANSWER_MARKER)
                    .to_string();

                let entry = subject_scores.entry(q.subject().to_string()).or_default();
                entry.total += 1;
                if is_correct {
                    entry.score += 1;
                    total_score += 1;
                }

                QuestionFeedback {
                    question_id: q.id().to_string(),
                    question: q.text().to_string(),
                    subject: q.subject().to_string(),
                    student_answer,
                    correct_answer: q.correct_option().to_string(),
                    is_correct,
                    explanation: self.explainer.explain(q, is_correct),
                }
            })
            .collect();

        let total_questions = questions.len();
        let verdict = Verdict::from_score(total_score, total_questions);
        debug!(
            "阅卷完成: {}/{} 科目数 {} 档位 {:?}",
            total_score,
            total_questions,
            subject_scores.len(),
            verdict
        );

        ExamResult {
            total_score,
            total_questions,
            subject_scores,
            feedback,
            neo_message: verdict.message().to_string(),
        }
    }
}

impl Default for Grader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATH: &str = "رياضيات";
    const RELIGION: &str = "دين";

    fn question(id: &str, subject: &str, correct: usize) -> Question {
        let options = ["أ", "ب", "ج", "د"].iter().map(|s| s.to_string()).collect();
        Question::new(id, format!("سؤال {}", id), options, correct, subject).unwrap()
    }

    fn answers(pairs: &[(&str, usize)]) -> HashMap<String, usize> {
        pairs.iter().map(|(id, i)| (id.to_string(), *i)).collect()
    }

    #[test]
    fn test_all_correct_single_subject() {
        let questions: Vec<Question> = (0..5)
            .map(|i| question(&format!("m{}", i), MATH, i % 4))
            .collect();
        let given: HashMap<String, usize> = questions
            .iter()
            .map(|q| (q.id().to_string(), q.correct_option_index()))
            .collect();

        let result = Grader::new().grade(&questions, &given);

        assert_eq!(result.total_score, 5);
        assert_eq!(result.total_questions, 5);
        assert_eq!(result.percentage(), Some(100.0));
        assert_eq!(result.neo_message, Verdict::Perfect.message());
        assert_eq!(result.subject_scores[MATH], SubjectScore { score: 5, total: 5 });
        assert!(result.feedback.iter().all(|f| f.explanation.is_none()));
        assert!(!result.has_subject_breakdown());
    }

    #[test]
    fn test_two_subjects_partial_score() {
        let mut questions = Vec::new();
        for i in 0..5 {
            questions.push(question(&format!("m{}", i), MATH, 0));
            questions.push(question(&format!("r{}", i), RELIGION, 1));
        }
        // 数学答对 4 道，宗教答对 2 道
        let given = answers(&[
            ("m0", 0),
            ("m1", 0),
            ("m2", 0),
            ("m3", 0),
            ("m4", 3),
            ("r0", 1),
            ("r1", 1),
            ("r2", 2),
            ("r3", 0),
        ]);

        let result = Grader::new().grade(&questions, &given);

        assert_eq!(result.total_score, 6);
        assert_eq!(result.subject_scores[MATH], SubjectScore { score: 4, total: 5 });
        assert_eq!(result.subject_scores[RELIGION], SubjectScore { score: 2, total: 5 });
        let score_sum: usize = result.subject_scores.values().map(|s| s.score).sum();
        let total_sum: usize = result.subject_scores.values().map(|s| s.total).sum();
        assert_eq!(score_sum, 6);
        assert_eq!(total_sum, result.total_questions);
        assert_eq!(result.neo_message, Verdict::Good.message());
        assert!(result.has_subject_breakdown());
    }

    #[test]
    fn test_unanswered_is_incorrect() {
        let questions = vec![question("q1", MATH, 0), question("q2", MATH, 2)];
        let result = Grader::new().grade(&questions, &HashMap::new());

        assert_eq!(result.total_score, 0);
        for f in &result.feedback {
            assert!(!f.is_correct);
            assert_eq!(f.student_answer, NO_ANSWER_MARKER);
            assert_eq!(f.explanation.as_deref(), Some(REVIEW_HINT));
        }
        assert_eq!(result.feedback[1].correct_answer, "ج");
        assert_eq!(result.neo_message, Verdict::KeepTrying.message());
    }

    #[test]
    fn test_feedback_keeps_question_order() {
        let questions = vec![
            question("z", RELIGION, 0),
            question("a", MATH, 1),
            question("m", MATH, 2),
        ];
        let result = Grader::new().grade(&questions, &answers(&[("a", 1), ("m", 0)]));

        let ids: Vec<&str> = result.feedback.iter().map(|f| f.question_id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
        assert_eq!(result.feedback[1].student_answer, "ب");
        assert_eq!(result.feedback[2].student_answer, "أ");
    }

    #[test]
    fn test_subject_keys_are_case_sensitive() {
        let questions = vec![question("1", "Math", 0), question("2", "math", 0)];
        let result = Grader::new().grade(&questions, &HashMap::new());
        assert_eq!(result.subject_scores.len(), 2);
    }

    #[test]
    fn test_grading_is_deterministic() {
        let questions = vec![question("1", MATH, 0), question("2", RELIGION, 3)];
        let given = answers(&[("1", 0), ("2", 1)]);
        let grader = Grader::new();
        assert_eq!(grader.grade(&questions, &given), grader.grade(&questions, &given));
    }

    #[test]
    fn test_zero_questions() {
        let result = Grader::new().grade(&[], &HashMap::new());
        assert_eq!(result.total_questions, 0);
        assert_eq!(result.percentage(), None);
        assert_eq!(result.neo_message, Verdict::Completed.message());
    }

    #[test]
    fn test_verdict_thresholds() {
        assert_eq!(Verdict::from_score(10, 10), Verdict::Perfect);
        assert_eq!(Verdict::from_score(8, 10), Verdict::Excellent);
        assert_eq!(Verdict::from_score(4, 5), Verdict::Excellent);
        assert_eq!(Verdict::from_score(6, 10), Verdict::Good);
        assert_eq!(Verdict::from_score(3, 5), Verdict::Good);
        assert_eq!(Verdict::from_score(5, 9), Verdict::KeepTrying);
        assert_eq!(Verdict::from_score(0, 3), Verdict::KeepTrying);
        assert_eq!(Verdict::from_score(0, 0), Verdict::Completed);
    }

    #[test]
    fn test_custom_explainer() {
        struct Silent;
        impl Explainer for Silent {
            fn explain(&self, _: &Question, _: bool) -> Option<String> {
                None
            }
        }

        let questions = vec![question("1", MATH, 0)];
        let result = Grader::with_explainer(Silent).grade(&questions, &HashMap::new());
        assert!(result.feedback[0].explanation.is_none());
    }
}
