use crate::model::{AnsweredRecord, QuizSession};

/// Aggregate results of a quiz run, ready for any front end to render.
///
/// Holds numbers only, no pre-formatted strings. Derived quantities guard
/// their divisions, so a run submitted before answering anything (or an empty
/// category) summarizes to zeros instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSummary {
    score: u32,
    question_count: u32,
    answered_count: u32,
    percentage: u32,
    total_time_secs: u32,
    average_time_secs: u32,
    history: Vec<AnsweredRecord>,
}

impl QuizSummary {
    /// Summarizes `session` as it stands; usually called once it completes.
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Self {
        let score = session.score();
        let question_count = u32::try_from(session.question_count()).unwrap_or(u32::MAX);
        let answered_count = u32::try_from(session.history().len()).unwrap_or(u32::MAX);
        let total_time_secs = session.total_time_secs();
        let average_time_secs = if answered_count == 0 {
            0
        } else {
            total_time_secs / answered_count
        };
        Self {
            score,
            question_count,
            answered_count,
            percentage: rounded_percentage(score, question_count),
            total_time_secs,
            average_time_secs,
            history: session.history().to_vec(),
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Size of the category the run was played over, answered or not.
    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn answered_count(&self) -> u32 {
        self.answered_count
    }

    /// Score over the full question count, rounded to the nearest percent.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        self.percentage
    }

    #[must_use]
    pub fn total_time_secs(&self) -> u32 {
        self.total_time_secs
    }

    /// Whole seconds per answered question, floored; zero when nothing was
    /// answered.
    #[must_use]
    pub fn average_time_secs(&self) -> u32 {
        self.average_time_secs
    }

    /// Per-question records in answer order.
    #[must_use]
    pub fn history(&self) -> &[AnsweredRecord] {
        &self.history
    }
}

/// `score / total` as a percentage rounded half-up; zero when `total` is zero.
fn rounded_percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let numerator = u64::from(score) * 100 + u64::from(total) / 2;
    u32::try_from(numerator / u64::from(total)).unwrap_or(u32::MAX)
}
