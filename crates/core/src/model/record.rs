use crate::model::question::AnswerKey;

/// Immutable record of one graded answer.
///
/// Created at commit time and never edited afterwards; the review screen and
/// the results summary both read from these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsweredRecord {
    /// Position of the question within the active category, not the catalog.
    pub question_index: usize,
    pub question_text: String,
    /// What the player had selected, in first-selected order.
    pub user_answer: Vec<String>,
    pub answer_key: AnswerKey,
    pub is_correct: bool,
    /// Whole seconds spent on the question before commit.
    pub time_spent_secs: u32,
}

impl AnsweredRecord {
    #[must_use]
    pub fn new(
        question_index: usize,
        question_text: impl Into<String>,
        user_answer: Vec<String>,
        answer_key: AnswerKey,
        is_correct: bool,
        time_spent_secs: u32,
    ) -> Self {
        Self {
            question_index,
            question_text: question_text.into(),
            user_answer,
            answer_key,
            is_correct,
            time_spent_secs,
        }
    }
}
