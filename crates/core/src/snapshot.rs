//! Snapshot codec for saving and restoring a session.
//!
//! A snapshot is the persisted subset of [`QuizSession`] as one JSON object
//! with camelCase keys. Encoding is plain serde; decoding is deliberately
//! field-by-field so one malformed field costs only that field, not the whole
//! saved session.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::{AnswerKey, AnsweredRecord, QuizSession};

/// Storage key under which the single saved session lives.
///
/// The `v1` suffix names the blob layout. An incompatible layout change gets
/// a new key, so an old build never misreads a new blob.
pub const SESSION_KEY: &str = "quiz.session.v1";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("failed to serialize session snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Persisted form of a session.
///
/// `questionStartedAt` is deliberately absent: wall-clock anchors are stamped
/// fresh on restore, so time while the process was gone is never counted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub player_name: Option<String>,
    /// Category token from [`QuizCategory::as_str`](crate::model::QuizCategory::as_str).
    pub category: Option<String>,
    pub current_index: u64,
    pub selected_options: Vec<String>,
    pub feedback_revealed: bool,
    pub last_answer_correct: bool,
    pub score: u32,
    pub history: Vec<AnsweredSnapshot>,
    pub total_time_seconds: u32,
    pub completed: bool,
}

/// Persisted form of one [`AnsweredRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredSnapshot {
    pub question_index: u64,
    pub question_text: String,
    pub user_answer: Vec<String>,
    pub correct_answer: AnswerKey,
    pub is_correct: bool,
    pub time_spent_seconds: u32,
}

impl SessionSnapshot {
    /// Captures the persisted subset of `session`.
    #[must_use]
    pub fn capture(session: &QuizSession) -> Self {
        Self {
            player_name: session.player().map(ToOwned::to_owned),
            category: session.category().map(|category| category.as_str().to_owned()),
            current_index: session.current_index() as u64,
            selected_options: session.selected_options().to_vec(),
            feedback_revealed: session.feedback_revealed(),
            last_answer_correct: session.last_answer_correct(),
            score: session.score(),
            history: session
                .history()
                .iter()
                .map(AnsweredSnapshot::from_record)
                .collect(),
            total_time_seconds: session.total_time_secs(),
            completed: session.is_completed(),
        }
    }

    /// Serializes the snapshot to its JSON blob form.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Encode`] when serialization fails.
    pub fn encode(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a blob, tolerating damage.
    ///
    /// Never fails: a blob that is not JSON at all yields the default
    /// snapshot, and within a JSON object every missing or wrong-typed field
    /// falls back to its default independently of the others. History entries
    /// are the exception and are dropped whole when their index or answer key
    /// cannot be read, since a partial record would claim grades that never
    /// happened.
    #[must_use]
    pub fn decode(blob: &str) -> Self {
        let value: Value = serde_json::from_str(blob).unwrap_or(Value::Null);
        Self::from_value(&value)
    }

    fn from_value(value: &Value) -> Self {
        Self {
            player_name: value
                .get("playerName")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(ToOwned::to_owned),
            category: value
                .get("category")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned),
            current_index: value
                .get("currentIndex")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            selected_options: string_vec(value.get("selectedOptions")),
            feedback_revealed: bool_field(value, "feedbackRevealed"),
            last_answer_correct: bool_field(value, "lastAnswerCorrect"),
            score: u32_field(value, "score"),
            history: value
                .get("history")
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(AnsweredSnapshot::from_value)
                        .collect()
                })
                .unwrap_or_default(),
            total_time_seconds: u32_field(value, "totalTimeSeconds"),
            completed: bool_field(value, "completed"),
        }
    }
}

impl AnsweredSnapshot {
    #[must_use]
    pub fn from_record(record: &AnsweredRecord) -> Self {
        Self {
            question_index: record.question_index as u64,
            question_text: record.question_text.clone(),
            user_answer: record.user_answer.clone(),
            correct_answer: record.answer_key.clone(),
            is_correct: record.is_correct,
            time_spent_seconds: record.time_spent_secs,
        }
    }

    fn from_value(entry: &Value) -> Option<Self> {
        let question_index = entry.get("questionIndex").and_then(Value::as_u64)?;
        let correct_answer: AnswerKey =
            serde_json::from_value(entry.get("correctAnswer")?.clone()).ok()?;
        if matches!(&correct_answer, AnswerKey::Multi(keys) if keys.is_empty()) {
            return None;
        }
        Some(Self {
            question_index,
            question_text: entry
                .get("questionText")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            user_answer: string_vec(entry.get("userAnswer")),
            correct_answer,
            is_correct: bool_field(entry, "isCorrect"),
            time_spent_seconds: u32_field(entry, "timeSpentSeconds"),
        })
    }
}

fn bool_field(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn u32_field(value: &Value, key: &str) -> u32 {
    value
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|number| u32::try_from(number).ok())
        .unwrap_or(0)
}

fn string_vec(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
