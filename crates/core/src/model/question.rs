use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question must offer at least one option")]
    NoOptions,

    #[error("option {position} is blank")]
    BlankOption { position: usize },

    #[error("duplicate option {0:?}")]
    DuplicateOption(String),

    #[error("answer key shape does not match question kind {kind}")]
    KeyShapeMismatch { kind: QuestionKind },

    #[error("answer set of a multi-select question cannot be empty")]
    EmptyAnswerSet,

    #[error("duplicate answer {0:?} in answer set")]
    DuplicateAnswer(String),

    #[error("answer {0:?} is not one of the offered options")]
    AnswerNotInOptions(String),
}

/// Error returned when parsing a [`QuestionKind`] from text fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown question kind {0:?}")]
pub struct ParseKindError(String);

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// Interaction shape of a question.
///
/// `Single` questions accept exactly one selected option, `Multi` questions
/// accept any subset of the options. The kind drives both selection toggling
/// and answer evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Single,
    Multi,
}

impl QuestionKind {
    /// Returns the canonical catalog spelling (`"single"` or `"multi"`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Single => "single",
            QuestionKind::Multi => "multi",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "single" => Ok(QuestionKind::Single),
            "multi" => Ok(QuestionKind::Multi),
            other => Err(ParseKindError(other.to_owned())),
        }
    }
}

//
// ─── ANSWER KEY ────────────────────────────────────────────────────────────────
//

/// The correct answer of a question.
///
/// Serialized untagged so the JSON form is a bare string for single-answer
/// questions and an array of strings for multi-select ones, matching the
/// catalog file format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerKey {
    Single(String),
    Multi(Vec<String>),
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single validated quiz question.
///
/// Construction checks the catalog invariants once so the session logic can
/// rely on them: the text is non-blank, options are non-blank and unique, and
/// the answer key matches the declared kind and only references offered
/// options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    index: usize,
    text: String,
    kind: QuestionKind,
    options: Vec<String>,
    answer_key: AnswerKey,
}

impl Question {
    /// Creates a validated question.
    ///
    /// `index` is the question's ordinal within its catalog and is only used
    /// for identity in logs and errors.
    ///
    /// # Errors
    ///
    /// Returns a [`QuestionError`] when the text or an option is blank, when
    /// options or answers repeat, or when the answer key does not fit the
    /// declared kind.
    pub fn new(
        index: usize,
        text: impl Into<String>,
        kind: QuestionKind,
        options: Vec<String>,
        answer_key: AnswerKey,
    ) -> Result<Self, QuestionError> {
        let text = text.into().trim().to_owned();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        for (position, option) in options.iter().enumerate() {
            if option.trim().is_empty() {
                return Err(QuestionError::BlankOption { position });
            }
            if options[..position].contains(option) {
                return Err(QuestionError::DuplicateOption(option.clone()));
            }
        }
        match (&kind, &answer_key) {
            (QuestionKind::Single, AnswerKey::Single(answer)) => {
                if !options.contains(answer) {
                    return Err(QuestionError::AnswerNotInOptions(answer.clone()));
                }
            }
            (QuestionKind::Multi, AnswerKey::Multi(answers)) => {
                if answers.is_empty() {
                    return Err(QuestionError::EmptyAnswerSet);
                }
                for (position, answer) in answers.iter().enumerate() {
                    if answers[..position].contains(answer) {
                        return Err(QuestionError::DuplicateAnswer(answer.clone()));
                    }
                    if !options.contains(answer) {
                        return Err(QuestionError::AnswerNotInOptions(answer.clone()));
                    }
                }
            }
            _ => return Err(QuestionError::KeyShapeMismatch { kind }),
        }
        Ok(Self {
            index,
            text,
            kind,
            options,
            answer_key,
        })
    }

    /// Ordinal of this question within its catalog.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    /// Options in the order the catalog presents them.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn answer_key(&self) -> &AnswerKey {
        &self.answer_key
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn builds_single_answer_question() {
        let q = Question::new(
            0,
            "  What is 2 + 2?  ",
            QuestionKind::Single,
            opts(&["3", "4", "5"]),
            AnswerKey::Single("4".into()),
        )
        .expect("valid question");

        assert_eq!(q.text(), "What is 2 + 2?");
        assert_eq!(q.kind(), QuestionKind::Single);
        assert_eq!(q.answer_key(), &AnswerKey::Single("4".into()));
    }

    #[test]
    fn rejects_blank_text() {
        let err = Question::new(
            0,
            "   ",
            QuestionKind::Single,
            opts(&["a"]),
            AnswerKey::Single("a".into()),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::EmptyText);
    }

    #[test]
    fn rejects_answer_outside_options() {
        let err = Question::new(
            0,
            "Pick one",
            QuestionKind::Single,
            opts(&["a", "b"]),
            AnswerKey::Single("c".into()),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::AnswerNotInOptions("c".into()));
    }

    #[test]
    fn rejects_key_shape_mismatch() {
        let err = Question::new(
            0,
            "Pick many",
            QuestionKind::Multi,
            opts(&["a", "b"]),
            AnswerKey::Single("a".into()),
        )
        .unwrap_err();
        assert_eq!(
            err,
            QuestionError::KeyShapeMismatch {
                kind: QuestionKind::Multi
            }
        );
    }

    #[test]
    fn rejects_duplicate_options_and_answers() {
        let err = Question::new(
            0,
            "Pick",
            QuestionKind::Single,
            opts(&["a", "a"]),
            AnswerKey::Single("a".into()),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::DuplicateOption("a".into()));

        let err = Question::new(
            0,
            "Pick many",
            QuestionKind::Multi,
            opts(&["a", "b"]),
            AnswerKey::Multi(vec!["a".into(), "a".into()]),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::DuplicateAnswer("a".into()));
    }

    #[test]
    fn rejects_empty_multi_answer_set() {
        let err = Question::new(
            0,
            "Pick many",
            QuestionKind::Multi,
            opts(&["a", "b"]),
            AnswerKey::Multi(Vec::new()),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::EmptyAnswerSet);
    }

    #[test]
    fn kind_round_trips_through_text() {
        assert_eq!("single".parse::<QuestionKind>(), Ok(QuestionKind::Single));
        assert_eq!("multi".parse::<QuestionKind>(), Ok(QuestionKind::Multi));
        assert!("multiple".parse::<QuestionKind>().is_err());
        assert_eq!(QuestionKind::Multi.to_string(), "multi");
    }

    #[test]
    fn answer_key_serializes_untagged() {
        let single = serde_json::to_value(AnswerKey::Single("yes".into())).unwrap();
        assert_eq!(single, serde_json::json!("yes"));

        let multi = serde_json::to_value(AnswerKey::Multi(vec!["a".into(), "b".into()])).unwrap();
        assert_eq!(multi, serde_json::json!(["a", "b"]));

        let parsed: AnswerKey = serde_json::from_value(serde_json::json!(["a", "b"])).unwrap();
        assert_eq!(parsed, AnswerKey::Multi(vec!["a".into(), "b".into()]));
    }
}
