use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::model::question::{AnswerKey, Question, QuestionError, QuestionKind};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("question {index} has unknown kind {raw:?}")]
    UnknownKind { index: usize, raw: String },

    #[error("question {index} is invalid: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: QuestionError,
    },
}

/// Error returned when parsing a [`QuizCategory`] from text fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown quiz category {0:?}")]
pub struct ParseCategoryError(String);

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// A playable slice of the catalog.
///
/// Categories partition questions by shape rather than by topic: every
/// question falls in exactly one category, so running all three covers the
/// whole catalog without repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizCategory {
    /// Single-answer questions whose two options are "true" and "false".
    TrueFalse,
    /// Any other single-answer question.
    SingleChoice,
    /// Questions graded as a set of selected options.
    MultiSelect,
}

impl QuizCategory {
    /// All categories, in menu order.
    pub const ALL: [QuizCategory; 3] = [
        QuizCategory::TrueFalse,
        QuizCategory::SingleChoice,
        QuizCategory::MultiSelect,
    ];

    /// Stable token used in snapshots and on the command line.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizCategory::TrueFalse => "true-false",
            QuizCategory::SingleChoice => "single-choice",
            QuizCategory::MultiSelect => "multi-select",
        }
    }

    /// Whether `question` belongs to this category.
    #[must_use]
    pub fn matches(&self, question: &Question) -> bool {
        match self {
            QuizCategory::MultiSelect => question.kind() == QuestionKind::Multi,
            QuizCategory::TrueFalse => {
                question.kind() == QuestionKind::Single && is_boolean_pair(question.options())
            }
            QuizCategory::SingleChoice => {
                question.kind() == QuestionKind::Single && !is_boolean_pair(question.options())
            }
        }
    }
}

impl fmt::Display for QuizCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true-false" | "true/false" | "truefalse" => Ok(QuizCategory::TrueFalse),
            "single-choice" | "single" => Ok(QuizCategory::SingleChoice),
            "multi-select" | "multi" => Ok(QuizCategory::MultiSelect),
            other => Err(ParseCategoryError(other.to_owned())),
        }
    }
}

fn is_boolean_pair(options: &[String]) -> bool {
    match options {
        [a, b] => {
            (a.eq_ignore_ascii_case("true") && b.eq_ignore_ascii_case("false"))
                || (a.eq_ignore_ascii_case("false") && b.eq_ignore_ascii_case("true"))
        }
        _ => false,
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Read-only bank of validated questions.
///
/// The catalog never changes during a session; sessions hold cloned slices of
/// it so a restored session and a fresh one see identical questions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Parses a catalog from its JSON file form:
    /// `{"questions": [{"text", "type", "options", "correctAnswer"}, ...]}`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the JSON is malformed or any record
    /// fails question validation. The error names the offending record's
    /// position so catalog authors can find it.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let parsed: RawCatalog = serde_json::from_str(raw)?;
        let mut questions = Vec::with_capacity(parsed.questions.len());
        for (index, record) in parsed.questions.into_iter().enumerate() {
            let kind = record
                .kind
                .parse::<QuestionKind>()
                .map_err(|_| CatalogError::UnknownKind {
                    index,
                    raw: record.kind.clone(),
                })?;
            let question =
                Question::new(index, record.text, kind, record.options, record.correct_answer)
                    .map_err(|source| CatalogError::Invalid { index, source })?;
            questions.push(question);
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Questions belonging to `category`, in catalog order.
    ///
    /// The filter is deterministic, so calling this again for the same
    /// catalog and category always yields the same list. Restoring a saved
    /// session relies on that.
    #[must_use]
    pub fn questions_in(&self, category: QuizCategory) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|question| category.matches(question))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    text: String,
    #[serde(rename = "type")]
    kind: String,
    options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    correct_answer: AnswerKey,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "questions": [
            {
                "text": "The sky is blue.",
                "type": "single",
                "options": ["True", "False"],
                "correctAnswer": "True"
            },
            {
                "text": "Which planet is closest to the sun?",
                "type": "single",
                "options": ["Venus", "Mercury", "Mars"],
                "correctAnswer": "Mercury"
            },
            {
                "text": "Which of these are primary colors?",
                "type": "multi",
                "options": ["Red", "Green", "Blue", "Yellow"],
                "correctAnswer": ["Red", "Blue", "Yellow"]
            },
            {
                "text": "Water boils at 90 degrees Celsius at sea level.",
                "type": "single",
                "options": ["True", "False"],
                "correctAnswer": "False"
            }
        ]
    }"#;

    #[test]
    fn parses_catalog_file_format() {
        let catalog = QuestionCatalog::from_json_str(SAMPLE).expect("valid catalog");
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.questions()[2].kind(), QuestionKind::Multi);
    }

    #[test]
    fn categories_partition_the_catalog() {
        let catalog = QuestionCatalog::from_json_str(SAMPLE).expect("valid catalog");
        let mut covered = 0;
        for category in QuizCategory::ALL {
            covered += catalog.questions_in(category).len();
        }
        assert_eq!(covered, catalog.len());
    }

    #[test]
    fn filter_keeps_catalog_order() {
        let catalog = QuestionCatalog::from_json_str(SAMPLE).expect("valid catalog");
        let true_false = catalog.questions_in(QuizCategory::TrueFalse);
        let indices: Vec<usize> = true_false.iter().map(Question::index).collect();
        assert_eq!(indices, vec![0, 3]);

        // Deterministic: a second filter sees the same list.
        assert_eq!(catalog.questions_in(QuizCategory::TrueFalse), true_false);
    }

    #[test]
    fn boolean_pair_detection_ignores_case_and_order() {
        let q = Question::new(
            0,
            "Yes or no?",
            QuestionKind::Single,
            vec!["FALSE".into(), "true".into()],
            AnswerKey::Single("true".into()),
        )
        .unwrap();
        assert!(QuizCategory::TrueFalse.matches(&q));
        assert!(!QuizCategory::SingleChoice.matches(&q));
    }

    #[test]
    fn unknown_kind_is_reported_with_position() {
        let raw = r#"{"questions": [{"text": "Q", "type": "multiple", "options": ["a"], "correctAnswer": "a"}]}"#;
        let err = QuestionCatalog::from_json_str(raw).unwrap_err();
        match err {
            CatalogError::UnknownKind { index, raw } => {
                assert_eq!(index, 0);
                assert_eq!(raw, "multiple");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_question_is_reported_with_position() {
        let raw = r#"{"questions": [
            {"text": "Q", "type": "single", "options": ["a"], "correctAnswer": "a"},
            {"text": "Q2", "type": "single", "options": ["a", "b"], "correctAnswer": "c"}
        ]}"#;
        let err = QuestionCatalog::from_json_str(raw).unwrap_err();
        match err {
            CatalogError::Invalid { index, source } => {
                assert_eq!(index, 1);
                assert_eq!(source, QuestionError::AnswerNotInOptions("c".into()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn category_tokens_round_trip() {
        for category in QuizCategory::ALL {
            assert_eq!(category.as_str().parse::<QuizCategory>(), Ok(category));
        }
        assert_eq!("true/false".parse::<QuizCategory>(), Ok(QuizCategory::TrueFalse));
        assert_eq!("multi".parse::<QuizCategory>(), Ok(QuizCategory::MultiSelect));
        assert!("hardest".parse::<QuizCategory>().is_err());
    }
}
