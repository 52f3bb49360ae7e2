//! Grading of a selection against a question's answer key.

use std::collections::BTreeSet;

use crate::model::{AnswerKey, Question};

/// Returns whether `selected` is a fully correct answer for `question`.
///
/// Single-answer questions require exactly one selected option equal to the
/// key. Multi-select questions are graded all-or-nothing as set equality:
/// selection order does not matter, and a missing or extra option makes the
/// whole answer wrong. Comparison is exact and case-sensitive because options
/// are presented verbatim from the catalog.
#[must_use]
pub fn evaluate(question: &Question, selected: &[String]) -> bool {
    match question.answer_key() {
        AnswerKey::Single(expected) => selected.len() == 1 && selected[0] == *expected,
        AnswerKey::Multi(expected) => {
            let chosen: BTreeSet<&str> = selected.iter().map(String::as_str).collect();
            let wanted: BTreeSet<&str> = expected.iter().map(String::as_str).collect();
            chosen == wanted
        }
    }
}
