use chrono::{DateTime, Utc};

use crate::evaluate::evaluate;
use crate::model::catalog::{QuestionCatalog, QuizCategory};
use crate::model::question::{Question, QuestionKind};
use crate::model::record::AnsweredRecord;
use crate::snapshot::SessionSnapshot;
use crate::time::elapsed_whole_secs;

//
// ─── TRANSITIONS ───────────────────────────────────────────────────────────────
//

/// Outcome of a session operation.
///
/// Operations called in the wrong phase are not errors: stale events (a
/// double click, a queued key press) are normal and must leave the session
/// untouched. `Ignored` tells the caller nothing changed, so nothing needs
/// to be persisted or re-rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored,
}

impl Transition {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied)
    }

    #[must_use]
    pub fn is_ignored(&self) -> bool {
        matches!(self, Transition::Ignored)
    }
}

/// Screen-level phase of a session, derived from its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No player name yet.
    NoPlayer,
    /// Named player picking a category.
    CategorySelection,
    /// A question is on screen and accepting selections.
    InProgress,
    /// The current question was just graded; waiting for "next".
    ReviewingFeedback,
    /// The run is over and results are visible.
    Completed,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State of one player's quiz run.
///
/// The session is a plain state machine: every operation takes the inputs it
/// needs (including the current time) and returns a [`Transition`], never an
/// error. Phase is not stored; it is derived from the fields so the state
/// cannot disagree with itself after a restore.
#[derive(Debug, Clone)]
pub struct QuizSession {
    player: Option<String>,
    category: Option<QuizCategory>,
    questions: Vec<Question>,
    current_index: usize,
    selected: Vec<String>,
    feedback_revealed: bool,
    last_answer_correct: bool,
    score: u32,
    history: Vec<AnsweredRecord>,
    total_time_secs: u32,
    question_started_at: DateTime<Utc>,
    completed: bool,
}

impl QuizSession {
    /// A fresh session with no player and no category.
    #[must_use]
    pub fn new() -> Self {
        Self {
            player: None,
            category: None,
            questions: Vec::new(),
            current_index: 0,
            selected: Vec::new(),
            feedback_revealed: false,
            last_answer_correct: false,
            score: 0,
            history: Vec::new(),
            total_time_secs: 0,
            question_started_at: DateTime::UNIX_EPOCH,
            completed: false,
        }
    }

    /// Rebuilds a session from a decoded snapshot.
    ///
    /// The snapshot is data from outside the process, so every field is
    /// sanitized rather than trusted: a missing player falls back to a fresh
    /// session, an unknown category falls back to category selection, the
    /// index is clamped into the active question list, history entries that
    /// do not fit the list are dropped, and the score is recounted from the
    /// surviving history. `now` becomes the new question start time, so time
    /// spent while the process was away is not billed to the player.
    #[must_use]
    pub fn restore(
        catalog: &QuestionCatalog,
        snapshot: &SessionSnapshot,
        now: DateTime<Utc>,
    ) -> Self {
        let mut session = Self::new();
        session.question_started_at = now;

        let Some(player) = snapshot
            .player_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
        else {
            return session;
        };
        session.player = Some(player.to_owned());

        let Some(category) = snapshot
            .category
            .as_deref()
            .and_then(|raw| raw.parse::<QuizCategory>().ok())
        else {
            return session;
        };
        session.category = Some(category);
        session.questions = catalog.questions_in(category);

        let count = session.questions.len();
        session.completed = snapshot.completed;
        session.current_index = usize::try_from(snapshot.current_index).unwrap_or(0);
        if count == 0 {
            session.current_index = 0;
        } else if session.current_index >= count {
            session.current_index = count - 1;
        }

        for entry in &snapshot.history {
            let Ok(question_index) = usize::try_from(entry.question_index) else {
                continue;
            };
            if question_index >= count {
                continue;
            }
            if session
                .history
                .iter()
                .any(|record| record.question_index == question_index)
            {
                continue;
            }
            session.history.push(AnsweredRecord::new(
                question_index,
                entry.question_text.clone(),
                entry.user_answer.clone(),
                entry.correct_answer.clone(),
                entry.is_correct,
                entry.time_spent_seconds,
            ));
        }

        // Score is derived, not trusted: a blob edited by hand cannot claim
        // points its history does not back.
        let correct = session
            .history
            .iter()
            .filter(|record| record.is_correct)
            .count();
        session.score = u32::try_from(correct).unwrap_or(u32::MAX);

        session.selected = snapshot.selected_options.clone();
        session.feedback_revealed = snapshot.feedback_revealed && !session.selected.is_empty();
        session.last_answer_correct = snapshot.last_answer_correct;
        session.total_time_secs = snapshot.total_time_seconds;
        session
    }

    /// Current phase, derived from the fields.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.player.is_none() {
            SessionPhase::NoPlayer
        } else if self.category.is_none() {
            SessionPhase::CategorySelection
        } else if self.completed {
            SessionPhase::Completed
        } else if self.feedback_revealed {
            SessionPhase::ReviewingFeedback
        } else {
            SessionPhase::InProgress
        }
    }

    #[must_use]
    pub fn player(&self) -> Option<&str> {
        self.player.as_deref()
    }

    #[must_use]
    pub fn category(&self) -> Option<QuizCategory> {
        self.category
    }

    /// Questions of the active category, in catalog order.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The question on screen, if the active category has any.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    /// Options the player has selected, in first-selected order.
    #[must_use]
    pub fn selected_options(&self) -> &[String] {
        &self.selected
    }

    #[must_use]
    pub fn feedback_revealed(&self) -> bool {
        self.feedback_revealed
    }

    /// Grade of the most recent commit. Only meaningful while
    /// [`feedback_revealed`](Self::feedback_revealed) is true.
    #[must_use]
    pub fn last_answer_correct(&self) -> bool {
        self.last_answer_correct
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn history(&self) -> &[AnsweredRecord] {
        &self.history
    }

    #[must_use]
    pub fn total_time_secs(&self) -> u32 {
        self.total_time_secs
    }

    #[must_use]
    pub fn question_started_at(&self) -> DateTime<Utc> {
        self.question_started_at
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Whether the question on screen already has a committed answer.
    #[must_use]
    pub fn is_current_answered(&self) -> bool {
        self.history
            .iter()
            .any(|record| record.question_index == self.current_index)
    }

    /// Names the player and moves to category selection.
    ///
    /// Ignored when a player is already set or the trimmed name is empty.
    pub fn set_player(&mut self, name: &str) -> Transition {
        if self.player.is_some() {
            return Transition::Ignored;
        }
        let name = name.trim();
        if name.is_empty() {
            return Transition::Ignored;
        }
        self.player = Some(name.to_owned());
        Transition::Applied
    }

    /// Starts a run over the questions of `category`.
    ///
    /// Resets every per-run accumulator and stamps `now` as the start of the
    /// first question. Ignored outside category selection.
    pub fn select_category(
        &mut self,
        catalog: &QuestionCatalog,
        category: QuizCategory,
        now: DateTime<Utc>,
    ) -> Transition {
        if self.phase() != SessionPhase::CategorySelection {
            return Transition::Ignored;
        }
        self.category = Some(category);
        self.questions = catalog.questions_in(category);
        self.reset_run();
        self.question_started_at = now;
        Transition::Applied
    }

    /// Toggles `option` in the current selection.
    ///
    /// Single-answer questions replace the selection; multi-select questions
    /// toggle membership, keeping first-selected order. Ignored while
    /// feedback is showing or when no question is on screen.
    pub fn toggle_option(&mut self, option: &str) -> Transition {
        if self.phase() != SessionPhase::InProgress {
            return Transition::Ignored;
        }
        let Some(kind) = self.current_question().map(Question::kind) else {
            return Transition::Ignored;
        };
        match kind {
            QuestionKind::Single => {
                self.selected.clear();
                self.selected.push(option.to_owned());
            }
            QuestionKind::Multi => {
                if let Some(position) = self.selected.iter().position(|held| held == option) {
                    self.selected.remove(position);
                } else {
                    self.selected.push(option.to_owned());
                }
            }
        }
        Transition::Applied
    }

    /// Grades the current selection and reveals feedback.
    ///
    /// On the first commit for this question the grade is recorded: a correct
    /// answer scores one point, the time since the question appeared is added
    /// to the total, and an [`AnsweredRecord`] is appended. A committed
    /// answer is final: committing again on a revisited question re-reveals
    /// feedback for the current selection but never rescores or rewrites
    /// history. Ignored with an empty selection or outside `InProgress`.
    pub fn commit_answer(&mut self, now: DateTime<Utc>) -> Transition {
        if self.phase() != SessionPhase::InProgress || self.selected.is_empty() {
            return Transition::Ignored;
        }
        let Some(question) = self.current_question().cloned() else {
            return Transition::Ignored;
        };
        let correct = evaluate(&question, &self.selected);
        self.last_answer_correct = correct;
        self.feedback_revealed = true;
        if !self.is_current_answered() {
            if correct {
                self.score = self.score.saturating_add(1);
            }
            let elapsed = elapsed_whole_secs(self.question_started_at, now);
            self.total_time_secs = self.total_time_secs.saturating_add(elapsed);
            self.history.push(AnsweredRecord::new(
                self.current_index,
                question.text(),
                self.selected.clone(),
                question.answer_key().clone(),
                correct,
                elapsed,
            ));
        }
        Transition::Applied
    }

    /// Leaves the feedback screen for the next question, or completes the
    /// run when the current question was the last one.
    ///
    /// Clears the selection, hides feedback and stamps `now` as the start of
    /// whatever comes next. Ignored unless feedback is showing.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Transition {
        if self.phase() != SessionPhase::ReviewingFeedback {
            return Transition::Ignored;
        }
        self.selected.clear();
        self.feedback_revealed = false;
        self.question_started_at = now;
        if self.current_index + 1 >= self.questions.len() {
            self.completed = true;
        } else {
            self.current_index += 1;
        }
        Transition::Applied
    }

    /// Steps back to the previous question for another look.
    ///
    /// Backward navigation is view-only: the selection is cleared but history
    /// and score stay exactly as they were. Ignored at the first question or
    /// outside `InProgress`.
    pub fn go_back(&mut self) -> Transition {
        if self.phase() != SessionPhase::InProgress || self.current_index == 0 {
            return Transition::Ignored;
        }
        self.current_index -= 1;
        self.selected.clear();
        Transition::Applied
    }

    /// Ends the run now, keeping whatever has been answered so far.
    ///
    /// Ignored outside `InProgress`.
    pub fn submit_early(&mut self) -> Transition {
        if self.phase() != SessionPhase::InProgress {
            return Transition::Ignored;
        }
        self.feedback_revealed = false;
        self.completed = true;
        Transition::Applied
    }

    /// Starts the same category over from the results screen.
    ///
    /// Keeps the player and the question list; zeroes everything else.
    /// Ignored outside `Completed`.
    pub fn restart(&mut self, now: DateTime<Utc>) -> Transition {
        if self.phase() != SessionPhase::Completed {
            return Transition::Ignored;
        }
        self.reset_run();
        self.question_started_at = now;
        Transition::Applied
    }

    /// Abandons the run and returns to category selection.
    ///
    /// The player name survives; the category, its questions and every
    /// accumulator do not. Ignored before a category was ever selected.
    pub fn go_home(&mut self) -> Transition {
        if !matches!(
            self.phase(),
            SessionPhase::InProgress | SessionPhase::ReviewingFeedback | SessionPhase::Completed
        ) {
            return Transition::Ignored;
        }
        self.category = None;
        self.questions.clear();
        self.reset_run();
        Transition::Applied
    }

    fn reset_run(&mut self) {
        self.current_index = 0;
        self.selected.clear();
        self.feedback_revealed = false;
        self.last_answer_correct = false;
        self.score = 0;
        self.history.clear();
        self.total_time_secs = 0;
        self.completed = false;
    }
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
