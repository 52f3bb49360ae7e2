#![forbid(unsafe_code)]

//! Domain model for a single-player quiz session.
//!
//! Everything in this crate is synchronous and side-effect free: operations
//! take timestamps as arguments instead of reading a clock, and persistence
//! is expressed as a snapshot codec rather than as storage calls. Hosting
//! layers decide when to read the clock and where snapshots go.

pub mod evaluate;
pub mod model;
pub mod snapshot;
pub mod summary;
pub mod time;

pub use model::{
    AnswerKey, AnsweredRecord, CatalogError, Question, QuestionCatalog, QuestionError,
    QuestionKind, QuizCategory, QuizSession, SessionPhase, Transition,
};
pub use snapshot::{SESSION_KEY, SessionSnapshot, SnapshotError};
pub use summary::QuizSummary;
pub use time::Clock;
