mod catalog;
mod question;
mod record;
mod session;

pub use catalog::{CatalogError, ParseCategoryError, QuestionCatalog, QuizCategory};
pub use question::{AnswerKey, ParseKindError, Question, QuestionError, QuestionKind};
pub use record::AnsweredRecord;
pub use session::{QuizSession, SessionPhase, Transition};
