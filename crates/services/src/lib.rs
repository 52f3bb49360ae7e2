#![forbid(unsafe_code)]

pub mod error;
pub mod quiz_flow;

pub use quiz_core::Clock;

pub use error::FlowError;
pub use quiz_flow::QuizFlow;
