//! The tagging and filing pipeline.
//!
//! Documents enter in `summarized` status with their text already
//! extracted upstream. The pipeline pulls metadata out of the text
//! ([`tagging`]), decides where the file belongs and moves it there
//! ([`filing`]), and drives the whole batch ([`orchestrator`]).

pub mod filing;
pub mod orchestrator;
pub mod tagging;

pub use orchestrator::{BatchOutcome, TaggerError, TaggerOrchestrator};
