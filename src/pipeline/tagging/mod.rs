//! Metadata extraction: dates, entities, tags, and the validation gate.
//!
//! Extractors are pure over their input text. They never fail: a document
//! that yields nothing produces empty collections, and validation decides
//! what survives.

pub mod dates;
pub mod entities;
pub mod tags;
pub mod validate;

pub use dates::DateExtractor;
pub use entities::EntityExtractor;
pub use tags::TagExtractor;
pub use validate::ValidationFilter;
