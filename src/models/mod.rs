pub mod audit;
pub mod document;
pub mod enums;

pub use audit::*;
pub use document::*;
pub use enums::*;
