pub mod construction;
pub mod search;

pub use construction::*;
pub use search::*;
