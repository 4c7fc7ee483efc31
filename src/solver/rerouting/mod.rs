pub mod brackets;
pub mod stacking;

pub use brackets::{catalan_combinations, Bracket, BracketCache};
pub use stacking::*;
