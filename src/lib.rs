pub mod config;
pub mod distance;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod fixtures;
pub mod output;
pub mod setup;
pub mod solver;
pub mod utils;

pub use error::SolverError;
