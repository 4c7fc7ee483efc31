use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolverError {
    #[error(
        "{couriers} couriers with {max_stops} stops each cannot serve {deliveries} deliveries"
    )]
    InsufficientFleet {
        couriers: usize,
        deliveries: usize,
        max_stops: usize,
    },
    /// `courier` is `None` when the stop cap itself is too large for re-sequencing.
    #[error(
        "{}, re-sequencing supports at most {max}",
        stop_count_label(*courier, *stops)
    )]
    TooManyStops {
        courier: Option<usize>,
        stops: usize,
        max: usize,
    },
    #[error("invalid value '{value}' for solver config key '{key}'")]
    InvalidConfig { key: String, value: String },
    #[error("invalid instance: {0}")]
    InvalidInstance(String),
    #[error("missing {file} in instance folder {}", folder.display())]
    MissingInstanceFile {
        folder: PathBuf,
        file: &'static str,
    },
    #[error("routing plan of courier {courier} is not properly formatted: slot {slot} is empty")]
    MalformedRoute { courier: usize, slot: usize },
    #[error("no feasible solution found after {attempts} attempts")]
    NoFeasibleSolution { attempts: usize },
    #[error("solution is not feasible: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("failed to read solver config: {0}")]
    ConfigFile(#[from] dotenv::Error),
}

fn stop_count_label(courier: Option<usize>, stops: usize) -> String {
    match courier {
        Some(courier) => format!("courier {} holds {} deliveries", courier, stops),
        None => format!("couriers may hold {} deliveries", stops),
    }
}
