use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::types::RouteLimits;
use crate::error::SolverError;

pub mod constant {
    pub const TIME_LIMIT_SECS: u64 = 60;
    pub const MAX_STOPS_PER_COURIER: usize = 4;
    pub const MAX_DELIVERY_TIME: f64 = 180.0;
    pub const MAX_CONSTRUCTION_ROUNDS: usize = 10_000;
    pub const TOTAL_TIME_TOLERANCE: f64 = 1e-6;
    /// `k! * Catalan(k)` candidates per courier stays at 336 for k = 4.
    pub const MAX_RESEQUENCE_STOPS: usize = 4;
}

/// Solver settings read from a `key=value` file.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmConfig {
    pub time_limit: Duration,
    pub log_output: bool,
    pub refine_routes: bool,
    pub seed: Option<u64>,
    pub iteration_limit: Option<usize>,
    pub limits: RouteLimits,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(constant::TIME_LIMIT_SECS),
            log_output: false,
            refine_routes: false,
            seed: None,
            iteration_limit: None,
            limits: RouteLimits::default(),
        }
    }
}

impl AlgorithmConfig {
    /// Reads the config file, falling back to defaults when it does not exist.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SolverError> {
        let path = path.as_ref();
        let mut config = Self::default();

        if !path.exists() {
            warn!(
                "Failed to open solver config at {}, using defaults",
                path.display()
            );
            return Ok(config);
        }

        #[allow(deprecated)]
        let entries = dotenv::from_path_iter(path)?;
        for entry in entries {
            let (key, value) = entry?;
            config.apply(&key, &value)?;
        }

        info!("Loaded solver config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Applies a single `key=value` pair.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), SolverError> {
        let value = value.trim();
        match key.trim() {
            "time_limit" => {
                let secs: f64 = parse_value(key, value)?;
                if !secs.is_finite() || secs < 0.0 {
                    return Err(SolverError::InvalidConfig {
                        key: key.to_string(),
                        value: value.to_string(),
                    });
                }
                self.time_limit = Duration::from_secs_f64(secs);
            }
            "log_output" => self.log_output = value == "true",
            "refine_routes" => self.refine_routes = value == "true",
            "seed" => self.seed = Some(parse_value(key, value)?),
            "iteration_limit" => self.iteration_limit = Some(parse_value(key, value)?),
            "max_stops_per_courier" => self.limits.max_stops_per_courier = parse_value(key, value)?,
            "max_delivery_time" => self.limits.max_delivery_time = parse_value(key, value)?,
            other => warn!("Ignoring unknown solver config key '{}'", other),
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, SolverError> {
    value.parse().map_err(|_| SolverError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
    })
}
