use std::path::Path;

use csv::Writer;

use crate::error::SolverError;

/// Objective of every new best solution, by construction attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolutionLog {
    entries: Vec<(usize, f64)>,
}

impl SolutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, attempt: usize, total_delivery_time: f64) {
        self.entries.push((attempt, total_delivery_time));
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), SolverError> {
        let mut wtr = Writer::from_path(path)?;

        wtr.write_record(["attempt", "new_best_so_far"])?;
        for (attempt, value) in &self.entries {
            wtr.write_record([attempt.to_string(), value.to_string()])?;
        }

        wtr.flush()?;
        Ok(())
    }
}
