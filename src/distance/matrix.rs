use crate::error::SolverError;

/// Square matrix of travel durations between locations, indexed `[from][to]`.
/// Need not be symmetric.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelTimeMatrix {
    rows: Vec<Vec<f64>>,
}

impl TravelTimeMatrix {
    /// Create a travel-time matrix, rejecting non-square, negative or non-finite input.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, SolverError> {
        let n = rows.len();
        for (from, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(SolverError::InvalidInstance(format!(
                    "travel time row {} has {} entries, expected {}",
                    from + 1,
                    row.len(),
                    n
                )));
            }
            if let Some(to) = row.iter().position(|t| !t.is_finite() || *t < 0.0) {
                return Err(SolverError::InvalidInstance(format!(
                    "travel time from {} to {} is {}",
                    from + 1,
                    to + 1,
                    row[to]
                )));
            }
        }
        Ok(Self { rows })
    }

    pub fn location_count(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn between(&self, from: usize, to: usize) -> f64 {
        self.rows[from][to]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }
}
