use std::path::Path;

use csv::WriterBuilder;
use tracing::info;

use crate::domain::solution::Solution;
use crate::domain::types::ProblemInstance;
use crate::error::SolverError;

/// One row per courier: its public id followed by its stops. Delivery ids are shifted by the
/// courier count so they never collide with courier ids; the sign marks pickup (+) or dropoff (-).
pub fn routing_plan_rows(pi: &ProblemInstance, sol: &Solution) -> Vec<Vec<i64>> {
    let offset = pi.courier_count() as i64;
    (0..sol.courier_count())
        .map(|courier| {
            std::iter::once(courier as i64 + 1)
                .chain(sol.stops(courier).map(|stop| {
                    let id = stop.signed_id();
                    id.signum() * (id.abs() + offset)
                }))
                .collect()
        })
        .collect()
}

pub fn write_routing_plan(
    pi: &ProblemInstance,
    sol: &Solution,
    path: impl AsRef<Path>,
) -> Result<(), SolverError> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new().flexible(true).from_path(path)?;

    wtr.write_record(["ID"])?;
    for row in routing_plan_rows(pi, sol) {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }

    wtr.flush()?;
    info!("Routing plan successfully saved to {}", path.display());
    Ok(())
}
