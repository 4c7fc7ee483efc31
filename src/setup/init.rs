use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::distance::TravelTimeMatrix;
use crate::domain::types::{Courier, Delivery, ProblemInstance};
use crate::error::SolverError;
use crate::setup::init_types::*;

const COURIERS_FILE: &str = "couriers.csv";
const DELIVERIES_FILE: &str = "deliveries.csv";
const TRAVEL_TIMES_FILE: &str = "traveltimes.csv";

/// Build the solver's view of an instance: 1-based file locations become 0-based indices and the
/// nearest-delivery rankings are derived.
pub fn setup(data: InstanceData) -> Result<ProblemInstance, SolverError> {
    info!(
        "Starting setup of instance '{}' with {} couriers, {} deliveries, {} locations",
        data.name,
        data.couriers.len(),
        data.deliveries.len(),
        data.travel_time.len()
    );

    let travel_times = TravelTimeMatrix::new(data.travel_time)?;
    print_dist_matrix(travel_times.rows());

    let deliveries = data
        .deliveries
        .iter()
        .map(|d| {
            Ok(Delivery {
                capacity: d.capacity,
                release_time: d.time_window_start,
                pickup: location_index(d.pickup_loc, "pickup", d.delivery_id)?,
                dropoff: location_index(d.dropoff_loc, "dropoff", d.delivery_id)?,
            })
        })
        .collect::<Result<Vec<_>, SolverError>>()?;

    let couriers = data
        .couriers
        .iter()
        .map(|c| {
            Ok(Courier {
                capacity: c.capacity,
                start: location_index(c.location, "start", c.courier_id)?,
            })
        })
        .collect::<Result<Vec<_>, SolverError>>()?;

    let problem_instance = ProblemInstance::new(data.name, deliveries, couriers, travel_times)?;

    info!("Setup completed successfully");
    Ok(problem_instance)
}

fn location_index(location: usize, what: &str, owner: usize) -> Result<usize, SolverError> {
    location.checked_sub(1).ok_or_else(|| {
        SolverError::InvalidInstance(format!("{} location of record {} is 0", what, owner))
    })
}

/// Read the three instance files from a folder. Files are matched by name suffix, so
/// `small_couriers.csv` is accepted too.
pub fn load_instance_folder(folder: impl AsRef<Path>) -> Result<InstanceData, SolverError> {
    let folder = folder.as_ref();
    let mut couriers_file = None;
    let mut deliveries_file = None;
    let mut travel_time_file = None;

    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        let Some(filename) = path.file_name().and_then(|f| f.to_str()) else {
            continue;
        };
        if filename.ends_with(COURIERS_FILE) {
            couriers_file = Some(path);
        } else if filename.ends_with(DELIVERIES_FILE) {
            deliveries_file = Some(path);
        } else if filename.ends_with(TRAVEL_TIMES_FILE) {
            travel_time_file = Some(path);
        }
    }

    let require = |file: Option<PathBuf>, name: &'static str| {
        file.ok_or_else(|| SolverError::MissingInstanceFile {
            folder: folder.to_path_buf(),
            file: name,
        })
    };
    let couriers_file = require(couriers_file, COURIERS_FILE)?;
    let deliveries_file = require(deliveries_file, DELIVERIES_FILE)?;
    let travel_time_file = require(travel_time_file, TRAVEL_TIMES_FILE)?;

    let name = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(InstanceData {
        name,
        couriers: read_records(&couriers_file)?,
        deliveries: read_records(&deliveries_file)?,
        travel_time: read_travel_times(&travel_time_file)?,
    })
}

/// Load every instance sub-folder of `parent`; folders that fail are logged and skipped.
pub fn load_all_instances(parent: impl AsRef<Path>) -> Result<Vec<InstanceData>, SolverError> {
    let mut all_instances = Vec::new();

    for entry in fs::read_dir(parent)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        match load_instance_folder(&path) {
            Ok(instance) => all_instances.push(instance),
            Err(err) => warn!("Skipping instance folder {}: {}", path.display(), err),
        }
    }

    all_instances.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(all_instances)
}

// Header row is skipped; fields are read by position.
fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SolverError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let record: StringRecord = row?;
        records.push(record.deserialize(None)?);
    }
    debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

// First column holds the location label and is dropped.
fn read_travel_times(path: &Path) -> Result<Vec<Vec<f64>>, SolverError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut travel_time = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let record = row?;
        let values = record
            .iter()
            .skip(1)
            .map(|field| {
                field.parse::<f64>().map_err(|_| {
                    SolverError::InvalidInstance(format!(
                        "travel time '{}' on row {} of {} is not a number",
                        field,
                        line + 1,
                        path.display()
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        travel_time.push(values);
    }
    Ok(travel_time)
}

// Print distance matrix for debugging
pub fn print_dist_matrix(dist_m: &[Vec<f64>]) {
    debug!("Distance matrix:");
    for row in dist_m {
        debug!("{:?}", row);
    }
}
