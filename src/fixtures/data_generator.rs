use std::fs;
use std::path::Path;

use csv::Writer;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::error::SolverError;
use crate::setup::init_types::{CourierRecord, DeliveryRecord, InstanceData};

/// Generates a symmetric travel-time matrix with whole-number times in [1, 20]
fn generate_travel_times(rng: &mut ChaCha8Rng, location_count: usize) -> Vec<Vec<f64>> {
    let mut travel_time = vec![vec![0.0; location_count]; location_count];
    for i in 0..location_count {
        for j in (i + 1)..location_count {
            let t = rng.gen_range(1..=20) as f64;
            travel_time[i][j] = t;
            travel_time[j][i] = t;
        }
    }
    travel_time
}

/// Generate a random instance with 1-based locations, as it would be read from disk.
///
/// Couriers carry 4 to 10 units, deliveries 1 to 4 units with release times in [0, 30].
/// Pickup and dropoff of a delivery differ whenever there are at least two locations.
pub fn generate_random_instance(
    seed: u64,
    location_count: usize,
    courier_count: usize,
    delivery_count: usize,
) -> InstanceData {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let travel_time = generate_travel_times(&mut rng, location_count);

    let couriers = (1..=courier_count)
        .map(|courier_id| CourierRecord {
            courier_id,
            location: rng.gen_range(1..=location_count),
            capacity: rng.gen_range(4..=10),
        })
        .collect();

    let deliveries = (1..=delivery_count)
        .map(|delivery_id| {
            let pickup_loc = rng.gen_range(1..=location_count);
            let mut dropoff_loc = rng.gen_range(1..=location_count);
            while dropoff_loc == pickup_loc && location_count > 1 {
                dropoff_loc = rng.gen_range(1..=location_count);
            }
            DeliveryRecord {
                delivery_id,
                capacity: rng.gen_range(1..=4),
                pickup_loc,
                time_window_start: rng.gen_range(0..=30) as f64,
                pickup_stacking_id: delivery_id as i64,
                dropoff_loc,
            }
        })
        .collect();

    info!(
        "Generated instance with {} locations, {} couriers, {} deliveries (seed {})",
        location_count, courier_count, delivery_count, seed
    );

    InstanceData {
        name: format!("random-{}", seed),
        couriers,
        deliveries,
        travel_time,
    }
}

/// Write an instance in the folder layout `load_instance_folder` reads.
pub fn write_instance_folder(
    data: &InstanceData,
    folder: impl AsRef<Path>,
) -> Result<(), SolverError> {
    let folder = folder.as_ref();
    fs::create_dir_all(folder)?;

    let mut wtr = Writer::from_path(folder.join("couriers.csv"))?;
    wtr.write_record(["courier_id", "location", "capacity"])?;
    for c in &data.couriers {
        wtr.write_record([
            c.courier_id.to_string(),
            c.location.to_string(),
            c.capacity.to_string(),
        ])?;
    }
    wtr.flush()?;

    let mut wtr = Writer::from_path(folder.join("deliveries.csv"))?;
    wtr.write_record([
        "delivery_id",
        "capacity",
        "pickup_loc",
        "time_window_start",
        "pickup_stacking_id",
        "dropoff_loc",
    ])?;
    for d in &data.deliveries {
        wtr.write_record([
            d.delivery_id.to_string(),
            d.capacity.to_string(),
            d.pickup_loc.to_string(),
            d.time_window_start.to_string(),
            d.pickup_stacking_id.to_string(),
            d.dropoff_loc.to_string(),
        ])?;
    }
    wtr.flush()?;

    let mut wtr = Writer::from_path(folder.join("traveltimes.csv"))?;
    let header: Vec<String> = std::iter::once("location".to_string())
        .chain((1..=data.travel_time.len()).map(|l| l.to_string()))
        .collect();
    wtr.write_record(&header)?;
    for (i, row) in data.travel_time.iter().enumerate() {
        let record: Vec<String> = std::iter::once((i + 1).to_string())
            .chain(row.iter().map(|t| t.to_string()))
            .collect();
        wtr.write_record(&record)?;
    }
    wtr.flush()?;

    Ok(())
}
