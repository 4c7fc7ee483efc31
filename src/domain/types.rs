use crate::config::constant::{MAX_DELIVERY_TIME, MAX_STOPS_PER_COURIER};
use crate::distance::TravelTimeMatrix;
use crate::error::SolverError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delivery {
    pub capacity: u32,
    /// Earliest instant the delivery can be picked up.
    pub release_time: f64,
    pub pickup: usize,
    pub dropoff: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Courier {
    pub capacity: u32,
    pub start: usize,
}

impl Delivery {
    pub fn new(capacity: u32, release_time: f64, pickup: usize, dropoff: usize) -> Self {
        Self {
            capacity,
            release_time,
            pickup,
            dropoff,
        }
    }
}

impl Courier {
    pub fn new(capacity: u32, start: usize) -> Self {
        Self { capacity, start }
    }
}

/// Per-solution bounds shared by construction, re-sequencing and validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteLimits {
    pub max_stops_per_courier: usize,
    /// Completion time no dropoff may exceed.
    pub max_delivery_time: f64,
}

impl Default for RouteLimits {
    fn default() -> Self {
        Self {
            max_stops_per_courier: MAX_STOPS_PER_COURIER,
            max_delivery_time: MAX_DELIVERY_TIME,
        }
    }
}

/// One event in a courier's routing plan. Deliveries are 0-based indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stop {
    Pickup(usize),
    Dropoff(usize),
}

impl Stop {
    pub fn delivery(self) -> usize {
        match self {
            Stop::Pickup(d) | Stop::Dropoff(d) => d,
        }
    }

    pub fn is_pickup(self) -> bool {
        matches!(self, Stop::Pickup(_))
    }

    /// Signed 1-based id: `+d` for a pickup, `-d` for a dropoff.
    pub fn signed_id(self) -> i64 {
        match self {
            Stop::Pickup(d) => d as i64 + 1,
            Stop::Dropoff(d) => -(d as i64 + 1),
        }
    }
}

/// Immutable per-run inputs. All indices are 0-based.
#[derive(Debug, Clone)]
pub struct ProblemInstance {
    pub name: String,
    pub deliveries: Vec<Delivery>,
    pub couriers: Vec<Courier>,
    pub travel_times: TravelTimeMatrix,
    /// For every location, all deliveries ordered by travel time to their pickup.
    pub nearest_deliveries: Vec<Vec<usize>>,
}

impl ProblemInstance {
    pub fn new(
        name: impl Into<String>,
        deliveries: Vec<Delivery>,
        couriers: Vec<Courier>,
        travel_times: TravelTimeMatrix,
    ) -> Result<Self, SolverError> {
        let location_count = travel_times.location_count();
        let check = |what: String, location: usize| {
            if location < location_count {
                Ok(())
            } else {
                Err(SolverError::InvalidInstance(format!(
                    "{} references location {} but only {} locations exist",
                    what,
                    location + 1,
                    location_count
                )))
            }
        };

        for (i, d) in deliveries.iter().enumerate() {
            check(format!("pickup of delivery {}", i + 1), d.pickup)?;
            check(format!("dropoff of delivery {}", i + 1), d.dropoff)?;
            if !d.release_time.is_finite() {
                return Err(SolverError::InvalidInstance(format!(
                    "release time of delivery {} is {}",
                    i + 1,
                    d.release_time
                )));
            }
        }
        for (i, c) in couriers.iter().enumerate() {
            check(format!("start of courier {}", i + 1), c.start)?;
        }

        let nearest_deliveries = rank_deliveries_by_pickup(&deliveries, &travel_times);

        Ok(Self {
            name: name.into(),
            deliveries,
            couriers,
            travel_times,
            nearest_deliveries,
        })
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries.len()
    }

    pub fn courier_count(&self) -> usize {
        self.couriers.len()
    }

    pub fn location_count(&self) -> usize {
        self.travel_times.location_count()
    }

    #[inline]
    pub fn travel(&self, from: usize, to: usize) -> f64 {
        self.travel_times.between(from, to)
    }
}

// Stable sort keeps ties in delivery order.
fn rank_deliveries_by_pickup(
    deliveries: &[Delivery],
    travel_times: &TravelTimeMatrix,
) -> Vec<Vec<usize>> {
    (0..travel_times.location_count())
        .map(|location| {
            let mut ranking: Vec<usize> = (0..deliveries.len()).collect();
            ranking.sort_by(|&a, &b| {
                travel_times
                    .between(location, deliveries[a].pickup)
                    .total_cmp(&travel_times.between(location, deliveries[b].pickup))
            });
            ranking
        })
        .collect()
}
