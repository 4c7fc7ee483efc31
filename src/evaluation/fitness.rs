use crate::domain::types::{ProblemInstance, Stop};

/// Completion time of `delivery` when a courier at `location` at `time` goes straight to its
/// pickup, waits for the release time if needed, and drives on to the dropoff.
pub fn appended_delivery_time(
    pi: &ProblemInstance,
    location: usize,
    time: f64,
    delivery: usize,
) -> f64 {
    let d = &pi.deliveries[delivery];
    (time + pi.travel(location, d.pickup)).max(d.release_time) + pi.travel(d.pickup, d.dropoff)
}

/// Sum of completion times of `route` driven by `courier` from its start at time 0.
///
/// Returns `+inf` as soon as the onboard load exceeds the courier's capacity at a pickup or a
/// dropoff completes after `max_delivery_time`.
pub fn rerouted_delivery_time(
    pi: &ProblemInstance,
    courier: usize,
    route: &[Stop],
    max_delivery_time: f64,
) -> f64 {
    let capacity = pi.couriers[courier].capacity as i64;
    let mut location = pi.couriers[courier].start;
    let mut time = 0.0;
    let mut load = 0i64;
    let mut total = 0.0;

    for stop in route {
        match *stop {
            Stop::Pickup(d) => {
                let delivery = &pi.deliveries[d];
                load += delivery.capacity as i64;
                if load > capacity {
                    return f64::INFINITY;
                }
                time = (time + pi.travel(location, delivery.pickup)).max(delivery.release_time);
                location = delivery.pickup;
            }
            Stop::Dropoff(d) => {
                let delivery = &pi.deliveries[d];
                load -= delivery.capacity as i64;
                time += pi.travel(location, delivery.dropoff);
                if time > max_delivery_time {
                    return f64::INFINITY;
                }
                total += time;
                location = delivery.dropoff;
            }
        }
    }

    total
}

/// Clock time and onboard load right after a stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEvent {
    pub stop: Stop,
    pub time: f64,
    pub load: i64,
}

/// Drive `stops` with `courier` from its start at time 0 and record every event.
pub fn replay_route<I>(pi: &ProblemInstance, courier: usize, stops: I) -> Vec<RouteEvent>
where
    I: IntoIterator<Item = Stop>,
{
    let mut location = pi.couriers[courier].start;
    let mut time = 0.0;
    let mut load = 0i64;

    stops
        .into_iter()
        .map(|stop| {
            let delivery = &pi.deliveries[stop.delivery()];
            match stop {
                Stop::Pickup(_) => {
                    time = (time + pi.travel(location, delivery.pickup)).max(delivery.release_time);
                    location = delivery.pickup;
                    load += delivery.capacity as i64;
                }
                Stop::Dropoff(_) => {
                    time += pi.travel(location, delivery.dropoff);
                    location = delivery.dropoff;
                    load -= delivery.capacity as i64;
                }
            }
            RouteEvent { stop, time, load }
        })
        .collect()
}
