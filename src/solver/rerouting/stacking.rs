use itertools::Itertools;
use tracing::{debug, trace};

use crate::config::constant::MAX_RESEQUENCE_STOPS;
use crate::domain::solution::Solution;
use crate::domain::types::{ProblemInstance, Stop};
use crate::error::SolverError;
use crate::evaluation::fitness::{replay_route, rerouted_delivery_time};

use super::brackets::{Bracket, BracketCache};

/// Result of re-sequencing one courier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReroutingOutcome {
    pub courier: usize,
    /// Number of (permutation, bracket sequence) candidates scored.
    pub evaluated: usize,
    pub previous_delivery_time: f64,
    pub delivery_time: f64,
}

impl ReroutingOutcome {
    pub fn improvement(&self) -> f64 {
        self.previous_delivery_time - self.delivery_time
    }
}

/// Build the stop sequence a bracket sequence describes for one delivery ordering.
pub fn route_from_brackets(permutation: &[usize], brackets: &[Bracket]) -> Vec<Stop> {
    brackets
        .iter()
        .map(|bracket| match *bracket {
            Bracket::Open(i) => Stop::Pickup(permutation[i]),
            Bracket::Close(i) => Stop::Dropoff(permutation[i]),
        })
        .collect()
}

/// Find the cheapest pickup/dropoff order for the deliveries `courier` already owns, by trying
/// every delivery permutation against every bracket sequence, and apply it.
///
/// Candidates are compared with `<=` against the best so far, so among equal-cost routes the last
/// one enumerated wins.
pub fn stack_courier_deliveries(
    pi: &ProblemInstance,
    sol: &mut Solution,
    courier: usize,
    cache: &mut BracketCache,
) -> Result<ReroutingOutcome, SolverError> {
    let stop_count = sol.assigned_count[courier];
    let previous = sol.courier_delivery_time[courier];
    let mut outcome = ReroutingOutcome {
        courier,
        evaluated: 0,
        previous_delivery_time: previous,
        delivery_time: previous,
    };

    if stop_count <= 1 {
        return Ok(outcome);
    }
    if stop_count > MAX_RESEQUENCE_STOPS {
        return Err(SolverError::TooManyStops {
            courier: Some(courier + 1),
            stops: stop_count,
            max: MAX_RESEQUENCE_STOPS,
        });
    }

    let mut best_route = Vec::with_capacity(2 * stop_count);
    let mut deliveries_in_route = Vec::with_capacity(stop_count);
    for (slot, stop) in sol.route_slots(courier).iter().enumerate() {
        match stop {
            None => {
                return Err(SolverError::MalformedRoute {
                    courier: courier + 1,
                    slot,
                })
            }
            Some(stop) => {
                if let Stop::Pickup(d) = stop {
                    deliveries_in_route.push(*d);
                }
                best_route.push(*stop);
            }
        }
    }

    let max_delivery_time = sol.limits.max_delivery_time;
    let mut best_route_delivery_time = previous;
    let sequences = cache.get(stop_count);

    for permutation in deliveries_in_route.iter().copied().permutations(stop_count) {
        for brackets in sequences {
            let candidate = route_from_brackets(&permutation, brackets);
            let candidate_time = rerouted_delivery_time(pi, courier, &candidate, max_delivery_time);
            outcome.evaluated += 1;

            if candidate_time <= best_route_delivery_time {
                trace!(
                    "courier {} candidate {:?} at {:.2}",
                    courier + 1,
                    candidate,
                    candidate_time
                );
                best_route = candidate;
                best_route_delivery_time = candidate_time;
            }
        }
    }

    apply_rerouting(pi, sol, courier, &best_route);
    outcome.delivery_time = sol.courier_delivery_time[courier];

    debug!(
        "Courier {} re-sequenced over {} candidates: {:.2} -> {:.2}",
        courier + 1,
        outcome.evaluated,
        outcome.previous_delivery_time,
        outcome.delivery_time
    );
    Ok(outcome)
}

/// Overwrite a courier's route and recompute its completion times, load and attributed time.
/// The total is adjusted by the courier's delta.
pub fn apply_rerouting(pi: &ProblemInstance, sol: &mut Solution, courier: usize, route: &[Stop]) {
    let slots = &mut sol.routing_plan[courier];
    slots.iter_mut().for_each(|slot| *slot = None);
    for (slot, stop) in slots.iter_mut().zip(route) {
        *slot = Some(*stop);
    }

    let previous = sol.courier_delivery_time[courier];
    let mut attributed = 0.0;
    let mut load = 0;

    for event in replay_route(pi, courier, route.iter().copied()) {
        if let Stop::Dropoff(d) = event.stop {
            sol.delivery_time[d] = event.time;
            attributed += event.time;
        }
        load = event.load;
    }

    sol.courier_load[courier] = load;
    sol.courier_delivery_time[courier] = attributed;
    sol.total_delivery_time = sol.total_delivery_time - previous + attributed;
}

/// Re-sequence every courier of the solution.
pub fn stack_all_courier_deliveries(
    pi: &ProblemInstance,
    sol: &mut Solution,
) -> Result<Vec<ReroutingOutcome>, SolverError> {
    let mut cache = BracketCache::new();
    (0..sol.courier_count())
        .map(|courier| stack_courier_deliveries(pi, sol, courier, &mut cache))
        .collect()
}
