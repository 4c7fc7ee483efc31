use rand::Rng;
use tracing::trace;

use crate::config::constant::MAX_CONSTRUCTION_ROUNDS;
use crate::domain::solution::Solution;
use crate::domain::types::{ProblemInstance, Stop};
use crate::evaluation::fitness::appended_delivery_time;

/// Where a courier is and when, while its route is being built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourierState {
    pub courier: usize,
    pub location: usize,
    pub time: f64,
}

impl CourierState {
    pub fn initial(pi: &ProblemInstance) -> Vec<CourierState> {
        pi.couriers
            .iter()
            .enumerate()
            .map(|(courier, c)| CourierState {
                courier,
                location: c.start,
                time: 0.0,
            })
            .collect()
    }
}

/// Append `delivery` (pickup then dropoff) to the end of `courier`'s route.
/// `cost` is the completion time the move would produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourierMove {
    pub courier: usize,
    pub delivery: usize,
    pub cost: f64,
}

/// Per-location cursor into the nearest-delivery ranking. Cursors only move forward within one
/// construction attempt, so candidates that were skipped once are never scanned again.
#[derive(Debug, Clone)]
pub struct GreedyDeliveryFinder {
    considered: Vec<usize>,
}

impl GreedyDeliveryFinder {
    pub fn new(pi: &ProblemInstance) -> Self {
        Self {
            considered: vec![0; pi.location_count()],
        }
    }

    pub fn cursor(&self, location: usize) -> usize {
        self.considered[location]
    }

    /// First delivery in the ranking of the courier's location that it can still take.
    pub fn greedy_delivery_of_courier(
        &mut self,
        pi: &ProblemInstance,
        sol: &Solution,
        state: &CourierState,
    ) -> Option<CourierMove> {
        let location = state.location;
        let delivery_count = pi.delivery_count();

        if sol.assigned_count[state.courier] >= sol.limits.max_stops_per_courier {
            self.considered[location] = delivery_count;
            return None;
        }

        let capacity = pi.couriers[state.courier].capacity;
        while self.considered[location] < delivery_count {
            let delivery = pi.nearest_deliveries[location][self.considered[location]];

            if sol.assigned_courier[delivery].is_some()
                || pi.deliveries[delivery].capacity > capacity
            {
                self.considered[location] += 1;
                continue;
            }

            let cost = appended_delivery_time(pi, location, state.time, delivery);
            if cost > sol.limits.max_delivery_time {
                self.considered[location] += 1;
                continue;
            }

            return Some(CourierMove {
                courier: state.courier,
                delivery,
                cost,
            });
        }

        None
    }
}

/// Deterministic half of a round: one proposal per courier, cheapest first.
pub fn propose_moves(
    finder: &mut GreedyDeliveryFinder,
    pi: &ProblemInstance,
    sol: &Solution,
    states: &[CourierState],
) -> Vec<CourierMove> {
    let mut moves: Vec<CourierMove> = states
        .iter()
        .filter_map(|state| finder.greedy_delivery_of_courier(pi, sol, state))
        .collect();
    moves.sort_by(|a, b| a.cost.total_cmp(&b.cost));
    moves
}

/// Randomised half of a round. `draws[c]` is courier `c`'s uniform draw for this round; a move is
/// taken when its delivery is still free and `draw^2 <= (assigned + 1) / delivery_count`.
/// Returns the number of deliveries assigned.
pub fn accept_moves(
    pi: &ProblemInstance,
    sol: &mut Solution,
    states: &mut [CourierState],
    moves: &[CourierMove],
    draws: &[f64],
    assigned: &mut usize,
) -> usize {
    let delivery_count = pi.delivery_count();
    let mut accepted = 0;

    for mv in moves {
        if *assigned == delivery_count {
            break;
        }
        let probability = draws[mv.courier] * draws[mv.courier];
        let threshold = (*assigned + 1) as f64 / delivery_count as f64;

        if probability <= threshold && sol.assigned_courier[mv.delivery].is_none() {
            apply_courier_move(pi, sol, &mut states[mv.courier], mv);
            *assigned += 1;
            accepted += 1;
        }
    }

    accepted
}

/// Append the move's pickup and dropoff and advance the courier to the dropoff.
pub fn apply_courier_move(
    pi: &ProblemInstance,
    sol: &mut Solution,
    state: &mut CourierState,
    mv: &CourierMove,
) {
    let delivery_time = appended_delivery_time(pi, state.location, state.time, mv.delivery);
    let slot = 2 * sol.assigned_count[mv.courier];

    state.location = pi.deliveries[mv.delivery].dropoff;
    state.time = delivery_time;

    sol.routing_plan[mv.courier][slot] = Some(Stop::Pickup(mv.delivery));
    sol.routing_plan[mv.courier][slot + 1] = Some(Stop::Dropoff(mv.delivery));
    sol.assigned_courier[mv.delivery] = Some(mv.courier);
    sol.assigned_count[mv.courier] += 1;
    sol.delivery_time[mv.delivery] = delivery_time;
    sol.courier_delivery_time[mv.courier] += delivery_time;
    sol.total_delivery_time += delivery_time;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructionOutcome {
    pub rounds: usize,
    pub assigned: usize,
}

/// Build one complete solution in randomised greedy rounds.
///
/// Gives up after [`MAX_CONSTRUCTION_ROUNDS`] rounds, leaving the solution infeasible with an
/// infinite objective.
pub fn random_greedy_courier_heuristic<R: Rng>(
    pi: &ProblemInstance,
    sol: &mut Solution,
    rng: &mut R,
) -> ConstructionOutcome {
    sol.total_delivery_time = 0.0;

    let delivery_count = pi.delivery_count();
    let mut finder = GreedyDeliveryFinder::new(pi);
    let mut states = CourierState::initial(pi);
    let mut assigned = 0;
    let mut rounds = 0;
    let mut draws = vec![0.0; pi.courier_count()];

    while assigned < delivery_count {
        if rounds == MAX_CONSTRUCTION_ROUNDS {
            sol.total_delivery_time = f64::INFINITY;
            sol.is_feasible = false;
            trace!(
                "Construction exhausted after {} rounds with {}/{} deliveries",
                rounds,
                assigned,
                delivery_count
            );
            return ConstructionOutcome { rounds, assigned };
        }
        rounds += 1;

        let moves = propose_moves(&mut finder, pi, sol, &states);
        draws.iter_mut().for_each(|draw| *draw = rng.gen::<f64>());
        let accepted = accept_moves(pi, sol, &mut states, &moves, &draws, &mut assigned);

        trace!(
            "round {}: {} proposals, {} accepted, {}/{} assigned",
            rounds,
            moves.len(),
            accepted,
            assigned,
            delivery_count
        );
    }

    sol.is_feasible = true;
    ConstructionOutcome { rounds, assigned }
}
