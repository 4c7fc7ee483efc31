use crate::domain::types::{RouteLimits, Stop};

/// Mutable state of one construction attempt.
///
/// `routing_plan[c]` has `2 * max_stops_per_courier` slots; `None` marks an unused slot.
/// Every pickup of a delivery sits at an earlier slot than its dropoff.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub is_feasible: bool,
    pub limits: RouteLimits,
    /// Sum of all completion times; the objective.
    pub total_delivery_time: f64,
    pub routing_plan: Vec<Vec<Option<Stop>>>,
    pub assigned_count: Vec<usize>,
    /// Completion time of each delivery's dropoff, `+inf` until assigned.
    pub delivery_time: Vec<f64>,
    pub assigned_courier: Vec<Option<usize>>,
    pub courier_delivery_time: Vec<f64>,
    /// Onboard load after the route is replayed; kept by re-routing only.
    pub courier_load: Vec<i64>,
}

impl Solution {
    pub fn new(courier_count: usize, delivery_count: usize, limits: RouteLimits) -> Self {
        Self {
            is_feasible: false,
            limits,
            total_delivery_time: f64::INFINITY,
            routing_plan: vec![vec![None; 2 * limits.max_stops_per_courier]; courier_count],
            assigned_count: vec![0; courier_count],
            delivery_time: vec![f64::INFINITY; delivery_count],
            assigned_courier: vec![None; delivery_count],
            courier_delivery_time: vec![0.0; courier_count],
            courier_load: vec![0; courier_count],
        }
    }

    pub fn courier_count(&self) -> usize {
        self.routing_plan.len()
    }

    pub fn delivery_count(&self) -> usize {
        self.assigned_courier.len()
    }

    /// The occupied prefix of a courier's slots, `2 * assigned_count` long.
    pub fn route_slots(&self, courier: usize) -> &[Option<Stop>] {
        &self.routing_plan[courier][..2 * self.assigned_count[courier]]
    }

    /// Non-empty stops of a courier, in route order.
    pub fn stops(&self, courier: usize) -> impl Iterator<Item = Stop> + '_ {
        self.routing_plan[courier].iter().flatten().copied()
    }

    pub fn assigned_deliveries(&self) -> usize {
        self.assigned_courier.iter().filter(|c| c.is_some()).count()
    }

    /// Total delivery time, or `+inf` for a failed attempt.
    pub fn objective(&self) -> f64 {
        if self.is_feasible {
            self.total_delivery_time
        } else {
            f64::INFINITY
        }
    }
}
