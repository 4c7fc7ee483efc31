use tracing::{debug, warn};

use crate::config::constant::TOTAL_TIME_TOLERANCE;
use crate::domain::solution::Solution;
use crate::domain::types::{ProblemInstance, Stop};
use crate::evaluation::fitness::replay_route;

/// Violations found by [`check_feasibility`], in the order the checks run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeasibilityReport {
    pub violations: Vec<String>,
}

impl FeasibilityReport {
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }

    fn violation(&mut self, message: String) {
        warn!("{}", message);
        self.violations.push(message);
    }
}

pub fn is_feasible(pi: &ProblemInstance, sol: &Solution) -> bool {
    check_feasibility(pi, sol).is_feasible()
}

/// Re-derive every correctness property of a finished solution from the instance alone.
/// Public ids (1-based) are used in messages.
pub fn check_feasibility(pi: &ProblemInstance, sol: &Solution) -> FeasibilityReport {
    let mut report = FeasibilityReport::default();

    if !sol.is_feasible {
        report.violation("No feasible solution found".to_string());
        return report;
    }

    if sol.courier_count() != pi.courier_count() || sol.delivery_count() != pi.delivery_count() {
        report.violation(format!(
            "Solution covers {} couriers and {} deliveries, instance has {} and {}",
            sol.courier_count(),
            sol.delivery_count(),
            pi.courier_count(),
            pi.delivery_count()
        ));
        return report;
    }

    check_references(sol, &mut report);
    if !report.is_feasible() {
        return report;
    }

    check_assignment(sol, &mut report);
    check_precedence(sol, &mut report);
    check_reachable_completion_times(pi, sol, &mut report);
    check_completion_times(pi, sol, &mut report);
    check_capacities(pi, sol, &mut report);
    check_travel_times(pi, sol, &mut report);
    check_total_delivery_time(sol, &mut report);

    if report.is_feasible() {
        debug!("Solution passed all feasibility checks");
    } else {
        warn!("SOLUTION INFEASIBLE ({} violations)", report.violations.len());
    }
    report
}

/// Every courier and delivery index the solution mentions must exist.
fn check_references(sol: &Solution, report: &mut FeasibilityReport) {
    let courier_count = sol.courier_count();
    let delivery_count = sol.delivery_count();

    if sol.assigned_count.len() != courier_count || sol.delivery_time.len() != delivery_count {
        report.violation(format!(
            "Solution bookkeeping covers {} couriers and {} delivery times, expected {} and {}",
            sol.assigned_count.len(),
            sol.delivery_time.len(),
            courier_count,
            delivery_count
        ));
        return;
    }

    for (d, courier) in sol.assigned_courier.iter().enumerate() {
        if let Some(c) = *courier {
            if c >= courier_count {
                report.violation(format!(
                    "Delivery {} is assigned to unknown courier {}",
                    d + 1,
                    c + 1
                ));
            }
        }
    }

    for c in 0..courier_count {
        for stop in sol.stops(c) {
            if stop.delivery() >= delivery_count {
                report.violation(format!(
                    "Routing plan of courier {} refers to unknown delivery {}",
                    c + 1,
                    stop.delivery() + 1
                ));
            }
        }
    }
}

fn check_assignment(sol: &Solution, report: &mut FeasibilityReport) {
    for (d, courier) in sol.assigned_courier.iter().enumerate() {
        if courier.is_none() {
            report.violation(format!("Delivery {} is not assigned to any courier", d + 1));
        }
    }
}

fn check_precedence(sol: &Solution, report: &mut FeasibilityReport) {
    for (d, courier) in sol.assigned_courier.iter().enumerate() {
        let Some(c) = *courier else { continue };

        let mut is_picked_up = false;
        let mut is_delivered = false;
        for stop in sol.stops(c) {
            if stop == Stop::Pickup(d) {
                is_picked_up = true;
            } else if stop == Stop::Dropoff(d) {
                if !is_picked_up {
                    report.violation(format!(
                        "Delivery {} is delivered before being picked up by courier {}",
                        d + 1,
                        c + 1
                    ));
                }
                is_delivered = true;
            }
        }

        if !is_picked_up {
            report.violation(format!(
                "Delivery {} is not picked up by courier {}",
                d + 1,
                c + 1
            ));
        }
        if !is_delivered {
            report.violation(format!(
                "Delivery {} is not delivered by courier {}",
                d + 1,
                c + 1
            ));
        }
    }
}

/// A recorded completion time must not precede the earliest moment the courier gets there.
fn check_reachable_completion_times(
    pi: &ProblemInstance,
    sol: &Solution,
    report: &mut FeasibilityReport,
) {
    for c in 0..pi.courier_count() {
        let occupied = (2 * sol.assigned_count[c]).min(sol.routing_plan[c].len());
        let stops = sol.routing_plan[c][..occupied].iter().flatten().copied();

        for event in replay_route(pi, c, stops) {
            if let Stop::Dropoff(d) = event.stop {
                if event.time > sol.delivery_time[d] {
                    report.violation(format!(
                        "Delivery {} is recorded at {} but courier {} cannot deliver it before {}",
                        d + 1,
                        sol.delivery_time[d],
                        c + 1,
                        event.time
                    ));
                }
            }
        }
    }
}

fn check_completion_times(pi: &ProblemInstance, sol: &Solution, report: &mut FeasibilityReport) {
    for (d, courier) in sol.assigned_courier.iter().enumerate() {
        let Some(c) = *courier else { continue };

        let replayed = replay_route(pi, c, sol.stops(c))
            .into_iter()
            .find(|event| event.stop == Stop::Dropoff(d));

        if let Some(event) = replayed {
            if event.time != sol.delivery_time[d] {
                report.violation(format!(
                    "Time window of delivery {} is violated: recorded {}, computed {}",
                    d + 1,
                    sol.delivery_time[d],
                    event.time
                ));
            }
        }
    }
}

fn check_capacities(pi: &ProblemInstance, sol: &Solution, report: &mut FeasibilityReport) {
    for (c, courier) in pi.couriers.iter().enumerate() {
        let exceeded = replay_route(pi, c, sol.stops(c))
            .into_iter()
            .any(|event| event.load > courier.capacity as i64);

        if exceeded {
            report.violation(format!("Capacity of courier {} is exceeded", c + 1));
        }
    }
}

/// Second, independent traversal over every slot of every courier.
fn check_travel_times(pi: &ProblemInstance, sol: &Solution, report: &mut FeasibilityReport) {
    for c in 0..pi.courier_count() {
        let mut location = pi.couriers[c].start;
        let mut time = 0.0;

        for stop in sol.stops(c) {
            let delivery = &pi.deliveries[stop.delivery()];
            match stop {
                Stop::Pickup(_) => {
                    time += pi.travel(location, delivery.pickup);
                    if time < delivery.release_time {
                        time = delivery.release_time;
                    }
                    location = delivery.pickup;
                }
                Stop::Dropoff(d) => {
                    time += pi.travel(location, delivery.dropoff);
                    if time > sol.delivery_time[d] {
                        report.violation(format!(
                            "Delivery {} is delivered before courier {} can reach it",
                            d + 1,
                            c + 1
                        ));
                    }
                    location = delivery.dropoff;
                }
            }
        }
    }
}

fn check_total_delivery_time(sol: &Solution, report: &mut FeasibilityReport) {
    let total: f64 = sol.delivery_time.iter().sum();
    let diff = (total - sol.total_delivery_time).abs();

    if !(diff <= TOTAL_TIME_TOLERANCE) {
        report.violation(format!(
            "Total delivery time {} is not equal to sum of delivery times {}",
            sol.total_delivery_time, total
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::TravelTimeMatrix;
    use crate::domain::types::{Courier, Delivery, RouteLimits};

    fn instance() -> ProblemInstance {
        let rows = (0..4)
            .map(|i: i32| (0..4).map(|j: i32| (i - j).abs() as f64).collect())
            .collect();
        let deliveries = vec![Delivery::new(2, 0.0, 1, 2), Delivery::new(2, 5.0, 2, 3)];
        let couriers = vec![Courier::new(3, 0)];
        ProblemInstance::new("t", deliveries, couriers, TravelTimeMatrix::new(rows).unwrap())
            .unwrap()
    }

    // d0 done at 2; d1 picked at max(2, 5) = 5, done at 6
    fn valid_solution() -> Solution {
        let mut sol = Solution::new(1, 2, RouteLimits::default());
        sol.routing_plan[0][..4].copy_from_slice(&[
            Some(Stop::Pickup(0)),
            Some(Stop::Dropoff(0)),
            Some(Stop::Pickup(1)),
            Some(Stop::Dropoff(1)),
        ]);
        sol.assigned_count[0] = 2;
        sol.assigned_courier = vec![Some(0), Some(0)];
        sol.delivery_time = vec![2.0, 6.0];
        sol.courier_delivery_time[0] = 8.0;
        sol.total_delivery_time = 8.0;
        sol.is_feasible = true;
        sol
    }

    #[test]
    fn accepts_consistent_solution() {
        let report = check_feasibility(&instance(), &valid_solution());
        assert!(report.is_feasible(), "{:?}", report.violations);
    }

    #[test]
    fn short_circuits_on_infeasible_flag() {
        let mut sol = valid_solution();
        sol.is_feasible = false;
        let report = check_feasibility(&instance(), &sol);
        assert_eq!(report.violations, vec!["No feasible solution found".to_string()]);
    }

    #[test]
    fn reports_unassigned_delivery() {
        let mut sol = valid_solution();
        sol.assigned_courier[1] = None;
        let report = check_feasibility(&instance(), &sol);
        assert!(!report.is_feasible());
        assert_eq!(
            report.violations[0],
            "Delivery 2 is not assigned to any courier"
        );
    }

    #[test]
    fn reports_dropoff_before_pickup() {
        let mut sol = valid_solution();
        sol.routing_plan[0].swap(0, 1);
        let report = check_feasibility(&instance(), &sol);
        assert!(report
            .violations
            .iter()
            .any(|v| v.contains("delivered before being picked up")));
    }

    #[test]
    fn reports_too_early_completion_time() {
        let mut sol = valid_solution();
        sol.delivery_time[1] = 5.0;
        sol.total_delivery_time = 7.0;
        let report = check_feasibility(&instance(), &sol);
        assert!(report.violations.iter().any(|v| v.contains("cannot deliver it before")));
        assert!(report.violations.iter().any(|v| v.contains("Time window of delivery 2")));
        assert!(report.violations.iter().any(|v| v.contains("can reach it")));
    }

    #[test]
    fn late_recorded_time_is_only_a_mismatch() {
        let mut sol = valid_solution();
        sol.delivery_time[1] = 7.0;
        sol.total_delivery_time = 9.0;
        let report = check_feasibility(&instance(), &sol);
        assert_eq!(report.violations.len(), 1);
        assert!(report.violations[0].contains("Time window of delivery 2"));
    }

    #[test]
    fn reports_capacity_overflow() {
        let mut sol = valid_solution();
        sol.routing_plan[0][..4].copy_from_slice(&[
            Some(Stop::Pickup(0)),
            Some(Stop::Pickup(1)),
            Some(Stop::Dropoff(0)),
            Some(Stop::Dropoff(1)),
        ]);
        let report = check_feasibility(&instance(), &sol);
        assert!(report
            .violations
            .contains(&"Capacity of courier 1 is exceeded".to_string()));
    }

    #[test]
    fn reports_total_mismatch() {
        let mut sol = valid_solution();
        sol.total_delivery_time = 8.5;
        let report = check_feasibility(&instance(), &sol);
        assert_eq!(report.violations.len(), 1);
        assert!(report.violations[0].starts_with("Total delivery time"));
    }

    #[test]
    fn reports_unknown_courier_instead_of_panicking() {
        let mut sol = valid_solution();
        sol.assigned_courier[0] = Some(3);
        let report = check_feasibility(&instance(), &sol);
        assert_eq!(
            report.violations,
            vec!["Delivery 1 is assigned to unknown courier 4".to_string()]
        );
    }

    #[test]
    fn reports_unknown_delivery_instead_of_panicking() {
        let mut sol = valid_solution();
        sol.routing_plan[0][3] = Some(Stop::Dropoff(7));
        let report = check_feasibility(&instance(), &sol);
        assert_eq!(
            report.violations,
            vec!["Routing plan of courier 1 refers to unknown delivery 8".to_string()]
        );
    }

    #[test]
    fn reports_short_bookkeeping() {
        let mut sol = valid_solution();
        sol.delivery_time.pop();
        let report = check_feasibility(&instance(), &sol);
        assert_eq!(report.violations.len(), 1);
        assert!(report.violations[0].starts_with("Solution bookkeeping"));
    }
}
