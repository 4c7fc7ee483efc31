use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use vrppd::config::constant::MAX_CONSTRUCTION_ROUNDS;
use vrppd::config::AlgorithmConfig;
use vrppd::distance::TravelTimeMatrix;
use vrppd::domain::{Courier, Delivery, ProblemInstance, RouteLimits, Solution, Stop};
use vrppd::evaluation::feasibility::{check_feasibility, is_feasible};
use vrppd::solver::grasp::{optimize, random_greedy_courier_heuristic};
use vrppd::solver::rerouting::{apply_rerouting, stack_courier_deliveries, BracketCache};
use vrppd::utils::Stopwatch;
use vrppd::SolverError;

fn grid_matrix(n: usize) -> TravelTimeMatrix {
    let rows = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| (i as f64 - j as f64).abs() * 3.0 + if i == j { 0.0 } else { 1.0 })
                .collect()
        })
        .collect();
    TravelTimeMatrix::new(rows).unwrap()
}

fn delivery(capacity: u32, release_time: f64, pickup: usize, dropoff: usize) -> Delivery {
    Delivery::new(capacity, release_time, pickup, dropoff)
}

#[test]
fn two_couriers_serve_three_disjoint_deliveries() {
    let deliveries = vec![
        delivery(2, 0.0, 2, 3),
        delivery(3, 0.0, 4, 5),
        delivery(1, 0.0, 6, 7),
    ];
    let couriers = vec![Courier::new(10, 0), Courier::new(8, 1)];
    let pi = ProblemInstance::new("two-couriers", deliveries, couriers, grid_matrix(8)).unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut sol = Solution::new(2, 3, RouteLimits::default());
    let outcome = random_greedy_courier_heuristic(&pi, &mut sol, &mut rng);

    assert!(sol.is_feasible);
    assert_eq!(outcome.assigned, 3);
    assert_eq!(sol.assigned_deliveries(), 3);
    assert!(is_feasible(&pi, &sol));
}

#[test]
fn oversized_deliveries_are_never_assigned() {
    let deliveries = vec![delivery(2, 0.0, 1, 2), delivery(2, 0.0, 2, 3)];
    let couriers = vec![Courier::new(1, 0)];
    let pi = ProblemInstance::new("too-small", deliveries, couriers, grid_matrix(4)).unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut sol = Solution::new(1, 2, RouteLimits::default());
    let outcome = random_greedy_courier_heuristic(&pi, &mut sol, &mut rng);

    assert!(!sol.is_feasible);
    assert_eq!(outcome.rounds, MAX_CONSTRUCTION_ROUNDS);
    assert_eq!(outcome.assigned, 0);
    assert!(sol.assigned_courier.iter().all(Option::is_none));
    assert_eq!(sol.total_delivery_time, f64::INFINITY);
    assert_eq!(sol.objective(), f64::INFINITY);
}

#[test]
fn delivery_past_the_bound_is_never_assigned() {
    // Released at 500, after every courier's completion bound.
    let deliveries = vec![delivery(1, 0.0, 1, 2), delivery(1, 500.0, 2, 3)];
    let couriers = vec![Courier::new(4, 0), Courier::new(4, 3)];
    let pi = ProblemInstance::new("late", deliveries, couriers, grid_matrix(4)).unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut sol = Solution::new(2, 2, RouteLimits::default());
    let outcome = random_greedy_courier_heuristic(&pi, &mut sol, &mut rng);

    assert!(!sol.is_feasible);
    assert_eq!(outcome.rounds, MAX_CONSTRUCTION_ROUNDS);
    assert_eq!(sol.assigned_courier[1], None);
    assert_eq!(sol.delivery_time[1], f64::INFINITY);
    assert!(!is_feasible(&pi, &sol));
}

fn four_delivery_instance() -> ProblemInstance {
    let deliveries = vec![
        delivery(1, 0.0, 1, 6),
        delivery(2, 4.0, 2, 5),
        delivery(1, 0.0, 4, 3),
        delivery(1, 12.0, 7, 0),
    ];
    let couriers = vec![Courier::new(4, 0)];
    ProblemInstance::new("four", deliveries, couriers, grid_matrix(8)).unwrap()
}

fn sequential_solution(pi: &ProblemInstance) -> Solution {
    let mut sol = Solution::new(1, pi.delivery_count(), RouteLimits::default());
    let route: Vec<Stop> = (0..pi.delivery_count())
        .flat_map(|d| [Stop::Pickup(d), Stop::Dropoff(d)])
        .collect();
    for d in 0..pi.delivery_count() {
        sol.assigned_courier[d] = Some(0);
    }
    sol.assigned_count[0] = pi.delivery_count();
    sol.total_delivery_time = 0.0;
    apply_rerouting(pi, &mut sol, 0, &route);
    sol.is_feasible = true;
    sol
}

/// Cost of a stop sequence, or `None` when it breaks capacity or the completion bound.
fn simulate(pi: &ProblemInstance, route: &[Stop], bound: f64) -> Option<f64> {
    let courier = &pi.couriers[0];
    let (mut at, mut time, mut load, mut total) = (courier.start, 0.0_f64, 0u32, 0.0);
    for stop in route {
        let d = &pi.deliveries[stop.delivery()];
        match stop {
            Stop::Pickup(_) => {
                load += d.capacity;
                if load > courier.capacity {
                    return None;
                }
                time = (time + pi.travel(at, d.pickup)).max(d.release_time);
                at = d.pickup;
            }
            Stop::Dropoff(_) => {
                load -= d.capacity;
                time += pi.travel(at, d.dropoff);
                if time > bound {
                    return None;
                }
                total += time;
                at = d.dropoff;
            }
        }
    }
    Some(total)
}

/// Every ordering where pickups follow `order` and dropoffs follow the same order.
fn brute_force_best(pi: &ProblemInstance, bound: f64) -> f64 {
    fn permutations(items: Vec<usize>) -> Vec<Vec<usize>> {
        if items.len() <= 1 {
            return vec![items];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.clone();
            let head = rest.remove(i);
            for mut tail in permutations(rest) {
                tail.insert(0, head);
                out.push(tail);
            }
        }
        out
    }

    let k = pi.delivery_count();
    let mut best = f64::INFINITY;
    for order in permutations((0..k).collect()) {
        for mask in 0u32..(1 << (2 * k)) {
            if mask.count_ones() as usize != k {
                continue;
            }
            let (mut opened, mut closed) = (0, 0);
            let mut route = Vec::with_capacity(2 * k);
            let mut valid = true;
            for bit in 0..2 * k {
                if mask & (1 << bit) != 0 {
                    route.push(Stop::Pickup(order[opened]));
                    opened += 1;
                } else {
                    if closed >= opened {
                        valid = false;
                        break;
                    }
                    route.push(Stop::Dropoff(order[closed]));
                    closed += 1;
                }
            }
            if valid {
                if let Some(cost) = simulate(pi, &route, bound) {
                    best = best.min(cost);
                }
            }
        }
    }
    best
}

#[test]
fn four_stop_courier_matches_brute_force() {
    let pi = four_delivery_instance();
    let mut sol = sequential_solution(&pi);
    let before = sol.courier_delivery_time[0];

    let outcome = stack_courier_deliveries(&pi, &mut sol, 0, &mut BracketCache::new()).unwrap();
    let expected = brute_force_best(&pi, sol.limits.max_delivery_time);

    assert_eq!(outcome.evaluated, 24 * 14);
    assert!((outcome.delivery_time - expected).abs() < 1e-9);
    assert!(outcome.delivery_time <= before);
    assert!((sol.total_delivery_time - expected).abs() < 1e-9);
    assert!(check_feasibility(&pi, &sol).is_feasible());
}

#[test]
fn resequencing_twice_changes_nothing() {
    let pi = four_delivery_instance();
    let mut sol = sequential_solution(&pi);
    let mut cache = BracketCache::new();

    stack_courier_deliveries(&pi, &mut sol, 0, &mut cache).unwrap();
    let once = sol.clone();
    let again = stack_courier_deliveries(&pi, &mut sol, 0, &mut cache).unwrap();

    assert_eq!(again.improvement(), 0.0);
    assert_eq!(sol.courier_delivery_time, once.courier_delivery_time);
    assert_eq!(sol.total_delivery_time, once.total_delivery_time);
    assert!(is_feasible(&pi, &sol));
}

#[test]
fn optimize_rejects_small_fleet() {
    let deliveries = (0..5).map(|d| delivery(1, 0.0, d % 3, 3)).collect();
    let couriers = vec![Courier::new(10, 0)];
    let pi = ProblemInstance::new("fleet", deliveries, couriers, grid_matrix(4)).unwrap();

    let config = AlgorithmConfig {
        iteration_limit: Some(1),
        ..AlgorithmConfig::default()
    };
    let err = optimize(&pi, &config, &Stopwatch::started(), &mut ChaCha8Rng::seed_from_u64(0))
        .unwrap_err();

    assert!(matches!(
        err,
        SolverError::InsufficientFleet {
            couriers: 1,
            deliveries: 5,
            max_stops: 4
        }
    ));
}

#[test]
fn optimize_reports_exhausted_runs() {
    let deliveries = vec![delivery(2, 0.0, 1, 2)];
    let couriers = vec![Courier::new(1, 0)];
    let pi = ProblemInstance::new("hopeless", deliveries, couriers, grid_matrix(3)).unwrap();

    let config = AlgorithmConfig {
        iteration_limit: Some(2),
        ..AlgorithmConfig::default()
    };
    let err = optimize(&pi, &config, &Stopwatch::started(), &mut ChaCha8Rng::seed_from_u64(0))
        .unwrap_err();

    assert!(matches!(err, SolverError::NoFeasibleSolution { attempts: 2 }));
}
