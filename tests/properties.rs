use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use vrppd::config::constant::TOTAL_TIME_TOLERANCE;
use vrppd::domain::{ProblemInstance, RouteLimits, Solution, Stop};
use vrppd::evaluation::feasibility::check_feasibility;
use vrppd::fixtures::generate_random_instance;
use vrppd::setup::setup;
use vrppd::solver::grasp::random_greedy_courier_heuristic;
use vrppd::solver::rerouting::stack_all_courier_deliveries;

fn constructed(seed: u64, couriers: usize, deliveries: usize) -> (ProblemInstance, Solution) {
    let data = generate_random_instance(seed, deliveries + couriers + 1, couriers, deliveries);
    let pi = setup(data).unwrap();
    let mut sol = Solution::new(pi.courier_count(), pi.delivery_count(), RouteLimits::default());
    random_greedy_courier_heuristic(&pi, &mut sol, &mut ChaCha8Rng::seed_from_u64(seed));
    (pi, sol)
}

fn sum_of_delivery_times(sol: &Solution) -> f64 {
    sol.delivery_time.iter().sum()
}

fn pickups_precede_dropoffs(sol: &Solution) -> bool {
    (0..sol.courier_count()).all(|c| {
        let stops: Vec<Stop> = sol.stops(c).collect();
        stops.iter().enumerate().all(|(i, stop)| match stop {
            Stop::Pickup(_) => true,
            Stop::Dropoff(d) => stops[..i].contains(&Stop::Pickup(*d)),
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn feasible_construction_passes_validation(
        seed in any::<u64>(),
        couriers in 1usize..4,
        deliveries in 0usize..8,
    ) {
        prop_assume!(couriers * 4 >= deliveries);
        let (pi, sol) = constructed(seed, couriers, deliveries);
        prop_assume!(sol.is_feasible);

        let report = check_feasibility(&pi, &sol);
        prop_assert!(report.is_feasible(), "{:?}", report.violations);
        prop_assert!(pickups_precede_dropoffs(&sol));
        let drift = (sol.total_delivery_time - sum_of_delivery_times(&sol)).abs();
        prop_assert!(drift <= TOTAL_TIME_TOLERANCE);
    }

    #[test]
    fn resequencing_never_slows_a_courier(
        seed in any::<u64>(),
        couriers in 1usize..3,
        deliveries in 2usize..7,
    ) {
        prop_assume!(couriers * 4 >= deliveries);
        let (pi, mut sol) = constructed(seed, couriers, deliveries);
        prop_assume!(sol.is_feasible);

        let before = sol.courier_delivery_time.clone();
        let outcomes = stack_all_courier_deliveries(&pi, &mut sol).unwrap();

        for outcome in &outcomes {
            prop_assert!(outcome.delivery_time <= before[outcome.courier]);
            prop_assert!(outcome.improvement() >= 0.0);
        }
        prop_assert!(pickups_precede_dropoffs(&sol));
        let drift = (sol.total_delivery_time - sum_of_delivery_times(&sol)).abs();
        prop_assert!(drift <= TOTAL_TIME_TOLERANCE);
        let report = check_feasibility(&pi, &sol);
        prop_assert!(report.is_feasible(), "{:?}", report.violations);
    }
}
