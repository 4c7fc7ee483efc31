use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use dotenv::dotenv;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::constant::MAX_RESEQUENCE_STOPS;
use crate::config::AlgorithmConfig;
use crate::domain::solution::Solution;
use crate::domain::types::{ProblemInstance, RouteLimits};
use crate::error::SolverError;
use crate::evaluation::feasibility::check_feasibility;
use crate::fixtures::data_generator::generate_random_instance;
use crate::output::{write_routing_plan, SolutionLog};
use crate::setup::init::{load_instance_folder, setup};
use crate::solver::rerouting::{stack_all_courier_deliveries, ReroutingOutcome};
use crate::utils::Stopwatch;

use super::construction::random_greedy_courier_heuristic;

/// Best solution across construction attempts and what it took to find it.
#[derive(Debug, Clone)]
pub struct SearchState {
    pub best_so_far: Solution,
    pub best_so_far_attempt: usize,
    pub attempts: usize,
    pub feasible_attempts: usize,
    pub best_so_far_updates: SolutionLog,
}

impl SearchState {
    pub fn new(pi: &ProblemInstance, limits: RouteLimits) -> Self {
        Self {
            best_so_far: Solution::new(pi.courier_count(), pi.delivery_count(), limits),
            best_so_far_attempt: 0,
            attempts: 0,
            feasible_attempts: 0,
            best_so_far_updates: SolutionLog::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best: Solution,
    pub attempts: usize,
    pub feasible_attempts: usize,
    pub best_attempt: usize,
    pub log: SolutionLog,
    pub refinement: Vec<ReroutingOutcome>,
    pub elapsed: Duration,
}

/// Fails when the fleet cannot hold every delivery under the per-courier stop cap.
pub fn check_fleet(pi: &ProblemInstance, limits: &RouteLimits) -> Result<(), SolverError> {
    if pi.courier_count() * limits.max_stops_per_courier < pi.delivery_count() {
        return Err(SolverError::InsufficientFleet {
            couriers: pi.courier_count(),
            deliveries: pi.delivery_count(),
            max_stops: limits.max_stops_per_courier,
        });
    }
    Ok(())
}

/// Fails when refinement is enabled but couriers may hold more deliveries than
/// re-sequencing can enumerate.
pub fn check_refinement_limits(config: &AlgorithmConfig) -> Result<(), SolverError> {
    let max_stops = config.limits.max_stops_per_courier;
    if config.refine_routes && max_stops > MAX_RESEQUENCE_STOPS {
        return Err(SolverError::TooManyStops {
            courier: None,
            stops: max_stops,
            max: MAX_RESEQUENCE_STOPS,
        });
    }
    Ok(())
}

/// Build one fresh solution and keep it if it beats the best so far.
fn perform_iteration<R: Rng>(
    state: &mut SearchState,
    pi: &ProblemInstance,
    limits: RouteLimits,
    rng: &mut R,
) {
    state.attempts += 1;
    let attempt = state.attempts;

    let mut incumbent = Solution::new(pi.courier_count(), pi.delivery_count(), limits);
    let outcome = random_greedy_courier_heuristic(pi, &mut incumbent, rng);

    if incumbent.is_feasible {
        state.feasible_attempts += 1;
    } else {
        debug!(
            "Attempt {} exhausted after {} rounds ({}/{} deliveries assigned)",
            attempt,
            outcome.rounds,
            outcome.assigned,
            pi.delivery_count()
        );
    }

    if incumbent.total_delivery_time < state.best_so_far.total_delivery_time {
        info!(
            "New best at attempt {}: total delivery time = {:.2}",
            attempt, incumbent.total_delivery_time
        );
        state
            .best_so_far_updates
            .add_entry(attempt, incumbent.total_delivery_time);
        state.best_so_far = incumbent;
        state.best_so_far_attempt = attempt;
    }
}

/// Repeat randomised greedy construction until the time budget (or attempt limit) is used up,
/// optionally re-sequence every courier of the best solution, then validate it.
///
/// The budget is checked before each attempt; an attempt in progress always finishes.
pub fn optimize<R: Rng>(
    pi: &ProblemInstance,
    config: &AlgorithmConfig,
    stopwatch: &Stopwatch,
    rng: &mut R,
) -> Result<SearchOutcome, SolverError> {
    check_fleet(pi, &config.limits)?;
    check_refinement_limits(config)?;

    let mut state = SearchState::new(pi, config.limits);
    {
        let loop_span = span!(Level::INFO, "main_search_loop", time_limit = ?config.time_limit);
        let _loop_guard = loop_span.enter();

        loop {
            if stopwatch.elapsed() >= config.time_limit {
                break;
            }
            if config
                .iteration_limit
                .is_some_and(|limit| state.attempts >= limit)
            {
                break;
            }
            perform_iteration(&mut state, pi, config.limits, rng);
        }
    }
    report_final_stats(&state, stopwatch);

    let mut best = state.best_so_far;
    if !best.is_feasible {
        return Err(SolverError::NoFeasibleSolution {
            attempts: state.attempts,
        });
    }

    let refinement = if config.refine_routes {
        let span = span!(Level::INFO, "refinement");
        let _guard = span.enter();
        let before = best.total_delivery_time;
        let outcomes = stack_all_courier_deliveries(pi, &mut best)?;
        info!(
            "Re-sequencing {} couriers: {:.2} -> {:.2}",
            outcomes.iter().filter(|o| o.evaluated > 0).count(),
            before,
            best.total_delivery_time
        );
        outcomes
    } else {
        Vec::new()
    };

    let report = check_feasibility(pi, &best);
    if !report.is_feasible() {
        return Err(SolverError::Validation(report.violations));
    }

    Ok(SearchOutcome {
        best,
        attempts: state.attempts,
        feasible_attempts: state.feasible_attempts,
        best_attempt: state.best_so_far_attempt,
        log: state.best_so_far_updates,
        refinement,
        elapsed: stopwatch.elapsed(),
    })
}

fn report_final_stats(state: &SearchState, stopwatch: &Stopwatch) {
    info!(
        "Attempts: {} done in {:.2}s ({} feasible)",
        state.attempts,
        stopwatch.elapsed_seconds(),
        state.feasible_attempts
    );
    if state.best_so_far.is_feasible {
        info!(
            "Best solution found at attempt {}: {:.2}",
            state.best_so_far_attempt, state.best_so_far.total_delivery_time
        );
    } else {
        warn!("No feasible solution found");
    }
}

pub fn print_solution(pi: &ProblemInstance, sol: &Solution) {
    info!("Total delivery time: {:.2}", sol.total_delivery_time);
    for courier in 0..sol.courier_count() {
        let route: Vec<i64> = sol.stops(courier).map(|s| s.signed_id()).collect();
        debug!(
            "courier {} ({} / {} deliveries, {:.2}): {:?}",
            courier + 1,
            sol.assigned_count[courier],
            sol.limits.max_stops_per_courier,
            sol.courier_delivery_time[courier],
            route
        );
    }
    debug!("Instance '{}'", pi.name);
}

/// Where the instance comes from.
#[derive(Debug, Clone)]
pub enum InstanceSource {
    Folder(PathBuf),
    Random { deliveries: usize },
}

#[derive(Debug, Clone)]
pub struct RunArgs {
    pub instance: InstanceSource,
    pub solver_config: PathBuf,
    /// Written as `<output>.csv`, plus `<output>.log.csv` when `log_output` is set.
    pub output: PathBuf,
    pub seed: Option<u64>,
}

/// Initialize tracing and environment
fn init_tracing_and_env() {
    dotenv().ok();

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_span_events(fmt::format::FmtSpan::CLOSE))
        .try_init();
}

/// Seed the generator and run [`optimize`] on a loaded instance. The time budget starts here,
/// so reading and checking the instance does not count against it.
pub fn solve(pi: &ProblemInstance, config: &AlgorithmConfig) -> Result<SearchOutcome, SolverError> {
    let stopwatch = Stopwatch::started();
    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    optimize(pi, config, &stopwatch, &mut rng)
}

fn with_extension_suffix(path: &std::path::Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

pub fn run(args: RunArgs) -> Result<(ProblemInstance, SearchOutcome), Box<dyn Error>> {
    init_tracing_and_env();

    let mut config = AlgorithmConfig::from_path(&args.solver_config)?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let problem_instance = {
        let span = span!(Level::INFO, "setup");
        let _guard = span.enter();
        let data = match &args.instance {
            InstanceSource::Folder(folder) => load_instance_folder(folder)?,
            InstanceSource::Random { deliveries } => {
                let max_stops = config.limits.max_stops_per_courier.max(1);
                let couriers = deliveries.div_ceil(max_stops) + 1;
                generate_random_instance(
                    config.seed.unwrap_or(0),
                    deliveries + couriers,
                    couriers,
                    *deliveries,
                )
            }
        };
        setup(data)?
    };

    info!(
        "Starting VRPPD solver on '{}' with {} couriers, {} deliveries, time limit {:?}",
        problem_instance.name,
        problem_instance.courier_count(),
        problem_instance.delivery_count(),
        config.time_limit
    );

    let outcome = solve(&problem_instance, &config)?;
    print_solution(&problem_instance, &outcome.best);

    write_routing_plan(
        &problem_instance,
        &outcome.best,
        with_extension_suffix(&args.output, ".csv"),
    )?;
    if config.log_output {
        outcome
            .log
            .write(with_extension_suffix(&args.output, ".log.csv"))?;
    }

    Ok((problem_instance, outcome))
}
