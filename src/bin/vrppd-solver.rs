use std::path::PathBuf;

use clap::Parser;
use colored::*;

use vrppd::solver::grasp::search::{self, InstanceSource, RunArgs};

#[derive(Parser)]
#[clap(author, version, about = "Courier pickup-and-delivery route solver", long_about = None)]
struct Cli {
    /// Folder holding the couriers, deliveries and travel_time CSV files
    instance_dir: PathBuf,

    /// key=value solver configuration file
    solver_config: PathBuf,

    /// Output prefix; the routing plan is written to `<output_path>.csv`
    output_path: PathBuf,

    /// Ignore `instance_dir` and solve a generated instance with this many deliveries
    #[arg(long)]
    random: Option<usize>,

    /// Overrides the seed from the solver configuration
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let instance = match cli.random {
        Some(deliveries) => InstanceSource::Random { deliveries },
        None => InstanceSource::Folder(cli.instance_dir),
    };
    let (pi, outcome) = match search::run(RunArgs {
        instance,
        solver_config: cli.solver_config,
        output: cli.output_path,
        seed: cli.seed,
    }) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("{} {}", "Solver failed:".red().bold(), err);
            return Err(err);
        }
    };

    println!(
        "{} {} | {} {} | {} {}/{} feasible | {:.2}s",
        "Instance".bold(),
        pi.name.cyan(),
        "total delivery time".bold(),
        format!("{:.2}", outcome.best.total_delivery_time).green(),
        "attempts".bold(),
        outcome.feasible_attempts,
        outcome.attempts,
        outcome.elapsed.as_secs_f64()
    );
    Ok(())
}
