pub mod plan;
pub mod solution_log;

pub use plan::{routing_plan_rows, write_routing_plan};
pub use solution_log::SolutionLog;
