pub mod feasibility;
pub mod fitness;

pub use feasibility::{is_feasible, FeasibilityReport};
pub use fitness::{appended_delivery_time, replay_route, rerouted_delivery_time, RouteEvent};
