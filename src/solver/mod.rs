pub mod grasp;
pub mod rerouting;
