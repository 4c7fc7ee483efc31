pub mod data_generator;

pub use data_generator::{generate_random_instance, write_instance_folder};
