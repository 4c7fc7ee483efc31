pub mod init;
pub mod init_types;

pub use init::{load_all_instances, load_instance_folder, setup};
pub use init_types::{CourierRecord, DeliveryRecord, InstanceData};
