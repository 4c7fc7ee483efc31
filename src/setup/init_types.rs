use serde::Deserialize;

/// Row of `couriers.csv`. Locations are 1-based.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CourierRecord {
    pub courier_id: usize,
    pub location: usize,
    pub capacity: u32,
}

/// Row of `deliveries.csv`. Locations are 1-based.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeliveryRecord {
    pub delivery_id: usize,
    pub capacity: u32,
    pub pickup_loc: usize,
    pub time_window_start: f64,
    pub pickup_stacking_id: i64,
    pub dropoff_loc: usize,
}

/// Raw contents of one instance folder, before id translation.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceData {
    pub name: String,
    pub couriers: Vec<CourierRecord>,
    pub deliveries: Vec<DeliveryRecord>,
    pub travel_time: Vec<Vec<f64>>,
}
