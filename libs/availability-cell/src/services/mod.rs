pub mod availability;
pub mod generator;
