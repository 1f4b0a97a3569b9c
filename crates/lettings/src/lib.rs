pub mod config;
pub mod error;
pub mod occupancy;
pub mod telemetry;
