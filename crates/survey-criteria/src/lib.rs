pub mod config;
pub mod criteria;
pub mod error;
pub mod telemetry;
