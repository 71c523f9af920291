pub mod config;
pub mod driver;
pub mod metrics;
pub mod report;
