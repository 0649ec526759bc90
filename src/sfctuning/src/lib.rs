pub mod config;
pub mod demand;
pub mod report;
