pub mod runner;
pub mod stats;
