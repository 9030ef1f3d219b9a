pub mod orchestrator;
pub mod records;
pub mod runner;
