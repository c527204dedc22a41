pub mod augment;
pub mod classifier;
pub mod orchestrator;
pub mod scheduler;
pub mod staging;
