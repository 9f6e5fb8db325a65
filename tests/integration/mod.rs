pub mod batch_integration;
pub mod cli;
pub mod pipeline_integration;
