//! CLI library components for the customer lifetime value pipeline.

pub mod config;
pub mod logging;
pub mod pipeline;
pub mod types;
