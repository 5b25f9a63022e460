pub mod aggregate;
pub mod cli;
pub mod data;
pub mod defaults;
pub mod flatten;
pub mod loading;
pub mod reporting;
pub mod sample_data;
pub mod stats;
