pub mod analyzer;
pub mod config;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod utils;

pub use pipeline::{DashboardReport, ForecastSection, PipelineRequest, run};
