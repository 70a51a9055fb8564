pub mod aggregate;
pub mod config;
pub mod control;
pub mod output;
pub mod phase;
pub mod pool;
pub mod worker;

/// Name this client reports in every `MetricsRecord`.
pub const LIBRARY: &str = "reqwest";

pub const LANGUAGE: &str = "rust";
