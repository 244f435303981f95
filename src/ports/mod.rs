//! Port traits implemented by adapters.

pub mod chart_port;
pub mod config_port;
pub mod data_port;
pub mod report_port;
