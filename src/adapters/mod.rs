//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod frame_csv_adapter;
#[cfg(feature = "chart")]
pub mod svg_chart_adapter;
#[cfg(feature = "yahoo")]
pub mod yahoo_adapter;
