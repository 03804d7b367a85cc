//! Statistical analysis of network test datasets.
//!
//! This module provides per-configuration metric aggregation, anomaly
//! detection, configuration ranking, and report generation.

pub mod anomaly;
pub mod metrics;
pub mod orchestrator;
pub mod ranking;
pub mod report;
pub mod stats;
pub mod types;

pub use anomaly::{AnomalyDetector, AnomalyThresholds};
pub use orchestrator::{run_analysis, AnalysisOptions};
pub use ranking::{analyze_logging_impact, analyze_mtu_impact, build_rankings, compare_configurations};
pub use report::{generate_json_report, generate_text_report, print_summary};
pub use types::*;
