//! Core data types for network test datasets.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The configuration under which one dataset was captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestConfiguration {
    /// Interface MTU in bytes (e.g. 1500, 9001).
    pub mtu: u32,
    /// Whether AWS query logging was enabled during the capture.
    pub logging_enabled: bool,
    /// Backend DNS server implementation ("coredns" or "stock").
    pub backend_server: String,
    /// Test date, `YYYY-MM-DD HH:MM:SS` local time.
    pub test_date: String,
}

/// A discovered dataset: one directory of captured test output.
///
/// Created during discovery with `results: None`; the loader attaches parsed
/// results. Immutable once loaded, never persisted.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Directory name, unique within a sweep.
    pub name: String,
    pub configuration: TestConfiguration,
    /// Parameters file inside the dataset directory, if present.
    pub parameters_file: Option<PathBuf>,
    /// Results file inside the dataset directory, if present.
    pub results_file: Option<PathBuf>,
    /// Parsed test results, attached by the loader.
    pub results: Option<Arc<TestResults>>,
}

impl Dataset {
    /// Iperf records for this dataset, empty if results were never loaded.
    pub fn iperf_tests(&self) -> &[IperfTestRecord] {
        self.results.as_deref().map(|r| r.iperf_tests.as_slice()).unwrap_or(&[])
    }

    /// DNS records for this dataset, empty if results were never loaded.
    pub fn dns_tests(&self) -> &[DnsTestRecord] {
        self.results.as_deref().map(|r| r.dns_tests.as_slice()).unwrap_or(&[])
    }
}

/// A single iperf test run as recorded in the results file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IperfTestRecord {
    pub server: String,
    /// Free-text scenario tag, used to classify TCP vs UDP tests.
    pub scenario: String,
    pub success: bool,
    #[serde(default)]
    pub bandwidth_mbps: Option<f64>,
    #[serde(default)]
    pub jitter_ms: Option<f64>,
    /// UDP packet loss as a fraction (0.01 = 1%).
    #[serde(default)]
    pub packet_loss: Option<f64>,
    #[serde(default)]
    pub retransmits: Option<u64>,
    #[serde(default)]
    pub tcp_mss_default: Option<u64>,
    #[serde(default)]
    pub cpu_utilization_host: Option<f64>,
    #[serde(default)]
    pub cpu_utilization_remote: Option<f64>,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Traffic class of an iperf scenario, derived from its free-text label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    /// TCP bandwidth measurement.
    Tcp,
    /// UDP jitter/loss measurement.
    Udp,
    /// Label matched neither class; excluded from both aggregates.
    Other,
}

impl ScenarioKind {
    /// Classify a scenario label. UDP wins over TCP when both appear, since
    /// UDP scenario names in the capture tooling embed the transport last
    /// ("tcp-fallback-udp" is a UDP run).
    pub fn classify(label: &str) -> Self {
        let lower = label.to_ascii_lowercase();
        if lower.contains("udp") {
            ScenarioKind::Udp
        } else if lower.contains("tcp") {
            ScenarioKind::Tcp
        } else {
            ScenarioKind::Other
        }
    }
}

impl IperfTestRecord {
    pub fn scenario_kind(&self) -> ScenarioKind {
        ScenarioKind::classify(&self.scenario)
    }
}

/// A single DNS resolution attempt as recorded in the results file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsTestRecord {
    pub domain: String,
    pub dns_server: String,
    pub success: bool,
    #[serde(default)]
    pub response_time_ms: Option<f64>,
    #[serde(default)]
    pub query_time_ms: Option<f64>,
    #[serde(default)]
    pub resolved_ips: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// All parsed records for one dataset. Empty vectors are valid: they mean
/// absence of data, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestResults {
    #[serde(default)]
    pub iperf_tests: Vec<IperfTestRecord>,
    #[serde(default)]
    pub dns_tests: Vec<DnsTestRecord>,
}

impl TestResults {
    pub fn is_empty(&self) -> bool {
        self.iperf_tests.is_empty() && self.dns_tests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_classification() {
        assert_eq!(ScenarioKind::classify("tcp_bandwidth_parallel"), ScenarioKind::Tcp);
        assert_eq!(ScenarioKind::classify("TCP-single-stream"), ScenarioKind::Tcp);
        assert_eq!(ScenarioKind::classify("udp_jitter"), ScenarioKind::Udp);
        assert_eq!(ScenarioKind::classify("UDP 100Mbit"), ScenarioKind::Udp);
        assert_eq!(ScenarioKind::classify("baseline"), ScenarioKind::Other);
    }

    #[test]
    fn test_record_deserializes_with_optional_fields_absent() {
        let json = r#"{"server": "10.0.0.1", "scenario": "tcp_bandwidth", "success": true}"#;
        let rec: IperfTestRecord = serde_json::from_str(json).unwrap();
        assert!(rec.success);
        assert_eq!(rec.bandwidth_mbps, None);
        assert_eq!(rec.scenario_kind(), ScenarioKind::Tcp);
    }

    #[test]
    fn test_record_rejects_wrong_field_type() {
        let json = r#"{"server": "10.0.0.1", "scenario": "tcp_bandwidth", "success": "yes"}"#;
        let rec: Result<IperfTestRecord, _> = serde_json::from_str(json);
        assert!(rec.is_err());
    }

    #[test]
    fn test_empty_results_are_valid() {
        let results: TestResults = serde_json::from_str("{}").unwrap();
        assert!(results.is_empty());
    }
}
