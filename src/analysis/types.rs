//! Result types for the analysis engine: per-configuration metric
//! aggregates, detected anomalies, configuration rankings, and the assembled
//! report consumed by downstream renderers.

use serde::{Deserialize, Serialize};

/// TCP bandwidth statistics for one configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandwidthMetrics {
    pub configuration: String,
    pub mean_mbps: f64,
    pub median_mbps: f64,
    pub max_mbps: f64,
    pub min_mbps: f64,
    pub std_dev_mbps: f64,
    pub p95_mbps: f64,
    pub p99_mbps: f64,
    pub sample_count: usize,
}

/// Latency statistics for one configuration.
///
/// No direct RTT is captured; jitter from UDP scenarios is the latency
/// proxy, reported both as its own field and duplicated into `mean_latency_ms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyMetrics {
    pub configuration: String,
    pub mean_latency_ms: f64,
    pub mean_jitter_ms: f64,
    pub median_jitter_ms: f64,
    pub max_jitter_ms: f64,
    pub min_jitter_ms: f64,
    pub std_dev_ms: f64,
    pub sample_count: usize,
}

/// Reliability statistics for one configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityMetrics {
    pub configuration: String,
    /// Successes over all iperf records, success and failure alike.
    pub success_rate: f64,
    /// Mean of retransmits / approximate packet count over TCP records.
    pub retransmit_rate: f64,
    /// Mean of UDP packet-loss fractions.
    pub packet_loss_rate: f64,
    /// Records that are unsuccessful or carry an error string.
    pub error_count: usize,
    pub total_tests: usize,
}

/// CPU utilization statistics for one configuration. Zero readings are
/// treated as "not measured" and filtered before averaging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuMetrics {
    pub configuration: String,
    pub mean_host_pct: f64,
    pub max_host_pct: f64,
    pub mean_remote_pct: f64,
    pub max_remote_pct: f64,
}

/// DNS resolution statistics for one configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsPerformanceMetrics {
    pub configuration: String,
    pub mean_response_ms: f64,
    pub median_response_ms: f64,
    pub success_rate: f64,
    /// Domains whose mean response time exceeds the display threshold,
    /// used for report highlighting.
    pub slow_domains: Vec<String>,
    pub sample_count: usize,
}

/// Detection channel that produced an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    Bandwidth,
    Latency,
    PacketLoss,
    DnsFailure,
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AnomalyKind::Bandwidth => "bandwidth",
            AnomalyKind::Latency => "latency",
            AnomalyKind::PacketLoss => "packet_loss",
            AnomalyKind::DnsFailure => "dns_failure",
        };
        write!(f, "{}", s)
    }
}

/// How far past its threshold an observation landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Tier a breach by its threshold ratio (observed / threshold, or the
    /// inverse for below-minimum checks).
    ///
    /// Total over the three tiers: this is only called once a breach is
    /// established, so every anomaly carries exactly one severity. There is
    /// deliberately no "none" tier; downstream consumers assume one of the
    /// three values.
    pub fn from_ratio(ratio: f64) -> Self {
        let r = ratio.abs();
        if r >= 3.0 {
            Severity::High
        } else if r >= 2.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        write!(f, "{}", s)
    }
}

/// One detected deviation, attributed to a configuration or a group of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceAnomaly {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    /// Configuration name, a comma-joined group, or "All Configurations".
    pub configuration: String,
    pub description: String,
    pub severity: Severity,
    pub affected_metrics: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Composite score and rank for one configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationRanking {
    pub configuration: String,
    pub overall_score: f64,
    pub bandwidth_score: f64,
    pub latency_score: f64,
    pub reliability_score: f64,
    /// Dense rank, 1 = best. Ties keep input order.
    pub rank: usize,
}

/// Averages for one MTU group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MtuGroupStats {
    pub mtu: u32,
    pub avg_bandwidth_mbps: f64,
    pub avg_latency_ms: f64,
    pub avg_success_rate: f64,
    pub avg_cpu_pct: f64,
    pub dataset_count: usize,
}

/// MTU sweep comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MtuImpactAnalysis {
    pub groups: Vec<MtuGroupStats>,
    /// MTU with the highest average bandwidth, None when no data exists.
    pub optimal_mtu: Option<u32>,
    pub recommendations: Vec<String>,
}

/// Query-logging on/off comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingImpactAnalysis {
    /// Bandwidth cost of logging as a percentage of the disabled average.
    /// Positive means disabling improves throughput.
    pub performance_impact_pct: f64,
    pub bandwidth_difference_mbps: f64,
    /// Mean jitter with logging enabled minus disabled; positive means
    /// logging adds latency.
    pub latency_difference_ms: f64,
    pub avg_bandwidth_enabled_mbps: f64,
    pub avg_bandwidth_disabled_mbps: f64,
    pub recommendations: Vec<String>,
}

/// Configuration comparison: MTU impact, logging impact, overall ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationComparison {
    pub mtu_impact: MtuImpactAnalysis,
    pub logging_impact: LoggingImpactAnalysis,
    pub rankings: Vec<ConfigurationRanking>,
}

/// Textual executive summary for the report header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub key_findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub optimal_configuration: String,
    pub highlights: Vec<String>,
}

/// Report metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub analysis_timestamp: String,
    pub total_datasets: usize,
    pub total_iperf_records: usize,
    pub total_dns_records: usize,
}

/// Everything the analysis produced for one run, consumed by the downstream
/// report renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub metadata: AnalysisMetadata,
    pub bandwidth: Vec<BandwidthMetrics>,
    pub latency: Vec<LatencyMetrics>,
    pub reliability: Vec<ReliabilityMetrics>,
    pub cpu: Vec<CpuMetrics>,
    pub dns: Vec<DnsPerformanceMetrics>,
    pub anomalies: Vec<PerformanceAnomaly>,
    pub comparison: ConfigurationComparison,
    pub summary: ExecutiveSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_tiers_are_monotonic() {
        assert_eq!(Severity::from_ratio(1.6), Severity::Low);
        assert_eq!(Severity::from_ratio(2.2), Severity::Medium);
        assert_eq!(Severity::from_ratio(3.5), Severity::High);
        // Boundaries are inclusive.
        assert_eq!(Severity::from_ratio(2.0), Severity::Medium);
        assert_eq!(Severity::from_ratio(3.0), Severity::High);
        // Negative ratios tier by magnitude.
        assert_eq!(Severity::from_ratio(-2.5), Severity::Medium);
        assert_eq!(Severity::from_ratio(f64::INFINITY), Severity::High);
    }

    #[test]
    fn test_anomaly_kind_serializes_snake_case() {
        let json = serde_json::to_string(&AnomalyKind::DnsFailure).unwrap();
        assert_eq!(json, "\"dns_failure\"");
        let json = serde_json::to_string(&AnomalyKind::PacketLoss).unwrap();
        assert_eq!(json, "\"packet_loss\"");
    }
}
