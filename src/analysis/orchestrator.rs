//! Analysis orchestration: runs the four analysis channels concurrently over
//! one immutable dataset snapshot and assembles the final report.

use crate::dataset::Dataset;
use crate::error::{AnalyzerError, Result};

use super::anomaly::{AnomalyDetector, AnomalyThresholds};
use super::metrics;
use super::ranking;
use super::types::{
    AnalysisMetadata, AnalysisReport, BandwidthMetrics, ConfigurationComparison, CpuMetrics,
    DnsPerformanceMetrics, ExecutiveSummary, LatencyMetrics, PerformanceAnomaly,
    ReliabilityMetrics, Severity,
};

/// Knobs for one analysis pass.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub thresholds: AnomalyThresholds,
}

struct IperfMetrics {
    bandwidth: Vec<BandwidthMetrics>,
    latency: Vec<LatencyMetrics>,
    reliability: Vec<ReliabilityMetrics>,
    cpu: Vec<CpuMetrics>,
}

/// Run the full analysis over a loaded dataset snapshot.
///
/// The four channels (iperf metrics, DNS metrics, configuration comparison,
/// anomaly detection) execute concurrently; none of them mutates shared
/// state, so the snapshot is shared read-only. There is no cancellation: a
/// started channel runs to completion.
pub fn run_analysis(datasets: &[Dataset], options: &AnalysisOptions) -> Result<AnalysisReport> {
    if datasets.is_empty() {
        return Err(AnalyzerError::analysis(
            "orchestrator",
            None,
            "no datasets to analyze",
        ));
    }

    log::info!("Analyzing {} datasets", datasets.len());
    let detector = AnomalyDetector::new(options.thresholds.clone());

    let ((iperf, dns), (comparison, anomalies)) = rayon::join(
        || {
            rayon::join(
                || compute_iperf_metrics(datasets),
                || metrics::compute_dns_metrics(datasets),
            )
        },
        || {
            rayon::join(
                || ranking::compare_configurations(datasets),
                || detector.detect(datasets),
            )
        },
    );

    let metadata = AnalysisMetadata {
        analysis_timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        total_datasets: datasets.len(),
        total_iperf_records: datasets.iter().map(|d| d.iperf_tests().len()).sum(),
        total_dns_records: datasets.iter().map(|d| d.dns_tests().len()).sum(),
    };

    let summary = build_summary(&iperf, &dns, &comparison, &anomalies);

    Ok(AnalysisReport {
        metadata,
        bandwidth: iperf.bandwidth,
        latency: iperf.latency,
        reliability: iperf.reliability,
        cpu: iperf.cpu,
        dns,
        anomalies,
        comparison,
        summary,
    })
}

fn compute_iperf_metrics(datasets: &[Dataset]) -> IperfMetrics {
    IperfMetrics {
        bandwidth: metrics::compute_bandwidth_metrics(datasets),
        latency: metrics::compute_latency_metrics(datasets),
        reliability: metrics::compute_reliability_metrics(datasets),
        cpu: metrics::compute_cpu_metrics(datasets),
    }
}

fn build_summary(
    iperf: &IperfMetrics,
    dns: &[DnsPerformanceMetrics],
    comparison: &ConfigurationComparison,
    anomalies: &[PerformanceAnomaly],
) -> ExecutiveSummary {
    let mut key_findings = Vec::new();
    let mut highlights = Vec::new();

    let optimal_configuration = comparison
        .rankings
        .first()
        .map(|r| r.configuration.clone())
        .unwrap_or_default();

    if let Some(top) = comparison.rankings.first() {
        key_findings.push(format!(
            "Configuration '{}' ranks first with an overall score of {:.1}",
            top.configuration, top.overall_score
        ));
    }

    if let Some(best_bandwidth) = iperf
        .bandwidth
        .iter()
        .filter(|m| m.sample_count > 0)
        .max_by(|a, b| {
            a.mean_mbps
                .partial_cmp(&b.mean_mbps)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    {
        key_findings.push(format!(
            "Highest mean TCP bandwidth: {:.1} Mbps ('{}')",
            best_bandwidth.mean_mbps, best_bandwidth.configuration
        ));
    }

    if anomalies.is_empty() {
        key_findings.push("No anomalies detected".to_string());
    } else {
        let high = anomalies.iter().filter(|a| a.severity == Severity::High).count();
        let medium = anomalies.iter().filter(|a| a.severity == Severity::Medium).count();
        let low = anomalies.iter().filter(|a| a.severity == Severity::Low).count();
        key_findings.push(format!(
            "{} anomalies detected ({} high, {} medium, {} low)",
            anomalies.len(),
            high,
            medium,
            low
        ));
    }

    let logging = &comparison.logging_impact;
    if logging.performance_impact_pct != 0.0 {
        key_findings.push(format!(
            "Query logging bandwidth impact: {:.1}%",
            logging.performance_impact_pct
        ));
    }

    if let Some(optimal_mtu) = comparison.mtu_impact.optimal_mtu {
        highlights.push(format!("MTU {} delivered the best average bandwidth", optimal_mtu));
    }
    if let Some(best_jitter) = iperf
        .latency
        .iter()
        .filter(|m| m.sample_count > 0)
        .min_by(|a, b| {
            a.mean_jitter_ms
                .partial_cmp(&b.mean_jitter_ms)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    {
        highlights.push(format!(
            "Lowest jitter: {:.2} ms ('{}')",
            best_jitter.mean_jitter_ms, best_jitter.configuration
        ));
    }
    let mut slow_domains: Vec<&str> = dns
        .iter()
        .flat_map(|m| m.slow_domains.iter().map(String::as_str))
        .collect();
    slow_domains.sort_unstable();
    slow_domains.dedup();
    if !slow_domains.is_empty() {
        highlights.push(format!(
            "Slow DNS domains flagged: {}",
            slow_domains.join(", ")
        ));
    }

    // MTU and logging recommendations first, then anomaly remediations,
    // deduplicated while keeping first-seen order.
    let mut recommendations = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for rec in comparison
        .mtu_impact
        .recommendations
        .iter()
        .chain(comparison.logging_impact.recommendations.iter())
        .chain(anomalies.iter().flat_map(|a| a.recommendations.iter()))
    {
        if seen.insert(rec.as_str()) {
            recommendations.push(rec.clone());
        }
    }

    ExecutiveSummary {
        key_findings,
        recommendations,
        optimal_configuration,
        highlights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{IperfTestRecord, TestConfiguration, TestResults};
    use std::sync::Arc;

    fn dataset(name: &str, logging: bool, bandwidth: f64, jitter: f64) -> Dataset {
        let tcp = IperfTestRecord {
            server: "10.0.0.1".to_string(),
            scenario: "tcp_bandwidth".to_string(),
            success: true,
            bandwidth_mbps: Some(bandwidth),
            jitter_ms: None,
            packet_loss: None,
            retransmits: None,
            tcp_mss_default: None,
            cpu_utilization_host: None,
            cpu_utilization_remote: None,
            bytes: None,
            duration: None,
            error: None,
        };
        let udp = IperfTestRecord {
            scenario: "udp_jitter".to_string(),
            bandwidth_mbps: None,
            jitter_ms: Some(jitter),
            ..tcp.clone()
        };
        Dataset {
            name: name.to_string(),
            configuration: TestConfiguration {
                mtu: 1500,
                logging_enabled: logging,
                backend_server: "coredns".to_string(),
                test_date: "2025-03-18 12:03:01".to_string(),
            },
            parameters_file: None,
            results_file: None,
            results: Some(Arc::new(TestResults {
                iperf_tests: vec![tcp, udp],
                dns_tests: vec![],
            })),
        }
    }

    #[test]
    fn test_empty_snapshot_is_an_analysis_error() {
        let err = run_analysis(&[], &AnalysisOptions::default()).unwrap_err();
        assert!(matches!(err, AnalyzerError::Analysis { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_report_assembly() {
        let datasets = vec![
            dataset("on", true, 800.0, 1.0),
            dataset("off", false, 1000.0, 1.0),
        ];
        let report = run_analysis(&datasets, &AnalysisOptions::default()).unwrap();

        assert_eq!(report.metadata.total_datasets, 2);
        assert_eq!(report.metadata.total_iperf_records, 4);
        assert_eq!(report.bandwidth.len(), 2);
        assert_eq!(report.comparison.rankings.len(), 2);
        // 1000 Mbps at equal jitter and reliability wins.
        assert_eq!(report.summary.optimal_configuration, "off");
        assert!(report
            .summary
            .key_findings
            .iter()
            .any(|f| f.contains("Highest mean TCP bandwidth: 1000.0")));
        // Logging costs 20%: the summary carries the impact finding.
        assert!(report
            .summary
            .key_findings
            .iter()
            .any(|f| f.contains("Query logging bandwidth impact")));
    }

    #[test]
    fn test_summary_recommendations_are_deduplicated() {
        // Two configurations breaching the same channel share remediation
        // text; the summary lists it once.
        let datasets = vec![
            dataset("slow-1", false, 40.0, 1.0),
            dataset("slow-2", false, 42.0, 1.0),
        ];
        let report = run_analysis(&datasets, &AnalysisOptions::default()).unwrap();
        let mut sorted = report.summary.recommendations.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), report.summary.recommendations.len());
        assert!(!report.anomalies.is_empty());
    }
}
