//! Report generation for network test analysis.
//!
//! Emits the assembled report as JSON and as a human-readable text file.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};

use super::types::AnalysisReport;

/// Generate JSON report
pub fn generate_json_report(report: &AnalysisReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialize report to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

/// Generate human-readable text report
pub fn generate_text_report(report: &AnalysisReport, output_path: &Path) -> Result<()> {
    let mut lines: Vec<String> = Vec::new();

    // Header
    lines.push("=".repeat(80));
    lines.push("                    NETWORK PERFORMANCE ANALYSIS".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());

    // Metadata
    lines.push(format!("Analysis Date: {}", report.metadata.analysis_timestamp));
    lines.push(format!("Datasets Analyzed: {}", report.metadata.total_datasets));
    lines.push(format!("Iperf Records: {}", report.metadata.total_iperf_records));
    lines.push(format!("DNS Records: {}", report.metadata.total_dns_records));
    lines.push(String::new());

    // Executive summary
    lines.push("=".repeat(80));
    lines.push("                         EXECUTIVE SUMMARY".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());
    lines.push(format!(
        "Optimal Configuration: {}",
        report.summary.optimal_configuration
    ));
    lines.push(String::new());
    lines.push("Key Findings:".to_string());
    for finding in &report.summary.key_findings {
        lines.push(format!("  - {}", finding));
    }
    if !report.summary.highlights.is_empty() {
        lines.push(String::new());
        lines.push("Highlights:".to_string());
        for highlight in &report.summary.highlights {
            lines.push(format!("  - {}", highlight));
        }
    }
    lines.push(String::new());

    // Rankings
    lines.push("=".repeat(80));
    lines.push("                       CONFIGURATION RANKINGS".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());
    for ranking in &report.comparison.rankings {
        lines.push(format!(
            "  {}. {}: score {:.1} (bandwidth {:.1}, latency {:.1}, reliability {:.1})",
            ranking.rank,
            ranking.configuration,
            ranking.overall_score,
            ranking.bandwidth_score,
            ranking.latency_score,
            ranking.reliability_score
        ));
    }
    lines.push(String::new());

    // Per-configuration metrics
    lines.push("=".repeat(80));
    lines.push("                      PER-CONFIGURATION METRICS".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());
    for metrics in &report.bandwidth {
        lines.push(format!("{}:", metrics.configuration));
        lines.push(format!(
            "  TCP bandwidth: mean {:.1} Mbps, median {:.1}, p95 {:.1}, p99 {:.1} ({} samples)",
            metrics.mean_mbps,
            metrics.median_mbps,
            metrics.p95_mbps,
            metrics.p99_mbps,
            metrics.sample_count
        ));
        if let Some(latency) = report
            .latency
            .iter()
            .find(|l| l.configuration == metrics.configuration)
        {
            lines.push(format!(
                "  UDP jitter: mean {:.2} ms, median {:.2} ms ({} samples)",
                latency.mean_jitter_ms, latency.median_jitter_ms, latency.sample_count
            ));
        }
        if let Some(reliability) = report
            .reliability
            .iter()
            .find(|r| r.configuration == metrics.configuration)
        {
            lines.push(format!(
                "  Reliability: {:.1}% success, {:.2}% packet loss, {} errors of {} tests",
                reliability.success_rate * 100.0,
                reliability.packet_loss_rate * 100.0,
                reliability.error_count,
                reliability.total_tests
            ));
        }
        if let Some(dns) = report
            .dns
            .iter()
            .find(|d| d.configuration == metrics.configuration)
        {
            lines.push(format!(
                "  DNS: mean {:.1} ms, {:.1}% success ({} samples)",
                dns.mean_response_ms,
                dns.success_rate * 100.0,
                dns.sample_count
            ));
            if !dns.slow_domains.is_empty() {
                lines.push(format!("  Slow domains: {}", dns.slow_domains.join(", ")));
            }
        }
        lines.push(String::new());
    }

    // MTU and logging impact
    lines.push("=".repeat(80));
    lines.push("                       CONFIGURATION IMPACT".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());
    for group in &report.comparison.mtu_impact.groups {
        lines.push(format!(
            "  MTU {}: {:.1} Mbps, {:.2} ms jitter, {:.1}% success ({} datasets)",
            group.mtu,
            group.avg_bandwidth_mbps,
            group.avg_latency_ms,
            group.avg_success_rate * 100.0,
            group.dataset_count
        ));
    }
    let logging = &report.comparison.logging_impact;
    lines.push(format!(
        "  Query logging impact: {:.1}% ({:.1} Mbps difference)",
        logging.performance_impact_pct, logging.bandwidth_difference_mbps
    ));
    lines.push(String::new());

    // Anomalies
    if !report.anomalies.is_empty() {
        lines.push("=".repeat(80));
        lines.push("                            ANOMALIES".to_string());
        lines.push("=".repeat(80));
        lines.push(String::new());
        for anomaly in &report.anomalies {
            lines.push(format!(
                "  [{}] {} ({}): {}",
                anomaly.severity, anomaly.kind, anomaly.configuration, anomaly.description
            ));
            for rec in &anomaly.recommendations {
                lines.push(format!("      -> {}", rec));
            }
        }
        lines.push(String::new());
    }

    if !report.summary.recommendations.is_empty() {
        lines.push("RECOMMENDATIONS:".to_string());
        for rec in &report.summary.recommendations {
            lines.push(format!("  - {}", rec));
        }
        lines.push(String::new());
    }

    // Footer
    lines.push("=".repeat(80));

    let content = lines.join("\n");
    fs::write(output_path, content)
        .with_context(|| format!("Failed to write text report to {}", output_path.display()))?;

    log::info!("Text report written to {}", output_path.display());
    Ok(())
}

/// Print a summary to stdout
pub fn print_summary(report: &AnalysisReport) {
    println!("\n=== NETWORK PERFORMANCE ANALYSIS SUMMARY ===\n");
    println!("Datasets: {}", report.metadata.total_datasets);
    println!("Iperf records: {}", report.metadata.total_iperf_records);
    println!("DNS records: {}", report.metadata.total_dns_records);

    if !report.summary.optimal_configuration.is_empty() {
        println!("\nOptimal configuration: {}", report.summary.optimal_configuration);
    }

    for finding in &report.summary.key_findings {
        println!("  {}", finding);
    }

    if !report.anomalies.is_empty() {
        println!("\nAnomalies:");
        for anomaly in &report.anomalies {
            println!(
                "  [{}] {} ({})",
                anomaly.severity, anomaly.kind, anomaly.configuration
            );
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::*;

    fn minimal_report() -> AnalysisReport {
        AnalysisReport {
            metadata: AnalysisMetadata {
                analysis_timestamp: "2025-03-18 12:03:01".to_string(),
                total_datasets: 1,
                total_iperf_records: 2,
                total_dns_records: 1,
            },
            bandwidth: vec![BandwidthMetrics {
                configuration: "coredns-mtu1500-aws-logs_enabled".to_string(),
                mean_mbps: 940.0,
                median_mbps: 940.0,
                max_mbps: 950.0,
                min_mbps: 930.0,
                std_dev_mbps: 10.0,
                p95_mbps: 950.0,
                p99_mbps: 950.0,
                sample_count: 2,
            }],
            latency: vec![],
            reliability: vec![],
            cpu: vec![],
            dns: vec![],
            anomalies: vec![PerformanceAnomaly {
                kind: AnomalyKind::Bandwidth,
                configuration: "coredns-mtu1500-aws-logs_enabled".to_string(),
                description: "test anomaly".to_string(),
                severity: Severity::Low,
                affected_metrics: vec!["bandwidth_mbps".to_string()],
                recommendations: vec!["do less".to_string()],
            }],
            comparison: ConfigurationComparison {
                mtu_impact: MtuImpactAnalysis {
                    groups: vec![],
                    optimal_mtu: Some(1500),
                    recommendations: vec![],
                },
                logging_impact: LoggingImpactAnalysis {
                    performance_impact_pct: 0.0,
                    bandwidth_difference_mbps: 0.0,
                    latency_difference_ms: 0.0,
                    avg_bandwidth_enabled_mbps: 0.0,
                    avg_bandwidth_disabled_mbps: 0.0,
                    recommendations: vec![],
                },
                rankings: vec![ConfigurationRanking {
                    configuration: "coredns-mtu1500-aws-logs_enabled".to_string(),
                    overall_score: 489.8,
                    bandwidth_score: 940.0,
                    latency_score: 50.0,
                    reliability_score: 99.0,
                    rank: 1,
                }],
            },
            summary: ExecutiveSummary {
                key_findings: vec!["finding".to_string()],
                recommendations: vec!["do less".to_string()],
                optimal_configuration: "coredns-mtu1500-aws-logs_enabled".to_string(),
                highlights: vec![],
            },
        }
    }

    #[test]
    fn test_json_report_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        generate_json_report(&minimal_report(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: AnalysisReport = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.metadata.total_datasets, 1);
        assert_eq!(parsed.anomalies.len(), 1);
        // The closed kind enum serializes as its wire tag.
        assert!(content.contains("\"type\": \"bandwidth\""));
    }

    #[test]
    fn test_text_report_contains_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        generate_text_report(&minimal_report(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("EXECUTIVE SUMMARY"));
        assert!(content.contains("CONFIGURATION RANKINGS"));
        assert!(content.contains("ANOMALIES"));
        assert!(content.contains("[low] bandwidth"));
    }
}
