//! Per-configuration metric aggregation.
//!
//! Reduces each dataset's raw records into bandwidth, latency, reliability,
//! CPU, and DNS aggregates. Aggregates are recomputed fully on every analysis
//! pass; there is no incremental update path.

use crate::dataset::{Dataset, ScenarioKind};

use super::stats;
use super::types::{
    BandwidthMetrics, CpuMetrics, DnsPerformanceMetrics, LatencyMetrics, ReliabilityMetrics,
};

/// Display threshold for highlighting slow DNS domains in reports.
pub const SLOW_DOMAIN_THRESHOLD_MS: f64 = 150.0;

/// Fallback TCP MSS when a record does not report one.
pub const DEFAULT_TCP_MSS: f64 = 1460.0;

/// Bandwidth samples: successful TCP-scenario records reporting a rate.
pub(crate) fn tcp_bandwidth_samples(dataset: &Dataset) -> Vec<f64> {
    dataset
        .iperf_tests()
        .iter()
        .filter(|r| r.success && r.scenario_kind() == ScenarioKind::Tcp)
        .filter_map(|r| r.bandwidth_mbps)
        .collect()
}

/// Latency proxy samples: jitter from successful UDP-scenario records.
pub(crate) fn udp_jitter_samples(dataset: &Dataset) -> Vec<f64> {
    dataset
        .iperf_tests()
        .iter()
        .filter(|r| r.success && r.scenario_kind() == ScenarioKind::Udp)
        .filter_map(|r| r.jitter_ms)
        .collect()
}

/// Packet-loss fractions from UDP-scenario records.
pub(crate) fn udp_loss_samples(dataset: &Dataset) -> Vec<f64> {
    dataset
        .iperf_tests()
        .iter()
        .filter(|r| r.scenario_kind() == ScenarioKind::Udp)
        .filter_map(|r| r.packet_loss)
        .collect()
}

/// Per-record retransmit rates over TCP records: retransmits divided by the
/// approximate packet count, bytes / (tcp_mss_default or 1460). Records
/// without a byte count are excluded rather than treated as zero packets.
pub(crate) fn retransmit_rate_samples(dataset: &Dataset) -> Vec<f64> {
    dataset
        .iperf_tests()
        .iter()
        .filter(|r| r.scenario_kind() == ScenarioKind::Tcp)
        .filter_map(|r| {
            let retransmits = r.retransmits? as f64;
            let bytes = r.bytes? as f64;
            let mss = r.tcp_mss_default.map(|m| m as f64).unwrap_or(DEFAULT_TCP_MSS);
            let packets = bytes / mss;
            if packets > 0.0 {
                Some(retransmits / packets)
            } else {
                None
            }
        })
        .collect()
}

/// Success rate over all iperf records, success and failure alike.
pub(crate) fn iperf_success_rate(dataset: &Dataset) -> f64 {
    let records = dataset.iperf_tests();
    if records.is_empty() {
        return 0.0;
    }
    records.iter().filter(|r| r.success).count() as f64 / records.len() as f64
}

/// DNS response-time samples for a dataset.
pub(crate) fn dns_response_samples(dataset: &Dataset) -> Vec<f64> {
    dataset
        .dns_tests()
        .iter()
        .filter_map(|r| r.response_time_ms)
        .collect()
}

/// Compute TCP bandwidth statistics for every configuration.
pub fn compute_bandwidth_metrics(datasets: &[Dataset]) -> Vec<BandwidthMetrics> {
    datasets
        .iter()
        .map(|dataset| {
            let samples = tcp_bandwidth_samples(dataset);
            BandwidthMetrics {
                configuration: dataset.name.clone(),
                mean_mbps: stats::mean(&samples),
                median_mbps: stats::median(&samples),
                max_mbps: stats::max(&samples),
                min_mbps: stats::min(&samples),
                std_dev_mbps: stats::std_dev(&samples),
                p95_mbps: stats::percentile(&samples, 95.0),
                p99_mbps: stats::percentile(&samples, 99.0),
                sample_count: samples.len(),
            }
        })
        .collect()
}

/// Compute latency statistics for every configuration, using UDP jitter as
/// the latency proxy.
pub fn compute_latency_metrics(datasets: &[Dataset]) -> Vec<LatencyMetrics> {
    datasets
        .iter()
        .map(|dataset| {
            let samples = udp_jitter_samples(dataset);
            let mean_jitter = stats::mean(&samples);
            LatencyMetrics {
                configuration: dataset.name.clone(),
                mean_latency_ms: mean_jitter,
                mean_jitter_ms: mean_jitter,
                median_jitter_ms: stats::median(&samples),
                max_jitter_ms: stats::max(&samples),
                min_jitter_ms: stats::min(&samples),
                std_dev_ms: stats::std_dev(&samples),
                sample_count: samples.len(),
            }
        })
        .collect()
}

/// Compute reliability statistics for every configuration.
pub fn compute_reliability_metrics(datasets: &[Dataset]) -> Vec<ReliabilityMetrics> {
    datasets
        .iter()
        .map(|dataset| {
            let records = dataset.iperf_tests();
            let error_count = records
                .iter()
                .filter(|r| !r.success || r.error.is_some())
                .count();
            ReliabilityMetrics {
                configuration: dataset.name.clone(),
                success_rate: iperf_success_rate(dataset),
                retransmit_rate: stats::mean(&retransmit_rate_samples(dataset)),
                packet_loss_rate: stats::mean(&udp_loss_samples(dataset)),
                error_count,
                total_tests: records.len(),
            }
        })
        .collect()
}

/// Compute CPU utilization statistics for every configuration.
///
/// A record reporting exactly 0 is treated as "not measured", not as 0%
/// used, and filtered before averaging.
pub fn compute_cpu_metrics(datasets: &[Dataset]) -> Vec<CpuMetrics> {
    datasets
        .iter()
        .map(|dataset| {
            let host: Vec<f64> = dataset
                .iperf_tests()
                .iter()
                .filter_map(|r| r.cpu_utilization_host)
                .filter(|v| *v > 0.0)
                .collect();
            let remote: Vec<f64> = dataset
                .iperf_tests()
                .iter()
                .filter_map(|r| r.cpu_utilization_remote)
                .filter(|v| *v > 0.0)
                .collect();
            CpuMetrics {
                configuration: dataset.name.clone(),
                mean_host_pct: stats::mean(&host),
                max_host_pct: stats::max(&host),
                mean_remote_pct: stats::mean(&remote),
                max_remote_pct: stats::max(&remote),
            }
        })
        .collect()
}

/// Compute DNS performance statistics for every configuration.
pub fn compute_dns_metrics(datasets: &[Dataset]) -> Vec<DnsPerformanceMetrics> {
    datasets
        .iter()
        .map(|dataset| {
            let records = dataset.dns_tests();
            let samples = dns_response_samples(dataset);
            let success_rate = if records.is_empty() {
                0.0
            } else {
                records.iter().filter(|r| r.success).count() as f64 / records.len() as f64
            };

            // Per-domain means within this configuration, flagged when over
            // the display threshold.
            let mut by_domain: std::collections::BTreeMap<&str, Vec<f64>> =
                std::collections::BTreeMap::new();
            for record in records {
                if let Some(rt) = record.response_time_ms {
                    by_domain.entry(record.domain.as_str()).or_default().push(rt);
                }
            }
            let slow_domains: Vec<String> = by_domain
                .iter()
                .filter(|(_, times)| stats::mean(times) > SLOW_DOMAIN_THRESHOLD_MS)
                .map(|(domain, _)| domain.to_string())
                .collect();

            DnsPerformanceMetrics {
                configuration: dataset.name.clone(),
                mean_response_ms: stats::mean(&samples),
                median_response_ms: stats::median(&samples),
                success_rate,
                slow_domains,
                sample_count: samples.len(),
            }
        })
        .collect()
}
