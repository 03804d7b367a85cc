//! Anomaly detection over per-configuration aggregates.
//!
//! Four channels (bandwidth, latency, packet loss, DNS) each run an
//! absolute-threshold check and a relative-deviation check against the grand
//! mean; a fifth check scans per-domain DNS response times independently of
//! configuration grouping. Configurations with no samples for a channel are
//! skipped: absence of data is not a breach.

use std::collections::BTreeMap;

use crate::dataset::Dataset;

use super::metrics::{
    dns_response_samples, retransmit_rate_samples, tcp_bandwidth_samples, udp_jitter_samples,
    udp_loss_samples,
};
use super::stats;
use super::types::{AnomalyKind, PerformanceAnomaly, Severity};

/// Attribution label used when more than three configurations share a
/// domain-scoped anomaly.
pub const ALL_CONFIGURATIONS: &str = "All Configurations";

/// Absolute thresholds and relative-deviation fractions for all channels.
#[derive(Debug, Clone)]
pub struct AnomalyThresholds {
    pub min_bandwidth_mbps: f64,
    pub max_jitter_ms: f64,
    /// Packet loss as a fraction (0.01 = 1%).
    pub max_packet_loss: f64,
    pub max_retransmit_rate: f64,
    pub max_dns_response_ms: f64,
    pub min_dns_success_rate: f64,
    /// Relative deviation from the grand mean that flags a configuration.
    pub bandwidth_deviation: f64,
    pub latency_deviation: f64,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            min_bandwidth_mbps: 100.0,
            max_jitter_ms: 50.0,
            max_packet_loss: 0.01,
            max_retransmit_rate: 0.05,
            max_dns_response_ms: 100.0,
            min_dns_success_rate: 0.95,
            bandwidth_deviation: 0.25,
            latency_deviation: 0.30,
        }
    }
}

const LOW_BANDWIDTH_RECS: &[&str] = &[
    "Verify the interface MTU matches the path MTU to rule out fragmentation",
    "Check iperf server placement; cross-zone paths cap well below line rate",
    "Review the instance type's documented network bandwidth limit",
];

const BANDWIDTH_DEVIATION_RECS: &[&str] = &[
    "Re-run the sweep for this configuration to rule out transient congestion",
    "Compare kernel network settings against the other configurations",
];

const HIGH_JITTER_RECS: &[&str] = &[
    "Check for CPU contention on the test hosts during UDP runs",
    "Inspect queue discipline and buffer sizes on the path",
];

const LATENCY_DEVIATION_RECS: &[&str] = &[
    "Re-run UDP scenarios for this configuration at an off-peak time",
    "Verify the configuration was not sharing hosts with another sweep",
];

const PACKET_LOSS_RECS: &[&str] = &[
    "Reduce the UDP offered rate below the measured TCP bandwidth",
    "Check interface error counters on both endpoints",
];

const RETRANSMIT_RECS: &[&str] = &[
    "Capture a TCP trace to distinguish loss from reordering",
    "Lower the MTU to test for a path MTU black hole",
];

const SLOW_DNS_RECS: &[&str] = &[
    "Check resolver cache hit rates; cold caches inflate response times",
    "Verify the backend server has warm upstream connectivity",
];

const DNS_FAILURE_RECS: &[&str] = &[
    "Inspect resolver logs for SERVFAIL and timeout causes",
    "Confirm upstream nameservers were reachable during the capture",
];

const SLOW_DOMAIN_RECS: &[&str] = &[
    "Test the domain's authoritative servers directly to isolate upstream slowness",
    "Consider prefetching or extending cache TTLs for this domain",
];

fn recommendations(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Scans aggregates and raw per-domain samples for deviations.
pub struct AnomalyDetector {
    thresholds: AnomalyThresholds,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(AnomalyThresholds::default())
    }
}

impl AnomalyDetector {
    pub fn new(thresholds: AnomalyThresholds) -> Self {
        Self { thresholds }
    }

    /// Run every detection channel over the dataset snapshot.
    pub fn detect(&self, datasets: &[Dataset]) -> Vec<PerformanceAnomaly> {
        let mut anomalies = Vec::new();
        anomalies.extend(self.detect_bandwidth(datasets));
        anomalies.extend(self.detect_latency(datasets));
        anomalies.extend(self.detect_packet_loss(datasets));
        anomalies.extend(self.detect_dns(datasets));
        anomalies.extend(self.detect_slow_domains(datasets));
        log::info!("Anomaly detection flagged {} finding(s)", anomalies.len());
        anomalies
    }

    fn detect_bandwidth(&self, datasets: &[Dataset]) -> Vec<PerformanceAnomaly> {
        let mut anomalies = Vec::new();
        let mut all_samples: Vec<f64> = Vec::new();
        let mut per_config: Vec<(&str, f64)> = Vec::new();

        for dataset in datasets {
            let samples = tcp_bandwidth_samples(dataset);
            if samples.is_empty() {
                continue;
            }
            per_config.push((dataset.name.as_str(), stats::mean(&samples)));
            all_samples.extend(samples);
        }

        let floor = self.thresholds.min_bandwidth_mbps;
        for &(name, mean) in &per_config {
            if mean < floor {
                let ratio = if mean > 0.0 { floor / mean } else { f64::INFINITY };
                anomalies.push(PerformanceAnomaly {
                    kind: AnomalyKind::Bandwidth,
                    configuration: name.to_string(),
                    description: format!(
                        "Mean TCP bandwidth {:.1} Mbps is below the {:.0} Mbps minimum",
                        mean, floor
                    ),
                    severity: Severity::from_ratio(ratio),
                    affected_metrics: vec!["bandwidth_mbps".to_string()],
                    recommendations: recommendations(LOW_BANDWIDTH_RECS),
                });
            }
        }

        let grand_mean = stats::mean(&all_samples);
        if grand_mean > 0.0 {
            for &(name, mean) in &per_config {
                let deviation = (mean - grand_mean) / grand_mean;
                if deviation.abs() > self.thresholds.bandwidth_deviation {
                    let direction = if deviation > 0.0 { "higher" } else { "lower" };
                    anomalies.push(PerformanceAnomaly {
                        kind: AnomalyKind::Bandwidth,
                        configuration: name.to_string(),
                        description: format!(
                            "Mean bandwidth {:.1} Mbps is {:.1}% {} than the grand mean {:.1} Mbps",
                            mean,
                            deviation.abs() * 100.0,
                            direction,
                            grand_mean
                        ),
                        severity: Severity::from_ratio(
                            deviation.abs() / self.thresholds.bandwidth_deviation,
                        ),
                        affected_metrics: vec!["bandwidth_mbps".to_string()],
                        recommendations: recommendations(BANDWIDTH_DEVIATION_RECS),
                    });
                }
            }
        }

        anomalies
    }

    fn detect_latency(&self, datasets: &[Dataset]) -> Vec<PerformanceAnomaly> {
        let mut anomalies = Vec::new();
        let mut all_samples: Vec<f64> = Vec::new();
        let mut per_config: Vec<(&str, f64)> = Vec::new();

        for dataset in datasets {
            let samples = udp_jitter_samples(dataset);
            if samples.is_empty() {
                continue;
            }
            per_config.push((dataset.name.as_str(), stats::mean(&samples)));
            all_samples.extend(samples);
        }

        let ceiling = self.thresholds.max_jitter_ms;
        for &(name, mean) in &per_config {
            if mean > ceiling {
                anomalies.push(PerformanceAnomaly {
                    kind: AnomalyKind::Latency,
                    configuration: name.to_string(),
                    description: format!(
                        "Mean jitter {:.2} ms exceeds the {:.0} ms maximum",
                        mean, ceiling
                    ),
                    severity: Severity::from_ratio(mean / ceiling),
                    affected_metrics: vec!["jitter_ms".to_string()],
                    recommendations: recommendations(HIGH_JITTER_RECS),
                });
            }
        }

        let grand_mean = stats::mean(&all_samples);
        if grand_mean > 0.0 {
            for &(name, mean) in &per_config {
                let deviation = (mean - grand_mean) / grand_mean;
                if deviation.abs() > self.thresholds.latency_deviation {
                    let direction = if deviation > 0.0 { "higher" } else { "lower" };
                    anomalies.push(PerformanceAnomaly {
                        kind: AnomalyKind::Latency,
                        configuration: name.to_string(),
                        description: format!(
                            "Mean jitter {:.2} ms is {:.1}% {} than the grand mean {:.2} ms",
                            mean,
                            deviation.abs() * 100.0,
                            direction,
                            grand_mean
                        ),
                        severity: Severity::from_ratio(
                            deviation.abs() / self.thresholds.latency_deviation,
                        ),
                        affected_metrics: vec!["jitter_ms".to_string()],
                        recommendations: recommendations(LATENCY_DEVIATION_RECS),
                    });
                }
            }
        }

        anomalies
    }

    fn detect_packet_loss(&self, datasets: &[Dataset]) -> Vec<PerformanceAnomaly> {
        let mut anomalies = Vec::new();

        for dataset in datasets {
            let loss_samples = udp_loss_samples(dataset);
            if !loss_samples.is_empty() {
                let mean_loss = stats::mean(&loss_samples);
                if mean_loss > self.thresholds.max_packet_loss {
                    anomalies.push(PerformanceAnomaly {
                        kind: AnomalyKind::PacketLoss,
                        configuration: dataset.name.clone(),
                        description: format!(
                            "Mean UDP packet loss {:.2}% exceeds the {:.1}% maximum",
                            mean_loss * 100.0,
                            self.thresholds.max_packet_loss * 100.0
                        ),
                        severity: Severity::from_ratio(mean_loss / self.thresholds.max_packet_loss),
                        affected_metrics: vec!["packet_loss".to_string()],
                        recommendations: recommendations(PACKET_LOSS_RECS),
                    });
                }
            }

            let retransmit_samples = retransmit_rate_samples(dataset);
            if !retransmit_samples.is_empty() {
                let mean_rate = stats::mean(&retransmit_samples);
                if mean_rate > self.thresholds.max_retransmit_rate {
                    anomalies.push(PerformanceAnomaly {
                        kind: AnomalyKind::PacketLoss,
                        configuration: dataset.name.clone(),
                        description: format!(
                            "Mean TCP retransmit rate {:.2}% exceeds the {:.1}% maximum",
                            mean_rate * 100.0,
                            self.thresholds.max_retransmit_rate * 100.0
                        ),
                        severity: Severity::from_ratio(
                            mean_rate / self.thresholds.max_retransmit_rate,
                        ),
                        affected_metrics: vec!["retransmits".to_string()],
                        recommendations: recommendations(RETRANSMIT_RECS),
                    });
                }
            }
        }

        anomalies
    }

    fn detect_dns(&self, datasets: &[Dataset]) -> Vec<PerformanceAnomaly> {
        let mut anomalies = Vec::new();

        for dataset in datasets {
            let samples = dns_response_samples(dataset);
            if !samples.is_empty() {
                let mean_response = stats::mean(&samples);
                if mean_response > self.thresholds.max_dns_response_ms {
                    anomalies.push(PerformanceAnomaly {
                        kind: AnomalyKind::DnsFailure,
                        configuration: dataset.name.clone(),
                        description: format!(
                            "Mean DNS response time {:.1} ms exceeds the {:.0} ms maximum",
                            mean_response, self.thresholds.max_dns_response_ms
                        ),
                        severity: Severity::from_ratio(
                            mean_response / self.thresholds.max_dns_response_ms,
                        ),
                        affected_metrics: vec!["response_time_ms".to_string()],
                        recommendations: recommendations(SLOW_DNS_RECS),
                    });
                }
            }

            let records = dataset.dns_tests();
            if !records.is_empty() {
                let success_rate =
                    records.iter().filter(|r| r.success).count() as f64 / records.len() as f64;
                let floor = self.thresholds.min_dns_success_rate;
                if success_rate < floor {
                    let ratio = if success_rate > 0.0 {
                        floor / success_rate
                    } else {
                        f64::INFINITY
                    };
                    anomalies.push(PerformanceAnomaly {
                        kind: AnomalyKind::DnsFailure,
                        configuration: dataset.name.clone(),
                        description: format!(
                            "DNS success rate {:.1}% is below the {:.0}% minimum",
                            success_rate * 100.0,
                            floor * 100.0
                        ),
                        severity: Severity::from_ratio(ratio),
                        affected_metrics: vec!["success".to_string()],
                        recommendations: recommendations(DNS_FAILURE_RECS),
                    });
                }
            }
        }

        anomalies
    }

    /// Domain-scoped check, independent of configuration grouping: any domain
    /// with at least two samples anywhere whose mean response time exceeds
    /// 1.5x the absolute DNS threshold.
    fn detect_slow_domains(&self, datasets: &[Dataset]) -> Vec<PerformanceAnomaly> {
        let mut samples_by_domain: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        let mut configs_by_domain: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for dataset in datasets {
            for record in dataset.dns_tests() {
                let configs = configs_by_domain.entry(record.domain.as_str()).or_default();
                if !configs.contains(&dataset.name.as_str()) {
                    configs.push(dataset.name.as_str());
                }
                if let Some(rt) = record.response_time_ms {
                    samples_by_domain.entry(record.domain.as_str()).or_default().push(rt);
                }
            }
        }

        let threshold = 1.5 * self.thresholds.max_dns_response_ms;
        let mut anomalies = Vec::new();
        for (domain, samples) in &samples_by_domain {
            if samples.len() < 2 {
                continue;
            }
            let mean_response = stats::mean(samples);
            if mean_response <= threshold {
                continue;
            }

            let configs = configs_by_domain.get(domain).map(Vec::as_slice).unwrap_or(&[]);
            let configuration = if configs.len() > 3 {
                ALL_CONFIGURATIONS.to_string()
            } else {
                configs.join(", ")
            };

            anomalies.push(PerformanceAnomaly {
                kind: AnomalyKind::DnsFailure,
                configuration,
                description: format!(
                    "Domain '{}' averages {:.1} ms over {} samples, above the {:.0} ms slow-domain threshold",
                    domain,
                    mean_response,
                    samples.len(),
                    threshold
                ),
                severity: Severity::from_ratio(mean_response / threshold),
                affected_metrics: vec!["response_time_ms".to_string()],
                recommendations: recommendations(SLOW_DOMAIN_RECS),
            });
        }

        anomalies
    }
}
