//! End-to-end pipeline tests: fixture directory trees through discovery,
//! batched loading, and the full analysis pass.

use std::fs::{self, FileTimes};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use netperf_analyzer::analysis::{self, AnalysisOptions, AnomalyKind, Severity};
use netperf_analyzer::dataset::{
    parser, DatasetLoader, DnsTestRecord, IperfTestRecord, LoaderOptions, ParserOptions,
    TestResults,
};

fn iperf_record(scenario: &str, success: bool, bandwidth: Option<f64>, jitter: Option<f64>) -> IperfTestRecord {
    IperfTestRecord {
        server: "10.0.1.10".to_string(),
        scenario: scenario.to_string(),
        success,
        bandwidth_mbps: bandwidth,
        jitter_ms: jitter,
        packet_loss: Some(0.0),
        retransmits: Some(3),
        tcp_mss_default: Some(1448),
        cpu_utilization_host: Some(12.5),
        cpu_utilization_remote: Some(8.0),
        bytes: Some(1_250_000_000),
        duration: Some(10.0),
        error: None,
    }
}

fn dns_record(domain: &str, response_ms: f64) -> DnsTestRecord {
    DnsTestRecord {
        domain: domain.to_string(),
        dns_server: "10.0.0.2".to_string(),
        success: true,
        response_time_ms: Some(response_ms),
        query_time_ms: Some(response_ms * 0.8),
        resolved_ips: Some(vec!["93.184.216.34".to_string()]),
        error: None,
    }
}

/// Write one dataset directory with a parameters and a results file.
fn write_dataset(root: &Path, name: &str, params: &str, results: &TestResults) {
    let dir = root.join(name);
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("parameters_20250318_120301.json"), params).unwrap();
    fs::write(
        dir.join("results_20250318_120301.json"),
        serde_json::to_string(results).unwrap(),
    )
    .unwrap();
}

/// Results averaging `bandwidth` Mbps / `jitter` ms with `successes` of
/// `total` record pairs succeeding.
fn perf_results(bandwidth: f64, jitter: f64, successes: usize, total: usize) -> TestResults {
    let mut iperf_tests = Vec::new();
    for i in 0..total {
        let ok = i < successes;
        iperf_tests.push(iperf_record("tcp_bandwidth", ok, ok.then_some(bandwidth), None));
        iperf_tests.push(iperf_record("udp_jitter", ok, None, ok.then_some(jitter)));
    }
    TestResults {
        iperf_tests,
        dns_tests: vec![dns_record("example.com", 15.0), dns_record("example.org", 22.0)],
    }
}

#[test]
fn full_pipeline_over_fixture_sweep() {
    let root = tempfile::tempdir().unwrap();

    write_dataset(
        root.path(),
        "coredns-mtu9001-aws-logs_disabled",
        r#"{"backend-server": "coredns", "mtu": 9001, "query-logging": "disabled"}"#,
        &perf_results(950.0, 0.8, 20, 20),
    );
    write_dataset(
        root.path(),
        "coredns-mtu1500-aws-logs_disabled",
        r#"{"backend-server": "coredns", "mtu": "1500", "query-logging": "disabled"}"#,
        &perf_results(880.0, 1.0, 20, 20),
    );
    write_dataset(
        root.path(),
        "coredns-mtu1500-aws-logs_enabled",
        r#"{"backend-server": "coredns", "mtu": 1500, "query-logging": "enabled"}"#,
        &perf_results(820.0, 1.1, 19, 20),
    );
    write_dataset(
        root.path(),
        "stock-mtu1500-aws-logs_disabled",
        r#"{"backend-server": "stock", "mtu": 1500, "query-logging": "disabled"}"#,
        &perf_results(900.0, 0.9, 20, 20),
    );

    let loader = DatasetLoader::new(LoaderOptions {
        max_parallel: 2,
        ..LoaderOptions::default()
    });
    let datasets = loader.load_directory(root.path()).unwrap();
    assert_eq!(datasets.len(), 4);

    // Name-derived and parameters-file configuration agree.
    let jumbo = datasets
        .iter()
        .find(|d| d.name == "coredns-mtu9001-aws-logs_disabled")
        .unwrap();
    assert_eq!(jumbo.configuration.mtu, 9001);
    assert_eq!(jumbo.configuration.backend_server, "coredns");
    assert!(!jumbo.configuration.logging_enabled);
    assert_eq!(jumbo.configuration.test_date, "2025-03-18 12:03:01");

    let report = analysis::run_analysis(&datasets, &AnalysisOptions::default()).unwrap();

    assert_eq!(report.metadata.total_datasets, 4);
    assert_eq!(report.bandwidth.len(), 4);
    assert_eq!(report.dns.len(), 4);

    // Ranks are a dense permutation with non-increasing scores.
    let mut ranks: Vec<usize> = report.comparison.rankings.iter().map(|r| r.rank).collect();
    ranks.sort_unstable();
    assert_eq!(ranks, vec![1, 2, 3, 4]);
    for pair in report.comparison.rankings.windows(2) {
        assert!(pair[0].overall_score >= pair[1].overall_score);
    }

    // The jumbo-frame configuration has the best bandwidth and wins.
    assert_eq!(report.comparison.mtu_impact.optimal_mtu, Some(9001));
    assert_eq!(
        report.summary.optimal_configuration,
        "coredns-mtu9001-aws-logs_disabled"
    );

    // Both logging partitions exist, so the impact is computed, not the
    // insufficient-data fallback.
    assert!(report
        .comparison
        .logging_impact
        .recommendations
        .iter()
        .all(|r| !r.contains("Insufficient data")));
    assert!(report.comparison.logging_impact.performance_impact_pct > 0.0);

    // Reports can be emitted from the assembled output object.
    let out = tempfile::tempdir().unwrap();
    analysis::generate_json_report(&report, &out.path().join("report.json")).unwrap();
    analysis::generate_text_report(&report, &out.path().join("report.txt")).unwrap();
    assert!(out.path().join("report.json").exists());
    assert!(out.path().join("report.txt").exists());
}

#[test]
fn ranking_and_anomaly_scenario() {
    // Configuration A: ~900 Mbps, 2 ms, 99% success.
    // Configuration B: ~400 Mbps, 10 ms, 80% success.
    let root = tempfile::tempdir().unwrap();
    write_dataset(
        root.path(),
        "coredns-mtu9001-aws-logs_disabled",
        r#"{"backend-server": "coredns", "mtu": 9001, "query-logging": "disabled"}"#,
        &perf_results(900.0, 2.0, 99, 100),
    );
    write_dataset(
        root.path(),
        "stock-mtu1500-aws-logs_disabled",
        r#"{"backend-server": "stock", "mtu": 1500, "query-logging": "disabled"}"#,
        &perf_results(400.0, 10.0, 80, 100),
    );

    let loader = DatasetLoader::new(LoaderOptions::default());
    let datasets = loader.load_directory(root.path()).unwrap();
    let report = analysis::run_analysis(&datasets, &AnalysisOptions::default()).unwrap();

    let first = &report.comparison.rankings[0];
    let second = &report.comparison.rankings[1];
    assert_eq!(first.configuration, "coredns-mtu9001-aws-logs_disabled");
    assert_eq!(first.rank, 1);
    assert!(first.overall_score > second.overall_score);
    // A: 0.5*900 + 0.3*(100/2) + 0.2*99
    assert!((first.overall_score - 484.8).abs() < 1e-9);

    // B sits well above the 100 Mbps floor but deviates far from the grand
    // mean: a bandwidth anomaly at low severity or higher.
    let b_anomaly = report
        .anomalies
        .iter()
        .find(|a| {
            a.kind == AnomalyKind::Bandwidth
                && a.configuration == "stock-mtu1500-aws-logs_disabled"
        })
        .expect("expected a bandwidth anomaly for the slow configuration");
    assert!(b_anomaly.severity >= Severity::Low);
    assert!(!b_anomaly.description.contains("minimum"));
}

#[test]
fn streaming_and_whole_document_parses_agree() {
    let mut results = TestResults::default();
    for i in 0..1000 {
        results.iperf_tests.push(iperf_record(
            if i % 2 == 0 { "tcp_bandwidth" } else { "udp_jitter" },
            i % 17 != 0,
            Some(900.0 + i as f64),
            Some(0.5 + i as f64 / 1000.0),
        ));
        results.dns_tests.push(dns_record(&format!("host{}.example.com", i), 10.0 + i as f64 % 50.0));
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results_large.json");
    fs::write(&path, serde_json::to_string(&results).unwrap()).unwrap();

    let whole = parser::parse_results_document(&path).unwrap();

    // A zero threshold forces the streaming path through the public entry
    // point, with the default 50/100 batch sizes.
    let streamed = parser::parse_results_file(
        &path,
        &ParserOptions {
            streaming_threshold_bytes: 0,
            ..ParserOptions::default()
        },
    )
    .unwrap();

    assert_eq!(whole.iperf_tests.len(), 1000);
    assert_eq!(whole.dns_tests.len(), 1000);
    assert_eq!(whole, streamed);
    // Spot-check ordering survived the batched flushes.
    assert_eq!(streamed.dns_tests[999].domain, "host999.example.com");
}

#[test]
fn cache_is_idempotent_until_mtime_changes() {
    let root = tempfile::tempdir().unwrap();
    write_dataset(
        root.path(),
        "stock-mtu1500-aws-logs_disabled",
        r#"{"backend-server": "stock", "mtu": 1500, "query-logging": "disabled"}"#,
        &perf_results(900.0, 1.0, 5, 5),
    );
    let results_path = root
        .path()
        .join("stock-mtu1500-aws-logs_disabled")
        .join("results_20250318_120301.json");

    let loader = DatasetLoader::new(LoaderOptions::default());
    let first = loader.load_directory(root.path()).unwrap();
    let second = loader.load_directory(root.path()).unwrap();

    // Unchanged mtime: the second load returns the memoized parse.
    let first_results = first[0].results.as_ref().unwrap();
    assert!(Arc::ptr_eq(first_results, second[0].results.as_ref().unwrap()));
    assert_eq!(loader.cache().len(), 1);

    // Bump the modification time without touching content: a fresh parse
    // with equal value under a new cache key.
    let file = fs::OpenOptions::new().append(true).open(&results_path).unwrap();
    file.set_times(
        FileTimes::new().set_modified(SystemTime::now() + Duration::from_secs(10)),
    )
    .unwrap();
    drop(file);

    let third = loader.load_directory(root.path()).unwrap();
    let third_results = third[0].results.as_ref().unwrap();
    assert!(!Arc::ptr_eq(first_results, third_results));
    assert_eq!(**third_results, **first_results);
    assert_eq!(loader.cache().len(), 2);
}

#[test]
fn continue_on_error_policy_governs_the_whole_load() {
    let root = tempfile::tempdir().unwrap();
    write_dataset(
        root.path(),
        "stock-mtu1500-aws-logs_disabled",
        r#"{"backend-server": "stock", "mtu": 1500, "query-logging": "disabled"}"#,
        &perf_results(900.0, 1.0, 5, 5),
    );
    // Valid directory name, invalid logging token inside the parameters file.
    let bad_dir = root.path().join("coredns-mtu1500-aws-logs_enabled");
    fs::create_dir(&bad_dir).unwrap();
    fs::write(
        bad_dir.join("parameters.json"),
        r#"{"backend-server": "coredns", "mtu": 1500, "query-logging": "yes"}"#,
    )
    .unwrap();

    let lenient = DatasetLoader::new(LoaderOptions::default());
    let datasets = lenient.load_directory(root.path()).unwrap();
    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0].name, "stock-mtu1500-aws-logs_disabled");

    let strict = DatasetLoader::new(LoaderOptions {
        continue_on_error: false,
        ..LoaderOptions::default()
    });
    assert!(strict.load_directory(root.path()).is_err());
}
