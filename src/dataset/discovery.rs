//! Dataset discovery: directory scanning and name parsing.
//!
//! A dataset directory encodes its configuration in its name:
//! `coredns-mtu9001-aws-logs_enabled`. Inside it, a parameters file and a
//! results file are located by filename prefix. A directory with neither file
//! is rejected with a warning, never an error.

use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::error::{AnalyzerError, Result};

use super::types::{Dataset, TestConfiguration};

/// Compiled patterns for dataset discovery
pub struct DatasetPatterns {
    /// Match: "coredns-mtu9001-aws-logs_enabled"
    pub dataset_dir: Regex,
    /// Match: embedded "YYYYMMDD_HHMMSS" token in a filename
    pub date_token: Regex,
}

impl DatasetPatterns {
    pub fn new() -> Self {
        Self {
            dataset_dir: Regex::new(r"^(coredns|stock)-mtu(\d+)-aws-logs_(enabled|disabled)$")
                .expect("Invalid dataset_dir regex"),
            date_token: Regex::new(r"(\d{8}_\d{6})").expect("Invalid date_token regex"),
        }
    }
}

impl Default for DatasetPatterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Global patterns instance
pub static PATTERNS: LazyLock<DatasetPatterns> = LazyLock::new(DatasetPatterns::new);

/// Parse a dataset directory name into (backend server, mtu, logging flag).
pub fn parse_dataset_name(name: &str) -> Option<(String, u32, bool)> {
    let caps = PATTERNS.dataset_dir.captures(name)?;
    let backend = caps.get(1)?.as_str().to_string();
    let mtu: u32 = caps.get(2)?.as_str().parse().ok()?;
    let logging_enabled = caps.get(3)?.as_str() == "enabled";
    Some((backend, mtu, logging_enabled))
}

/// Extract a test date from an embedded `YYYYMMDD_HHMMSS` filename token,
/// formatted for display. Returns None when no parseable token exists.
pub fn extract_test_date(file_name: &str) -> Option<String> {
    let caps = PATTERNS.date_token.captures(file_name)?;
    let token = caps.get(1)?.as_str();
    let dt = NaiveDateTime::parse_from_str(token, "%Y%m%d_%H%M%S").ok()?;
    Some(dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Scan a root directory for dataset subdirectories.
///
/// Discovery never fails on a single bad directory: non-matching names and
/// directories without a parameters or results file are skipped with a log
/// entry. Only a failure to read the root itself is an error.
pub fn discover_datasets(root: &Path) -> Result<Vec<Dataset>> {
    let entries = std::fs::read_dir(root).map_err(|e| AnalyzerError::filesystem(root, e))?;

    let mut datasets = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AnalyzerError::filesystem(root, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => continue,
        };

        let (backend_server, mtu, logging_enabled) = match parse_dataset_name(&name) {
            Some(parsed) => parsed,
            None => {
                log::debug!("Skipping non-dataset directory '{}'", name);
                continue;
            }
        };

        let mut parameters_file = None;
        let mut results_file = None;
        let dir_entries = std::fs::read_dir(&path).map_err(|e| AnalyzerError::filesystem(&path, e))?;
        for file_entry in dir_entries {
            let file_entry = file_entry.map_err(|e| AnalyzerError::filesystem(&path, e))?;
            let file_path = file_entry.path();
            let file_name = match file_path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };
            if file_path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            if file_name.starts_with("parameters") && parameters_file.is_none() {
                parameters_file = Some(file_path);
            } else if file_name.starts_with("results") && results_file.is_none() {
                results_file = Some(file_path);
            }
        }

        // At least one of the two files must exist for the dataset to count.
        if parameters_file.is_none() && results_file.is_none() {
            log::warn!(
                "Rejecting dataset '{}': no parameters or results file in {}",
                name,
                path.display()
            );
            continue;
        }

        let test_date = [&results_file, &parameters_file]
            .into_iter()
            .flatten()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .find_map(extract_test_date)
            .unwrap_or_else(|| {
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
            });

        datasets.push(Dataset {
            name,
            configuration: TestConfiguration {
                mtu,
                logging_enabled,
                backend_server,
                test_date,
            },
            parameters_file,
            results_file,
            results: None,
        });
    }

    // Deterministic processing order regardless of directory iteration order.
    datasets.sort_by(|a, b| a.name.cmp(&b.name));
    log::info!("Discovered {} datasets under {}", datasets.len(), root.display());
    Ok(datasets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dataset_name() {
        let (backend, mtu, logging) = parse_dataset_name("coredns-mtu9001-aws-logs_enabled").unwrap();
        assert_eq!(backend, "coredns");
        assert_eq!(mtu, 9001);
        assert!(logging);

        let (backend, mtu, logging) = parse_dataset_name("stock-mtu1500-aws-logs_disabled").unwrap();
        assert_eq!(backend, "stock");
        assert_eq!(mtu, 1500);
        assert!(!logging);

        assert!(parse_dataset_name("bind9-mtu1500-aws-logs_enabled").is_none());
        assert!(parse_dataset_name("coredns-mtu1500-aws-logs_on").is_none());
        assert!(parse_dataset_name("coredns-mtu1500-aws-logs_enabled-extra").is_none());
    }

    #[test]
    fn test_extract_test_date() {
        let date = extract_test_date("results_20250318_120301.json").unwrap();
        assert_eq!(date, "2025-03-18 12:03:01");

        assert!(extract_test_date("results.json").is_none());
        // 13th month is not a parseable date even though the token matches.
        assert!(extract_test_date("results_20251399_250000.json").is_none());
    }

    #[test]
    fn test_discovery_on_fixture_tree() {
        let root = tempfile::tempdir().unwrap();

        let good = root.path().join("coredns-mtu1500-aws-logs_enabled");
        std::fs::create_dir(&good).unwrap();
        std::fs::write(
            good.join("results_20250318_120301.json"),
            r#"{"iperf_tests": [], "dns_tests": []}"#,
        )
        .unwrap();

        // Matching name but no recognizable files: rejected.
        let empty = root.path().join("stock-mtu1500-aws-logs_disabled");
        std::fs::create_dir(&empty).unwrap();
        std::fs::write(empty.join("notes.txt"), "nothing").unwrap();

        // Non-matching name: skipped.
        std::fs::create_dir(root.path().join("scratch")).unwrap();

        let datasets = discover_datasets(root.path()).unwrap();
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].name, "coredns-mtu1500-aws-logs_enabled");
        assert_eq!(datasets[0].configuration.test_date, "2025-03-18 12:03:01");
        assert!(datasets[0].parameters_file.is_none());
        assert!(datasets[0].results_file.is_some());
    }

    #[test]
    fn test_discovery_missing_root_is_error() {
        let err = discover_datasets(Path::new("/nonexistent/netperf-data")).unwrap_err();
        assert!(matches!(err, AnalyzerError::FileSystem { .. }));
    }
}
