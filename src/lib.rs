//! # NetPerf Analyzer - Statistical analysis for MTU / DNS-backend network test sweeps
//!
//! This library ingests collections of captured network-test datasets (iperf
//! throughput measurements and DNS-resolution timings recorded under varying
//! MTU, backend-server, and query-logging configurations), computes
//! comparative statistics, flags anomalous configurations, and ranks
//! configurations by a composite score.
//!
//! ## Overview
//!
//! A sweep produces one directory per configuration, named like
//! `coredns-mtu9001-aws-logs_enabled`, each holding a parameters file and a
//! results file. The pipeline discovers those directories, parses their
//! results in bounded-parallel batches with memoization, and then runs the
//! analysis channels concurrently over the immutable loaded snapshot.
//!
//! ## Architecture
//!
//! The library is organized into three modules:
//!
//! - `dataset`: discovery, record parsing (whole-document and streaming),
//!   the parsed-results cache, and the batched loader
//! - `analysis`: metric aggregation, anomaly detection, configuration
//!   ranking, orchestration, and report emission
//! - `error`: the `AnalyzerError` taxonomy shared by both
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use netperf_analyzer::dataset::{DatasetLoader, LoaderOptions};
//! use netperf_analyzer::analysis::{self, AnalysisOptions};
//!
//! let loader = DatasetLoader::new(LoaderOptions::default());
//! let datasets = loader.load_directory("results".as_ref())?;
//!
//! let report = analysis::run_analysis(&datasets, &AnalysisOptions::default())?;
//! analysis::print_summary(&report);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Library functions return `Result<T, AnalyzerError>` with errors classified
//! as filesystem, parsing, or analysis failures; recoverability is a property
//! of the error kind. The binary converts these into `color_eyre` reports at
//! the edge.

pub mod analysis;
pub mod dataset;
pub mod error;

pub use error::{AnalyzerError, FsErrorKind, Result};
