//! Dataset loading: bounded-batch parallel parsing with caching.
//!
//! Discovered datasets are partitioned into consecutive batches of at most
//! `max_parallel`; all parses in a batch run concurrently and the loader
//! waits for the whole batch before starting the next. Batch order is strict;
//! completion order within a batch is unconstrained.

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{AnalyzerError, Result};

use super::cache::DatasetCache;
use super::discovery;
use super::parser::{self, ParserOptions};
use super::types::{Dataset, TestResults};

/// Loader policy and tuning.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Maximum datasets parsed concurrently (batch size).
    pub max_parallel: usize,
    /// Skip datasets that fail with a recoverable error instead of aborting.
    pub continue_on_error: bool,
    pub parser: ParserOptions,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            max_parallel: 4,
            continue_on_error: true,
            parser: ParserOptions::default(),
        }
    }
}

/// Loads datasets through the parser, memoizing parsed results.
pub struct DatasetLoader {
    options: LoaderOptions,
    cache: Arc<DatasetCache>,
}

impl DatasetLoader {
    pub fn new(options: LoaderOptions) -> Self {
        Self {
            options,
            cache: Arc::new(DatasetCache::new()),
        }
    }

    /// Use an existing cache, shared across loads.
    pub fn with_cache(options: LoaderOptions, cache: Arc<DatasetCache>) -> Self {
        Self { options, cache }
    }

    pub fn cache(&self) -> &Arc<DatasetCache> {
        &self.cache
    }

    /// Discover datasets under `root` and load their results.
    pub fn load_directory(&self, root: &Path) -> Result<Vec<Dataset>> {
        let datasets = discovery::discover_datasets(root)?;
        self.load_datasets(datasets)
    }

    /// Load results for already-discovered datasets in sequential batches.
    ///
    /// With continue-on-error, a dataset failing recoverably is excluded from
    /// the returned set (warn-logged); otherwise the first failure aborts.
    /// Inherently fatal errors abort regardless of policy.
    pub fn load_datasets(&self, mut datasets: Vec<Dataset>) -> Result<Vec<Dataset>> {
        let batch_size = self.options.max_parallel.max(1);
        let total = datasets.len();
        let batch_count = total.div_ceil(batch_size);
        let mut loaded = Vec::with_capacity(total);

        let mut batch_index = 0;
        while !datasets.is_empty() {
            let take = batch_size.min(datasets.len());
            let batch: Vec<Dataset> = datasets.drain(..take).collect();
            batch_index += 1;
            log::info!(
                "Loading batch {}/{} ({} datasets)",
                batch_index,
                batch_count,
                batch.len()
            );

            // collect() is the batch barrier: every task resolves before the
            // next batch starts.
            let results: Vec<(String, Result<Dataset>)> = batch
                .into_par_iter()
                .map(|dataset| {
                    let name = dataset.name.clone();
                    (name, self.load_one(dataset))
                })
                .collect();

            for (name, result) in results {
                match result {
                    Ok(dataset) => loaded.push(dataset),
                    Err(e) if self.options.continue_on_error && e.is_recoverable() => {
                        log::warn!("Skipping dataset '{}': {}", name, e);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        log::info!("Loaded {}/{} datasets", loaded.len(), total);
        Ok(loaded)
    }

    fn load_one(&self, mut dataset: Dataset) -> Result<Dataset> {
        if let Some(params_path) = dataset.parameters_file.clone() {
            self.apply_parameters(&mut dataset, &params_path)?;
        }

        let results = match dataset.results_file.clone() {
            Some(results_path) => self.load_results(&results_path)?,
            // A parameters-only dataset carries empty record sequences:
            // absence of data, not an error.
            None => Arc::new(TestResults::default()),
        };

        log::debug!(
            "Loaded '{}': {} iperf records, {} dns records",
            dataset.name,
            results.iperf_tests.len(),
            results.dns_tests.len()
        );
        dataset.results = Some(results);
        Ok(dataset)
    }

    /// Parameters-file values override the name-derived configuration.
    fn apply_parameters(&self, dataset: &mut Dataset, path: &Path) -> Result<()> {
        let params = parser::parse_parameters_file(path)?;
        let config = &mut dataset.configuration;

        if params.backend_server != config.backend_server || params.mtu != config.mtu {
            log::warn!(
                "Dataset '{}': parameters file disagrees with directory name \
                 ({} mtu{} vs {} mtu{}), using parameters file",
                dataset.name,
                params.backend_server,
                params.mtu,
                config.backend_server,
                config.mtu
            );
        }
        config.backend_server = params.backend_server;
        config.mtu = params.mtu;
        config.logging_enabled = params.logging_enabled;
        if let Some(ts) = params.timestamp {
            if let Some(date) = discovery::extract_test_date(&ts) {
                config.test_date = date;
            }
        }
        Ok(())
    }

    fn load_results(&self, path: &Path) -> Result<Arc<TestResults>> {
        let meta = std::fs::metadata(path).map_err(|e| AnalyzerError::filesystem(path, e))?;
        let mtime = meta.modified().map_err(|e| AnalyzerError::filesystem(path, e))?;

        if let Some(hit) = self.cache.get(path, mtime) {
            log::debug!("Cache hit for {}", path.display());
            return Ok(hit);
        }

        let results = Arc::new(parser::parse_results_file(path, &self.options.parser)?);
        self.cache.put(path, mtime, Arc::clone(&results));
        Ok(results)
    }
}
