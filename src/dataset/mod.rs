//! Dataset discovery, parsing, and cached loading.
//!
//! This module turns a directory of captured network-test output into typed,
//! immutable `Dataset` values ready for analysis.

pub mod cache;
pub mod discovery;
pub mod loader;
pub mod parser;
pub mod types;

pub use cache::DatasetCache;
pub use discovery::discover_datasets;
pub use loader::{DatasetLoader, LoaderOptions};
pub use parser::{parse_parameters_file, parse_results_file, ParserOptions, RecordSink};
pub use types::*;
