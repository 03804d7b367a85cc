//! Record parsing for dataset results and parameters files.
//!
//! Two entry points share one output contract: a whole-document parse that
//! decodes the entire JSON into memory, and a streaming parse for oversized
//! files that walks the document incrementally and hands matched array
//! elements to an accumulator in fixed-size batches. Parsing the same file
//! through either path yields the same ordered record sequences.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::{DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

use crate::error::{AnalyzerError, Result};

use super::types::{DnsTestRecord, IperfTestRecord, TestResults};

/// Tuning knobs for the parse pipeline.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Files larger than this are parsed in streaming mode.
    pub streaming_threshold_bytes: u64,
    /// Iperf records flushed to the accumulator per batch.
    pub iperf_batch_size: usize,
    /// DNS records flushed to the accumulator per batch.
    pub dns_batch_size: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            streaming_threshold_bytes: 10 * 1024 * 1024,
            iperf_batch_size: 50,
            dns_batch_size: 100,
        }
    }
}

/// Receives record batches from the streaming parser.
pub trait RecordSink {
    fn accept_iperf(&mut self, batch: Vec<IperfTestRecord>);
    fn accept_dns(&mut self, batch: Vec<DnsTestRecord>);
}

impl RecordSink for TestResults {
    fn accept_iperf(&mut self, batch: Vec<IperfTestRecord>) {
        self.iperf_tests.extend(batch);
    }

    fn accept_dns(&mut self, batch: Vec<DnsTestRecord>) {
        self.dns_tests.extend(batch);
    }
}

/// Parse a results file, selecting streaming mode for files whose size
/// exceeds the configured threshold.
pub fn parse_results_file(path: &Path, options: &ParserOptions) -> Result<TestResults> {
    let meta = std::fs::metadata(path).map_err(|e| AnalyzerError::filesystem(path, e))?;
    if meta.len() > options.streaming_threshold_bytes {
        log::debug!(
            "Streaming parse of {} ({} bytes > {} threshold)",
            path.display(),
            meta.len(),
            options.streaming_threshold_bytes
        );
        parse_results_streaming(path, options)
    } else {
        parse_results_document(path)
    }
}

/// Whole-document parse: decode the entire JSON into memory.
pub fn parse_results_document(path: &Path) -> Result<TestResults> {
    let file = File::open(path).map_err(|e| AnalyzerError::filesystem(path, e))?;
    let reader = BufReader::with_capacity(64 * 1024, file);
    serde_json::from_reader(reader).map_err(|e| AnalyzerError::parsing(path, &e))
}

/// Streaming parse: accumulate batched records into a `TestResults`.
pub fn parse_results_streaming(path: &Path, options: &ParserOptions) -> Result<TestResults> {
    let mut results = TestResults::default();
    parse_results_streaming_into(path, &mut results, options)?;
    Ok(results)
}

/// Streaming parse into a caller-supplied accumulator. Peak memory is bounded
/// by the batch sizes, independent of file size.
pub fn parse_results_streaming_into<S: RecordSink>(
    path: &Path,
    sink: &mut S,
    options: &ParserOptions,
) -> Result<()> {
    let file = File::open(path).map_err(|e| AnalyzerError::filesystem(path, e))?;
    let reader = BufReader::with_capacity(64 * 1024, file);
    let mut de = serde_json::Deserializer::from_reader(reader);

    let seed = DocumentSeed {
        sink,
        iperf_batch_size: options.iperf_batch_size,
        dns_batch_size: options.dns_batch_size,
    };
    seed.deserialize(&mut de)
        .map_err(|e| AnalyzerError::parsing(path, &e))?;
    de.end().map_err(|e| AnalyzerError::parsing(path, &e))
}

/// Seed that walks the top-level results object, dispatching the two record
/// arrays to batched sequence seeds and skipping unknown keys.
struct DocumentSeed<'a, S: RecordSink> {
    sink: &'a mut S,
    iperf_batch_size: usize,
    dns_batch_size: usize,
}

impl<'de, 'a, S: RecordSink> DeserializeSeed<'de> for DocumentSeed<'a, S> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de, 'a, S: RecordSink> Visitor<'de> for DocumentSeed<'a, S> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a results document object")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "iperf_tests" => map.next_value_seed(BatchedSeq {
                    sink: &mut *self.sink,
                    batch_size: self.iperf_batch_size,
                    flush: |sink: &mut S, batch| sink.accept_iperf(batch),
                    _marker: std::marker::PhantomData::<IperfTestRecord>,
                })?,
                "dns_tests" => map.next_value_seed(BatchedSeq {
                    sink: &mut *self.sink,
                    batch_size: self.dns_batch_size,
                    flush: |sink: &mut S, batch| sink.accept_dns(batch),
                    _marker: std::marker::PhantomData::<DnsTestRecord>,
                })?,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(())
    }
}

/// Seed that deserializes one record array element-by-element, flushing to
/// the sink every `batch_size` records.
struct BatchedSeq<'a, S, T, F>
where
    F: Fn(&mut S, Vec<T>),
{
    sink: &'a mut S,
    batch_size: usize,
    flush: F,
    _marker: std::marker::PhantomData<T>,
}

impl<'de, 'a, S, T, F> DeserializeSeed<'de> for BatchedSeq<'a, S, T, F>
where
    T: Deserialize<'de>,
    F: Fn(&mut S, Vec<T>),
{
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de, 'a, S, T, F> Visitor<'de> for BatchedSeq<'a, S, T, F>
where
    T: Deserialize<'de>,
    F: Fn(&mut S, Vec<T>),
{
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an array of test records")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut batch: Vec<T> = Vec::with_capacity(self.batch_size);
        while let Some(record) = seq.next_element::<T>()? {
            batch.push(record);
            if batch.len() >= self.batch_size {
                (self.flush)(&mut *self.sink, std::mem::take(&mut batch));
                batch.reserve(self.batch_size);
            }
        }
        if !batch.is_empty() {
            (self.flush)(&mut *self.sink, batch);
        }
        Ok(())
    }
}

/// Values read from a dataset parameters file, after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetParameters {
    pub backend_server: String,
    pub mtu: u32,
    pub logging_enabled: bool,
    pub timestamp: Option<String>,
}

#[derive(Deserialize)]
struct RawParameters {
    #[serde(rename = "backend-server")]
    backend_server: String,
    mtu: MtuValue,
    #[serde(rename = "query-logging")]
    query_logging: String,
    #[serde(default)]
    timestamp: Option<String>,
}

/// The capture tooling wrote `mtu` as a number in some sweeps and a decimal
/// string in others; both are accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum MtuValue {
    Number(u64),
    Text(String),
}

/// Parse and validate a parameters file.
///
/// `query-logging` is constrained to the literal tokens "enabled" /
/// "disabled"; any other value is a validation failure, never coerced.
pub fn parse_parameters_file(path: &Path) -> Result<DatasetParameters> {
    let file = File::open(path).map_err(|e| AnalyzerError::filesystem(path, e))?;
    let raw: RawParameters = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AnalyzerError::parsing(path, &e))?;

    let mtu = match raw.mtu {
        MtuValue::Number(n) => u32::try_from(n)
            .map_err(|_| AnalyzerError::validation(path, format!("mtu {} out of range", n)))?,
        MtuValue::Text(s) => s
            .trim()
            .parse::<u32>()
            .map_err(|_| AnalyzerError::validation(path, format!("mtu '{}' is not an integer", s)))?,
    };

    let logging_enabled = match raw.query_logging.as_str() {
        "enabled" => true,
        "disabled" => false,
        other => {
            return Err(AnalyzerError::validation(
                path,
                format!("query-logging must be 'enabled' or 'disabled', got '{}'", other),
            ))
        }
    };

    Ok(DatasetParameters {
        backend_server: raw.backend_server,
        mtu,
        logging_enabled,
        timestamp: raw.timestamp,
    })
}
