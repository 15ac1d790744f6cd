use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, Float64Array, Int64Array, StringArray, UInt64Array};
use arrow::record_batch::RecordBatch;
use flate2::read::GzDecoder;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::model::{ChannelRecord, ChannelTable, Dataset, ObservationTable, RawObservation};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A data source that cannot be read or parsed. Fatal to the load step:
/// either both tables load or the whole operation fails.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {detail}", path.display())]
    Malformed { path: PathBuf, detail: String },
    #[error("unsupported file extension on {}", .0.display())]
    UnsupportedExtension(PathBuf),
}

impl DataError {
    fn malformed(path: &Path, detail: impl ToString) -> Self {
        DataError::Malformed {
            path: path.to_path_buf(),
            detail: detail.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load both tables, or fail. No partial result: a dashboard with only one
/// of the two tables cannot render anything meaningful.
pub fn load_pair(channels: &Path, observations: &Path) -> Result<Dataset, DataError> {
    let channels = load_channels(channels)?;
    let observations = load_observations(observations)?;
    log::info!(
        "loaded {} channels, {} observations",
        channels.len(),
        observations.len()
    );
    Ok(Dataset {
        channels,
        observations,
    })
}

/// Load the channel metadata table. Dispatch by extension.
///
/// Supported formats:
/// * `.tsv` / `.tsv.gz` – tab-separated, optionally gzipped (source format)
/// * `.csv` / `.csv.gz` – comma-separated
/// * `.json`            – records-oriented array of objects
/// * `.parquet` / `.pq` – scalar columns, same names as the TSV headers
pub fn load_channels(path: &Path) -> Result<ChannelTable, DataError> {
    let rows: Vec<ChannelRecord> = match detect_format(path)? {
        Format::Delimited { delimiter, gzip } => {
            read_delimited(open_maybe_gzip(path, gzip)?, delimiter, path)?
        }
        Format::Json => read_json(path)?,
        Format::Parquet => read_channels_parquet(path)?,
    };
    Ok(ChannelTable::new(rows))
}

/// Load the weekly time-series table. Same format dispatch as
/// [`load_channels`]; timestamps are coerced here, never rejected.
pub fn load_observations(path: &Path) -> Result<ObservationTable, DataError> {
    let raw: Vec<RawObservation> = match detect_format(path)? {
        Format::Delimited { delimiter, gzip } => {
            read_delimited(open_maybe_gzip(path, gzip)?, delimiter, path)?
        }
        Format::Json => read_json(path)?,
        Format::Parquet => read_observations_parquet(path)?,
    };
    let rows = raw.into_iter().map(RawObservation::into_observation).collect();
    Ok(ObservationTable::new(rows))
}

// ---------------------------------------------------------------------------
// Format detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Delimited { delimiter: u8, gzip: bool },
    Json,
    Parquet,
}

fn detect_format(path: &Path) -> Result<Format, DataError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (inner, gzip) = match name.strip_suffix(".gz") {
        Some(stripped) => (stripped, true),
        None => (name.as_str(), false),
    };

    if inner.ends_with(".tsv") {
        Ok(Format::Delimited {
            delimiter: b'\t',
            gzip,
        })
    } else if inner.ends_with(".csv") {
        Ok(Format::Delimited {
            delimiter: b',',
            gzip,
        })
    } else if !gzip && inner.ends_with(".json") {
        Ok(Format::Json)
    } else if !gzip && (inner.ends_with(".parquet") || inner.ends_with(".pq")) {
        Ok(Format::Parquet)
    } else {
        Err(DataError::UnsupportedExtension(path.to_path_buf()))
    }
}

fn open_maybe_gzip(path: &Path, gzip: bool) -> Result<Box<dyn Read>, DataError> {
    let file = std::fs::File::open(path).map_err(|source| DataError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    if gzip {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

// ---------------------------------------------------------------------------
// Delimited loader
// ---------------------------------------------------------------------------

/// Parse a delimited table with a header row into typed rows. Columns are
/// matched by header name; unknown columns are ignored.
fn read_delimited<T: DeserializeOwned>(
    reader: impl Read,
    delimiter: u8,
    path: &Path,
) -> Result<Vec<T>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (i, result) in rdr.deserialize().enumerate() {
        let row: T = result.map_err(|e| DataError::malformed(path, format!("row {i}: {e}")))?;
        rows.push(row);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON: a top-level array of objects whose keys match the
/// delimited headers (`df.to_json(orient='records')` output).
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DataError> {
    let text = std::fs::read_to_string(path).map_err(|source| DataError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|e| DataError::malformed(path, e))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

fn parquet_batches(path: &Path) -> Result<Vec<RecordBatch>, DataError> {
    let file = std::fs::File::open(path).map_err(|source| DataError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| DataError::malformed(path, e))?;
    let reader = builder.build().map_err(|e| DataError::malformed(path, e))?;

    reader
        .into_iter()
        .map(|b| b.map_err(|e| DataError::malformed(path, e)))
        .collect()
}

fn read_channels_parquet(path: &Path) -> Result<Vec<ChannelRecord>, DataError> {
    let mut rows = Vec::new();
    for batch in parquet_batches(path)? {
        let ids = str_column(&batch, "channel_id", path)?;
        let names = str_column(&batch, "name_cc", path)?;
        let categories = str_column(&batch, "category_cc", path)?;
        let subscribers = u64_column(&batch, "subscribers_cc", path)?;
        let videos = u64_column(&batch, "videos_cc", path)?;

        for row in 0..batch.num_rows() {
            let channel_id = ids(row).ok_or_else(|| {
                DataError::malformed(path, format!("row {row}: null channel_id"))
            })?;
            let name = names(row).unwrap_or_default();
            rows.push(ChannelRecord {
                channel_id,
                name,
                category: categories(row),
                subscribers: subscribers(row).unwrap_or(0),
                videos: videos(row).unwrap_or(0),
            });
        }
    }
    Ok(rows)
}

fn read_observations_parquet(path: &Path) -> Result<Vec<RawObservation>, DataError> {
    let mut rows = Vec::new();
    for batch in parquet_batches(path)? {
        let ids = str_column(&batch, "channel", path)?;
        let datetimes = str_column(&batch, "datetime", path)?;
        let views = f64_column(&batch, "views", path)?;
        let subs = f64_column(&batch, "subs", path)?;
        let delta_views = f64_column(&batch, "delta_views", path)?;
        let delta_subs = f64_column(&batch, "delta_subs", path)?;

        for row in 0..batch.num_rows() {
            let channel_id = ids(row)
                .ok_or_else(|| DataError::malformed(path, format!("row {row}: null channel")))?;
            rows.push(RawObservation {
                channel_id,
                datetime: datetimes(row),
                views: views(row),
                subs: subs(row),
                delta_views: delta_views(row),
                delta_subs: delta_subs(row),
            });
        }
    }
    Ok(rows)
}

// -- Arrow column accessors: resolve the downcast once per batch --

fn column<'a>(
    batch: &'a RecordBatch,
    name: &str,
    path: &Path,
) -> Result<&'a Arc<dyn Array>, DataError> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| DataError::malformed(path, format!("missing '{name}' column")))?;
    Ok(batch.column(idx))
}

fn str_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
    path: &Path,
) -> Result<impl Fn(usize) -> Option<String> + 'a, DataError> {
    let col = column(batch, name, path)?;
    let arr = col
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| {
            DataError::malformed(path, format!("column '{name}' is not Utf8"))
        })?;
    Ok(move |row: usize| {
        if arr.is_null(row) {
            None
        } else {
            Some(arr.value(row).to_string())
        }
    })
}

fn u64_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
    path: &Path,
) -> Result<Box<dyn Fn(usize) -> Option<u64> + 'a>, DataError> {
    let col = column(batch, name, path)?;
    if let Some(arr) = col.as_any().downcast_ref::<UInt64Array>() {
        Ok(Box::new(move |row| (!arr.is_null(row)).then(|| arr.value(row))))
    } else if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
        Ok(Box::new(move |row| {
            (!arr.is_null(row)).then(|| arr.value(row).max(0) as u64)
        }))
    } else {
        Err(DataError::malformed(
            path,
            format!("column '{name}' is not an integer type"),
        ))
    }
}

fn f64_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
    path: &Path,
) -> Result<Box<dyn Fn(usize) -> Option<f64> + 'a>, DataError> {
    let col = column(batch, name, path)?;
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(Box::new(move |row| (!arr.is_null(row)).then(|| arr.value(row))))
    } else if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
        Ok(Box::new(move |row| {
            (!arr.is_null(row)).then(|| arr.value(row) as f64)
        }))
    } else {
        Err(DataError::malformed(
            path,
            format!("column '{name}' is not a numeric type"),
        ))
    }
}

// ---------------------------------------------------------------------------
// DatasetCache – explicit memoization, keyed by source path pair
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceKey {
    channels: PathBuf,
    observations: PathBuf,
}

/// Session-owned load cache. `load` re-reads only when the source path pair
/// changed or after an explicit `invalidate`; otherwise it hands back the
/// shared snapshot. Readers clone the `Arc`, nobody writes.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entry: Option<(SourceKey, Arc<Dataset>)>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, channels: &Path, observations: &Path) -> Result<Arc<Dataset>, DataError> {
        let key = SourceKey {
            channels: channels.to_path_buf(),
            observations: observations.to_path_buf(),
        };
        if let Some((cached, data)) = &self.entry {
            if *cached == key {
                log::debug!("dataset cache hit: {}", key.channels.display());
                return Ok(Arc::clone(data));
            }
        }
        let data = Arc::new(load_pair(channels, observations)?);
        self.entry = Some((key, Arc::clone(&data)));
        Ok(data)
    }

    /// Drop the cached snapshot; the next `load` re-reads from disk.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_cached(&self) -> bool {
        self.entry.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CHANNELS_TSV: &str = "\
category_cc\tchannel_id\tname_cc\tsubscribers_cc\tvideos_cc
Music\tUCa\tAlpha Music\t1000\t120
\tUCb\tBeta\t500\t30
Gaming\tUCc\tGamma Plays\t2500\t400
";

    const OBSERVATIONS_TSV: &str = "\
channel\tdatetime\tviews\tdelta_views\tsubs\tdelta_subs
UCa\t2017-09-25 00:00:00\t1000\t100\t50\t5
UCa\t2017-10-02 00:00:00\t1300\t300\t60\t10
UCb\tnot-a-date\t200\t50\t20\t
";

    #[test]
    fn detects_formats_including_double_extensions() {
        let fmt = |p: &str| detect_format(Path::new(p)).unwrap();
        assert_eq!(
            fmt("df_channels_en.tsv.gz"),
            Format::Delimited {
                delimiter: b'\t',
                gzip: true
            }
        );
        assert_eq!(
            fmt("channels.tsv"),
            Format::Delimited {
                delimiter: b'\t',
                gzip: false
            }
        );
        assert_eq!(
            fmt("channels.csv"),
            Format::Delimited {
                delimiter: b',',
                gzip: false
            }
        );
        assert_eq!(fmt("channels.json"), Format::Json);
        assert_eq!(fmt("channels.parquet"), Format::Parquet);
        assert!(detect_format(Path::new("channels.xlsx")).is_err());
    }

    #[test]
    fn reads_tsv_channels_with_null_category_and_extra_columns() {
        let rows: Vec<ChannelRecord> =
            read_delimited(CHANNELS_TSV.as_bytes(), b'\t', Path::new("t.tsv")).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].channel_id, "UCa");
        assert_eq!(rows[0].category.as_deref(), Some("Music"));
        assert_eq!(rows[1].category, None);
        assert_eq!(rows[2].videos, 400);
    }

    #[test]
    fn reads_tsv_observations_coercing_bad_timestamps() {
        let raw: Vec<RawObservation> =
            read_delimited(OBSERVATIONS_TSV.as_bytes(), b'\t', Path::new("t.tsv")).unwrap();
        let rows: Vec<_> = raw.into_iter().map(RawObservation::into_observation).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].timestamp.is_some());
        assert_eq!(rows[2].timestamp, None);
        assert_eq!(rows[2].delta_views, Some(50.0));
        assert_eq!(rows[2].delta_subs, None);
    }

    #[test]
    fn reads_gzipped_tsv() {
        let mut enc =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(CHANNELS_TSV.as_bytes()).unwrap();
        let compressed = enc.finish().unwrap();

        let rows: Vec<ChannelRecord> = read_delimited(
            GzDecoder::new(compressed.as_slice()),
            b'\t',
            Path::new("t.tsv.gz"),
        )
        .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].channel_id, "UCc");
    }

    #[test]
    fn malformed_delimited_input_is_an_error_not_a_default() {
        let bad = "channel_id\tname_cc\tcategory_cc\tsubscribers_cc\tvideos_cc\nUCa\tAlpha\tMusic\tnot-a-number\t3\n";
        let result: Result<Vec<ChannelRecord>, _> =
            read_delimited(bad.as_bytes(), b'\t', Path::new("t.tsv"));
        assert!(matches!(result, Err(DataError::Malformed { .. })));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = load_channels(Path::new("/definitely/not/here.tsv")).unwrap_err();
        assert!(matches!(err, DataError::Unreadable { .. }));
    }

    fn temp_tables(tag: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir();
        let pid = std::process::id();
        let channels = dir.join(format!("channelscope-test-{pid}-{tag}-channels.tsv"));
        let observations = dir.join(format!("channelscope-test-{pid}-{tag}-observations.tsv"));
        std::fs::write(&channels, CHANNELS_TSV).unwrap();
        std::fs::write(&observations, OBSERVATIONS_TSV).unwrap();
        (channels, observations)
    }

    #[test]
    fn cache_returns_shared_snapshot_until_invalidated() {
        let (channels, observations) = temp_tables("cache");
        let mut cache = DatasetCache::new();

        let first = cache.load(&channels, &observations).unwrap();
        let second = cache.load(&channels, &observations).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        cache.invalidate();
        assert!(!cache.is_cached());
        let third = cache.load(&channels, &observations).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.channels.len(), 3);

        std::fs::remove_file(&channels).ok();
        std::fs::remove_file(&observations).ok();
    }

    #[test]
    fn load_pair_fails_whole_when_one_side_is_missing() {
        let (channels, observations) = temp_tables("pair");
        assert!(load_pair(&channels, Path::new("/nope.tsv")).is_err());
        assert!(load_pair(Path::new("/nope.tsv"), &observations).is_err());
        std::fs::remove_file(&channels).ok();
        std::fs::remove_file(&observations).ok();
    }
}
