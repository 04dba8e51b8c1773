//! USGS→NWM 3.0 crosswalk reference table.

use std::collections::HashMap;

use arrow::array::{Array, StringArray};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::info;

use hydro_common::{fetch_bytes, DataStreamError, DataStreamResult, SourceLocation};

/// Default location of the public crosswalk reference table.
const USGS_NWM30_XWALK_URL: &str =
    "s3://ciroh-rti-public-data/teehr-data-warehouse/common/crosswalks/usgs_nwm30_crosswalk.conus.parquet";
const USGS_NWM30_XWALK_REGION: &str = "us-east-2";

/// Where to load the crosswalk reference from.
///
/// Injected configuration rather than a process-wide constant, so tests and
/// deployments can substitute their own table.
#[derive(Debug, Clone)]
pub struct CrosswalkSource {
    /// Parquet file URL (`s3://` or local path).
    pub url: String,
    /// S3 region of the bucket.
    pub region: String,
}

impl Default for CrosswalkSource {
    fn default() -> Self {
        Self {
            url: USGS_NWM30_XWALK_URL.to_string(),
            region: USGS_NWM30_XWALK_REGION.to_string(),
        }
    }
}

impl CrosswalkSource {
    /// Build from the environment, falling back to the public default.
    /// `XWALK_URL` and `XWALK_REGION` override the location.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            url: std::env::var("XWALK_URL").unwrap_or(default.url),
            region: std::env::var("XWALK_REGION").unwrap_or(default.region),
        }
    }
}

/// Lookup from canonical USGS key (`"usgs-<gage>"`) to NWM key.
#[derive(Debug, Default, Clone)]
pub struct CrosswalkIndex {
    map: HashMap<String, String>,
}

impl CrosswalkIndex {
    /// Load and index the reference table.
    ///
    /// Indexes `primary_location_id` → `secondary_location_id`. Keys are
    /// assumed unique upstream; should duplicates occur, the first
    /// occurrence survives. Fetch and parse failures are hard errors and
    /// are not retried.
    pub async fn load(source: &CrosswalkSource) -> DataStreamResult<Self> {
        let location = SourceLocation::parse(&source.url)
            .map_err(|e| DataStreamError::ReferenceLoad(e.to_string()))?;
        let bytes = fetch_bytes(&location, Some(&source.region))
            .await
            .map_err(|e| DataStreamError::ReferenceLoad(e.to_string()))?;

        let reader = ParquetRecordBatchReaderBuilder::try_new(bytes)
            .map_err(|e| DataStreamError::ReferenceLoad(format!("Invalid parquet: {}", e)))?
            .build()
            .map_err(|e| DataStreamError::ReferenceLoad(format!("Invalid parquet: {}", e)))?;

        let mut map = HashMap::new();
        for batch in reader {
            let batch = batch
                .map_err(|e| DataStreamError::ReferenceLoad(format!("Read failed: {}", e)))?;

            let primary = string_column(&batch, "primary_location_id")?;
            let secondary = string_column(&batch, "secondary_location_id")?;

            for i in 0..batch.num_rows() {
                if primary.is_null(i) || secondary.is_null(i) {
                    continue;
                }
                map.entry(primary.value(i).to_string())
                    .or_insert_with(|| secondary.value(i).to_string());
            }
        }

        info!(entries = map.len(), url = %source.url, "Loaded crosswalk reference");
        Ok(Self { map })
    }

    /// Build an index directly from entries (used by tests and callers
    /// that already hold the mapping).
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = HashMap::new();
        for (k, v) in entries {
            map.entry(k.into()).or_insert_with(|| v.into());
        }
        Self { map }
    }

    /// Look up the NWM key for a canonical USGS key.
    pub fn get(&self, usgs_key: &str) -> Option<&str> {
        self.map.get(usgs_key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn string_column<'a>(
    batch: &'a arrow::record_batch::RecordBatch,
    name: &str,
) -> DataStreamResult<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| {
            DataStreamError::ReferenceLoad(format!("Reference table is missing column {}", name))
        })
}
