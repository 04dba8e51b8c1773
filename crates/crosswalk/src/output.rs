//! Output encodings for merged tables.
//!
//! Two encodings of the same schema, both lossless including nulls: a
//! Parquet file on disk for the CLI path, and an Arrow IPC stream written
//! fully into memory for the HTTP path.

use std::fs;
use std::path::Path;

use arrow::compute::concat_batches;
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use tracing::info;

use hydro_common::{DataStreamError, DataStreamResult};

/// Write a batch to a Parquet file, creating parent directories as needed.
pub fn write_parquet(batch: &RecordBatch, path: &Path) -> DataStreamResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .map_err(|e| DataStreamError::Serialize(format!("Parquet writer: {}", e)))?;
    writer
        .write(batch)
        .map_err(|e| DataStreamError::Serialize(format!("Parquet write: {}", e)))?;
    writer
        .close()
        .map_err(|e| DataStreamError::Serialize(format!("Parquet close: {}", e)))?;

    info!(path = %path.display(), rows = batch.num_rows(), "Wrote parquet file");
    Ok(())
}

/// Encode a batch as an Arrow IPC stream held fully in memory.
pub fn to_ipc_stream(batch: &RecordBatch) -> DataStreamResult<Bytes> {
    let mut writer = StreamWriter::try_new(Vec::new(), batch.schema_ref())
        .map_err(|e| DataStreamError::Serialize(format!("IPC writer: {}", e)))?;
    writer
        .write(batch)
        .map_err(|e| DataStreamError::Serialize(format!("IPC write: {}", e)))?;
    writer
        .finish()
        .map_err(|e| DataStreamError::Serialize(format!("IPC finish: {}", e)))?;

    let buf = writer
        .into_inner()
        .map_err(|e| DataStreamError::Serialize(format!("IPC buffer: {}", e)))?;
    Ok(Bytes::from(buf))
}

/// Concatenate merged batches row-wise into one batch.
///
/// All batches must share a schema; the row index is implicitly renumbered
/// by concatenation.
pub fn concat_merged(batches: &[RecordBatch]) -> DataStreamResult<RecordBatch> {
    let first = batches
        .first()
        .ok_or_else(|| DataStreamError::Merge("No batches to concatenate".to_string()))?;
    concat_batches(&first.schema(), batches)
        .map_err(|e| DataStreamError::Merge(format!("Concatenation failed: {}", e)))
}
