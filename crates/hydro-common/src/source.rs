//! Source URL resolution and scoped remote acquisition.
//!
//! Container sources are either local filesystem paths (no scheme) or
//! public S3 objects (`s3://bucket/key`). Remote containers are fetched in
//! full to a private temporary file before being opened, because both the
//! SQLite and NetCDF readers need a real file path. The temporary copy is
//! removed when the [`LocalCopy`] is dropped, on every exit path.

use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use object_store::{aws::AmazonS3Builder, path::Path as ObjectPath, ObjectStore};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{DataStreamError, DataStreamResult};

/// A resolved source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Local filesystem path (the URL had no scheme).
    Local(PathBuf),
    /// Public S3 object.
    S3 { bucket: String, key: String },
}

impl SourceLocation {
    /// Resolve a URL string to a source location.
    ///
    /// Anything with a scheme other than `s3` is rejected up front; no
    /// partial fetch or extraction is attempted.
    pub fn parse(url: &str) -> DataStreamResult<Self> {
        if let Some(rest) = url.strip_prefix("s3://") {
            let (bucket, key) = rest.split_once('/').ok_or_else(|| {
                DataStreamError::SourceLoad(format!("S3 URL has no object key: {}", url))
            })?;
            if bucket.is_empty() || key.is_empty() {
                return Err(DataStreamError::SourceLoad(format!(
                    "S3 URL has empty bucket or key: {}",
                    url
                )));
            }
            Ok(SourceLocation::S3 {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
        } else if let Some((scheme, _)) = url.split_once("://") {
            Err(DataStreamError::UnsupportedSource(scheme.to_string()))
        } else {
            Ok(SourceLocation::Local(PathBuf::from(url)))
        }
    }
}

/// A locally readable copy of a source container.
///
/// Local sources are used in place; remote sources live in a temporary
/// file that is deleted on drop.
#[derive(Debug)]
pub enum LocalCopy {
    Path(PathBuf),
    Temp(NamedTempFile),
}

impl LocalCopy {
    /// Path to open the container at.
    pub fn path(&self) -> &Path {
        match self {
            LocalCopy::Path(p) => p,
            LocalCopy::Temp(t) => t.path(),
        }
    }
}

/// Read an entire source object into memory.
///
/// `region` overrides the S3 region; public buckets are read without
/// credentials (request signing skipped).
pub async fn fetch_bytes(
    location: &SourceLocation,
    region: Option<&str>,
) -> DataStreamResult<Bytes> {
    match location {
        SourceLocation::Local(path) => {
            let bytes = std::fs::read(path)?;
            Ok(Bytes::from(bytes))
        }
        SourceLocation::S3 { bucket, key } => {
            // The builder refuses to build without a region; public-bucket
            // reads work regardless of which one is configured.
            let region = region
                .map(str::to_string)
                .or_else(|| std::env::var("AWS_REGION").ok())
                .unwrap_or_else(|| "us-east-1".to_string());

            let store = AmazonS3Builder::from_env()
                .with_bucket_name(bucket)
                .with_region(region)
                .with_skip_signature(true)
                .build()
                .map_err(|e| {
                    DataStreamError::SourceLoad(format!("Failed to create S3 client: {}", e))
                })?;

            let object_path = ObjectPath::from(key.as_str());
            let result = store.get(&object_path).await.map_err(|e| {
                DataStreamError::SourceLoad(format!(
                    "Failed to read s3://{}/{}: {}",
                    bucket, key, e
                ))
            })?;
            let bytes = result.bytes().await.map_err(|e| {
                DataStreamError::SourceLoad(format!("Failed to read object bytes: {}", e))
            })?;

            debug!(bucket = %bucket, key = %key, size = bytes.len(), "Fetched object");
            Ok(bytes)
        }
    }
}

/// Resolve a URL and make its content available at a local path.
///
/// Remote objects are downloaded in full to a temporary file with the
/// given suffix (e.g. `.gpkg`, `.nc`).
pub async fn fetch_to_temp(url: &str, suffix: &str) -> DataStreamResult<LocalCopy> {
    let location = SourceLocation::parse(url)?;

    match location {
        SourceLocation::Local(path) => Ok(LocalCopy::Path(path)),
        remote @ SourceLocation::S3 { .. } => {
            let bytes = fetch_bytes(&remote, None).await?;

            let mut tmp = tempfile::Builder::new().suffix(suffix).tempfile()?;
            tmp.write_all(&bytes)?;
            tmp.flush()?;
            Ok(LocalCopy::Temp(tmp))
        }
    }
}
