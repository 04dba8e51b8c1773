//! CLI configuration from the process environment.

use std::env;
use std::path::PathBuf;

use crosswalk::CrosswalkSource;
use hydro_common::{DataStreamError, DataStreamResult};

/// Required inputs for one conversion run.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Time-series source URL
    pub nc_url: String,
    /// Hydrofabric GeoPackage URL
    pub gpkg_url: String,
    /// Parquet output path
    pub output_path: PathBuf,
    /// Crosswalk reference location
    pub xwalk: CrosswalkSource,
}

impl ConvertConfig {
    /// Load configuration from environment variables.
    ///
    /// `S3_NC_URL`, `S3_GPKG_URL` and `OUTPUT_PATH` are required and must
    /// be non-empty; `XWALK_URL`/`XWALK_REGION` optionally override the
    /// crosswalk reference location.
    pub fn from_env() -> DataStreamResult<Self> {
        Ok(Self {
            nc_url: required_var("S3_NC_URL")?,
            gpkg_url: required_var("S3_GPKG_URL")?,
            output_path: PathBuf::from(required_var("OUTPUT_PATH")?),
            xwalk: CrosswalkSource::from_env(),
        })
    }
}

fn required_var(name: &str) -> DataStreamResult<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(DataStreamError::Configuration(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_var_is_a_configuration_error() {
        let err = required_var("NC2PARQUET_TEST_UNSET_VAR").unwrap_err();
        match err {
            DataStreamError::Configuration(name) => {
                assert_eq!(name, "NC2PARQUET_TEST_UNSET_VAR")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn empty_required_var_is_a_configuration_error() {
        env::set_var("NC2PARQUET_TEST_EMPTY_VAR", "  ");
        let err = required_var("NC2PARQUET_TEST_EMPTY_VAR").unwrap_err();
        assert!(matches!(err, DataStreamError::Configuration(_)));
        env::remove_var("NC2PARQUET_TEST_EMPTY_VAR");
    }
}
