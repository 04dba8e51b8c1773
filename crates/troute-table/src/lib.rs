//! Flattening of t-route NetCDF output into Arrow record batches.
//!
//! t-route writes one NetCDF container per simulation with a `feature_id`
//! dimension (stream-network segments) and data variables such as `flow`,
//! `velocity` and `depth`, optionally indexed by `time` as well. This crate
//! flattens that into a flat table with one row per (time, segment)
//! combination, time-major, matching the container's dimension order.
//!
//! The `netcdf` library needs a real file path, so remote containers are
//! staged through a temporary file by `hydro-common`.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use tracing::{debug, info};

use hydro_common::{fetch_to_temp, DataStreamError, DataStreamResult};

/// Load a t-route time-series container and flatten it to a record batch.
///
/// `source` is a local path or an `s3://` URL; public buckets are read
/// anonymously.
pub async fn load_troute_batch(source: &str) -> DataStreamResult<RecordBatch> {
    let copy = fetch_to_temp(source, ".nc").await?;
    flatten_local(copy.path())
}

/// Flatten a local NetCDF file.
///
/// The output always has a `feature_id` (Int64) column; a `time` (Float64)
/// column when the container has a `time` coordinate; and one Float64
/// column per numeric data variable indexed by `feature_id`.
pub fn flatten_local(path: &Path) -> DataStreamResult<RecordBatch> {
    let file = netcdf::open(path)
        .map_err(|e| DataStreamError::SourceLoad(format!("Failed to open NetCDF: {}", e)))?;

    let feature_var = file.variable("feature_id").ok_or_else(|| {
        DataStreamError::SourceLoad("NetCDF is missing the feature_id variable".to_string())
    })?;
    let feature_ids: Vec<i64> = feature_var
        .get_values(..)
        .map_err(|e| DataStreamError::SourceLoad(format!("Failed to read feature_id: {}", e)))?;
    let n_features = feature_ids.len();

    let time_values: Option<Vec<f64>> = match file.variable("time") {
        Some(var) => Some(var.get_values(..).map_err(|e| {
            DataStreamError::SourceLoad(format!("Failed to read time: {}", e))
        })?),
        None => None,
    };
    let n_times = time_values.as_ref().map(|t| t.len()).unwrap_or(1);
    let n_rows = n_features * n_times;

    let mut fields: Vec<Field> = Vec::new();
    let mut columns: Vec<ArrayRef> = Vec::new();

    // Index columns first: time-major row order, so feature_id tiles once
    // per time step and each time value repeats across all features.
    if let Some(times) = &time_values {
        let mut repeated = Vec::with_capacity(n_rows);
        for &t in times {
            repeated.extend(std::iter::repeat(t).take(n_features));
        }
        fields.push(Field::new("time", DataType::Float64, false));
        columns.push(Arc::new(Float64Array::from(repeated)));
    }

    let mut tiled_features = Vec::with_capacity(n_rows);
    for _ in 0..n_times {
        tiled_features.extend_from_slice(&feature_ids);
    }
    fields.push(Field::new("feature_id", DataType::Int64, false));
    columns.push(Arc::new(Int64Array::from(tiled_features)));

    let mut data_columns = 0usize;
    for var in file.variables() {
        let name = var.name();
        if name == "feature_id" || name == "time" {
            continue;
        }

        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let dim_names: Vec<&str> = dims.iter().map(String::as_str).collect();

        // Non-numeric variables fail conversion to f64; skip them.
        let values: Vec<f64> = match var.get_values(..) {
            Ok(v) => v,
            Err(e) => {
                debug!(variable = %name, error = %e, "Skipping unreadable variable");
                continue;
            }
        };

        let flattened = match dim_names.as_slice() {
            ["feature_id"] => {
                if values.len() != n_features {
                    return Err(shape_error(&name, values.len(), n_features));
                }
                // Per-segment variable: tile across every time step.
                let mut tiled = Vec::with_capacity(n_rows);
                for _ in 0..n_times {
                    tiled.extend_from_slice(&values);
                }
                tiled
            }
            ["time", "feature_id"] => {
                if values.len() != n_rows {
                    return Err(shape_error(&name, values.len(), n_rows));
                }
                values
            }
            ["feature_id", "time"] => {
                if values.len() != n_rows {
                    return Err(shape_error(&name, values.len(), n_rows));
                }
                // Stored segment-major; transpose to the time-major row order.
                let mut transposed = Vec::with_capacity(n_rows);
                for t in 0..n_times {
                    for f in 0..n_features {
                        transposed.push(values[f * n_times + t]);
                    }
                }
                transposed
            }
            other => {
                debug!(variable = %name, dims = ?other, "Skipping variable with unexpected dimensions");
                continue;
            }
        };

        fields.push(Field::new(name.as_str(), DataType::Float64, false));
        columns.push(Arc::new(Float64Array::from(flattened)));
        data_columns += 1;
    }

    if data_columns == 0 {
        return Err(DataStreamError::SourceLoad(
            "NetCDF has no data variables indexed by feature_id".to_string(),
        ));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema, columns)
        .map_err(|e| DataStreamError::SourceLoad(format!("Failed to assemble batch: {}", e)))?;

    info!(
        rows = batch.num_rows(),
        features = n_features,
        times = n_times,
        variables = data_columns,
        "Flattened t-route output"
    );
    Ok(batch)
}

fn shape_error(variable: &str, actual: usize, expected: usize) -> DataStreamError {
    DataStreamError::SourceLoad(format!(
        "Variable {} has {} values, expected {}",
        variable, actual, expected
    ))
}
