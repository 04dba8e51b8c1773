//! One-shot conversion pipeline shared by the CLI and the HTTP service.

use arrow::record_batch::RecordBatch;
use tracing::info;

use hydro_common::DataStreamResult;
use hydrofabric::extract_gages;
use troute_table::load_troute_batch;

use crate::merge::merge_crosswalk;
use crate::output::concat_merged;
use crate::reference::{CrosswalkIndex, CrosswalkSource};

/// Convert one NetCDF container to a merged batch.
///
/// Loads the time series, the hydrofabric gage list, and the crosswalk
/// reference, then merges. Fail-fast: the first loader error aborts the
/// whole conversion and nothing is emitted.
pub async fn convert_nc(
    nc_url: &str,
    gpkg_url: &str,
    xwalk: &CrosswalkSource,
) -> DataStreamResult<RecordBatch> {
    let batch = load_troute_batch(nc_url).await?;
    let pairs = extract_gages(gpkg_url).await?;
    let index = CrosswalkIndex::load(xwalk).await?;

    merge_crosswalk(&batch, &pairs, &index)
}

/// Convert several NetCDF containers against one hydrofabric and
/// concatenate the merged tables row-wise.
///
/// The gage list and crosswalk index are loaded once and reused for every
/// file; each container is still converted independently.
pub async fn convert_nc_batch(
    nc_urls: &[String],
    gpkg_url: &str,
    xwalk: &CrosswalkSource,
) -> DataStreamResult<RecordBatch> {
    let pairs = extract_gages(gpkg_url).await?;
    let index = CrosswalkIndex::load(xwalk).await?;

    let mut merged = Vec::with_capacity(nc_urls.len());
    for nc_url in nc_urls {
        let batch = load_troute_batch(nc_url).await?;
        merged.push(merge_crosswalk(&batch, &pairs, &index)?);
    }

    info!(files = nc_urls.len(), "Converted batch of containers");
    concat_merged(&merged)
}
