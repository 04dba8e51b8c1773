//! The crosswalk merge: join a t-route batch with gage and crosswalk data.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringBuilder};
use arrow::datatypes::{DataType, Field, FieldRef, Schema};
use arrow::record_batch::RecordBatch;
use tracing::{debug, info};

use hydro_common::{DataStreamError, DataStreamResult};
use hydrofabric::GagePair;

use crate::reference::CrosswalkIndex;

/// Derived identifiers for a single network segment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DerivedIds {
    ngen_id: String,
    usgs_id: String,
    nwm_id: String,
}

/// Attach `ngen_id`, `usgs_id` and `nwm_id` columns to the batch.
///
/// A left join on `feature_id`: every input row is retained exactly once,
/// and the three derived columns are appended regardless of match rate, so
/// the output schema is stable. Unmatched segments get nulls.
///
/// Two silent-degradation policies apply per gage pair, both deliberate:
/// a segment token whose trailing numeric part does not parse contributes
/// nothing, and when several pairs resolve to the same `feature_id` only
/// the first (in extraction order) determines the derived columns.
pub fn merge_crosswalk(
    batch: &RecordBatch,
    pairs: &[GagePair],
    index: &CrosswalkIndex,
) -> DataStreamResult<RecordBatch> {
    let derived = derive_crosswalk_rows(pairs, index);

    let feature_ids = batch
        .column_by_name("feature_id")
        .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
        .ok_or_else(|| {
            DataStreamError::Merge("Batch is missing an Int64 feature_id column".to_string())
        })?;

    let n_rows = batch.num_rows();
    let mut ngen = StringBuilder::new();
    let mut usgs = StringBuilder::new();
    let mut nwm = StringBuilder::new();

    for i in 0..n_rows {
        match derived.get(&feature_ids.value(i)) {
            Some(ids) => {
                ngen.append_value(&ids.ngen_id);
                usgs.append_value(&ids.usgs_id);
                nwm.append_value(&ids.nwm_id);
            }
            None => {
                ngen.append_null();
                usgs.append_null();
                nwm.append_null();
            }
        }
    }

    let mut fields: Vec<FieldRef> = batch.schema().fields().iter().cloned().collect();
    fields.push(Arc::new(Field::new("ngen_id", DataType::Utf8, true)));
    fields.push(Arc::new(Field::new("usgs_id", DataType::Utf8, true)));
    fields.push(Arc::new(Field::new("nwm_id", DataType::Utf8, true)));

    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    columns.push(Arc::new(ngen.finish()));
    columns.push(Arc::new(usgs.finish()));
    columns.push(Arc::new(nwm.finish()));

    let merged = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .map_err(|e| DataStreamError::Merge(e.to_string()))?;

    info!(
        rows = merged.num_rows(),
        matched_segments = derived.len(),
        gage_pairs = pairs.len(),
        "Merged crosswalk columns"
    );
    Ok(merged)
}

/// Resolve gage pairs to per-segment derived identifiers.
///
/// Processes pairs in extraction order; the first pair that resolves to a
/// given `feature_id` wins over any later one.
fn derive_crosswalk_rows(
    pairs: &[GagePair],
    index: &CrosswalkIndex,
) -> HashMap<i64, DerivedIds> {
    let mut derived: HashMap<i64, DerivedIds> = HashMap::new();

    for pair in pairs {
        // "wb-2855078" -> "2855078"
        let flowpath_token = pair.segment.rsplit('-').next().unwrap_or(&pair.segment);
        let feature_id: i64 = match flowpath_token.parse() {
            Ok(id) => id,
            Err(_) => {
                debug!(segment = %pair.segment, "Skipping unparseable segment token");
                continue;
            }
        };

        let usgs_key = format!("usgs-{}", pair.gage);
        let Some(nwm_id) = index.get(&usgs_key) else {
            debug!(usgs_key = %usgs_key, "Gage not present in crosswalk");
            continue;
        };

        if derived.contains_key(&feature_id) {
            // First pair for this segment already decided the columns.
            continue;
        }
        derived.insert(
            feature_id,
            DerivedIds {
                ngen_id: format!("ngen-{}", flowpath_token),
                usgs_id: usgs_key,
                nwm_id: nwm_id.to_string(),
            },
        );
    }

    derived
}
