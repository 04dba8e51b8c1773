//! USGS/NWM crosswalk: reference loading, merge, and output encodings.
//!
//! The merge is the core of the datastream conversion: it joins a flattened
//! t-route batch, the hydrofabric gage list, and the USGS→NWM 3.0 crosswalk
//! reference into one denormalized table carrying `ngen_id`, `usgs_id` and
//! `nwm_id` columns. Everything around it (reference loading, Parquet and
//! Arrow IPC encodings, the one-shot pipeline) is thin plumbing.

pub mod convert;
pub mod merge;
pub mod output;
pub mod reference;

pub use convert::{convert_nc, convert_nc_batch};
pub use merge::merge_crosswalk;
pub use output::{concat_merged, to_ipc_stream, write_parquet};
pub use reference::{CrosswalkIndex, CrosswalkSource};
