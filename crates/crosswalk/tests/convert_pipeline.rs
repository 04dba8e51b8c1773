//! End-to-end conversion tests against local fixture containers.
//!
//! Builds a small t-route NetCDF file, a v2.2 hydrofabric GeoPackage and a
//! crosswalk Parquet table in a temp directory, then runs the one-shot
//! pipeline both services use.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rusqlite::Connection;

use crosswalk::{convert_nc, convert_nc_batch, CrosswalkSource};

fn write_troute_nc(path: &Path) {
    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("feature_id", 3).unwrap();

    let mut fid = file
        .add_variable::<i64>("feature_id", &["feature_id"])
        .unwrap();
    fid.put_values(&[10i64, 20, 30], ..).unwrap();

    let mut flow = file.add_variable::<f64>("flow", &["feature_id"]).unwrap();
    flow.put_values(&[5.0f64, 6.0, 7.0], ..).unwrap();
}

fn write_hydrofabric_gpkg(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE gpkg_contents (table_name TEXT);
         INSERT INTO gpkg_contents VALUES ('pois');
         CREATE TABLE \"flowpath-attributes\" (id TEXT, gage TEXT);
         INSERT INTO \"flowpath-attributes\" VALUES ('wb-10', '0001');
         INSERT INTO \"flowpath-attributes\" VALUES ('wb-20', '9999');",
    )
    .unwrap();
}

fn write_xwalk_parquet(path: &Path) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("primary_location_id", DataType::Utf8, true),
        Field::new("secondary_location_id", DataType::Utf8, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(vec!["usgs-0001"])),
            Arc::new(StringArray::from(vec!["nwm-A"])),
        ],
    )
    .unwrap();

    let file = std::fs::File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

struct Fixture {
    _dir: tempfile::TempDir,
    nc: String,
    gpkg: String,
    xwalk: CrosswalkSource,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let nc = dir.path().join("troute.nc");
    let gpkg = dir.path().join("vpu.gpkg");
    let xwalk = dir.path().join("xwalk.parquet");
    write_troute_nc(&nc);
    write_hydrofabric_gpkg(&gpkg);
    write_xwalk_parquet(&xwalk);

    Fixture {
        nc: nc.to_str().unwrap().to_string(),
        gpkg: gpkg.to_str().unwrap().to_string(),
        xwalk: CrosswalkSource {
            url: xwalk.to_str().unwrap().to_string(),
            region: "us-east-2".to_string(),
        },
        _dir: dir,
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> &'a StringArray {
    batch
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap()
}

#[tokio::test]
async fn convert_merges_crosswalk_columns() {
    let fx = fixture();
    let merged = convert_nc(&fx.nc, &fx.gpkg, &fx.xwalk).await.unwrap();

    assert_eq!(merged.num_rows(), 3);

    let fid = merged
        .column_by_name("feature_id")
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(&fid.values()[..], &[10, 20, 30]);

    let usgs = string_column(&merged, "usgs_id");
    let nwm = string_column(&merged, "nwm_id");
    let ngen = string_column(&merged, "ngen_id");

    assert_eq!(ngen.value(0), "ngen-10");
    assert_eq!(usgs.value(0), "usgs-0001");
    assert_eq!(nwm.value(0), "nwm-A");

    // Gage 9999 is not in the crosswalk; feature 30 has no gage pair.
    for i in [1, 2] {
        assert!(usgs.is_null(i));
        assert!(nwm.is_null(i));
        assert!(ngen.is_null(i));
    }
}

#[tokio::test]
async fn batch_conversion_concatenates_rows() {
    let fx = fixture();
    let urls = vec![fx.nc.clone(), fx.nc.clone()];
    let merged = convert_nc_batch(&urls, &fx.gpkg, &fx.xwalk).await.unwrap();

    assert_eq!(merged.num_rows(), 6);
    let usgs = string_column(&merged, "usgs_id");
    assert_eq!(usgs.value(0), "usgs-0001");
    assert_eq!(usgs.value(3), "usgs-0001");
}

#[tokio::test]
async fn missing_netcdf_aborts_the_conversion() {
    let fx = fixture();
    let result = convert_nc("/nonexistent/troute.nc", &fx.gpkg, &fx.xwalk).await;
    assert!(result.is_err());
}
