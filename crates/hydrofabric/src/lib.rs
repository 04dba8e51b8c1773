//! Gage extraction from hydrofabric GeoPackage containers.
//!
//! A hydrofabric GeoPackage maps stream-network flowpaths to USGS gages.
//! Two incompatible layouts exist in the wild (v2.0.1 and v2.2); the layout
//! is detected once per container from the `gpkg_contents` metadata table
//! and handled by a tagged variant, see [`schema::HydrofabricSchema`].

pub mod schema;

use rusqlite::Connection;
use tracing::info;

use hydro_common::{fetch_to_temp, DataStreamError, DataStreamResult};
use schema::HydrofabricSchema;

/// One (segment, gage) pair extracted from the hydrofabric.
///
/// `segment` is the raw flowpath token (e.g. `"wb-2855078"`), `gage` the
/// raw USGS gage number string. Pairs keep the container query order;
/// downstream dedup is first-match-wins, so the order is observable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GagePair {
    pub segment: String,
    pub gage: String,
}

/// Extract the ordered gage list from a hydrofabric GeoPackage.
///
/// `source` is a local path or an `s3://` URL. Remote containers are
/// downloaded to a temporary file which is removed when extraction
/// finishes, whether it succeeds or fails.
pub async fn extract_gages(source: &str) -> DataStreamResult<Vec<GagePair>> {
    let copy = fetch_to_temp(source, ".gpkg").await?;
    extract_gages_local(copy.path())
}

/// Run the extraction against a local GeoPackage file.
pub fn extract_gages_local(path: &std::path::Path) -> DataStreamResult<Vec<GagePair>> {
    let conn = Connection::open(path)
        .map_err(|e| DataStreamError::Extract(format!("Failed to open GeoPackage: {}", e)))?;

    let schema = HydrofabricSchema::detect(&conn)?;
    let pairs = schema.extract(&conn)?;

    info!(
        schema = schema.name(),
        gages = pairs.len(),
        "Extracted gages from hydrofabric"
    );
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn gpkg_v201(path: &std::path::Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE gpkg_contents (table_name TEXT);
             INSERT INTO gpkg_contents VALUES ('flowpath_attributes');
             CREATE TABLE flowpath_attributes (id TEXT, rl_gages TEXT);
             INSERT INTO flowpath_attributes VALUES ('wb-10', '01010000');
             INSERT INTO flowpath_attributes VALUES ('wb-20', '02020000,02020001');
             INSERT INTO flowpath_attributes VALUES ('wb-30', NULL);
             INSERT INTO flowpath_attributes VALUES ('wb-40', '');",
        )
        .unwrap();
    }

    fn gpkg_v22(path: &std::path::Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE gpkg_contents (table_name TEXT);
             INSERT INTO gpkg_contents VALUES ('pois');
             INSERT INTO gpkg_contents VALUES ('flowpath-attributes');
             CREATE TABLE \"flowpath-attributes\" (id TEXT, gage TEXT);
             INSERT INTO \"flowpath-attributes\" VALUES ('wb-11', '01111111');
             INSERT INTO \"flowpath-attributes\" VALUES ('wb-22', NULL);
             INSERT INTO \"flowpath-attributes\" VALUES ('wb-33', '03333333');",
        )
        .unwrap();
    }

    #[test]
    fn v201_keeps_first_comma_token_and_drops_empties() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v201.gpkg");
        gpkg_v201(&path);

        let pairs = extract_gages_local(&path).unwrap();
        assert_eq!(
            pairs,
            vec![
                GagePair { segment: "wb-10".into(), gage: "01010000".into() },
                GagePair { segment: "wb-20".into(), gage: "02020000".into() },
            ]
        );
    }

    #[test]
    fn v22_reads_dedicated_gage_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v22.gpkg");
        gpkg_v22(&path);

        let pairs = extract_gages_local(&path).unwrap();
        assert_eq!(
            pairs,
            vec![
                GagePair { segment: "wb-11".into(), gage: "01111111".into() },
                GagePair { segment: "wb-33".into(), gage: "03333333".into() },
            ]
        );
    }

    #[test]
    fn extraction_order_follows_query_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ordered.gpkg");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE gpkg_contents (table_name TEXT);
             CREATE TABLE flowpath_attributes (id TEXT, rl_gages TEXT);
             INSERT INTO flowpath_attributes VALUES ('wb-5', '05');
             INSERT INTO flowpath_attributes VALUES ('wb-1', '01');
             INSERT INTO flowpath_attributes VALUES ('wb-3', '03');",
        )
        .unwrap();
        drop(conn);

        let pairs = extract_gages_local(&path).unwrap();
        let segments: Vec<&str> = pairs.iter().map(|p| p.segment.as_str()).collect();
        assert_eq!(segments, vec!["wb-5", "wb-1", "wb-3"]);
    }

    #[tokio::test]
    async fn unsupported_scheme_is_rejected() {
        let err = extract_gages("ftp://example.com/hydrofabric.gpkg")
            .await
            .unwrap_err();
        match err {
            DataStreamError::UnsupportedSource(scheme) => assert_eq!(scheme, "ftp"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn missing_metadata_table_is_an_extract_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.gpkg");
        Connection::open(&path).unwrap();

        let err = extract_gages_local(&path).unwrap_err();
        assert!(matches!(err, DataStreamError::Extract(_)));
    }
}
