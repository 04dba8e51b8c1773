//! Hydrofabric container schema detection.

use rusqlite::Connection;

use hydro_common::{DataStreamError, DataStreamResult};

use crate::GagePair;

/// The two known hydrofabric GeoPackage layouts.
///
/// v2.2 introduced a `pois` table alongside a dedicated gage column; the
/// upstream format carries no explicit version field, so presence of that
/// table is the detection probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrofabricSchema {
    /// v2.0.1: `flowpath_attributes.rl_gages`, possibly comma-separated.
    V201,
    /// v2.2: `"flowpath-attributes".gage`, one gage per row.
    V22,
}

impl HydrofabricSchema {
    /// Probe `gpkg_contents` for the `pois` marker table.
    pub fn detect(conn: &Connection) -> DataStreamResult<Self> {
        let pois_count: i64 = conn
            .query_row(
                "SELECT count(*) FROM gpkg_contents WHERE table_name = 'pois'",
                [],
                |row| row.get(0),
            )
            .map_err(|e| {
                DataStreamError::Extract(format!("Failed to probe gpkg_contents: {}", e))
            })?;

        if pois_count == 0 {
            Ok(HydrofabricSchema::V201)
        } else {
            Ok(HydrofabricSchema::V22)
        }
    }

    /// Human-readable schema name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            HydrofabricSchema::V201 => "v2.0.1",
            HydrofabricSchema::V22 => "v2.2",
        }
    }

    /// Extract gage pairs in container query order.
    pub fn extract(&self, conn: &Connection) -> DataStreamResult<Vec<GagePair>> {
        match self {
            HydrofabricSchema::V201 => extract_v201(conn),
            HydrofabricSchema::V22 => extract_v22(conn),
        }
    }
}

fn extract_v201(conn: &Connection) -> DataStreamResult<Vec<GagePair>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, rl_gages
             FROM flowpath_attributes
             WHERE rl_gages IS NOT NULL",
        )
        .map_err(query_err)?;

    let rows = stmt
        .query_map([], |row| {
            let segment: String = row.get(0)?;
            let gages: String = row.get(1)?;
            Ok((segment, gages))
        })
        .map_err(query_err)?;

    let mut pairs = Vec::new();
    for row in rows {
        let (segment, gages) = row.map_err(query_err)?;
        // Multiple gages may be listed; only the first is kept.
        let first = gages.split(',').next().unwrap_or("").trim().to_string();
        if first.is_empty() {
            continue;
        }
        pairs.push(GagePair { segment, gage: first });
    }
    Ok(pairs)
}

fn extract_v22(conn: &Connection) -> DataStreamResult<Vec<GagePair>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, gage
             FROM \"flowpath-attributes\"
             WHERE gage IS NOT NULL",
        )
        .map_err(query_err)?;

    let rows = stmt
        .query_map([], |row| {
            let segment: String = row.get(0)?;
            let gage: String = row.get(1)?;
            Ok((segment, gage))
        })
        .map_err(query_err)?;

    let mut pairs = Vec::new();
    for row in rows {
        let (segment, gage) = row.map_err(query_err)?;
        let gage = gage.trim().to_string();
        if gage.is_empty() {
            continue;
        }
        pairs.push(GagePair { segment, gage });
    }
    Ok(pairs)
}

fn query_err(e: rusqlite::Error) -> DataStreamError {
    DataStreamError::Extract(format!("Gage query failed: {}", e))
}
