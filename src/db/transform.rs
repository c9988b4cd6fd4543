// src/db/transform.rs
//! Reference tables and the (origin, destination, service level) → zone mapping.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use tracing::{info, instrument};

use super::{count_rows, ServiceLevel};

/// Country written to both sides of every mapping. Only domestic charts are
/// scraped so far.
pub const COUNTRY_CODE: &str = "US";

/// Rate cell meaning "service not offered for this pair".
pub const SENTINEL: &str = "-";

const CREATE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS zones(
        zone_id INTEGER PRIMARY KEY,
        zone TEXT UNIQUE NOT NULL,
        zone_sla TEXT,
        zone_price TEXT,
        zone_distance TEXT,
        zone_properties TEXT
    );

    CREATE TABLE IF NOT EXISTS service_levels(
        service_level_id INTEGER PRIMARY KEY,
        service_level TEXT UNIQUE NOT NULL,
        service_level_properties TEXT
    );

    CREATE TABLE IF NOT EXISTS zone_mappings(
        zone_mapping_id INTEGER PRIMARY KEY,
        origin_location TEXT,
        origin_country_code TEXT,
        destination_location TEXT,
        destination_country_code TEXT,
        service_level_id INTEGER REFERENCES service_levels(service_level_id),
        zone_id INTEGER REFERENCES zones(zone_id),
        UNIQUE(origin_location, origin_country_code, destination_location, destination_country_code, service_level_id, zone_id)
    );
";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransformSummary {
    pub zones: i64,
    pub service_levels: i64,
    pub zone_mappings: i64,
}

/// Every distinct rate value across the six service columns, minus
/// NULL, empty and the sentinel (bound as `?1`).
fn insert_zones_sql() -> String {
    let union = ServiceLevel::ALL
        .iter()
        .map(|level| format!("SELECT {} AS zone FROM raw_data", level.as_str()))
        .collect::<Vec<_>>()
        .join("\n        UNION ");
    format!(
        "INSERT INTO zones(zone)
        SELECT zone FROM (
        {union}
        )
        WHERE zone IS NOT NULL AND zone <> '' AND zone <> ?1
        ORDER BY zone"
    )
}

/// Unpivot the six rate columns into (origin, destination, service_level, zone)
/// records, resolve both surrogate keys and insert. `?1` is the country code.
fn insert_zone_mappings_sql() -> String {
    let expanded = ServiceLevel::ALL
        .iter()
        .map(|level| {
            format!(
                "SELECT origin, destination, '{0}' AS service_level, {0} AS zone FROM raw_data",
                level.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("\n            UNION ALL ");
    format!(
        "WITH data AS (
            {expanded}
        )
        INSERT INTO zone_mappings(
            origin_location,
            origin_country_code,
            destination_location,
            destination_country_code,
            service_level_id,
            zone_id
        )
        SELECT data.origin,
               ?1,
               data.destination,
               ?1,
               service_levels.service_level_id,
               zones.zone_id
        FROM data
        JOIN service_levels ON service_levels.service_level = data.service_level
        JOIN zones ON zones.zone = data.zone
        WHERE true
        ON CONFLICT DO NOTHING"
    )
}

/// Create the zone tables if needed and rebuild `zones` and `service_levels`
/// from the staging table. Existing mappings are cleared with them.
///
/// Returns the number of zones inserted.
#[instrument(level = "info", skip(conn))]
pub fn build_reference_tables(conn: &mut Connection) -> Result<usize> {
    let tx = conn.transaction().context("starting reference transaction")?;
    tx.execute_batch(CREATE_TABLES)
        .context("creating zone tables")?;
    tx.execute_batch(
        "DELETE FROM zone_mappings;
         DELETE FROM zones;
         DELETE FROM service_levels;",
    )
    .context("clearing reference tables")?;

    {
        let mut insert = tx.prepare("INSERT INTO service_levels(service_level) VALUES (?1)")?;
        for level in ServiceLevel::ALL {
            insert
                .execute([level.as_str()])
                .with_context(|| format!("inserting service level {}", level))?;
        }
    }

    let zones = tx
        .execute(&insert_zones_sql(), [SENTINEL])
        .context("inserting zones")?;

    tx.commit().context("committing reference tables")?;
    info!(zones, service_levels = ServiceLevel::ALL.len(), "reference tables rebuilt");
    Ok(zones)
}

/// Rebuild `zone_mappings` from the staging and reference tables.
///
/// Sentinel cells have no zone row, so the join drops them. Duplicate tuples
/// keep the first row inserted. Returns the number of mappings written.
#[instrument(level = "info", skip(conn))]
pub fn build_zone_mappings(conn: &mut Connection) -> Result<usize> {
    let tx = conn.transaction().context("starting mapping transaction")?;
    tx.execute("DELETE FROM zone_mappings", [])
        .context("clearing zone_mappings")?;
    let mappings = tx
        .execute(&insert_zone_mappings_sql(), [COUNTRY_CODE])
        .context("inserting zone mappings")?;
    tx.commit().context("committing zone mappings")?;
    info!(mappings, "zone mappings rebuilt");
    Ok(mappings)
}

/// Zone for one lane, if the carrier offers the service there.
pub fn lookup_zone(
    conn: &Connection,
    origin: &str,
    destination: &str,
    level: ServiceLevel,
) -> Result<Option<String>> {
    conn.query_row(
        "SELECT zones.zone
         FROM zone_mappings
         JOIN zones ON zones.zone_id = zone_mappings.zone_id
         JOIN service_levels ON service_levels.service_level_id = zone_mappings.service_level_id
         WHERE zone_mappings.origin_location = ?1
           AND zone_mappings.destination_location = ?2
           AND service_levels.service_level = ?3
         ORDER BY zone_mappings.zone_mapping_id
         LIMIT 1",
        [origin, destination, level.as_str()],
        |r| r.get(0),
    )
    .optional()
    .with_context(|| format!("looking up {} {}→{}", level, origin, destination))
}

pub fn summarize(conn: &Connection) -> Result<TransformSummary> {
    Ok(TransformSummary {
        zones: count_rows(conn, "zones")?,
        service_levels: count_rows(conn, "service_levels")?,
        zone_mappings: count_rows(conn, "zone_mappings")?,
    })
}

/// Both procedures in order, then a row count of the results.
pub fn run(conn: &mut Connection) -> Result<TransformSummary> {
    build_reference_tables(conn)?;
    build_zone_mappings(conn)?;
    let summary = summarize(conn)?;
    info!(
        zones = summary.zones,
        service_levels = summary.service_levels,
        zone_mappings = summary.zone_mappings,
        "transform finished"
    );
    Ok(summary)
}
