// src/db/mod.rs
//! Relational store: connection setup, the staging loader and the zone transforms.

pub mod load;
pub mod service_level;
pub mod transform;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

use crate::config::DatabaseConfig;
pub use service_level::ServiceLevel;

/// Open the database named by `config`, creating the file if needed.
pub fn open(config: &DatabaseConfig) -> Result<Connection> {
    let conn = Connection::open(&config.path)
        .with_context(|| format!("opening database {:?}", config.path))?;
    prepare(&conn)?;
    debug!(path = %config.path.display(), "database open");
    Ok(conn)
}

/// Private in-memory database with the same setup as [`open`].
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("opening in-memory database")?;
    prepare(&conn)?;
    Ok(conn)
}

fn prepare(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .context("enabling foreign keys")?;
    Ok(())
}

/// `SELECT COUNT(*) FROM <table>`; `table` must be a trusted identifier.
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        .with_context(|| format!("counting rows of {}", table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{process, Config};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_open_enables_foreign_keys() -> Result<()> {
        let tmp = tempdir()?;
        let conn = open(&DatabaseConfig {
            path: tmp.path().join("zones.db"),
        })?;
        let enabled: i64 = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0))?;
        assert_eq!(enabled, 1);
        assert!(tmp.path().join("zones.db").exists());
        Ok(())
    }

    #[test]
    fn test_in_memory_matches_file_setup() -> Result<()> {
        let conn = open_in_memory()?;
        let enabled: i64 = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0))?;
        assert_eq!(enabled, 1);
        Ok(())
    }

    #[test]
    fn test_raw_files_flow_into_zone_mappings() -> Result<()> {
        let tmp = tempdir()?;
        let config = Config {
            scrape_dir: tmp.path().join("raw"),
            database: DatabaseConfig {
                path: tmp.path().join("zones.db"),
            },
            ..Default::default()
        };
        fs::create_dir_all(&config.scrape_dir)?;

        let banner = ",a,b\n".to_string() + &"0,,\n".repeat(8);
        fs::write(
            config.scrape_dir.join("100.csv"),
            format!("{banner}0,200,2,-,1,-,1,1,,\n1,201,3,3,2,2,2,1,,\n2,,,,,,,,,\n3,202,9,9,9,9,9,9,,\n"),
        )?;
        fs::write(
            config.scrape_dir.join("101.csv"),
            format!("{banner}0,200,-,-,-,-,-,-,,\n"),
        )?;

        process::flatten_all(&config)?;
        let mut conn = open(&config.database)?;
        let loaded = load::load_all(&mut conn, &config.parsed_dir())?;
        assert_eq!(loaded.rows, 3);

        let summary = transform::run(&mut conn)?;
        assert_eq!(summary.zones, 3);
        assert_eq!(summary.zone_mappings, 4 + 6);
        assert_eq!(
            transform::lookup_zone(&conn, "100", "201", ServiceLevel::Ground)?.as_deref(),
            Some("3")
        );
        assert_eq!(
            transform::lookup_zone(&conn, "100", "202", ServiceLevel::Ground)?,
            None
        );
        assert_eq!(
            transform::lookup_zone(&conn, "101", "200", ServiceLevel::NextDayAir)?,
            None
        );
        Ok(())
    }
}
