// src/db/load.rs
use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use glob::{glob, Pattern};
use rusqlite::{params_from_iter, Connection, Statement};
use std::path::Path;
use tracing::{info, instrument};

use crate::process::FLAT_COLUMNS;

/// Landing table for flattened rows. Everything is text; nothing is validated here.
const CREATE_RAW_DATA: &str = "
    CREATE TABLE IF NOT EXISTS raw_data(
        origin TEXT,
        idx TEXT,
        destination TEXT,
        ground TEXT,
        three_day_select TEXT,
        two_day_air TEXT,
        two_day_air_am TEXT,
        next_day_air_saver TEXT,
        next_day_air TEXT,
        unknown1 TEXT,
        unknown2 TEXT
    );
";

const INSERT_RAW_DATA: &str = "
    INSERT INTO raw_data(
        origin, idx, destination,
        ground, three_day_select, two_day_air, two_day_air_am, next_day_air_saver, next_day_air,
        unknown1, unknown2
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub files: usize,
    pub rows: usize,
}

pub fn ensure_staging_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_RAW_DATA)
        .context("creating raw_data")
}

/// Replace the contents of `raw_data` with every flattened file in `parsed_dir`.
///
/// Runs as one transaction: a bad file rolls the table back to what it held
/// before the call.
#[instrument(level = "info", skip(conn))]
pub fn load_all(conn: &mut Connection, parsed_dir: &Path) -> Result<LoadSummary> {
    let tx = conn.transaction().context("starting load transaction")?;
    ensure_staging_table(&tx)?;
    tx.execute("DELETE FROM raw_data", [])
        .context("truncating raw_data")?;

    let pattern = format!("{}/*.csv", Pattern::escape(&parsed_dir.to_string_lossy()));
    let mut summary = LoadSummary::default();
    {
        let mut insert = tx.prepare(INSERT_RAW_DATA)?;
        for entry in glob(&pattern)? {
            let path = entry?;
            if path.is_dir() {
                continue;
            }
            let rows =
                copy_file(&mut insert, &path).with_context(|| format!("loading {:?}", path))?;
            info!(file = %path.display(), rows, "loaded");
            summary.files += 1;
            summary.rows += rows;
        }
    }

    tx.commit().context("committing raw_data")?;
    info!(files = summary.files, rows = summary.rows, "load finished");
    Ok(summary)
}

/// Stream one flattened file through `insert`. Empty fields become NULL.
fn copy_file(insert: &mut Statement<'_>, path: &Path) -> Result<usize> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let width = rdr.headers()?.len();
    if width != FLAT_COLUMNS.len() {
        bail!(
            "header has {} columns, expected {}",
            width,
            FLAT_COLUMNS.len()
        );
    }

    let mut rows = 0;
    for (idx, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("CSV parse error at record {}", idx + 1))?;
        insert
            .execute(params_from_iter(
                record.iter().map(|f| if f.is_empty() { None } else { Some(f) }),
            ))
            .with_context(|| format!("inserting record {}", idx + 1))?;
        rows += 1;
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, logging::init_test_logging, process::FLAT_HEADER};
    use std::fs;
    use tempfile::tempdir;

    fn write_flat(dir: &Path, name: &str, rows: &[&str]) -> Result<()> {
        let mut text = format!("{}\n", FLAT_HEADER);
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        fs::write(dir.join(name), text)?;
        Ok(())
    }

    #[test]
    fn test_load_all_copies_every_file() -> Result<()> {
        init_test_logging();
        let tmp = tempdir()?;
        write_flat(
            tmp.path(),
            "100.csv",
            &["100,0,200,2,-,1,-,1,1,,", "100,1,201,3,3,2,2,2,1,,"],
        )?;
        write_flat(tmp.path(), "101.csv", &["101,0,200,4,4,2,2,2,1,,"])?;

        let mut conn = db::open_in_memory()?;
        let summary = load_all(&mut conn, tmp.path())?;
        assert_eq!(summary, LoadSummary { files: 2, rows: 3 });
        assert_eq!(db::count_rows(&conn, "raw_data")?, 3);

        let (sentinel, unknown): (Option<String>, Option<String>) = conn.query_row(
            "SELECT three_day_select, unknown1 FROM raw_data WHERE origin = '100' AND destination = '200'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        assert_eq!(sentinel.as_deref(), Some("-"));
        assert_eq!(unknown, None);
        Ok(())
    }

    #[test]
    fn test_reload_replaces_previous_rows() -> Result<()> {
        init_test_logging();
        let tmp = tempdir()?;
        write_flat(tmp.path(), "100.csv", &["100,0,200,2,2,2,2,2,2,,"])?;

        let mut conn = db::open_in_memory()?;
        load_all(&mut conn, tmp.path())?;
        load_all(&mut conn, tmp.path())?;
        assert_eq!(db::count_rows(&conn, "raw_data")?, 1);
        Ok(())
    }

    #[test]
    fn test_malformed_file_aborts_and_rolls_back() -> Result<()> {
        init_test_logging();
        let tmp = tempdir()?;
        write_flat(tmp.path(), "100.csv", &["100,0,200,2,2,2,2,2,2,,"])?;

        let mut conn = db::open_in_memory()?;
        load_all(&mut conn, tmp.path())?;

        write_flat(tmp.path(), "101.csv", &["101,0,200,2,2"])?;
        let err = load_all(&mut conn, tmp.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("101.csv"));

        // the earlier load is still intact
        assert_eq!(db::count_rows(&conn, "raw_data")?, 1);
        Ok(())
    }

    #[test]
    fn test_empty_directory_leaves_empty_table() -> Result<()> {
        let tmp = tempdir()?;
        let mut conn = db::open_in_memory()?;
        let summary = load_all(&mut conn, tmp.path())?;
        assert_eq!(summary, LoadSummary::default());
        assert_eq!(db::count_rows(&conn, "raw_data")?, 0);
        Ok(())
    }
}
