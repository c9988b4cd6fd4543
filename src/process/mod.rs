// src/process/mod.rs
//! Raw per-prefix files → flat rows keyed by origin prefix.

pub mod schema;

use anyhow::{anyhow, Context, Result};
use glob::{glob, Pattern};
use std::{
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};
use tracing::{debug, info, instrument};

use crate::config::Config;
pub use schema::{BANNER_LINES, FLAT_COLUMNS, FLAT_HEADER};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlattenSummary {
    pub flattened: usize,
    pub skipped: usize,
    pub rows: usize,
}

/// Copy the data rows of one raw file to `writer`, each prefixed with `origin,`.
///
/// The header line is written first. The first [`BANNER_LINES`] input lines
/// are dropped unread. Reading stops for good at the first line whose second
/// comma-separated field is empty; anything after it is ignored. A line with
/// no second field at all is an error.
///
/// Returns the number of rows written.
pub fn flatten_lines<R: BufRead, W: Write>(origin: &str, reader: R, mut writer: W) -> Result<usize> {
    writeln!(writer, "{}", FLAT_HEADER)?;

    let mut rows = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", index + 1))?;
        if index < BANNER_LINES {
            continue;
        }
        let line = line.strip_suffix('\r').unwrap_or(&line);

        let destination = line.trim().split(',').nth(1).ok_or_else(|| {
            anyhow!("line {} has no destination field: {:?}", index + 1, line)
        })?;
        if destination.is_empty() {
            debug!(line = index + 1, "end of data");
            break;
        }

        writeln!(writer, "{},{}", origin, line)?;
        rows += 1;
    }

    writer.flush()?;
    Ok(rows)
}

/// Flatten `src` into `dst`. Output goes to a `.part` sibling first and is
/// renamed into place only once complete.
pub fn flatten_file(src: &Path, dst: &Path, origin: &str) -> Result<usize> {
    let reader = BufReader::new(File::open(src).with_context(|| format!("opening {:?}", src))?);

    let part = dst.with_extension("csv.part");
    let writer =
        BufWriter::new(File::create(&part).with_context(|| format!("creating {:?}", part))?);

    match flatten_lines(origin, reader, writer) {
        Ok(rows) => {
            fs::rename(&part, dst)
                .with_context(|| format!("renaming {:?} to {:?}", part, dst))?;
            Ok(rows)
        }
        Err(e) => {
            let _ = fs::remove_file(&part);
            Err(e)
        }
    }
}

/// Flatten every raw `*.csv` in the scrape directory that has no flattened
/// counterpart yet. The first failing file aborts the run.
#[instrument(level = "info", skip_all, fields(dir = %config.scrape_dir.display()))]
pub fn flatten_all(config: &Config) -> Result<FlattenSummary> {
    let raw_dir = &config.scrape_dir;
    let parsed_dir = config.parsed_dir();
    fs::create_dir_all(&parsed_dir).with_context(|| format!("creating {:?}", parsed_dir))?;

    let pattern = format!("{}/*.csv", Pattern::escape(&raw_dir.to_string_lossy()));
    let mut summary = FlattenSummary::default();

    for entry in glob(&pattern)? {
        let path = entry?;
        if path.is_dir() {
            continue;
        }
        let origin = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("unusable file name {:?}", path))?;

        let dst = parsed_dir.join(format!("{}.csv", origin));
        if dst.exists() {
            debug!(file = %path.display(), "skipping (already flattened)");
            summary.skipped += 1;
            continue;
        }

        let rows = flatten_file(&path, &dst, origin)
            .with_context(|| format!("flattening {:?}", path))?;
        info!(file = %path.display(), rows, "flattened");
        summary.flattened += 1;
        summary.rows += rows;
    }

    info!(
        flattened = summary.flattened,
        skipped = summary.skipped,
        rows = summary.rows,
        "flatten finished"
    );
    Ok(summary)
}
