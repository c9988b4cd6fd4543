// src/fetch/mod.rs
//! Per-prefix download of the carrier's zone workbooks.

pub mod sheet;
pub mod urls;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use tokio::{fs, task};
use tracing::{info, instrument, warn};

use crate::config::Config;
use urls::{prefix_code, prefix_url};

/// What happened to one prefix. Transport and local I/O failures are not
/// outcomes; they surface as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Workbook converted and written with this many data rows.
    Saved { rows: usize },
    /// A raw file for the prefix already exists.
    Skipped,
    /// The remote has nothing for this prefix (404 / 410).
    NotFound,
    /// The remote answered, but not with a usable workbook.
    Unparseable(String),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    pub saved: usize,
    pub skipped: usize,
    pub not_found: usize,
    pub unparseable: usize,
}

impl FetchSummary {
    fn record(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Saved { .. } => self.saved += 1,
            FetchOutcome::Skipped => self.skipped += 1,
            FetchOutcome::NotFound => self.not_found += 1,
            FetchOutcome::Unparseable(_) => self.unparseable += 1,
        }
    }
}

pub fn client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("zonescrape/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")
}

/// `<dir>/<prefix>.csv`
pub fn raw_path(dir: &Path, prefix: u16) -> PathBuf {
    dir.join(format!("{}.csv", prefix_code(prefix)))
}

/// Fetch one prefix into `dest_dir`, unless its raw file is already there.
#[instrument(level = "debug", skip(client, template, dest_dir))]
pub async fn fetch_prefix(
    client: &Client,
    template: &str,
    prefix: u16,
    dest_dir: &Path,
) -> Result<FetchOutcome> {
    let dest = raw_path(dest_dir, prefix);
    if fs::try_exists(&dest)
        .await
        .with_context(|| format!("checking {:?}", dest))?
    {
        return Ok(FetchOutcome::Skipped);
    }

    let url = prefix_url(template, prefix)?;
    let resp = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {}", url))?;

    let status = resp.status();
    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        return Ok(FetchOutcome::NotFound);
    }

    let bytes = resp
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?
        .bytes()
        .await
        .with_context(|| format!("reading body from {}", url))?;

    let converted = task::spawn_blocking(move || {
        sheet::first_sheet(bytes.to_vec()).and_then(|range| sheet::sheet_to_csv(&range))
    })
    .await?;

    let csv = match converted {
        Ok(csv) => csv,
        Err(e) => return Ok(FetchOutcome::Unparseable(format!("{:#}", e))),
    };

    let part = dest.with_extension("csv.part");
    fs::write(&part, &csv.bytes)
        .await
        .with_context(|| format!("writing {:?}", part))?;
    fs::rename(&part, &dest)
        .await
        .with_context(|| format!("renaming {:?} to {:?}", part, dest))?;
    Ok(FetchOutcome::Saved { rows: csv.rows })
}

/// Walk the configured prefix range, one request at a time.
#[instrument(level = "info", skip_all, fields(dir = %config.scrape_dir.display()))]
pub async fn fetch_all(client: &Client, config: &Config) -> Result<FetchSummary> {
    let dest_dir = &config.scrape_dir;
    fs::create_dir_all(dest_dir)
        .await
        .with_context(|| format!("creating {:?}", dest_dir))?;

    let mut summary = FetchSummary::default();
    for prefix in config.prefixes() {
        let code = prefix_code(prefix);
        let outcome = fetch_prefix(client, &config.url_template, prefix, dest_dir).await?;
        match &outcome {
            FetchOutcome::Saved { rows } => info!(prefix = %code, rows, "saved"),
            FetchOutcome::Skipped => info!(prefix = %code, "skipping (already fetched)"),
            FetchOutcome::NotFound => warn!(prefix = %code, "no workbook published"),
            FetchOutcome::Unparseable(reason) => {
                warn!(prefix = %code, %reason, "unparseable workbook")
            }
        }
        summary.record(&outcome);
    }

    info!(
        saved = summary.saved,
        skipped = summary.skipped,
        not_found = summary.not_found,
        unparseable = summary.unparseable,
        "fetch finished"
    );
    Ok(summary)
}
