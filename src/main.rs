use anyhow::Result;
use tracing::info;
use zonescrape::{db, fetch, logging, process, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging + config ────────────────────────────────────
    logging::init();
    let config = Config::discover()?;
    info!(
        scrape_dir = %config.scrape_dir.display(),
        parsed_dir = %config.parsed_dir().display(),
        database = %config.database.path.display(),
        "startup"
    );

    // ─── 2) download one workbook per prefix ─────────────────────────
    let client = fetch::client()?;
    fetch::fetch_all(&client, &config).await?;

    // ─── 3) flatten raw files ────────────────────────────────────────
    process::flatten_all(&config)?;

    // ─── 4) bulk-load the staging table ──────────────────────────────
    let mut conn = db::open(&config.database)?;
    db::load::load_all(&mut conn, &config.parsed_dir())?;

    // ─── 5) reference tables + zone mappings ─────────────────────────
    db::transform::run(&mut conn)?;

    info!("all done");
    Ok(())
}
