use anyhow::Result;
use zonescrape::{db, logging, Config};

fn main() -> Result<()> {
    logging::init();
    let config = Config::discover()?;
    let mut conn = db::open(&config.database)?;
    db::load::load_all(&mut conn, &config.parsed_dir())?;
    Ok(())
}
