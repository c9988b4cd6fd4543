use anyhow::Result;
use zonescrape::{db, logging, Config};

fn main() -> Result<()> {
    logging::init();
    let config = Config::discover()?;
    let mut conn = db::open(&config.database)?;
    db::transform::run(&mut conn)?;
    Ok(())
}
