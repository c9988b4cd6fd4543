use anyhow::Result;
use zonescrape::{logging, process, Config};

fn main() -> Result<()> {
    logging::init();
    let config = Config::discover()?;
    process::flatten_all(&config)?;
    Ok(())
}
