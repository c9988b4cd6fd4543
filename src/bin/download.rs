use anyhow::Result;
use zonescrape::{fetch, logging, Config};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let config = Config::discover()?;
    let client = fetch::client()?;
    fetch::fetch_all(&client, &config).await?;
    Ok(())
}
