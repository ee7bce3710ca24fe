use std::path::Path;

use anyhow::Context;
use log::info;

use ips_map::{Dataset, ViewerConfig, server};

/// Optional configuration file looked up in the working directory
const CONFIG_FILE: &str = "ips-map.json";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ViewerConfig::load_or_default(Path::new(CONFIG_FILE))
        .with_context(|| format!("Failed to read {CONFIG_FILE}"))?;

    info!(
        "Loading reference data from: {}",
        config.paths.data_dir.display()
    );
    let dataset = Dataset::global(&config).context("Failed to load reference data")?;
    info!(
        "IPS scale spans [{}, {}] over {} schools",
        dataset.scale().vmin,
        dataset.scale().vmax,
        dataset.schools().num_rows()
    );

    server::serve(dataset)
        .await
        .context("Map server stopped with an error")?;
    Ok(())
}
