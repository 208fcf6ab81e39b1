use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

use vehicle_scraper_lib::infrastructure::logging::{init_logging_with_config, log_system_info};
use vehicle_scraper_lib::ConfigManager;

#[tokio::main]
async fn main() -> Result<()> {
    let manager = match std::env::args_os().nth(1) {
        Some(path) => ConfigManager::with_path(PathBuf::from(path)),
        None => ConfigManager::new()?,
    };
    let config = manager.load_config().await?;

    init_logging_with_config(&config.logging)?;
    log_system_info();
    info!("Using configuration: {:?}", manager.config_path());

    let output_path = config.crawler.output_path.clone();
    let summary = vehicle_scraper_lib::run(config).await?;

    println!(
        "Scraped {} item(s) from {} request(s) ({} search page(s), {} failed) into {}",
        summary.items_scraped,
        summary.requests_handled,
        summary.search_pages,
        summary.failed_requests,
        output_path.display()
    );
    Ok(())
}
