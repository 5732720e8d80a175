//! `icon-harvest tags`: print the site's tag names.

use anyhow::Result;
use icon_harvest_core::config::{HarvestConfig, RunConfig};
use icon_harvest_core::harvest::Harvester;

pub async fn list_tags(cfg: &HarvestConfig) -> Result<()> {
    let run = RunConfig::from_config(cfg)?;
    let catalog = Harvester::new(run).catalog().await?;
    for tag in catalog.iter() {
        println!("{}", tag.name);
    }
    tracing::info!("listed {} tag(s)", catalog.len());
    Ok(())
}
