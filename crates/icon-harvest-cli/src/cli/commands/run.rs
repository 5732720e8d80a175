//! `icon-harvest run`: the full pipeline.

use anyhow::{Context, Result};
use icon_harvest_core::config::{Flavour, HarvestConfig, RunConfig};
use icon_harvest_core::harvest::{HarvestEvent, Harvester};
use std::path::PathBuf;

/// Command-line values that take precedence over config.toml.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub flavour: Option<Flavour>,
    pub output: Option<PathBuf>,
    pub parallel: Option<usize>,
    pub keep_archives: bool,
}

/// Folds `overrides` into `cfg`.
pub fn apply_overrides(mut cfg: HarvestConfig, overrides: &RunOverrides) -> HarvestConfig {
    if let Some(flavour) = overrides.flavour {
        cfg.flavour = flavour;
    }
    if let Some(output) = &overrides.output {
        cfg.output_folder = Some(output.clone());
    }
    if let Some(parallel) = overrides.parallel {
        cfg.parallelism = parallel;
    }
    cfg.keep_archives |= overrides.keep_archives;
    cfg
}

pub async fn run_harvest(cfg: HarvestConfig, overrides: &RunOverrides, tags: &[String]) -> Result<()> {
    let cfg = apply_overrides(cfg, overrides);
    let run = RunConfig::from_config(&cfg)?;
    tracing::info!(
        flavour = %run.flavour,
        parallelism = run.parallelism,
        output = %run.output_folder.display(),
        "starting harvest"
    );

    // Events are dropped when the buffer is full; size it for a burst of
    // completions while the printer is behind.
    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<HarvestEvent>(1024);
    let progress_handle = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            match event {
                HarvestEvent::CatalogLoaded { tags } => println!("Found {} tags", tags),
                HarvestEvent::Downloaded { tag, reused: false } => println!("Downloaded zip for {}", tag),
                HarvestEvent::Downloaded { tag, reused: true } => println!("Reusing zip for {}", tag),
                HarvestEvent::LicenseWritten { .. } => println!("Wrote license file"),
                HarvestEvent::Extracted { tag, .. } => println!("Processed zip for {}", tag),
            }
        }
    });

    let harvester = Harvester::new(run).with_progress(progress_tx);
    let result = harvester.run(tags).await;
    // Dropping the harvester closes the channel so the printer can finish.
    drop(harvester);
    let _ = progress_handle.await;

    let report = result.context("harvest failed")?;
    tracing::info!(
        icons_written = report.icons_written,
        icons_skipped = report.icons_skipped,
        archives_removed = report.archives_removed,
        "run summary"
    );
    println!("Done. Extracted all icons to {}", report.output_folder.display());
    Ok(())
}
