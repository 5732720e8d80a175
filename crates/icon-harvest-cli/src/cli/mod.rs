//! CLI for icon-harvest.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use icon_harvest_core::config::{self, Flavour};
use std::path::PathBuf;

use commands::{list_flavours, list_tags, run_harvest, RunOverrides};

/// Top-level CLI for icon-harvest.
#[derive(Debug, Parser)]
#[command(name = "icon-harvest")]
#[command(about = "Download every tag archive from the icon site and sort the icons by artist", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download, extract and clean up every tag archive.
    Run {
        /// Archive variant: svg-white, svg-black, png-white or png-black.
        #[arg(short, long, value_name = "FLAVOUR")]
        flavour: Option<Flavour>,
        /// Output folder (default from config, else ~/Downloads/game-icons).
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
        /// Tags processed at once in each phase.
        #[arg(short, long, value_name = "N")]
        parallel: Option<usize>,
        /// Leave the downloaded archives in the output folder.
        #[arg(long)]
        keep_archives: bool,
        /// Only harvest this tag (repeatable).
        #[arg(long = "tag", value_name = "NAME")]
        tags: Vec<String>,
    },

    /// List the tags on the site.
    Tags,

    /// List the archive flavours.
    Flavours,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run {
                flavour,
                output,
                parallel,
                keep_archives,
                tags,
            } => {
                let overrides = RunOverrides {
                    flavour,
                    output,
                    parallel,
                    keep_archives,
                };
                run_harvest(cfg, &overrides, &tags).await?
            }
            CliCommand::Tags => list_tags(&cfg).await?,
            CliCommand::Flavours => list_flavours(&cfg),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
