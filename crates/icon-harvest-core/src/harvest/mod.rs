//! Run orchestration: catalog, download phase, extract phase, cleanup.
//!
//! Both phases go through [`run_bounded`] with the configured parallelism.
//! Extraction starts only after every download has finished, and archives are
//! deleted only after every extraction has finished, so an interrupted run
//! leaves its archives behind for a cheap re-run.

mod stage;

pub use stage::{StageBoard, TagStage};

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use url::Url;

use crate::catalog::{require_flavour_link, CatalogIndex, Tag};
use crate::config::RunConfig;
use crate::downloader::{fetch_archive, Fetched};
use crate::error::HarvestError;
use crate::extractor::{extract_archive, ExtractStats};
use crate::fetch_page::fetch_html;
use crate::retry::run_with_retry;
use crate::runner::run_bounded;
use crate::state::HarvestState;
use crate::url_model::{archive_file_name, resolve_href};

/// Location of the tag list, relative to the base URL.
pub const TAGS_PATH: &str = "/tags.html";

/// Progress notifications for whoever drives the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    CatalogLoaded { tags: usize },
    /// The tag's archive is on disk; `reused` when no request was made.
    Downloaded { tag: String, reused: bool },
    Extracted { tag: String, stats: ExtractStats },
    LicenseWritten { tag: String },
}

/// An archive link resolved for one tag, and where it is stored locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArchive {
    pub tag: String,
    pub url: Url,
    pub local_path: PathBuf,
}

/// Summary of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub output_folder: PathBuf,
    pub tags: usize,
    pub archives_downloaded: usize,
    pub archives_reused: usize,
    pub icons_written: usize,
    pub icons_skipped: usize,
    pub license_written: bool,
    pub archives_removed: usize,
}

struct Shared {
    config: RunConfig,
    board: StageBoard,
    progress: Option<mpsc::Sender<HarvestEvent>>,
}

impl Shared {
    /// Never waits on the receiver: a full or closed channel drops the event.
    fn emit(&self, event: HarvestEvent) {
        if let Some(tx) = &self.progress {
            if let Err(e) = tx.try_send(event) {
                tracing::debug!("progress event dropped: {}", e);
            }
        }
    }
}

/// Drives one harvest with a fixed [`RunConfig`].
pub struct Harvester {
    config: RunConfig,
    progress: Option<mpsc::Sender<HarvestEvent>>,
}

impl Harvester {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Sends [`HarvestEvent`]s to `tx` as the run progresses.
    ///
    /// Events are dropped rather than waited on when the channel is full, so
    /// a slow or absent reader never stalls the run.
    pub fn with_progress(mut self, tx: mpsc::Sender<HarvestEvent>) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Fetches the tag list page and returns every tag on it.
    ///
    /// Detail page locations are resolved to absolute URLs. A page with no
    /// tags is a [`HarvestError::Parse`] error.
    pub async fn catalog(&self) -> Result<CatalogIndex, HarvestError> {
        let tags_url = resolve_href(&self.config.base_url, TAGS_PATH)?;
        let body = fetch_text(&self.config, tags_url.clone(), "tags page".to_string()).await?;

        let parsed = CatalogIndex::from_tag_list_page(&body);
        if parsed.is_empty() {
            return Err(HarvestError::Parse(format!("no tags found on {}", tags_url)));
        }
        let resolved: BTreeMap<String, String> = parsed
            .iter()
            .map(|tag| {
                let url = resolve_href(&tags_url, &tag.detail_page)?;
                Ok((tag.name, url.to_string()))
            })
            .collect::<Result<_, HarvestError>>()?;
        let catalog = CatalogIndex::new(resolved);
        tracing::info!(tags = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Runs the whole pipeline. A non-empty `only` restricts the run to those
    /// tags; naming a tag the site does not have is a configuration error.
    pub async fn run(&self, only: &[String]) -> Result<HarvestReport, HarvestError> {
        let config = &self.config;
        let mut catalog = self.catalog().await?;
        if !only.is_empty() {
            let unknown = catalog.retain_names(only);
            if !unknown.is_empty() {
                return Err(HarvestError::Config(format!("unknown tag(s): {}", unknown.join(", "))));
            }
        }

        let names: Vec<String> = catalog.iter().map(|t| t.name).collect();
        check_archive_names(&names)?;
        let shared = Arc::new(Shared {
            config: config.clone(),
            board: StageBoard::new(names.iter().map(String::as_str)),
            progress: self.progress.clone(),
        });
        shared.emit(HarvestEvent::CatalogLoaded { tags: catalog.len() });

        std::fs::create_dir_all(&config.output_folder)
            .map_err(|e| HarvestError::io(&config.output_folder, e))?;

        // Phase 1: detail page, flavour link, archive.
        let downloads = catalog.iter().map(|tag| {
            let shared = Arc::clone(&shared);
            move || async move {
                let name = tag.name.clone();
                let result = download_tag(&shared, tag).await;
                if result.is_err() {
                    shared.board.advance(&name, TagStage::Failed);
                }
                result
            }
        });
        let downloaded = run_bounded(downloads, config.parallelism).await?;

        let mut report = HarvestReport {
            output_folder: config.output_folder.clone(),
            tags: downloaded.len(),
            ..HarvestReport::default()
        };
        for (_, fetched) in &downloaded {
            match fetched {
                Fetched::AlreadyPresent => report.archives_reused += 1,
                Fetched::Downloaded { .. } => report.archives_downloaded += 1,
            }
        }
        let archives: Vec<ResolvedArchive> = downloaded.into_iter().map(|(a, _)| a).collect();

        // Phase 2: extraction, all archives sharing one license guard.
        let state = Arc::new(HarvestState::new(&config.output_folder));
        let extractions = archives.iter().cloned().map(|archive| {
            let shared = Arc::clone(&shared);
            let state = Arc::clone(&state);
            move || async move {
                let tag = archive.tag.clone();
                let result = extract_tag(&shared, state, archive).await;
                if result.is_err() {
                    shared.board.advance(&tag, TagStage::Failed);
                }
                result
            }
        });
        for stats in run_bounded(extractions, config.parallelism).await? {
            report.icons_written += stats.icons_written;
            report.icons_skipped += stats.icons_skipped;
            report.license_written |= stats.license_written;
        }

        // Phase 3: archives are disposable once everything is extracted.
        if config.keep_archives {
            tracing::debug!(count = archives.len(), "keeping archives");
        } else {
            report.archives_removed = remove_archives(&archives).await;
        }

        tracing::info!(
            tags = report.tags,
            icons = report.icons_written,
            output = %report.output_folder.display(),
            "harvest complete"
        );
        Ok(report)
    }

    /// Loads the tag's detail page and resolves the archive link for the
    /// configured flavour.
    pub async fn resolve_archive(&self, tag: &Tag) -> Result<ResolvedArchive, HarvestError> {
        let shared = Shared {
            config: self.config.clone(),
            board: StageBoard::new([tag.name.as_str()]),
            progress: None,
        };
        resolve_tag(&shared, tag).await
    }
}

async fn resolve_tag(shared: &Shared, tag: &Tag) -> Result<ResolvedArchive, HarvestError> {
    let config = &shared.config;
    let page_url = resolve_href(&config.base_url, &tag.detail_page)?;
    let body = fetch_text(config, page_url.clone(), format!("tag page '{}'", tag.name)).await?;
    shared.board.advance(&tag.name, TagStage::PageLoaded);

    let href = require_flavour_link(&body, &tag.name, config.flavour)?;
    let url = resolve_href(&page_url, &href)?;
    let file_name = archive_file_name(&tag.name)
        .ok_or_else(|| HarvestError::Parse(format!("tag '{}' has no usable file name", tag.name)))?;
    shared.board.advance(&tag.name, TagStage::LinkResolved);
    tracing::debug!(tag = %tag.name, %url, "archive link resolved");

    Ok(ResolvedArchive {
        tag: tag.name.clone(),
        url,
        local_path: config.output_folder.join(file_name),
    })
}

async fn download_tag(shared: &Shared, tag: Tag) -> Result<(ResolvedArchive, Fetched), HarvestError> {
    let archive = resolve_tag(shared, &tag).await?;
    let config = &shared.config;
    let what = format!("archive download for '{}'", archive.tag);

    let fetched = run_with_retry(&config.retry, &what, || {
        let tag = archive.tag.clone();
        let url = archive.url.to_string();
        let dest = archive.local_path.clone();
        let curl = config.curl;
        blocking(move || fetch_archive(&tag, &url, &dest, &curl))
    })
    .await?;

    shared.board.advance(&archive.tag, TagStage::Downloaded);
    shared.emit(HarvestEvent::Downloaded {
        tag: archive.tag.clone(),
        reused: fetched == Fetched::AlreadyPresent,
    });
    Ok((archive, fetched))
}

async fn extract_tag(
    shared: &Shared,
    state: Arc<HarvestState>,
    archive: ResolvedArchive,
) -> Result<ExtractStats, HarvestError> {
    let tag = archive.tag.clone();
    let stats = blocking(move || extract_archive(&archive.local_path, &archive.tag, &state)).await?;

    shared.board.advance(&tag, TagStage::Extracted);
    if stats.license_written {
        shared.emit(HarvestEvent::LicenseWritten { tag: tag.clone() });
    }
    shared.emit(HarvestEvent::Extracted { tag, stats });
    Ok(stats)
}

/// Fails when two tags would share one archive file, or a tag has none.
///
/// Concurrent downloads to the same `.part` file would corrupt each other.
fn check_archive_names(names: &[String]) -> Result<(), HarvestError> {
    let mut owners: BTreeMap<String, &str> = BTreeMap::new();
    for name in names {
        let file_name = archive_file_name(name)
            .ok_or_else(|| HarvestError::Parse(format!("tag '{}' has no usable file name", name)))?;
        if let Some(other) = owners.insert(file_name.clone(), name) {
            return Err(HarvestError::Config(format!(
                "tags '{}' and '{}' both map to archive {}",
                other, name, file_name
            )));
        }
    }
    Ok(())
}

/// Deletes downloaded archives. Failures are logged, never fatal.
async fn remove_archives(archives: &[ResolvedArchive]) -> usize {
    let mut removed = 0;
    for archive in archives {
        match tokio::fs::remove_file(&archive.local_path).await {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(
                tag = %archive.tag,
                path = %archive.local_path.display(),
                "could not remove archive: {}",
                e
            ),
        }
    }
    removed
}

/// GETs an HTML page on the blocking pool, retrying per the run's policy.
async fn fetch_text(config: &RunConfig, url: Url, context: String) -> Result<String, HarvestError> {
    run_with_retry(&config.retry, &context, || {
        let url = url.to_string();
        let context = context.clone();
        let curl = config.curl;
        blocking(move || fetch_html(&url, &context, &curl))
    })
    .await
}

async fn blocking<T, F>(f: F) -> Result<T, HarvestError>
where
    F: FnOnce() -> Result<T, HarvestError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(HarvestError::Worker)?
}
