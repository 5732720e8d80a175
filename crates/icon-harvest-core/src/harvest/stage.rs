//! Per-tag progress through a run.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

/// Where a tag is in the pipeline. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TagStage {
    Pending,
    PageLoaded,
    LinkResolved,
    Downloaded,
    Extracted,
    Failed,
}

impl TagStage {
    pub fn as_str(self) -> &'static str {
        match self {
            TagStage::Pending => "pending",
            TagStage::PageLoaded => "page-loaded",
            TagStage::LinkResolved => "link-resolved",
            TagStage::Downloaded => "downloaded",
            TagStage::Extracted => "extracted",
            TagStage::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TagStage::Extracted | TagStage::Failed)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_advance_to(self, next: TagStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == TagStage::Failed || next > self
    }
}

impl fmt::Display for TagStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage of every tag in the run, shared by all tasks.
#[derive(Debug, Default)]
pub struct StageBoard {
    stages: Mutex<BTreeMap<String, TagStage>>,
}

impl StageBoard {
    pub fn new<'a>(tags: impl IntoIterator<Item = &'a str>) -> Self {
        let stages = tags
            .into_iter()
            .map(|t| (t.to_string(), TagStage::Pending))
            .collect();
        Self {
            stages: Mutex::new(stages),
        }
    }

    /// Moves `tag` to `next`. Backward or post-terminal moves are ignored.
    pub fn advance(&self, tag: &str, next: TagStage) {
        let mut stages = self.stages.lock().unwrap_or_else(|e| e.into_inner());
        let current = stages.entry(tag.to_string()).or_insert(TagStage::Pending);
        if !current.can_advance_to(next) {
            tracing::debug!(tag, from = %current, to = %next, "ignoring stage regression");
            return;
        }
        tracing::debug!(tag, from = %current, to = %next, "tag stage");
        *current = next;
    }

    pub fn get(&self, tag: &str) -> Option<TagStage> {
        self.stages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(tag)
            .copied()
    }

    /// Tags currently in `stage`.
    pub fn count(&self, stage: TagStage) -> usize {
        self.stages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|s| **s == stage)
            .count()
    }
}
