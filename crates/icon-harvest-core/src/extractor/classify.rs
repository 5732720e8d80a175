//! Archive entry classification by path.

use regex::Regex;
use std::sync::OnceLock;

use crate::url_model::sanitize_path_component;

/// `icons/<owner>/...`: the first directory under `icons/` names the artist.
fn owner_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"icons/([\w-]+)/").expect("static regex"))
}

fn license_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"icons/license\.txt").expect("static regex"))
}

/// What to do with one archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Directory entry; never written.
    Directory,
    /// Icon file, stored under `<output>/<owner>/<file_name>`.
    Icon { owner: String, file_name: String },
    /// The shared license, stored once under `<output>/<file_name>`.
    License { file_name: String },
    /// Anything else; ignored.
    Other,
}

/// Classifies an entry by its archive path.
///
/// Directories are recognised by the trailing separator before any pattern is
/// tried. The owner pattern wins over the license pattern. An entry whose
/// basename sanitizes to nothing is [`EntryKind::Other`].
pub fn classify_entry(path: &str) -> EntryKind {
    if path.ends_with('/') || path.ends_with('\\') {
        return EntryKind::Directory;
    }
    let file_name = match basename(path) {
        Some(name) => name,
        None => return EntryKind::Other,
    };

    if let Some(caps) = owner_re().captures(path) {
        let owner = sanitize_path_component(&caps[1]);
        if owner.is_empty() {
            return EntryKind::Other;
        }
        return EntryKind::Icon { owner, file_name };
    }
    if license_re().is_match(path) {
        return EntryKind::License { file_name };
    }
    EntryKind::Other
}

fn basename(path: &str) -> Option<String> {
    let raw = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let name = sanitize_path_component(raw);
    (!name.is_empty()).then_some(name)
}
