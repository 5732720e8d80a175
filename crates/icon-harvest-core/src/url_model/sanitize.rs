//! Filesystem-safe path components.

/// Linux NAME_MAX.
const NAME_MAX: usize = 255;

/// Turns an untrusted name (tag text, archive entry basename) into a single
/// safe path component.
///
/// - Replaces NUL, `/`, `\` and control characters with `_`
/// - Collapses consecutive replacement underscores
/// - Trims leading/trailing whitespace and dots, so `.` and `..` become empty
/// - Limits length to 255 bytes
///
/// An empty result means the name is unusable.
pub fn sanitize_path_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_replaced = false;

    for c in name.chars() {
        if c == '\0' || c == '/' || c == '\\' || c.is_control() {
            if !prev_replaced {
                out.push('_');
            }
            prev_replaced = true;
        } else {
            out.push(c);
            prev_replaced = false;
        }
    }

    let trimmed = out.trim_matches(|c: char| c.is_whitespace() || c == '.');

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}
