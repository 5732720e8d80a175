//! Test archives and pages shaped like the icon site's.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;

/// Builds a zip in memory. Names ending in `/` become directory entries.
pub fn build(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, body) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, opts).unwrap();
        } else {
            zip.start_file(*name, opts).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
    }
    zip.finish().unwrap().into_inner()
}

/// Tag list page linking to `/tags/<tag>.html` for every tag.
pub fn tags_page(tags: &[&str]) -> String {
    let items: String = tags
        .iter()
        .enumerate()
        .map(|(i, t)| format!(r#"<li><a href="/tags/{t}.html">{t} ({})</a></li>"#, i + 1))
        .collect();
    format!(r#"<html><body><div class="tags"><ul>{items}</ul></div></body></html>"#)
}

/// Detail page offering the black PNG and white SVG archives of `tag`.
pub fn tag_page(tag: &str) -> String {
    format!(
        r#"<html><body>
<div class="download">
  <span class="hint--top" data-hint="white on black SVG icons"><a href="/zips/{tag}-svg.zip">SVG</a></span>
  <span class="hint--top" data-hint="black on transparent PNG icons"><a href="/zips/{tag}-png.zip">PNG</a></span>
</div>
</body></html>"#
    )
}
