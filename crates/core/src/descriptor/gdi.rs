//! GDI track list parsing.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::warn;

use super::{dedup_in_order, strip_bom};

/// `<track> <lba> <type> <sector size> <filename> [offset]`
static TRACK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(\d+)\s+\S+\s+\S+\s+\S+\s+(?:"([^"]+)"|([^\s"]+))(?:\s+.*)?$"#)
        .expect("valid regex")
});

/// Extracts the track file names from a GDI file.
///
/// The first non-blank line is the track count and is ignored.
pub fn parse_gdi(text: &str) -> Vec<String> {
    let text = strip_bom(text);
    let mut names = Vec::new();
    let mut header_seen = false;

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !header_seen {
            header_seen = true;
            if trimmed.parse::<u32>().is_ok() {
                continue;
            }
        }

        match TRACK_LINE.captures(line) {
            Some(caps) => {
                if let Some(name) = caps.get(2).or_else(|| caps.get(3)) {
                    names.push(name.as_str().to_string());
                }
            }
            None => warn!("Skipping malformed GDI track line {}: {}", idx + 1, trimmed),
        }
    }

    dedup_in_order(names)
}
