//! CUE sheet `FILE` directive parsing.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::warn;

use super::{dedup_in_order, strip_bom};

/// `FILE "name with spaces.bin" BINARY`
static QUOTED_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)^\s*FILE\s+"([^"]+)""#).expect("valid regex"));

/// `FILE name.bin BINARY`; the name runs up to the trailing type token.
static BARE_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*FILE\s+(.+?)\s+\w+\s*$").expect("valid regex"));

/// Extracts the file names referenced by `FILE` directives in a CUE sheet.
pub fn parse_cue(text: &str) -> Vec<String> {
    let text = strip_bom(text);
    let mut names = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some(keyword) if keyword.eq_ignore_ascii_case("FILE") => {}
            _ => continue,
        }

        if let Some(caps) = QUOTED_FILE.captures(line) {
            names.push(caps[1].to_string());
            continue;
        }

        if let Some(caps) = BARE_FILE.captures(line) {
            let name = caps[1].trim();
            if !name.starts_with('"') {
                names.push(name.to_string());
                continue;
            }
        }

        // No type token: take the bare second token.
        match tokens.next() {
            Some(token) if !token.starts_with('"') => {
                names.push(token.to_string());
            }
            _ => warn!("Skipping malformed CUE FILE line {}: {}", idx + 1, line.trim()),
        }
    }

    dedup_in_order(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_byte_order_mark() {
        let cue = "\u{feff}FILE \"game.bin\" BINARY\n  TRACK 01 MODE2/2352\n";
        assert_eq!(parse_cue(cue), vec!["game.bin".to_string()]);
    }

    #[test]
    fn test_quoted_name_with_spaces() {
        let cue = "FILE \"a b.bin\" BINARY\n  TRACK 01 MODE1/2352\n    INDEX 01 00:00:00\n";
        assert_eq!(parse_cue(cue), vec!["a b.bin".to_string()]);
    }

    #[test]
    fn test_unquoted_name() {
        let cue = "FILE game.bin BINARY\n  TRACK 01 MODE2/2352\n";
        assert_eq!(parse_cue(cue), vec!["game.bin".to_string()]);
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        let cue = "file \"Track 01.bin\" binary\n\tFile track2.wav WAVE\n";
        assert_eq!(
            parse_cue(cue),
            vec!["Track 01.bin".to_string(), "track2.wav".to_string()]
        );
    }

    #[test]
    fn test_duplicate_names_returned_once() {
        let cue = "\
FILE \"game.bin\" BINARY
  TRACK 01 MODE1/2352
    INDEX 01 00:00:00
FILE \"audio.bin\" BINARY
  TRACK 02 AUDIO
FILE \"game.bin\" BINARY
  TRACK 03 MODE1/2352
";
        assert_eq!(
            parse_cue(cue),
            vec!["game.bin".to_string(), "audio.bin".to_string()]
        );
    }

    #[test]
    fn test_missing_type_token_falls_back_to_second_token() {
        assert_eq!(parse_cue("FILE lonely.bin\n"), vec!["lonely.bin".to_string()]);
        assert_eq!(parse_cue("FILE \"q u.bin\"\n"), vec!["q u.bin".to_string()]);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let cue = "FILE\nFILE \"\" BINARY\nREM FILE \"x.bin\" BINARY\nFILE ok.bin BINARY\n";
        assert_eq!(parse_cue(cue), vec!["ok.bin".to_string()]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let cue = "FILE \"disc.bin\" BINARY\r\n  TRACK 01 MODE2/2352\r\n";
        assert_eq!(parse_cue(cue), vec!["disc.bin".to_string()]);
    }

    #[test]
    fn test_empty_sheet() {
        assert!(parse_cue("").is_empty());
        assert!(parse_cue("REM GENRE Game\nTITLE \"x\"\n").is_empty());
    }
}
