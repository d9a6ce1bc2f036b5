//! Mapping remote names to local file names
//!
//! Remote names may contain characters no filesystem accepts, and the same
//! name can arrive composed (NFC) or decomposed (NFD). Everything is written
//! to disk sanitized and compared in NFC.

use unicode_normalization::UnicodeNormalization;

/// Device names Windows refuses as file names, with or without an extension
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

fn replacement(c: char) -> Option<&'static str> {
    Some(match c {
        '<' | '>' | '\\' | '/' | '|' => "-",
        // "Title: Subtitle" -> "Title - Subtitle"
        ':' => " -",
        '"' => "'",
        '?' | '*' => "",
        c if c.is_ascii_control() => "_",
        _ => return None,
    })
}

/// NFC form of a name read from disk
pub fn normalize_fs_name(name: &str) -> String {
    name.nfc().collect()
}

/// Key for comparing paths across the manifest, the ledger and the disk
pub fn normalize_path_key(path: &str) -> String {
    normalize_fs_name(path).to_lowercase()
}

/// File name safe on every supported platform
///
/// Illegal characters are replaced, control characters become `_`, trailing
/// dots and spaces are stripped and reserved device names get a `_` prefix.
pub fn sanitize_filename(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let mut sanitized = String::with_capacity(name.len());
    for c in name.nfc() {
        match replacement(c) {
            Some(r) => sanitized.push_str(r),
            None => sanitized.push(c),
        }
    }
    let trimmed_len = sanitized.trim_end_matches(['.', ' ']).len();
    sanitized.truncate(trimmed_len);

    let upper = sanitized.to_uppercase();
    let base = upper.split('.').next().unwrap_or_default();
    if RESERVED_NAMES.contains(&base) {
        sanitized.insert(0, '_');
    }

    if sanitized.is_empty() {
        sanitized.push('_');
    }
    sanitized
}

/// Sanitize every component of a `/`-separated path
///
/// A run of two or more slashes is part of a name (an escaped literal slash)
/// and ends up as dashes; a single slash separates components.
pub fn sanitize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    split_components(&path)
        .into_iter()
        .map(sanitize_filename)
        .collect::<Vec<_>>()
        .join("/")
}

fn split_components(path: &str) -> Vec<&str> {
    let bytes = path.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'/' {
            i += 1;
            continue;
        }
        let run_end = bytes[i..]
            .iter()
            .position(|b| *b != b'/')
            .map_or(bytes.len(), |n| i + n);
        if run_end - i == 1 {
            parts.push(&path[start..i]);
            start = run_end;
        }
        i = run_end;
    }

    parts.push(&path[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colon_becomes_dash() {
        assert_eq!(
            sanitize_filename("Guitar Hero III: Legends of Rock"),
            "Guitar Hero III - Legends of Rock"
        );
    }

    #[test]
    fn test_illegal_and_control_characters() {
        assert_eq!(sanitize_filename("a<b>c|d"), "a-b-c-d");
        assert_eq!(sanitize_filename("What?*"), "What");
        assert_eq!(sanitize_filename("say \"hi\""), "say 'hi'");
        assert_eq!(sanitize_filename("tab\there"), "tab_here");
    }

    #[test]
    fn test_trailing_dots_reserved_and_empty() {
        assert_eq!(sanitize_filename("Chart. . "), "Chart");
        assert_eq!(sanitize_filename("con"), "_con");
        assert_eq!(sanitize_filename("NUL.txt"), "_NUL.txt");
        assert_eq!(sanitize_filename("CONSOLE"), "CONSOLE");
        assert_eq!(sanitize_filename("?"), "_");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn test_nfd_and_nfc_sanitize_the_same() {
        let composed = "Pok\u{e9}mon";
        let decomposed = "Poke\u{301}mon";
        assert_ne!(composed, decomposed);
        assert_eq!(sanitize_filename(decomposed), composed);
        assert_eq!(normalize_fs_name(decomposed), composed);
        assert_eq!(normalize_path_key("Set/POKE\u{301}MON"), "set/pok\u{e9}mon");
    }

    #[test]
    fn test_sanitize_path_components() {
        assert_eq!(
            sanitize_path("GH3: Legends/Chart?/song.ini"),
            "GH3 - Legends/Chart/song.ini"
        );
        assert_eq!(sanitize_path("Set\\Chart\\notes.mid"), "Set/Chart/notes.mid");
        // Escaped literal slash inside a name
        assert_eq!(
            sanitize_path("Setlist/Heart // Mind/song.ini"),
            "Setlist/Heart -- Mind/song.ini"
        );
    }
}
