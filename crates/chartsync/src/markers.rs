//! File classification constants
//!
//! A directory is a chart (content unit) when it directly contains one of
//! [`CHART_MARKERS`]. Matching is case-insensitive everywhere.

/// File names that mark a directory as a chart
pub const CHART_MARKERS: &[&str] = &["song.ini", "notes.mid", "notes.chart"];

/// Extensions of archives that expand into one or more charts
pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "7z", "rar"];

/// Extensions of video files that are removed after extraction
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "webm", "mkv", "mov", "wmv", "flv", "m4v"];

/// Prefix of in-flight downloads that were interrupted
pub const PARTIAL_DOWNLOAD_PREFIX: &str = "_download_";

/// Check if a file name is a chart marker
pub fn is_chart_marker(file_name: &str) -> bool {
    CHART_MARKERS
        .iter()
        .any(|marker| marker.eq_ignore_ascii_case(file_name))
}

/// Check if a path names an archive we extract
pub fn is_archive(path: &str) -> bool {
    has_extension(path, ARCHIVE_EXTENSIONS)
}

/// Check if a path names a video file
pub fn is_video(path: &str) -> bool {
    has_extension(path, VIDEO_EXTENSIONS)
}

/// Check if a path is a leftover partial download
pub fn is_partial_download(path: &str) -> bool {
    file_name(path).starts_with(PARTIAL_DOWNLOAD_PREFIX)
}

/// Last `/`-separated component of a path
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn has_extension(path: &str, extensions: &[&str]) -> bool {
    let name = file_name(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
        }
        _ => false,
    }
}
