//! File discovery module for finding candidate video files.
//!
//! Extensions are only a hint: files are frequently mislabeled, so a large
//! file with an unknown extension is still handed to the prober, which makes
//! the final call on whether it is a video.

use crate::error::{CoreError, CoreResult};

use log::{debug, warn};
use walkdir::WalkDir;

use std::path::{Path, PathBuf};

/// Extensions (lowercase, without dot) treated as likely video files.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "homohs", "avi", "mp4", "mkv", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "ts",
    "m2ts", "vob", "ogv", "3gp", "3g2",
];

/// Files above this size are probed even without a known extension.
pub const UNKNOWN_EXTENSION_MIN_SIZE: u64 = 1024 * 1024;

/// Returns true if the extension of `path` is a known video extension (case-insensitive).
#[must_use]
pub fn has_video_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Finds the files to probe under `input`.
///
/// A file path yields itself regardless of its extension. A directory is
/// walked recursively; a file is kept when it has a known video extension or
/// is larger than [`UNKNOWN_EXTENSION_MIN_SIZE`]. Results are sorted so the
/// numbering shown to the user is stable between runs.
///
/// # Examples
///
/// ```rust,no_run
/// use vconv_core::find_candidate_files;
/// use std::path::Path;
///
/// let files = find_candidate_files(Path::new("/path/to/videos")).unwrap();
/// println!("Found {} candidate(s)", files.len());
/// ```
pub fn find_candidate_files(input: &Path) -> CoreResult<Vec<PathBuf>> {
    if !input.exists() {
        return Err(CoreError::PathError(format!(
            "Path not found: {}",
            input.display()
        )));
    }

    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable directory entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if has_video_extension(path) {
            files.push(path.to_path_buf());
            continue;
        }

        match entry.metadata() {
            Ok(meta) if meta.len() > UNKNOWN_EXTENSION_MIN_SIZE => {
                debug!(
                    "Including {} ({} bytes) despite unknown extension",
                    path.display(),
                    meta.len()
                );
                files.push(path.to_path_buf());
            }
            Ok(_) => {}
            Err(e) => warn!("Could not read metadata for {}: {e}", path.display()),
        }
    }

    files.sort();
    Ok(files)
}
