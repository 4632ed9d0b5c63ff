//! Temporary output file management.
//!
//! Conversions write into a hidden sibling of their final output. The tempfile
//! crate removes the file when its handle is dropped, so an aborted or failed
//! conversion never leaves a partial MP4 behind; only an explicit persist
//! moves it into place.

use crate::config::TARGET_EXTENSION;
use crate::error::CoreResult;

use log::debug;
use tempfile::{Builder as TempFileBuilder, TempPath};

use std::path::Path;

/// Creates `.<stem>.<random>.partial.mp4` inside `dir`. Removed when dropped.
pub fn create_partial_output(dir: &Path, stem: &str) -> CoreResult<TempPath> {
    std::fs::create_dir_all(dir)?;
    let temp_file = TempFileBuilder::new()
        .prefix(&format!(".{stem}."))
        .suffix(&format!(".partial.{TARGET_EXTENSION}"))
        .rand_bytes(6)
        .tempfile_in(dir)?;

    let path = temp_file.into_temp_path();
    debug!("Created temporary output {}", path.display());
    Ok(path)
}
