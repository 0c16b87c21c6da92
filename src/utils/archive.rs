//! Expands a zip upload into a scoped temporary directory.

use crate::core::error::Result;

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A zip archive unpacked on disk. The directory and everything in it is
/// removed when this value is dropped, on success and error paths alike.
#[derive(Debug)]
pub struct ExtractedArchive {
    dir: TempDir,
    csv_files: Vec<PathBuf>,
}

impl ExtractedArchive {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Extracted `.csv` entries, in archive order.
    pub fn csv_files(&self) -> &[PathBuf] {
        &self.csv_files
    }
}

pub(crate) fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// Unpacks every entry of the archive at `archive_path`.
///
/// Entries whose names would escape the extraction root are skipped.
pub fn expand_archive(archive_path: &Path) -> Result<ExtractedArchive> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(io::BufReader::new(file))?;

    let dir = tempfile::Builder::new()
        .prefix("email-sift-archive-")
        .tempdir()?;
    tracing::debug!(target: "extract",
        "Expanding {} ({} entries) into {}", archive_path.display(), archive.len(), dir.path().display());

    let mut csv_files = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let relative = match entry.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => {
                tracing::warn!(target: "extract", "Skipping archive entry with unsafe path: {}", entry.name());
                continue;
            }
        };
        let dest = dir.path().join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest)?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&dest)?;
        io::copy(&mut entry, &mut out)?;

        if is_csv_path(&relative) {
            csv_files.push(dest);
        } else {
            tracing::trace!(target: "extract", "Ignoring non-CSV entry {}", relative.display());
        }
    }

    tracing::debug!(target: "extract", "Found {} CSV entries in archive.", csv_files.len());
    Ok(ExtractedArchive { dir, csv_files })
}
