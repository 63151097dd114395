//! Archive and directory-tree plumbing for SCORM packages.
//!
//! Everything here is blocking; async callers go through `spawn_blocking`.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Result, LocalizerError};

/// Extract a zip archive into `dest`. Entries whose names would land outside
/// `dest` are skipped. Returns the number of files written.
pub fn extract_zip(src: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(src)?;
    let mut archive = ZipArchive::new(file)?;
    fs::create_dir_all(dest)?;

    let mut written = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let relative = match entry.enclosed_name() {
            Some(path) => path.to_path_buf(),
            None => {
                warn!("Skipping unsafe archive entry: {}", entry.name());
                continue;
            }
        };
        let out_path = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        written += 1;
    }

    info!("Extracted {} files from {} to {}", written, src.display(), dest.display());
    Ok(written)
}

/// Zip every file under `src_dir` with deflate compression. Entry names are
/// relative to `src_dir` and use `/` separators.
pub fn zip_dir(src_dir: &Path, zip_path: &Path) -> Result<usize> {
    if !src_dir.is_dir() {
        return Err(LocalizerError::InvalidPackage(format!(
            "{} is not a directory",
            src_dir.display()
        )));
    }
    if let Some(parent) = zip_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = ZipWriter::new(File::create(zip_path)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut count = 0;
    for entry in WalkDir::new(src_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| LocalizerError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = relative_name(src_dir, entry.path())?;
        debug!("Adding {} to archive", name);
        writer.start_file(name, options)?;
        let mut input = File::open(entry.path())?;
        io::copy(&mut input, &mut writer)?;
        count += 1;
    }

    writer.finish()?;
    info!("Packaged {} files into {}", count, zip_path.display());
    Ok(count)
}

/// Recursively copy a directory tree. `dest` must not exist yet.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| LocalizerError::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| LocalizerError::InvalidPackage(e.to_string()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            count += 1;
        }
    }
    Ok(count)
}

pub fn remove_dir_if_exists(path: &Path) -> Result<bool> {
    if path.exists() {
        fs::remove_dir_all(path)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

fn relative_name(base: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(base)
        .map_err(|e| LocalizerError::InvalidPackage(e.to_string()))?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}
