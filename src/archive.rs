//! Zip extraction and packing
//!
//! Package archives are plain zip files. Extraction refuses entries whose
//! names escape the destination directory; packing writes to a temporary file
//! beside the destination and moves it into place only once the archive is
//! complete.

use crate::{Error, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Open a zip archive for reading
pub fn open(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path)?;
    Ok(ZipArchive::new(file)?)
}

/// Extract every entry of `archive_path` into `dest_dir`
///
/// Returns the number of files written.
pub fn extract_all(archive_path: &Path, dest_dir: &Path) -> Result<usize> {
    let mut archive = open(archive_path)?;
    fs::create_dir_all(dest_dir)?;

    let mut files_extracted = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative_path) = entry.enclosed_name() else {
            warn!(entry = entry.name(), "Skipping archive entry with an unsafe path");
            continue;
        };

        let out_path = dest_dir.join(&relative_path);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out_file = File::create(&out_path)?;
        io::copy(&mut entry, &mut out_file)?;
        files_extracted += 1;
    }

    debug!(
        archive = %archive_path.display(),
        files = files_extracted,
        "Extracted archive"
    );
    Ok(files_extracted)
}

/// Copy one entry of an open archive to `dest`, creating parent directories
pub fn extract_entry(archive: &mut ZipArchive<File>, name: &str, dest: &Path) -> Result<u64> {
    let mut entry = archive.by_name(name)?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out_file = File::create(dest)?;
    Ok(io::copy(&mut entry, &mut out_file)?)
}

/// Read an entry of an open archive as UTF-8 text
pub fn read_entry_to_string(archive: &mut ZipArchive<File>, name: &str) -> Result<String> {
    let mut entry = archive.by_name(name)?;
    let mut content = String::new();
    io::Read::read_to_string(&mut entry, &mut content)?;
    Ok(content)
}

/// Pack every file under `source` into a new zip archive at `output`
///
/// Entry names are paths relative to `source` with `/` separators. An
/// existing file at `output` is replaced only after packing succeeds.
/// Returns the number of files packed.
pub fn pack_directory(source: &Path, output: &Path) -> Result<usize> {
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let staging = tempfile::Builder::new()
        .prefix(".relpack-")
        .suffix(".partial")
        .tempfile_in(&parent)?;

    let mut zip = ZipWriter::new(staging.reopen()?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut files_packed = 0;
    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry_name(source, entry.path())?;
        zip.start_file(name, options)?;
        let mut file = File::open(entry.path())?;
        io::copy(&mut file, &mut zip)?;
        files_packed += 1;
    }

    zip.finish()?;
    staging.persist(output)?;

    debug!(output = %output.display(), files = files_packed, "Packed archive");
    Ok(files_packed)
}

/// Archive entry name of `path` relative to `root`
fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|e| Error::Other(format!("{} is outside {}: {}", path.display(), root.display(), e)))?;

    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}
