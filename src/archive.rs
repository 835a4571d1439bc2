//! Packaging a directory tree into a ZIP archive.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path};

use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};

/// Entry name for `path` relative to `root`, always `/`-separated.
fn entry_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Write every file under `source_dir` into a Deflated zip at `output_zip`,
/// replacing any existing file. Returns the number of files stored.
pub fn create_zip(source_dir: &Path, output_zip: &Path) -> Result<usize> {
    if !source_dir.is_dir() {
        return Err(Error::ReadFailed {
            path: source_dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "source directory does not exist"),
        });
    }

    if let Some(parent) = output_zip.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = ZipWriter::new(File::create(output_zip)?);
    // The archive may live inside the tree being packed.
    let output_abs = output_zip.canonicalize().ok();
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut count = 0;

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if output_abs.is_some() && entry.path().canonicalize().ok() == output_abs {
            continue;
        }
        let Some(name) = entry_name(source_dir, entry.path()) else {
            continue;
        };

        let mut reader = BufReader::new(File::open(entry.path()).map_err(|source| {
            Error::ReadFailed {
                path: entry.path().to_path_buf(),
                source,
            }
        })?);
        writer.start_file(name.as_str(), options)?;
        io::copy(&mut reader, &mut writer)?;
        debug!("Added {name}");
        count += 1;
    }

    writer.finish()?;
    info!("Created ZIP archive {} ({count} files)", output_zip.display());

    Ok(count)
}
