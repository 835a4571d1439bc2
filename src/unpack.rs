//! Extracting downloaded assets into the combined output directory.
//!
//! Zip and tar (gzip or xz) archives are unpacked, optionally rebasing a
//! subfolder onto the destination root. Any other file is copied as-is.
//!
//! Failures reading the archive are reported as archive errors so the caller
//! can skip the asset. Failures writing the destination stay I/O errors.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, info};
use xz2::read::XzDecoder;

use crate::error::{Error, Result};

const COPY_BUFFER: usize = 64 * 1024;

/// How a downloaded asset is handled, from its declared file type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileType {
    Zip,
    TarGz,
    TarXz,
    Raw(String),
}

impl FileType {
    pub fn parse(declared: &str) -> Self {
        match declared {
            "zip" => FileType::Zip,
            "tar.gz" => FileType::TarGz,
            "tar.xz" => FileType::TarXz,
            other => FileType::Raw(other.to_string()),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Zip => f.write_str("zip"),
            FileType::TarGz => f.write_str("tar.gz"),
            FileType::TarXz => f.write_str("tar.xz"),
            FileType::Raw(s) => f.write_str(s),
        }
    }
}

/// Where a member named `name` lands under the destination, or `None` when it
/// is outside `subfolder` or is the subfolder entry itself.
fn rebase(name: &str, subfolder: Option<&str>) -> Result<Option<PathBuf>> {
    let relative = match subfolder {
        Some(folder) => match name.strip_prefix(folder).and_then(|r| r.strip_prefix('/')) {
            Some(rest) => rest,
            None => return Ok(None),
        },
        None => name,
    };

    let relative = relative.trim_end_matches('/');
    if relative.is_empty() {
        return Ok(None);
    }

    let path = Path::new(relative);
    if path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(Error::UnsafeEntryPath(name.to_string()));
    }

    Ok(Some(path.to_path_buf()))
}

fn corrupt(archive: &Path) -> impl Fn(io::Error) -> Error + Copy + '_ {
    move |e| Error::CorruptArchive {
        path: archive.to_path_buf(),
        reason: e.to_string(),
    }
}

/// Stream one member to `target`. Read errors come from the archive, write
/// errors from the destination.
fn write_entry<R: Read>(reader: &mut R, target: &Path, archive: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(target)?;
    let mut buffer = vec![0u8; COPY_BUFFER];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(corrupt(archive))?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])?;
    }

    Ok(())
}

fn set_mode(target: &Path, mode: Option<u32>) -> Result<()> {
    #[cfg(unix)]
    if let Some(mode) = mode {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(target, fs::Permissions::from_mode(mode & 0o7777))?;
    }
    #[cfg(not(unix))]
    let _ = (target, mode);
    Ok(())
}

fn extract_zip(file_path: &Path, dest: &Path, subfolder: Option<&str>) -> Result<()> {
    let mut archive = zip::ZipArchive::new(BufReader::new(File::open(file_path)?))?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = rebase(entry.name(), subfolder)? else {
            continue;
        };

        let target = dest.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            write_entry(&mut entry, &target, file_path)?;
            set_mode(&target, entry.unix_mode())?;
            debug!("Extracted {}", relative.display());
        }
    }

    Ok(())
}

fn extract_tar<R: Read>(
    reader: R,
    file_path: &Path,
    dest: &Path,
    subfolder: Option<&str>,
) -> Result<()> {
    let corrupt = corrupt(file_path);
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries().map_err(corrupt)? {
        let mut entry = entry.map_err(corrupt)?;
        let name = entry.path().map_err(corrupt)?.to_string_lossy().into_owned();
        let Some(relative) = rebase(&name, subfolder)? else {
            continue;
        };

        let target = dest.join(&relative);
        let kind = entry.header().entry_type();
        if kind.is_dir() {
            fs::create_dir_all(&target)?;
        } else if kind.is_file() {
            write_entry(&mut entry, &target, file_path)?;
            set_mode(&target, entry.header().mode().ok())?;
            debug!("Extracted {}", relative.display());
        } else {
            // Links and other special members; tar refuses ones escaping `dest`.
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            entry.unpack(&target)?;
            debug!("Extracted {} ({kind:?})", relative.display());
        }
    }

    Ok(())
}

fn copy_raw(file_path: &Path, target_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(target_dir)?;
    let file_name = file_path.file_name().ok_or_else(|| {
        Error::UnsafeEntryPath(file_path.to_string_lossy().into_owned())
    })?;
    let target = target_dir.join(file_name);
    fs::copy(file_path, &target)?;
    info!("Copied {} to {}", file_path.display(), target_dir.display());
    Ok(target)
}

/// Extract or copy `file_path` into `dest` according to `file_type`.
///
/// `subfolder` only applies to archives; `copy_to` only to raw files, which
/// otherwise land directly in `dest`.
pub fn unpack(
    file_path: &Path,
    dest: &Path,
    subfolder: Option<&str>,
    file_type: &FileType,
    copy_to: Option<&Path>,
) -> Result<()> {
    fs::create_dir_all(dest)?;

    match file_type {
        FileType::Zip => extract_zip(file_path, dest, subfolder)?,
        FileType::TarGz => {
            let reader = GzDecoder::new(BufReader::new(File::open(file_path)?));
            extract_tar(reader, file_path, dest, subfolder)?;
        }
        FileType::TarXz => {
            let reader = XzDecoder::new(BufReader::new(File::open(file_path)?));
            extract_tar(reader, file_path, dest, subfolder)?;
        }
        FileType::Raw(_) => return copy_raw(file_path, copy_to.unwrap_or(dest)).map(|_| ()),
    }

    match subfolder {
        Some(folder) => info!(
            "Extracted {folder}/ from {file_type} archive {} to {}",
            file_path.display(),
            dest.display()
        ),
        None => info!(
            "Extracted {file_type} archive {} to {}",
            file_path.display(),
            dest.display()
        ),
    }
    Ok(())
}
