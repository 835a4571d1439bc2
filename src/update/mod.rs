//! The fetch workflow: resolve, download and unpack every tracked repository,
//! then write the manifest.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::config::{load_tracked_repos, TrackedRepo};
use crate::error::Result;
use crate::manifest::{write_manifest, ResolvedVersion};
use crate::unpack::{unpack, FileType};

pub mod fetching;

pub use fetching::{build_client, download_asset, resolve_latest, ResolvedRelease};

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub links_path: PathBuf,
    pub downloads_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub api_base: String,
}

#[derive(Debug, Default)]
pub struct FetchSummary {
    pub versions: IndexMap<String, ResolvedVersion>,
}

impl FetchSummary {
    pub fn found(&self) -> usize {
        self.versions
            .values()
            .filter(|v| matches!(v, ResolvedVersion::Found(_)))
            .count()
    }
}

/// Download and unpack one resolved entry. Archive problems are reported and
/// swallowed, anything else is returned.
fn install_entry(
    client: &Client,
    name: &str,
    repo: &TrackedRepo,
    resolved: &ResolvedRelease,
    options: &FetchOptions,
) -> Result<()> {
    let file_path = match download_asset(
        client,
        &resolved.download_url,
        &resolved.file_name,
        &options.downloads_dir,
    ) {
        Ok(path) => path,
        Err(err) => {
            warn!("Failed to download {}: {err}", resolved.download_url);
            return Ok(());
        }
    };

    let copy_to = repo.copy_to.as_deref().map(Path::new);
    match unpack(
        &file_path,
        &options.dest_dir,
        repo.extract_folder.as_deref(),
        &FileType::parse(&repo.file_type),
        copy_to,
    ) {
        Err(err) if err.is_archive_error() => {
            warn!("Skipping {name}: {err}");
            Ok(())
        }
        other => other,
    }
}

pub fn run_fetch(client: &Client, options: &FetchOptions) -> Result<FetchSummary> {
    let repos = load_tracked_repos(&options.links_path)?;
    let mut summary = FetchSummary::default();

    for (name, repo) in &repos {
        info!("Checking {name}...");

        let resolved = match resolve_latest(client, &options.api_base, &repo.url, &repo.file_type) {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!("Could not get the latest release of {name}: {err}");
                summary.versions.insert(name.clone(), ResolvedVersion::NotFound);
                continue;
            }
        };

        info!(
            "Latest release found: {} (file: {}, version: {})",
            resolved.download_url, resolved.file_name, resolved.tag_name
        );
        summary
            .versions
            .insert(name.clone(), ResolvedVersion::Found(resolved.tag_name.clone()));

        install_entry(client, name, repo, &resolved, options)?;
    }

    write_manifest(&options.manifest_path, &repos, &summary.versions)?;
    info!(
        "Fetched {}/{} tracked repositories",
        summary.found(),
        repos.len()
    );

    Ok(summary)
}
