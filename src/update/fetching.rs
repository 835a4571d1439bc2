use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use const_format::concatcp;
use reqwest::blocking::Client;
use regex::Regex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::github::Release;
use crate::progress::transfer_bar;

pub const USER_AGENT: &str = concatcp!("pack-updater/", env!("CARGO_PKG_VERSION"));

const CHUNK_SIZE: usize = 8192;

/// Blocking client shared by a whole run. Transfers may be large, so no
/// overall timeout is set.
pub fn build_client() -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(None)
        .build()?)
}

fn repo_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https?://(?:www\.)?github\.com/(?<owner>[^/\s]+)/(?<repo>[^/\s]+?)(?:\.git)?/?$")
            .expect("repository URL pattern is valid")
    })
}

/// Map `https://github.com/<owner>/<repo>` to its latest-release API endpoint.
pub fn latest_release_url(api_base: &str, repo_url: &str) -> Result<String> {
    let captures = repo_url_regex()
        .captures(repo_url.trim())
        .ok_or_else(|| Error::InvalidRepoUrl(repo_url.to_string()))?;

    Ok(format!(
        "{}/repos/{}/{}/releases/latest",
        api_base.trim_end_matches('/'),
        &captures["owner"],
        &captures["repo"],
    ))
}

/// What the fetch loop needs to download a release asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelease {
    pub tag_name: String,
    pub download_url: String,
    pub file_name: String,
}

pub fn fetch_latest_release(client: &Client, api_base: &str, repo_url: &str) -> Result<Release> {
    let endpoint = latest_release_url(api_base, repo_url)?;
    debug!("GET {endpoint}");

    let response = client
        .get(&endpoint)
        .header("Accept", "application/vnd.github+json")
        .send()?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::ApiStatus {
            status,
            body: response.text().unwrap_or_default(),
        });
    }

    Ok(response.json()?)
}

/// Find the first asset of the latest release whose name ends with `file_type`.
pub fn resolve_latest(
    client: &Client,
    api_base: &str,
    repo_url: &str,
    file_type: &str,
) -> Result<ResolvedRelease> {
    let release = fetch_latest_release(client, api_base, repo_url)?;

    let asset = release
        .find_asset(file_type)
        .ok_or_else(|| Error::NoMatchingAsset {
            url: repo_url.to_string(),
            file_type: file_type.to_string(),
        })?;

    Ok(ResolvedRelease {
        tag_name: release.tag_name.clone(),
        download_url: asset.browser_download_url.clone(),
        file_name: asset.name.clone(),
    })
}

/// Download `url` to `output_dir/file_name`.
///
/// An existing file of that name is returned as-is without touching the
/// network. The body is staged in a temporary file so an interrupted
/// transfer never leaves a file behind.
pub fn download_asset(
    client: &Client,
    url: &str,
    file_name: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;

    let file_path = output_dir.join(file_name);
    if file_path.exists() {
        info!("{file_name} already exists, skipping download");
        return Ok(file_path);
    }

    let mut response = client
        .get(url)
        .header("Accept", "application/octet-stream")
        .send()?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::ApiStatus {
            status,
            body: response.text().unwrap_or_default(),
        });
    }

    let bar = transfer_bar(file_name, response.content_length());
    let mut staged = tempfile::NamedTempFile::new_in(output_dir)?;
    let mut buffer = [0; CHUNK_SIZE];

    loop {
        let bytes_read = response.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        staged.write_all(&buffer[..bytes_read])?;
        bar.inc(bytes_read as u64);
    }

    bar.finish_and_clear();
    staged.flush()?;
    staged.persist(&file_path).map_err(|e| e.error)?;
    info!("Saved {}", file_path.display());

    Ok(file_path)
}
