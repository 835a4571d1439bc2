//! The publish workflow: optionally commit and push, zip the pack directory,
//! create a GitHub release and upload the archive to it.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use reqwest::blocking::{Body, Client};
use tracing::{info, warn};

use crate::archive::create_zip;
use crate::config::{load_publish_config, PublishConfig};
use crate::error::{Error, Result};
use crate::git;
use crate::github::{CreatedRelease, NewRelease};
use crate::progress::transfer_bar;

const FALLBACK_DESCRIPTION: &str =
    "README.md not found. Release generated automatically with the source code and files.";

#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub config_path: PathBuf,
    pub source_dir: PathBuf,
    pub output_zip: PathBuf,
    pub readme_path: PathBuf,
    pub commit: bool,
    pub api_base: String,
}

/// `Release-YYYYmmdd-HHMMSS`, used as both tag and title.
pub fn release_name(now: DateTime<Local>) -> String {
    format!("Release-{}", now.format("%Y%m%d-%H%M%S"))
}

pub fn release_description(readme_path: &Path) -> Result<String> {
    if readme_path.is_file() {
        fs::read_to_string(readme_path).map_err(|source| Error::ReadFailed {
            path: readme_path.to_path_buf(),
            source,
        })
    } else {
        Ok(FALLBACK_DESCRIPTION.to_string())
    }
}

/// Strip the `{?name,label}` URI template GitHub appends to upload URLs.
pub fn upload_url_base(upload_url: &str) -> &str {
    upload_url.split('{').next().unwrap_or(upload_url)
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

pub struct ReleasePublisher<'a> {
    client: &'a Client,
    api_base: String,
    config: PublishConfig,
}

impl<'a> ReleasePublisher<'a> {
    pub fn new(client: &'a Client, api_base: &str, config: PublishConfig) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            config,
        }
    }

    fn auth_header(&self) -> String {
        format!("token {}", self.config.token)
    }

    pub fn create_release(&self, name: &str, body: &str) -> Result<CreatedRelease> {
        let url = format!("{}/repos/{}/releases", self.api_base, self.config.repository);
        let request = NewRelease {
            tag_name: name,
            name,
            body,
            draft: false,
            prerelease: false,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/vnd.github+json")
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ApiStatus {
                status,
                body: response.text().unwrap_or_default(),
            });
        }

        let release: CreatedRelease = response.json()?;
        info!("Release created: {}", release.html_url);
        Ok(release)
    }

    pub fn upload_asset(&self, release: &CreatedRelease, path: &Path) -> Result<()> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::ReadFailed {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"),
            })?;

        let file = File::open(path).map_err(|source| Error::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let total_size = file.metadata()?.len();

        let bar = transfer_bar(&format!("Uploading {file_name}"), Some(total_size));
        let body = Body::sized(bar.wrap_read(file), total_size);

        let response = self
            .client
            .post(upload_url_base(&release.upload_url))
            .query(&[("name", file_name.as_str())])
            .header("Authorization", self.auth_header())
            .header("Content-Type", content_type_for(path))
            .body(body)
            .send()?;
        bar.finish_and_clear();

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ApiStatus {
                status,
                body: response.text().unwrap_or_default(),
            });
        }

        info!("Uploaded {file_name} to the release");
        Ok(())
    }

    /// Create the release, then upload `archive` to it. A failed create
    /// returns before any upload is attempted.
    pub fn publish(&self, archive: &Path, name: &str, description: &str) -> Result<CreatedRelease> {
        let release = self.create_release(name, description)?;
        self.upload_asset(&release, archive)?;
        Ok(release)
    }
}

pub fn run_publish(client: &Client, options: &PublishOptions) -> Result<CreatedRelease> {
    let config = load_publish_config(&options.config_path)?;
    let name = release_name(Local::now());

    if options.commit {
        let repo_dir = options
            .source_dir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        if let Err(err) = git::commit_and_push(repo_dir, &name) {
            warn!("Skipping commit/push: {err}");
        }
    }

    create_zip(&options.source_dir, &options.output_zip)?;
    let description = release_description(&options.readme_path)?;

    ReleasePublisher::new(client, &options.api_base, config).publish(
        &options.output_zip,
        &name,
        &description,
    )
}
