//! JSON input files: publishing credentials and the tracked repository list.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Deserialize, Clone)]
pub struct PublishConfig {
    /// `owner/name`
    pub repository: String,
    pub token: String,
}

impl std::fmt::Debug for PublishConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishConfig")
            .field("repository", &self.repository)
            .field("token", &"<redacted>")
            .finish()
    }
}

fn default_file_type() -> String {
    "zip".to_string()
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TrackedRepo {
    pub url: String,
    #[serde(default = "default_file_type")]
    pub file_type: String,
    #[serde(default)]
    pub extract_folder: Option<String>,
    #[serde(default)]
    pub copy_to: Option<String>,
}

/// Tracked repositories keyed by name, in file order.
pub type TrackedRepos = IndexMap<String, TrackedRepo>;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).map_err(|source| Error::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    // Files saved by some Windows editors start with a BOM.
    let text = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
    serde_json::from_str(text).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_publish_config(path: &Path) -> Result<PublishConfig> {
    read_json(path)
}

pub fn load_tracked_repos(path: &Path) -> Result<TrackedRepos> {
    read_json(path)
}
