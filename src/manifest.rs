//! Generated README listing every tracked repository and the version fetched.

use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use tracing::info;

use crate::config::TrackedRepos;
use crate::error::Result;

const HEADER: &str = "# Downloaded Programs\n\n\
    This repository contains the following automatically downloaded programs:\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedVersion {
    Found(String),
    NotFound,
}

impl fmt::Display for ResolvedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedVersion::Found(tag) => f.write_str(tag),
            ResolvedVersion::NotFound => f.write_str("Not found"),
        }
    }
}

pub fn render_manifest(
    repos: &TrackedRepos,
    versions: &IndexMap<String, ResolvedVersion>,
) -> String {
    let mut out = String::from(HEADER);

    for (name, repo) in repos {
        let version = versions
            .get(name)
            .map_or_else(|| "Unknown".to_string(), ToString::to_string);

        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "- **{name}**\n  - Repository: {}\n  - File type: {}\n  - Version: {version}\n\n",
            repo.url, repo.file_type
        );
    }

    out
}

pub fn write_manifest(
    path: &Path,
    repos: &TrackedRepos,
    versions: &IndexMap<String, ResolvedVersion>,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_manifest(repos, versions))?;
    info!("Manifest written to {}", path.display());
    Ok(())
}
