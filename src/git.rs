//! Committing and pushing the working tree before a release.

use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use crate::error::{Error, Result};

fn run_git(repo_dir: &Path, args: &[&str]) -> Result<()> {
    let command = args.join(" ");
    debug!("git {command}");

    let output = Command::new("git")
        .current_dir(repo_dir)
        .args(args)
        .output()
        .map_err(|e| Error::Git {
            command: command.clone(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        // `git commit` reports "nothing to commit" on stdout.
        let reason = if stderr.trim().is_empty() { stdout } else { stderr };
        return Err(Error::Git {
            command,
            reason: reason.trim().to_string(),
        });
    }

    Ok(())
}

/// Stage everything, commit with `message` and push to `origin`.
///
/// Stops at the first failing step.
pub fn commit_and_push(repo_dir: &Path, message: &str) -> Result<()> {
    run_git(repo_dir, &["add", "-A"])?;
    run_git(repo_dir, &["commit", "-m", message])?;
    run_git(repo_dir, &["push", "origin", "HEAD"])?;
    info!("Committed and pushed local changes: {message}");
    Ok(())
}
