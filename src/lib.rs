//! Publish a local pack directory as a GitHub release, and assemble that pack
//! from the latest releases of a list of tracked repositories.

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod github;
pub mod manifest;
pub mod progress;
pub mod publish;
pub mod unpack;
pub mod update;

pub use error::{Error, Result};
