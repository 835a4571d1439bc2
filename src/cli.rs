//! Command line interface. Every flag defaults to the fixed paths the tool
//! has always used, so a bare subcommand keeps working unchanged.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::github::DEFAULT_API_URL;
use crate::publish::PublishOptions;
use crate::update::FetchOptions;

#[derive(Parser, Debug)]
#[command(name = "pack-updater", version)]
#[command(about = "Publish a pack directory as a GitHub release, or fetch tracked release assets into it")]
pub struct Cli {
    /// Enable debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Zip the pack directory and upload it as a new GitHub release
    Publish(PublishArgs),
    /// Download the latest release of every tracked repository into the pack
    Fetch(FetchArgs),
}

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// JSON file with `repository` and `token`
    #[arg(long, default_value = "github.json")]
    pub config: PathBuf,

    /// Directory to package
    #[arg(long, default_value = "pack")]
    pub source: PathBuf,

    /// Archive to create and upload
    #[arg(long, default_value = "pack.zip")]
    pub output: PathBuf,

    /// Release description source; a fixed text is used when missing
    #[arg(long, default_value = "README.md")]
    pub readme: PathBuf,

    /// Commit and push local changes before packaging
    #[arg(long)]
    pub commit: bool,

    #[arg(long, env = "PACK_UPDATER_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// JSON map of tracked repositories
    #[arg(long, default_value = "links.json")]
    pub links: PathBuf,

    /// Where release assets are downloaded (existing files are reused)
    #[arg(long, default_value = "downloads")]
    pub downloads: PathBuf,

    /// Directory that receives extracted contents
    #[arg(long, default_value = "pack")]
    pub dest: PathBuf,

    /// Generated manifest
    #[arg(long, default_value = "README.md")]
    pub manifest: PathBuf,

    #[arg(long, env = "PACK_UPDATER_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

impl From<PublishArgs> for PublishOptions {
    fn from(args: PublishArgs) -> Self {
        Self {
            config_path: args.config,
            source_dir: args.source,
            output_zip: args.output,
            readme_path: args.readme,
            commit: args.commit,
            api_base: args.api_url,
        }
    }
}

impl From<FetchArgs> for FetchOptions {
    fn from(args: FetchArgs) -> Self {
        Self {
            links_path: args.links,
            downloads_dir: args.downloads,
            dest_dir: args.dest,
            manifest_path: args.manifest,
            api_base: args.api_url,
        }
    }
}
