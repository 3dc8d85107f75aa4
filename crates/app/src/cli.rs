//! Command-line arguments

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "calfeed")]
#[command(about = "Fetch third-party data as calendar events")]
pub struct Cli {
    /// Config file (TOML or JSON). Probed from the working directory when
    /// omitted.
    #[arg(short, long, value_name = "FILE", env = "CALFEED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the available feeds
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run one feed and print its events
    Run {
        /// Feed id, as shown by `list`
        feed: String,

        /// Setting override, repeatable. Lists may be comma-separated.
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        settings: Vec<String>,

        /// Print events as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Load `.env`, then parse `args`
///
/// `.env` may set `CALFEED_CONFIG` and `RUST_LOG`, so it must be loaded before
/// clap reads the environment and before logging is initialized. `env_file`
/// replaces the usual upward search for `.env`. The load outcome is returned
/// for logging once a subscriber exists.
pub fn load_env_then_parse<I, T>(
    env_file: Option<&Path>,
    args: I,
) -> Result<(Cli, dotenvy::Result<PathBuf>), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let dotenv = match env_file {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };
    let cli = Cli::try_parse_from(args)?;
    Ok((cli, dotenv))
}
