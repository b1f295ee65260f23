//! CLI for Navillera.

mod commands;
mod console;
#[cfg(unix)]
mod control_socket;
mod inputs;
mod options;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use navillera_core::config;
use std::path::PathBuf;

use commands::{
    run_completions, run_config, run_dispatch, run_fetch, run_manpage, run_stop, run_test,
    run_version,
};
use options::OptionArgs;

/// Top-level CLI for Navillera.
#[derive(Debug, Parser)]
#[command(name = "navillera")]
#[command(about = "Navillera: download URL lists with gallery-dl in length-bounded batches", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every URL, splitting the list into as few tool invocations as fit.
    Run(RunArgs),

    /// Download or update the gallery-dl executable.
    Fetch {
        /// Download even if the installed version is already the latest.
        #[arg(long)]
        force: bool,
        /// Download from this URL instead of the platform defaults (repeatable, tried in order).
        #[arg(long = "from", value_name = "URL")]
        from: Vec<String>,
    },

    /// Show the installed and the latest gallery-dl version.
    Version,

    /// Dry run: print the media URLs gallery-dl would download for one URL.
    Test {
        /// Gallery or post URL to resolve.
        url: String,
        #[command(flatten)]
        options: OptionArgs,
    },

    /// Ask a running `navillera run` to cancel (terminates in-flight batches).
    Stop,

    /// Print the config file path and its contents.
    Config,

    /// Print a shell completion script.
    Completions {
        /// Target shell.
        shell: Shell,
    },

    /// Print the man page (roff) to stdout.
    Manpage,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// URLs to download. `-` reads a list from stdin.
    #[arg(value_name = "URLS")]
    pub urls: Vec<String>,

    /// Read URLs from a text file, one per line (repeatable; `-` is stdin).
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub options: OptionArgs,

    /// Batches to run at once (default from config, 1 = sequential).
    #[arg(long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Command-line length ceiling for one invocation.
    #[arg(long, value_name = "CHARS")]
    pub max_command_len: Option<usize>,

    /// Pass repeated URLs through instead of dropping them.
    #[arg(long)]
    pub keep_duplicates: bool,

    /// Skip the periodic check for a newer gallery-dl.
    #[arg(long)]
    pub no_update_check: bool,

    /// Remember this run's download options as the new defaults.
    #[arg(long)]
    pub save: bool,
}

impl CliCommand {
    /// Parses the arguments and runs the command; returns the process exit code.
    pub async fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run(args) => return run_dispatch(cfg, args).await,
            CliCommand::Fetch { force, from } => run_fetch(&cfg, force, from).await?,
            CliCommand::Version => run_version(&cfg).await?,
            CliCommand::Test { url, options } => run_test(&cfg, &url, &options).await?,
            CliCommand::Stop => run_stop().await?,
            CliCommand::Config => run_config(&cfg)?,
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Manpage => run_manpage()?,
        }

        Ok(0)
    }
}

#[cfg(test)]
mod tests;
