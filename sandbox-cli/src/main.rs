//! # sandbox-cli
//!
//! Command-line front end for the WESL sandbox.
//!
//! ## Commands
//!
//! - `files`: List, show, add, remove, rename and edit project files
//! - `select`: Select a file
//! - `linker`: Show or switch the active linker
//! - `option` / `options`: Set or show linker options
//! - `publish`: Publish the project to the share service
//! - `load`: Load a share or a permalink
//! - `link`: Print a permalink for the project
//! - `decode`: Decode a link token
//! - `config`: Show or update `sandbox.toml`
//! - `status`: Show sandbox status
//!
//! ## Example
//!
//! ```bash
//! # Edit the project
//! sandbox-cli files add shapes.wgsl --source "fn area() -> f32 { return 1.0; }"
//! sandbox-cli option set strip true
//!
//! # Share it
//! sandbox-cli publish
//!
//! # Somewhere else
//! sandbox-cli load 3f9a0c12e4b7d561
//! ```

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

mod commands;
mod config;

use commands::configure::ConfigUpdate;
use commands::{configure, decode, files, linker, share, status, Context};
use config::{set_dir_permissions_0700, CliConfig};

/// Command-line front end for the WESL sandbox.
#[derive(Parser, Debug)]
#[command(name = "sandbox-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for the project store and settings
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to sandbox.toml in the data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use an in-process mock share service (for testing/demo)
    #[arg(long, global = true)]
    mock: bool,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Work with project files
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },

    /// Select a file
    Select {
        /// File name
        name: String,
    },

    /// Show the active linker, or switch to another
    Linker {
        /// Linker to switch to (primary or alternate)
        name: Option<String>,
    },

    /// Change a linker option
    #[command(name = "option")]
    SetOption {
        #[command(subcommand)]
        action: OptionAction,
    },

    /// Show linker options
    Options {
        /// Linker to show (defaults to the active one)
        #[arg(long, short)]
        linker: Option<String>,
    },

    /// Publish the project and print its share handle
    Publish,

    /// Load a share URL, /s/<handle> path, bare handle, or permalink
    Load {
        /// What to load
        target: String,
    },

    /// Print a permalink that reproduces the project
    Link {
        /// Base URL for the link (defaults to page_url from the config)
        #[arg(long)]
        base: Option<String>,
    },

    /// Decode a link token
    Decode {
        /// Token to decode
        token: String,
    },

    /// Show or update the configuration
    Config {
        /// Share service URL
        #[arg(long)]
        share_url: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Base URL for permalinks
        #[arg(long)]
        page_url: Option<String>,
    },

    /// Show sandbox status
    Status,
}

#[derive(Subcommand, Debug)]
enum FilesAction {
    /// List files
    List,

    /// Print a file's source
    Show {
        /// File name (defaults to the selected file)
        name: Option<String>,
    },

    /// Add a file and select it
    Add {
        /// File name (defaults to the next untitled-N.wgsl)
        name: Option<String>,

        /// Initial source
        #[arg(long, short, conflicts_with = "from")]
        source: Option<String>,

        /// Read the initial source from a file
        #[arg(long, short)]
        from: Option<PathBuf>,
    },

    /// Remove a file
    Rm {
        /// File name
        name: String,
    },

    /// Rename a file
    Rename {
        /// Current name
        from: String,
        /// New name
        to: String,
    },

    /// Replace a file's source
    Edit {
        /// File name (defaults to the selected file)
        name: Option<String>,

        /// New source (or use --from, or pipe it on stdin)
        #[arg(long, short, conflicts_with = "from")]
        source: Option<String>,

        /// Read the new source from a file
        #[arg(long, short)]
        from: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum OptionAction {
    /// Set an option; the value is read as JSON when it parses, otherwise as text
    Set {
        /// Option name
        key: String,

        /// New value
        value: String,

        /// Linker whose options to change (defaults to the active one)
        #[arg(long, short)]
        linker: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;
    set_dir_permissions_0700(&data_dir).await?;

    let config = CliConfig::load(&data_dir, cli.config.as_deref()).await?;
    let ctx = Context::new(data_dir, config, cli.mock);

    match cli.command {
        Commands::Files { action } => match action {
            FilesAction::List => files::list(&ctx).await?,
            FilesAction::Show { name } => files::show(&ctx, name.as_deref()).await?,
            FilesAction::Add { name, source, from } => {
                let source = match from {
                    Some(path) => Some(read_source(&path).await?),
                    None => source,
                };
                files::add(&ctx, name.as_deref(), source).await?;
            }
            FilesAction::Rm { name } => files::remove(&ctx, &name).await?,
            FilesAction::Rename { from, to } => files::rename(&ctx, &from, &to).await?,
            FilesAction::Edit { name, source, from } => {
                let source = match (source, from) {
                    (Some(source), _) => source,
                    (None, Some(path)) => read_source(&path).await?,
                    (None, None) => read_stdin()?,
                };
                files::edit(&ctx, name.as_deref(), source).await?;
            }
        },
        Commands::Select { name } => files::select(&ctx, &name).await?,
        Commands::Linker { name } => linker::run(&ctx, name.as_deref()).await?,
        Commands::SetOption {
            action:
                OptionAction::Set {
                    key,
                    value,
                    linker: name,
                },
        } => {
            linker::set_option(&ctx, name.as_deref(), &key, &value).await?;
        }
        Commands::Options { linker: name } => linker::show_options(&ctx, name.as_deref()).await?,
        Commands::Publish => share::publish(&ctx).await?,
        Commands::Load { target } => share::load(&ctx, &target).await?,
        Commands::Link { base } => share::link(&ctx, base.as_deref()).await?,
        Commands::Decode { token } => decode::run(&token)?,
        Commands::Config {
            share_url,
            timeout_secs,
            page_url,
        } => {
            let update = ConfigUpdate {
                share_url,
                timeout_secs,
                page_url,
            };
            configure::run(&ctx.data_dir, ctx.config.clone(), update).await?;
        }
        Commands::Status => status::run(&ctx).await?,
    }

    Ok(())
}

/// Log to stderr, honouring `RUST_LOG` when set.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("sandbox_cli=debug,sandbox_client=debug,sandbox_core=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn read_source(path: &std::path::Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn read_stdin() -> Result<String> {
    let mut source = String::new();
    std::io::stdin()
        .read_to_string(&mut source)
        .context("Failed to read source from stdin")?;
    Ok(source)
}

/// Get the default data directory for sandbox-cli.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("org", "wesl", "sandbox-cli")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
