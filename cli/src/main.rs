//! portmem CLI - List listening ports with their owning process and its
//! memory usage, as JSON.

mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use portmem_core::ProtocolSelection;

#[derive(Parser)]
#[command(name = "portmem")]
#[command(author, version, about = "List listening ports with process memory usage")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Filter by port number
    #[arg(short, long)]
    port: Option<u16>,

    /// Filter by process name (case-insensitive substring)
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Protocols to enumerate: all, tcp or udp
    #[arg(long)]
    protocol: Option<ProtocolSelection>,

    /// Indent width of the JSON output
    #[arg(long, conflicts_with = "compact")]
    indent: Option<usize>,

    /// Print the JSON array on a single line
    #[arg(long)]
    compact: bool,

    /// Use an alternate config file
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the effective configuration, or change it
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set a key in the config file (indent, protocols, procRoot)
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    match cli.command {
        Some(Commands::Config { action: None }) => {
            commands::config::show(cli.config_path).await?;
        }
        Some(Commands::Config {
            action: Some(ConfigAction::Set { key, value }),
        }) => {
            commands::config::set(cli.config_path, &key, &value).await?;
        }
        None => {
            let options = commands::inspect::Options {
                port: cli.port,
                name: cli.name,
                protocol: cli.protocol,
                indent: cli.indent,
                compact: cli.compact,
                config: cli.config_path,
            };
            commands::inspect::run(options).await?;
        }
    }

    Ok(())
}
