//! Default command - print listening ports as JSON.

use std::path::PathBuf;

use anyhow::Result;
use portmem_core::{OutputFormat, ProtocolSelection, RecordFilter, SystemInspector};

/// Command-line overrides on top of the config file.
pub struct Options {
    pub port: Option<u16>,
    pub name: Option<String>,
    pub protocol: Option<ProtocolSelection>,
    pub indent: Option<usize>,
    pub compact: bool,
    pub config: Option<PathBuf>,
}

pub async fn run(options: Options) -> Result<()> {
    let mut config = super::config::load(options.config).await?;
    if let Some(protocol) = options.protocol {
        config.protocols = protocol;
    }

    let format = if options.compact {
        OutputFormat::Compact
    } else {
        OutputFormat::Pretty {
            indent: options.indent.unwrap_or(config.indent),
        }
    };

    let filter = RecordFilter {
        port: options.port,
        name: options.name,
    };

    let inspector = SystemInspector::from_config(&config);
    let records = inspector.inspect_filtered(&filter).await?;
    tracing::info!(count = records.len(), "listening ports inspected");

    println!("{}", format.render(&records)?);
    Ok(())
}
