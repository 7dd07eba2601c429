mod cli;
mod commands;
mod config;
mod error;
mod processing;

use clap::Parser;
use tracing::subscriber::set_global_default;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::EnvFilter;

use crate::cli::{
    Args,
    Commands,
};
use crate::commands::{
    main_score,
    main_write_template,
};
use crate::error::CliError;

#[cfg(target_os = "windows")]
use mimalloc::MiMalloc;

#[cfg(target_os = "windows")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Log filter from a `RUST_LOG` style directive string, `info` when none is
/// given. Directives that fail to parse are skipped.
fn build_filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives.unwrap_or_default())
}

/// Logs go to stderr, stdout stays free for command output.
fn init_logging() -> Result<(), CliError> {
    let directives = std::env::var("RUST_LOG").ok();
    let subscriber = Registry::default()
        .with(build_filter(directives.as_deref()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<(), CliError> {
    init_logging()?;
    let args = Args::parse();

    match args.command {
        Some(Commands::Score(args)) => main_score(args)?,
        Some(Commands::WriteTemplate(args)) => main_write_template(args)?,
        None => {
            println!("No command provided, see --help");
        }
    }
    Ok(())
}
