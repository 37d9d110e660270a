//! # CLI Layer
//!
//! One client of the agroadmin library. This is the only place that:
//! - Parses arguments (clap)
//! - Sets up logging (tracing-subscriber, `AGROADMIN_LOG` or `--verbose`)
//! - Writes to stdout/stderr
//!
//! Each `handle_*` calls one [`AdminApi`] method and prints the `CmdResult`.

use super::render::{print_messages, render_distances, render_probe, render_record_list};
use super::setup::{Cli, Commands, ViewArgs};
use super::styles::STYLES;
use agroadmin::api::AdminApi;
use agroadmin::error::Result;
use agroadmin::init::initialize;
use agroadmin::lifecycle::LifecycleFilter;
use agroadmin::store::fs::FileStore;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "AGROADMIN_LOG";

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut ctx = initialize(cli.data_dir)?;
    let api = &mut ctx.api;

    match cli.command {
        Commands::List { collection, view } => handle_list(api, &collection, view),
        Commands::Archive {
            collection,
            indexes,
        } => {
            let result = api.archive(&collection, &indexes)?;
            print_messages(&result.messages);
            Ok(())
        }
        Commands::Delete {
            collection,
            indexes,
        } => {
            let result = api.delete(&collection, &indexes)?;
            print_messages(&result.messages);
            Ok(())
        }
        Commands::Restore {
            collection,
            indexes,
        } => {
            let result = api.restore(&collection, &indexes)?;
            print_messages(&result.messages);
            Ok(())
        }
        Commands::Purge {
            collection,
            indexes,
            yes,
        } => {
            let result = api.purge(&collection, &indexes, yes)?;
            print_messages(&result.messages);
            Ok(())
        }
        Commands::EmptyBin { collection, yes } => {
            let result = api.empty_bin(&collection, yes)?;
            print_messages(&result.messages);
            Ok(())
        }
        Commands::Import { file } => handle_import(api, file),
        Commands::Probe { collection } => handle_probe(api, &collection),
        Commands::Distance {
            origin,
            destination,
            limit,
        } => handle_distance(api, &origin, destination.as_deref(), limit),
        Commands::Map { query } => {
            let url = api.map_link(&query.join(" "))?;
            println!("{}", STYLES.link.apply_to(url.as_str()));
            Ok(())
        }
        Commands::Init => {
            let result = api.init()?;
            print_messages(&result.messages);
            Ok(())
        }
    }
}

/// Logs go to stderr. `AGROADMIN_LOG` takes an `EnvFilter` directive;
/// `--verbose` turns on debug for this crate.
fn init_logging(verbose: bool) {
    let default = if verbose { "agroadmin=debug" } else { "agroadmin=warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_list(api: &mut AdminApi<FileStore>, collection: &str, view: ViewArgs) -> Result<()> {
    let filter = if view.deleted {
        LifecycleFilter::Deleted
    } else if view.archived {
        LifecycleFilter::Archived
    } else {
        LifecycleFilter::Active
    };
    let result = api.list(collection, filter)?;
    print!("{}", render_record_list(&result.listed_records, filter));
    print_messages(&result.messages);
    Ok(())
}

fn handle_import(api: &mut AdminApi<FileStore>, file: PathBuf) -> Result<()> {
    let result = api.import_contacts(&file)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_probe(api: &mut AdminApi<FileStore>, collection: &str) -> Result<()> {
    let result = api.capabilities(collection)?;
    if let Some(report) = &result.probe {
        print!("{}", render_probe(report));
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_distance(
    api: &mut AdminApi<FileStore>,
    origin: &str,
    destination: Option<&str>,
    limit: usize,
) -> Result<()> {
    let result = match destination {
        Some(destination) => api.distance(origin, destination)?,
        None => api.nearest_companies(origin, limit)?,
    };
    print!("{}", render_distances(&result.distances));
    print_messages(&result.messages);
    Ok(())
}
