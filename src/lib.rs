//! appsync - Application Inventory Sync
//!
//! Scans installed application bundles, enriches them with generated
//! multi-language descriptions, categories and function tags, and keeps the
//! results durable (record store), visible (per-file comments) and
//! searchable (search index).
//!
//! The library is organised around capability traits so every external
//! effect can be swapped for an in-memory fake:
//!
//! * [`scanner::ManifestReader`] reads bundle manifests
//! * [`sinks::CommentSink`] reads and writes per-file comments
//! * [`sinks::SearchIndexSink`] publishes searchable documents
//! * [`icons::IconRenderer`] renders bundle icons
//! * [`enrich::DescriptionGenerator`] produces descriptions and tags

pub mod cli;
pub mod commands;
pub mod config;
pub mod enrich;
pub mod entry;
pub mod error;
pub mod icons;
pub mod inventory;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod sinks;
pub mod store;

use std::io::IsTerminal;

use cli::{Cli, Commands};
use commands::Session;
use config::Config;
use error::ExitCode;

/// Run the CLI application.
///
/// Initializes logging and colors, resolves the layered configuration and
/// dispatches to the subcommand.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    output::set_color_enabled(!cli.no_color && std::io::stdout().is_terminal());

    let config = Config::load(cli.config.as_deref(), &cli.overrides());
    log::debug!("Effective configuration: {:?}", config);

    let session = Session::new(&cli, config)?;
    match &cli.command {
        Commands::Scan(args) => commands::scan(&session, args),
        Commands::Enrich(args) => commands::enrich(&session, args),
        Commands::Describe(args) => commands::describe(&session, args),
        Commands::Search(args) => commands::search(&session, args),
        Commands::Stats(args) => commands::stats(&session, args),
        Commands::Prune => commands::prune(&session),
        Commands::Clear(args) => commands::clear(&session, args),
        Commands::Config(args) => commands::config(&cli, &session, args),
    }
}
