// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Command-Line Interface
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! `merger-profile`: batch extraction of 1D stellar profiles from merger
//! snapshots.

mod commands;

use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "merger-profile")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Spherical and cylindrical profiles of a stellar merger", long_about = None)]
struct Cli {
    /// Log level (off, error, warn, info, debug, trace); RUST_LOG is used when unset
    #[arg(short, long, value_parser = parse_level)]
    log_level: Option<LevelFilter>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Profile a columnar dump in simulation units
    Dump(commands::dump::DumpArgs),
    /// Profile flattened mesh arrays from an .npz archive
    Mesh(commands::mesh::MeshArgs),
    /// List the built-in nuclear networks
    Networks(commands::networks::NetworksArgs),
    /// Check a run configuration without profiling
    Validate(commands::validate::ValidateArgs),
}

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    s.parse::<LevelFilter>().map_err(|_| {
        format!("unknown log level `{s}`, expected off, error, warn, info, debug or trace")
    })
}

fn init_logger(level: Option<LevelFilter>) {
    let mut builder = match level {
        Some(filter) => {
            let mut b = Builder::new();
            b.filter_level(filter);
            b
        }
        None => {
            let mut b = Builder::from_default_env();
            if std::env::var_os("RUST_LOG").is_none() {
                b.filter_level(LevelFilter::Info);
            }
            b
        }
    };
    builder.format_target(false).init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    match cli.command {
        Commands::Dump(args) => commands::dump::execute(args),
        Commands::Mesh(args) => commands::mesh::execute(args),
        Commands::Networks(args) => commands::networks::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
