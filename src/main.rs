// src/main.rs

mod cli;
mod commands;
mod config;
mod csv_codec;
mod db;
mod dedup;
mod error;
mod exchange;
mod models;
mod pagination;
mod store;

use clap::Parser;
use cli::{Cli, Commands};
use commands::LogInput;
use config::Settings;
use error::Result;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RADIOLOG_LOG")
        .unwrap_or_else(|_| EnvFilter::new("radiolog=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::resolve(cli.db, cli.page_size)?;
    match cli.command {
        Commands::Init => commands::handle_init(&settings),
        Commands::Log { band, freq, call, rst, memo, edit, time } => commands::handle_log(
            &settings,
            LogInput { band, freq, call, rst, memo, edit, time },
        ),
        Commands::List { page } => commands::handle_list(&settings, page),
        Commands::Del { ids, page, yes } => commands::handle_del(&settings, &ids, page, yes),
        Commands::Export { dir, schema } => commands::handle_export(&settings, dir, &schema),
        Commands::Import { file } => commands::handle_import(&settings, file),
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
