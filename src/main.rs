// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise -v raises the default level
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Init { db_path }) => commands::cmd_init(&db_path),
        Some(Commands::Status { db_path }) => commands::cmd_status(&db_path),
        Some(Commands::Migrate {
            db_path,
            key_file,
            options,
            dry_run,
            validation_only,
            force,
            backup_dir,
            debug,
            no_auto_fill,
            json,
        }) => {
            let overrides = commands::MigrateFlags {
                dry_run,
                validation_only,
                force,
                backup_dir,
                debug,
                no_auto_fill,
            };
            commands::cmd_migrate(
                &db_path,
                key_file.as_deref(),
                options.as_deref(),
                overrides,
                json,
            )
        }
        Some(Commands::Validate {
            db_path,
            key_file,
            json,
        }) => commands::cmd_validate(&db_path, key_file.as_deref(), json),
        Some(Commands::Providers { db_path }) => commands::cmd_providers(&db_path),
        None => {
            println!("provider-migrate {}", env!("CARGO_PKG_VERSION"));
            println!("Run 'provider-migrate --help' for usage information.");
            Ok(())
        }
    }
}
