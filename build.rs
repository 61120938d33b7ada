// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: database path
fn db_path_arg() -> Arg {
    Arg::new("db_path")
        .short('d')
        .long("db-path")
        .value_name("PATH")
        .default_value("/var/lib/transfers/transfers.db")
        .help("Path to the database file")
}

/// Common argument: encryption passphrase file
fn key_file_arg() -> Arg {
    Arg::new("key_file")
        .short('k')
        .long("key-file")
        .value_name("PATH")
        .help("File holding the encryption passphrase")
}

fn flag(name: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(long).action(ArgAction::SetTrue).help(help)
}

fn build_cli() -> Command {
    Command::new("provider-migrate")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Transfer Scheduler Contributors")
        .about("Move inline transfer credentials into shared, encrypted storage providers")
        .subcommand_required(false)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Increase log verbosity (-v debug, -vv trace)"),
        )
        .subcommand(
            Command::new("init")
                .about("Create the database or upgrade its schema")
                .arg(db_path_arg()),
        )
        .subcommand(
            Command::new("status")
                .about("Show configuration and provider counts")
                .arg(db_path_arg()),
        )
        .subcommand(
            Command::new("migrate")
                .about("Migrate inline credentials to storage providers")
                .arg(db_path_arg())
                .arg(key_file_arg())
                .arg(
                    Arg::new("options")
                        .long("options")
                        .value_name("FILE")
                        .help("Load run options from a TOML file; flags override it"),
                )
                .arg(flag("dry_run", "dry-run", "Report what would be migrated without making changes"))
                .arg(flag("validation_only", "validation-only", "Validate current storage without making changes"))
                .arg(flag("force", "force", "Finish the run even if post-migration validation fails"))
                .arg(
                    Arg::new("backup_dir")
                        .long("backup-dir")
                        .value_name("DIR")
                        .help("Also write the pre-migration snapshot to this directory"),
                )
                .arg(flag("debug", "debug", "Keep field names in error messages, redacting only values"))
                .arg(flag("no_auto_fill", "no-auto-fill", "Fail instead of filling missing required fields with placeholders"))
                .arg(flag("json", "json", "Print run statistics as JSON")),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate that every configuration resolves through a provider")
                .arg(db_path_arg())
                .arg(key_file_arg())
                .arg(flag("json", "json", "Print the report as JSON")),
        )
        .subcommand(
            Command::new("providers")
                .about("List storage providers")
                .arg(db_path_arg()),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("provider-migrate.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
