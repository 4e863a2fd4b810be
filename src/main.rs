//! settle CLI - validated, layered application settings.

use clap::Parser;
use settle::cli::{Cli, Commands, ConfigCommands};
use settle::commands::{self, Output};
use settle::config::{self, ConfigOverrides};
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `settle=debug`).
const LOG_ENV: &str = "SETTLE_LOG";

fn main() {
    init_logging();

    let cli = Cli::parse();

    let data_dir = match config::resolve_data_dir(cli.data_dir.as_deref()) {
        Ok(resolved) => resolved.value,
        Err(e) => exit_with_error(&e, cli.human_readable),
    };
    let human = cli.human_readable || commands::prefers_human(&data_dir);

    if let Err(e) = run_command(cli.command, &data_dir, human) {
        exit_with_error(&e, human);
    }
}

/// Install the stderr subscriber, filtered by `SETTLE_LOG` (default: warn).
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_with_error(e: &settle::Error, human: bool) -> ! {
    if human {
        eprintln!("Error: {}", e);
    } else {
        eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
    }
    process::exit(1);
}

fn run_command(command: Commands, data_dir: &Path, human: bool) -> Result<(), settle::Error> {
    match command {
        Commands::Show { domain, path } => {
            let result = commands::show(data_dir, domain, path.as_deref())?;
            output(&result, human);
        }
        Commands::Set {
            domain,
            path,
            value,
        } => {
            let result = commands::set(data_dir, domain, &path, &value)?;
            output(&result, human);
        }
        Commands::Reset { domain } => {
            let result = commands::reset(data_dir, domain)?;
            output(&result, human);
        }
        Commands::Validate => {
            let result = commands::validate(data_dir)?;
            output(&result, human);
        }
        Commands::Feature { path } => {
            let result = commands::feature(data_dir, &path)?;
            output(&result, human);
        }
        Commands::Sync {
            app_id,
            language,
            server_url,
            timeout_ms,
        } => {
            let overrides = ConfigOverrides {
                app_id,
                language,
                server_url,
                timeout_ms,
                output_format: None,
            };
            let result = commands::sync(data_dir, &overrides)?;
            output(&result, human);
        }
        Commands::Config { command } => match command {
            ConfigCommands::List => {
                let result = commands::config_list(data_dir)?;
                output(&result, human);
            }
            ConfigCommands::Get { key } => {
                let result = commands::config_get(data_dir, &key)?;
                output(&result, human);
            }
            ConfigCommands::Set { key, value } => {
                let result = commands::config_set(data_dir, &key, &value)?;
                output(&result, human);
            }
        },
    }
    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
