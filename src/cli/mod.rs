//! CLI argument definitions for settle.

use crate::domains::Domain;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// settle - validated, layered application settings.
///
/// Settings for each domain (ui, app, user, asset) are built from compiled-in
/// defaults, the settings server and local overrides, and are always checked
/// against the domain schema before they are stored.
#[derive(Parser, Debug)]
#[command(name = "settle")]
#[command(author, version, about = "Validated, layered application settings", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Directory holding persisted settings and config.kdl.
    /// Can also be set via SETTLE_DATA_DIR environment variable.
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the current settings of one domain, or of all domains
    Show {
        /// Domain to show (ui, app, user, asset)
        domain: Option<Domain>,

        /// Dotted path inside the domain (e.g. theme.dark, features.core.pwa)
        #[arg(long, requires = "domain")]
        path: Option<String>,
    },

    /// Change one value; the whole domain is re-validated before saving
    Set {
        /// Domain to update
        domain: Domain,

        /// Dotted path of the value (e.g. leftDrawer.width)
        path: String,

        /// New value, parsed as JSON; anything that is not JSON is stored as a string
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Restore a domain to its defaults
    Reset {
        /// Domain to reset
        domain: Domain,
    },

    /// Check every domain's persisted settings against its schema
    Validate,

    /// Resolve a feature flag from the app domain
    Feature {
        /// Feature path under `features` (e.g. core.offline)
        path: String,
    },

    /// Fetch settings and translations from the server and apply them
    Sync {
        /// Application identifier (overrides config and SETTLE_APP_ID)
        #[arg(long)]
        app_id: Option<String>,

        /// Language tag (overrides config and SETTLE_LANGUAGE)
        #[arg(long)]
        language: Option<String>,

        /// Server base URL (overrides config and SETTLE_SERVER_URL)
        #[arg(long)]
        server_url: Option<String>,

        /// Fetch timeout in milliseconds (1-120000)
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// List every key with its effective value and where it came from
    List,

    /// Get the effective value of a key
    Get {
        /// Config key (app-id, language, server-url, timeout-ms, output-format)
        key: String,
    },

    /// Set a key in config.kdl
    Set {
        /// Config key
        key: String,

        /// New value
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        // This will panic if the CLI is misconfigured
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_set() {
        let cli = Cli::try_parse_from(["settle", "-H", "set", "ui", "theme.dark", "true"]).unwrap();
        assert!(cli.human_readable);
        match cli.command {
            Commands::Set {
                domain,
                path,
                value,
            } => {
                assert_eq!(domain, Domain::Ui);
                assert_eq!(path, "theme.dark");
                assert_eq!(value, "true");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_domain_rejected() {
        assert!(Cli::try_parse_from(["settle", "reset", "billing"]).is_err());
    }

    #[test]
    fn test_path_requires_domain() {
        assert!(Cli::try_parse_from(["settle", "show", "--path", "theme"]).is_err());
    }
}
