use anyhow::Result;
use clap::{Parser, Subcommand};

use coin_dash::cli::{self, ConfigAction, OutputFormat, ThemeAction};

#[derive(Debug, Parser)]
#[command(name = "coin-dash")]
#[command(about = "Crypto price proxy and live dashboard")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the /api/prices proxy and the dashboard
    Serve {
        /// Listen address (default from config: 127.0.0.1:3000)
        #[arg(long)]
        addr: Option<String>,
        /// Don't open the dashboard in a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Fetch the top coins once and print them
    Prices {
        /// Case-insensitive name/symbol filter
        #[arg(long, short)]
        query: Option<String>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Read from a running server (e.g. http://127.0.0.1:3000) instead of the upstream
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Show or change the saved dashboard theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeCommand>,
    },
    /// Summarize logged refresh cycles
    History {
        /// Number of recent cycles to list
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Check config, preferences and log locations
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ThemeCommand {
    /// Print the current theme
    Show,
    /// Switch between light and dark
    Toggle,
    /// Set the theme explicitly
    Set {
        /// light or dark
        theme: String,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Write the default config to ~/.coin-dash/config.toml
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. dashboard.refresh_interval_secs 30
    Set { key: String, value: String },
    /// Overwrite the global config with defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Serve { addr, no_browser } => cli::run_serve(addr, no_browser),
        Commands::Prices {
            query,
            format,
            endpoint,
        } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_prices(query.as_deref(), fmt, endpoint.as_deref())
        }
        Commands::Theme { action } => {
            let action = match action {
                None | Some(ThemeCommand::Show) => ThemeAction::Show,
                Some(ThemeCommand::Toggle) => ThemeAction::Toggle,
                Some(ThemeCommand::Set { theme }) => ThemeAction::Set(theme),
            };
            cli::run_theme(action)
        }
        Commands::History { limit, format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_history(limit, fmt)
        }
        Commands::Health => cli::run_health(),
        Commands::Config { action } => {
            let action = match action {
                ConfigCommand::Show => ConfigAction::Show,
                ConfigCommand::Init { force } => ConfigAction::Init { force },
                ConfigCommand::Set { key, value } => ConfigAction::Set { key, value },
                ConfigCommand::Reset => ConfigAction::Reset,
            };
            cli::run_config(action)
        }
    }
}
