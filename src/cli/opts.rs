use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use leveled_logger::constants::DEFAULT_CONFIG_PATH;

/// Leveled logger with console, file and database sinks
#[derive(Debug, Parser)]
#[command(
    name = "lvlog",
    version,
    about = "Filter, format and route log messages to console/file/PostgreSQL/SQLite sinks",
    long_about = "A small leveled logging tool: messages below the configured threshold are dropped, the rest are written to every configured sink. The database sink keeps one table per level plus a combined 'mylogs' table."
)]
pub struct Cli {
    /// Enable verbose diagnostics (debug level)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Suppress non-error diagnostics (error level only)
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Send one message through the configured sinks
    Emit {
        /// Configuration file path
        #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH)]
        config: String,
        /// Severity: debug, info, warn, error
        #[arg(short = 'l', long = "level", default_value = "info")]
        level: String,
        /// Message text (multiple words are joined with spaces)
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// Print the contents of a log table from the database sink
    Show {
        /// Configuration file path
        #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH)]
        config: String,
        /// Table: mylogs, debug, info, warn, error (or the full *_logs name)
        #[arg(short = 't', long = "table", default_value = "mylogs")]
        table: String,
    },
    /// Generate a default configuration file
    Init {
        /// Output configuration file path
        #[arg(short = 'o', long = "output", default_value = DEFAULT_CONFIG_PATH)]
        output: String,
        /// Force overwrite if file exists
        #[arg(short = 'f', long = "force")]
        force: bool,
    },
    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH)]
        config: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Generate shell completions
    pub fn generate_completions(shell: Shell) {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
    }
}
