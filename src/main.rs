mod cli;

use leveled_logger::config::Config;
use leveled_logger::error::{self, Result};
use leveled_logger::logging;
use log::info;
use std::path::Path;

/// Initialize simple console logging for init/completions commands
fn init_simple_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else if quiet {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn main() -> Result<()> {
    use clap::Parser;
    let cli = cli::opts::Cli::parse();

    match &cli.command {
        Some(cli::opts::Commands::Init { output, force }) => {
            init_simple_logging(cli.verbose, cli.quiet);
            cli::init::handle_init(output, *force)
        }
        Some(cli::opts::Commands::Completions { shell }) => {
            cli::opts::Cli::generate_completions(*shell);
            Ok(())
        }
        Some(cli::opts::Commands::Emit {
            config,
            level,
            message,
        }) => {
            let cfg = prepare(config, cli.verbose, cli.quiet)?;
            cli::emit::handle_emit(&cfg, level, &message.join(" "))
        }
        Some(cli::opts::Commands::Show { config, table }) => {
            let cfg = prepare(config, cli.verbose, cli.quiet)?;
            cli::show::handle_show(&cfg, table)
        }
        Some(cli::opts::Commands::Validate { config }) => {
            let cfg = prepare(config, cli.verbose, cli.quiet)?;
            cli::validate::handle_validate(&cfg)
        }
        None => {
            print_help();
            std::process::exit(1);
        }
    }
}

/// 加载并校验配置，应用 -v/-q 覆盖后初始化诊断通道
fn prepare(config_path: &str, verbose: bool, quiet: bool) -> Result<Config> {
    let mut cfg = load_config(config_path)?;
    cfg.validate()?;

    if verbose {
        cfg.diagnostics.level = "debug".to_string();
    } else if quiet {
        cfg.diagnostics.level = "error".to_string();
    }

    logging::init_diagnostics(&cfg.diagnostics)?;
    info!("Configuration loaded: {config_path}");
    Ok(cfg)
}

fn load_config(config_path: &str) -> Result<Config> {
    let path = Path::new(config_path);
    match Config::from_file(path) {
        Ok(c) => Ok(c),
        Err(e) => {
            if let error::Error::Config(error::ConfigError::NotFound(_)) = &e {
                eprintln!(
                    "Configuration file not found: {config_path}, using default configuration"
                );
                eprintln!("Tip: run 'lvlog init' to generate a configuration file");
                Ok(Config::default())
            } else {
                Err(e)
            }
        }
    }
}

fn print_help() {
    eprintln!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    eprintln!("lvlog - leveled logger with console/file/database sinks");
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    eprintln!("\nUsage: lvlog <COMMAND> [OPTIONS]");
    eprintln!("\nCommands:");
    eprintln!("  emit         Send one message through the configured sinks");
    eprintln!("  show         Print a log table from the database sink");
    eprintln!("  init         Generate a default configuration file");
    eprintln!("  validate     Validate a configuration file");
    eprintln!("  completions  Generate shell completion scripts");
    eprintln!("\nOptions:");
    eprintln!("  -v, --verbose   Enable verbose diagnostics (debug level)");
    eprintln!("  -q, --quiet     Suppress non-error diagnostics");
    eprintln!("  -h, --help      Print help information");
    eprintln!("  -V, --version   Print version information");
    eprintln!("\nExamples:");
    eprintln!("  # Initialize configuration");
    eprintln!("  lvlog init");
    eprintln!("\n  # Send a warning to every sink");
    eprintln!("  lvlog emit -l warn \"disk almost full\"");
    eprintln!("\n  # Show the warn_logs table");
    eprintln!("  lvlog show -c config.toml -t warn");
    eprintln!("\n  # Validate configuration");
    eprintln!("  lvlog validate -c config.toml");
    eprintln!("\nFor more help: lvlog --help");
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}
