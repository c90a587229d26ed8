//! vitalyst-guard: operator CLI for the security core.
//!
//! ```text
//! vitalyst-guard [--config guard.toml] check-config
//! vitalyst-guard [--config guard.toml] check-password <PASSWORD>
//! vitalyst-guard [--config guard.toml] token [--bytes 32]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use vitalyst_guard::config::loader::load_config;
use vitalyst_guard::observability::logging::init_logging;
use vitalyst_guard::security::token::DEFAULT_TOKEN_BYTES;
use vitalyst_guard::{GuardConfig, SecurityService};

#[derive(Parser)]
#[command(name = "vitalyst-guard")]
#[command(about = "Security core tooling for the Vitalyst knowledge graph", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print the effective values
    CheckConfig,
    /// Evaluate a password against the configured policy
    CheckPassword { password: String },
    /// Print a fresh URL-safe token
    Token {
        /// Bytes of entropy in the token
        #[arg(short, long, default_value_t = DEFAULT_TOKEN_BYTES)]
        bytes: usize,
    },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };

    init_logging(&config.observability);
    tracing::debug!(config_path = ?cli.config, "Configuration loaded");

    match cli.command {
        Commands::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::CheckPassword { password } => {
            let service = SecurityService::from_config(Arc::new(config.security))?;
            if let Err(err) = service.validate_password(&password) {
                eprintln!("{err}");
                return Ok(ExitCode::FAILURE);
            }
            println!("password satisfies policy");
        }
        Commands::Token { bytes } => {
            let service = SecurityService::from_config(Arc::new(config.security))?;
            println!("{}", service.generate_token(bytes)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}
