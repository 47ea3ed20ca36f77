//! # Crustula CLI (`crustula`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `crustula init` | Create the SQLite database and run schema migrations |
//! | `crustula serve` | Start the HTTP server |
//! | `crustula add "<curl command>"` | Store a new jar from a copied curl command |
//! | `crustula lookup <url>` | Hand out the best jar for a URL |
//! | `crustula report <call-id> --success\|--failure` | Report whether a handed-out jar worked |
//! | `crustula jar <id>` | Show a jar with its stats and calls |
//! | `crustula domains` | Overview of all domains |
//! | `crustula delete <id>` | Delete a jar and its calls |

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

use crustula::{calls, config, domains, jars, logging, migrate, server};

/// Crustula: a cookie-jar cache for automated HTTP clients.
#[derive(Parser)]
#[command(
    name = "crustula",
    about = "Crustula: store browser sessions copied as curl commands and hand out the jar most likely to still work",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/crustula.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Store a new jar from a copied curl command.
    ///
    /// The command must contain an http(s) URL; its `-H 'Cookie: ...'`
    /// header becomes the jar's cookies.
    Add {
        /// The full curl command, quoted as one argument.
        curl_cmd: String,
    },

    /// Hand out the best jar for a URL and record a pending call.
    Lookup {
        url: String,

        /// Write the cookie-jar text to this file and print only the call id.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Report whether the jar handed out for a call worked.
    #[command(group(ArgGroup::new("outcome").required(true).args(["success", "failure"])))]
    Report {
        call_id: String,

        #[arg(long)]
        success: bool,

        #[arg(long)]
        failure: bool,

        /// Record the URL actually requested, if it differs from the lookup.
        #[arg(long)]
        url: Option<String>,
    },

    /// Show a jar with its ranking stats and call history.
    Jar { id: String },

    /// List every domain with its active jar and recent calls.
    Domains,

    /// Delete a jar and its calls.
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Add { curl_cmd } => {
            jars::run_add(&cfg, &curl_cmd).await?;
        }
        Commands::Lookup { url, output } => {
            jars::run_lookup(&cfg, &url, output.as_deref()).await?;
        }
        Commands::Report {
            call_id,
            success,
            failure: _,
            url,
        } => {
            calls::run_report(&cfg, &call_id, success, url).await?;
        }
        Commands::Jar { id } => {
            jars::run_show(&cfg, &id).await?;
        }
        Commands::Domains => {
            domains::run_domains(&cfg).await?;
        }
        Commands::Delete { id } => {
            jars::run_delete(&cfg, &id).await?;
        }
    }

    Ok(())
}
