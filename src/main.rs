use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use mintdesk::config::MintdeskConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "mintdesk")]
#[command(version, about = "Securities back-office: token allocation summaries and confirmed minting")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Answer yes to confirmation prompts
    #[arg(long, global = true)]
    pub yes: bool,

    #[arg(long, global = true, env = "MINTDESK_PROJECT_DIR")]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create .mintdesk/, a default mintdesk.toml and the database
    Init,
    /// Run the back-office HTTP server
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,

        /// Database path (overrides mintdesk.toml)
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Enable dev mode (CORS permissive for a local front-end dev server)
        #[arg(long)]
        dev: bool,
    },
    /// Load projects, investors, subscriptions and allocations from a JSON seed file
    Import { file: PathBuf },
    /// List projects
    Projects,
    /// Show token group summaries for a project
    Summary {
        project: String,

        /// Only token types containing this text (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        json: bool,
    },
    /// Mint token groups for a project
    Mint {
        project: String,

        /// Token type to mint (repeatable)
        #[arg(
            short = 't',
            long = "token-type",
            required_unless_present = "all_ready",
            conflicts_with = "all_ready"
        )]
        token_types: Vec<String>,

        /// Mint every token group that is ready
        #[arg(long)]
        all_ready: bool,

        #[arg(long)]
        json: bool,
    },
    /// Show the audit log of a project, newest first
    Audit {
        project: String,

        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default mintdesk.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    // A missing .env is fine.
    let _ = dotenvy::from_path(project_dir.join(".env"));

    let config = MintdeskConfig::new(project_dir)?;
    let _log_guard =
        mintdesk::logging::init_tracing(&config.toml.logging, config.log_dir().as_deref(), cli.verbose)?;

    match &cli.command {
        Commands::Init => cmd::cmd_init(&config)?,
        Commands::Serve {
            port,
            host,
            db_path,
            dev,
        } => {
            cmd::cmd_serve(
                config,
                cmd::ServeOverrides {
                    port: *port,
                    host: host.clone(),
                    db_path: db_path.clone(),
                    dev: *dev,
                },
            )
            .await?
        }
        Commands::Import { file } => cmd::cmd_import(&config, file)?,
        Commands::Projects => cmd::cmd_projects(&config)?,
        Commands::Summary {
            project,
            search,
            json,
        } => cmd::cmd_summary(&config, project, search.as_deref(), *json)?,
        Commands::Mint {
            project,
            token_types,
            all_ready,
            json,
        } => cmd::cmd_mint(
            &config,
            project,
            cmd::MintSelection::from_args(token_types, *all_ready),
            cli.yes,
            *json,
        )?,
        Commands::Audit { project, limit } => cmd::cmd_audit(&config, project, *limit)?,
        Commands::Config { command } => cmd::cmd_config(&config, command.clone())?,
    }

    Ok(())
}
