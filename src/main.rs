mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use diag_core::DiagConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "flowstate-diag",
    about = "Diagnostic probes and analytics reports for a FlowState pose server",
    version,
    author
)]
struct Cli {
    /// Path to config file (default: ~/.config/flowstate-diag/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the server base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and render pose analytics for a user's most recent session
    Analytics {
        /// User whose analytics to fetch
        #[arg(short, long)]
        user: Option<String>,
        /// Render a saved analytics JSON document instead of fetching
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Probe the current-pose endpoint for status, latency and payload
    Pose,

    /// Check that the local camera opens and produces frames
    Camera {
        /// Capture device index
        #[arg(short, long)]
        device: Option<i32>,
        /// Number of frames to read
        #[arg(long)]
        frames: Option<u32>,
    },

    /// Camera check followed by the current-pose probe (default)
    Check,

    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize default configuration file
    Init,
    /// Print config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the report.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "flowstate_diag=info,warn".into()),
        )
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Init and path act on the file itself, which may not exist yet.
    let config_path = cli.config.clone().unwrap_or_else(DiagConfig::default_path);
    match &cli.command {
        Some(Commands::Config {
            action: Some(ConfigAction::Init),
        }) => return init_config(&config_path),
        Some(Commands::Config {
            action: Some(ConfigAction::Path),
        }) => {
            println!("{}", config_path.display());
            return Ok(());
        }
        _ => {}
    }

    let mut config = match &cli.config {
        Some(path) => DiagConfig::load_from(path)?,
        None => DiagConfig::load()?,
    };

    if let Some(base_url) = &cli.base_url {
        config.server.base_url = base_url.clone();
        config.validate()?;
    }

    tracing::debug!("Server: {}", config.server.base_url);

    match cli.command {
        Some(Commands::Analytics { user, file }) => {
            if let Some(user) = user {
                config.server.user_id = user;
                config.validate()?;
            }
            let lines = match file {
                Some(path) => commands::analytics_from_file(&path)?,
                None => commands::analytics_from_server(&config).await?,
            };
            commands::print_lines(&lines);
        }
        Some(Commands::Pose) => {
            commands::print_lines(&commands::pose_probe(&config).await?);
        }
        Some(Commands::Camera { device, frames }) => {
            if let Some(d) = device {
                config.camera.device = d;
            }
            if let Some(n) = frames {
                config.camera.frames = n;
            }
            commands::print_lines(&commands::camera_probe(&config.camera)?);
        }
        Some(Commands::Check) | None => {
            commands::print_lines(&commands::camera_probe(&config.camera)?);
            commands::print_lines(&commands::pose_probe(&config).await?);
        }
        Some(Commands::Config { .. }) => {
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
        }
    }

    Ok(())
}

/// Write a default config to `path`, leaving an existing file untouched.
fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists at: {}", path.display());
    } else {
        DiagConfig::default().save_to(path)?;
        println!("Created default config at: {}", path.display());
    }
    Ok(())
}
