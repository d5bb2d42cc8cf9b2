//! CLI entry point for tinyblog

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tinyblog::Site;

#[derive(Parser)]
#[command(name = "tinyblog")]
#[command(version)]
#[command(about = "A small static blog generator with page size budgets", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Configuration file, relative to the base directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site
    #[command(alias = "b")]
    Build {
        /// Output directory (overrides `output_dir`)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Print the build report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build, then serve the output locally
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Do not watch for changes
        #[arg(long)]
        no_watch: bool,
    },

    /// Remove the output directory
    Clean,

    /// List site content
    List {
        /// Type of content to list (posts, pages, categories)
        #[arg(default_value = "posts")]
        r#type: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "tinyblog=debug,info"
    } else {
        "tinyblog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Cannot determine the current directory")?,
    };

    let site = match &cli.config {
        Some(path) => Site::with_config_file(&base_dir, path),
        None => Site::new(&base_dir),
    }
    .with_context(|| format!("Failed to open site in {:?}", base_dir))?;

    match cli.command {
        Commands::Build { out, json } => {
            let out = out.map(|dir| if dir.is_absolute() { dir } else { base_dir.join(dir) });
            let report = tinyblog::commands::build::run(&site, out)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Generated successfully into {:?}", report.out_dir);
            }
        }

        Commands::Serve { port, ip, no_watch } => {
            tracing::info!("Building site...");
            site.build()?;

            tinyblog::server::start(&site, &ip, port, !no_watch).await?;
        }

        Commands::Clean => {
            tracing::info!("Cleaning output folder...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            tinyblog::commands::list::run(&site, &r#type)?;
        }
    }

    Ok(())
}
