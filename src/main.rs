//! CLI entry point for simpl-site

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use simpl_site::plugin::PluginRegistry;
use simpl_site::SimplSite;

#[derive(Parser)]
#[command(name = "simpl-site")]
#[command(version)]
#[command(about = "Render Markdown content through plugins and layout templates", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Config file, relative to the base directory
    #[arg(long, global = true, default_value = "simpl.yml")]
    config: PathBuf,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a local server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,
    },

    /// Render one request path to stdout
    Render {
        /// Request path, e.g. /blog/hello
        path: String,
    },

    /// List site information
    List {
        /// What to list (sources, plugins, templates)
        #[arg(default_value = "sources")]
        r#type: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "simpl_site=debug,info"
    } else {
        "simpl_site=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Commands::Version = cli.command {
        println!("simpl-site version {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let config_path = base_dir.join(&cli.config);

    let registry = PluginRegistry::with_builtins();
    let site = SimplSite::from_config_file(&config_path, &registry).await?;

    match cli.command {
        Commands::Serve { port, ip, open } => {
            tracing::info!("Starting server at http://{}:{}", ip, port);
            simpl_site::server::start(site, &ip, port, open).await?;
        }

        Commands::Render { path } => {
            if !simpl_site::commands::render::run(&site, &path).await? {
                std::process::exit(1);
            }
        }

        Commands::List { r#type } => {
            simpl_site::commands::list::run(&site, &registry, &r#type).await?;
        }

        Commands::Version => {}
    }

    Ok(())
}
