//! media-archive: video catalog service
//!
//! Serves the catalog API over HTTP. Configuration comes from a TOML file,
//! with a handful of CLI/env overrides.

use std::net::SocketAddr;
use std::path::Path;

use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info, warn};

use media_archive::{auth::hash_password, build_state, create_router, Config};

#[derive(Parser)]
#[command(name = "media-archive")]
#[command(about = "Curated video catalog with screenshot uploads")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "MEDIA_ARCHIVE_CONFIG", default_value = "media-archive.toml")]
    config: String,

    /// HTTP port (overrides config file)
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Log level for this crate
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Admin email (overrides config file)
    #[arg(long, env = "ADMIN_EMAIL")]
    admin_email: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print an Argon2 hash for a local account password
    HashPassword {
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("media_archive={}", cli.log_level).parse()?),
        )
        .init();

    if let Some(Command::HashPassword { password }) = cli.command {
        println!("{}", hash_password(&password)?);
        return Ok(());
    }

    // Load or create default config
    let mut config = if Path::new(&cli.config).exists() {
        Config::load(Path::new(&cli.config))?
    } else {
        warn!("Config file {} not found, using defaults", cli.config);
        Config::default()
    };

    // Apply CLI overrides
    if let Some(port) = cli.port {
        config.server.http_port = port;
    }
    if let Some(admin_email) = cli.admin_email {
        config.auth.admin_email = admin_email;
    }

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  media-archive");
    info!("======================================");
    info!("Config file: {}", cli.config);
    info!("Port: {}", config.server.http_port);
    info!("Public URL: {}", config.server.public_base_url());
    info!("Storage: {:?} (bucket {})", config.storage.backend, config.storage.bucket);
    info!("Identity provider: {:?}", config.auth.provider);
    info!("Seed entries: {}", config.catalog.seed.len());
    info!("======================================");

    let state = build_state(&config)?;
    let app = create_router(state, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("media-archive stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
