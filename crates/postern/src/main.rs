//! # Postern contact gateway
//!
//! ```text
//! Browser → (CDN / reverse proxy) → Postern → SMTP relay
//!                                      ↓
//!                              Turnstile siteverify
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use postern::config::{AppConfig, ConfigOverrides};
use postern::limiter::RateLimiter;
use postern::{AppState, routes};

/// Postern - contact form gateway
#[derive(Parser, Debug)]
#[command(name = "postern")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/postern.toml")]
    config: String,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,

    /// SMTP login and sender address
    #[arg(long, env = "MAIL_USER", hide_env_values = true)]
    mail_user: Option<String>,

    /// SMTP password
    #[arg(long, env = "MAIL_PASS", hide_env_values = true)]
    mail_pass: Option<String>,

    /// Administrator mailbox
    #[arg(long, env = "ADMIN_TO", hide_env_values = true)]
    admin_to: Option<String>,

    /// Turnstile shared secret
    #[arg(long, env = "TURNSTILE_SECRET", hide_env_values = true)]
    turnstile_secret: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            listen: self.listen.clone(),
            mail_user: self.mail_user.clone(),
            mail_pass: self.mail_pass.clone(),
            admin_to: self.admin_to.clone(),
            turnstile_secret: self.turnstile_secret.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env before clap so its values feed the env-backed flags
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();
    init_logging(&args.log_level, args.json_logs)?;

    info!("📮 Starting Postern v{}", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let config = AppConfig::load(&args.config, &args.overrides())?;
    info!(
        listen_addr = %config.listen_addr,
        contact_path = %config.contact_path,
        window_secs = config.rate_limit.window_secs,
        max_requests = config.rate_limit.max_requests,
        stages = ?config.pipeline.stages,
        "📋 Configuration loaded"
    );

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    let state = AppState::new(config.clone())?;

    if let Some(every) = config.rate_limit.idle_sweep_secs {
        let limiter = state.limiter.clone();
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            idle_sweep_worker(limiter, Duration::from_secs(every), shutdown).await;
        });
    }

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("🚀 Postern listening on {}", config.listen_addr);

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("🛑 Shutdown signal received");
        let _ = shutdown_tx.send(());
    };

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await
    .context("Server error")?;

    info!("👋 Postern shutdown complete");
    Ok(())
}

/// Periodically evict identities with no admission left in the window
async fn idle_sweep_worker(
    limiter: Arc<RateLimiter>,
    every: Duration,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let evicted = limiter.purge_idle();
                if evicted > 0 {
                    tracing::debug!(evicted, remaining = limiter.tracked_identities(), "Idle identities evicted");
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
            .context("Failed to install JSON logger")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()
            .context("Failed to install logger")?;
    }

    Ok(())
}
