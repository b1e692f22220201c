//! Inquilinos Relay Server
//!
//! Logs tenants in and relays their open-lock commands to the lock vendor.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use inquilinos_core::config::load_config;
use inquilinos_core::tracing_init::{LogFormat, init_tracing};
use inquilinos_relay::auth::JwtManager;
use inquilinos_relay::auth::password::hash_password;
use inquilinos_relay::server::{AppState, build_router};
use inquilinos_relay::users::UserDirectory;
use inquilinos_relay::vendor::{LockRelay, ReqwestCaller};

#[derive(Parser, Debug)]
#[command(name = "inquilinos-relay")]
#[command(version, about = "Inquilinos relay server - tenant login and smart-lock relay")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the JSON config file.
    #[arg(long, env = "INQUILINOS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config).
    #[arg(long, global = true)]
    addr: Option<SocketAddr>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Print an argon2id hash for a user directory entry.
    HashPassword {
        /// Plaintext password to hash.
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(Command::HashPassword { password }) = &args.command {
        let hash = hash_password(password)?;
        #[allow(clippy::print_stdout)]
        {
            println!("{}", hash.as_str());
        }
        return Ok(());
    }
    serve(args).await
}

async fn serve(args: Args) -> anyhow::Result<()> {
    init_tracing(
        "inquilinos_relay=info,tower_http=info",
        LogFormat::from_json_flag(args.log_json),
    )?;

    let mut config = load_config(args.config.as_deref()).context("Loading configuration")?;
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.addr,
        vendor = %config.vendor.base_url,
        "Starting inquilinos-relay"
    );

    let jwt = Arc::new(JwtManager::new(
        config.token.secret.as_bytes(),
        config.token.lifetime(),
    )?);

    let users_path = config
        .users
        .file
        .as_deref()
        .context("users.file is not configured")?;
    let users = Arc::new(UserDirectory::from_file(users_path)?);

    let caller = Arc::new(ReqwestCaller::new(config.vendor.timeout())?);
    let relay = Arc::new(LockRelay::new(Arc::new(config.vendor.clone()), caller));

    let app = build_router(AppState { jwt, users, relay });
    let listener = tokio::net::TcpListener::bind(config.server.addr)
        .await
        .with_context(|| format!("Binding {}", config.server.addr))?;
    info!(addr = %config.server.addr, "Relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await?;

    info!("Relay stopped");
    Ok(())
}
