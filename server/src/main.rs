use acd_core::{Config, SledStore};
use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};
use server::{build_app, AppState};
use tokio::net::TcpListener;

#[derive(Parser)]
struct Args {
    /// sled database directory (defaults to ACD_DB_PATH or ./acd-db)
    #[arg(long)]
    db: Option<String>,
    /// Key prefix of the index
    #[arg(long)]
    prefix: Option<String>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();
    let mut cfg = Config::from_env()?;
    if let Some(db) = args.db {
        cfg.db_path = db;
    }
    if let Some(prefix) = args.prefix {
        cfg.key_prefix = prefix;
    }

    let store = SledStore::open(&cfg.db_path).with_context(|| format!("opening database at {}", cfg.db_path))?;
    let state = AppState {
        store: Arc::new(store),
        keys: cfg.keyspace(),
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };
    let app: Router = build_app(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, db = %cfg.db_path, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
