//! wicket-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `WICKET_*`
//! environment overrides, connects to the configured spreadsheet as a
//! service account, and serves the membership gate over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use wicket_core::{
  expiry::offset_from_hours,
  session::SessionGate,
  store::MemberStore,
  token::{TokenConfig, TokenService},
};
use wicket_server::{AppState, ServerConfig};
use wicket_store_sheets::{ServiceAccountKey, SheetsBackend};

#[derive(Parser)]
#[command(author, version, about = "Wicket membership gate server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("WICKET"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  anyhow::ensure!(
    !server_cfg.admin_key.trim().is_empty(),
    "admin_key must be configured",
  );

  let offset = offset_from_hours(server_cfg.utc_offset_hours)
    .context("utc_offset_hours out of range")?;

  // Credentials: inline JSON wins, else the key file. Diagnostics name the
  // problem, never the key contents.
  let raw_key = match (&server_cfg.service_account_json, &server_cfg.service_account_path) {
    (Some(json), _) if !json.trim().is_empty() => json.clone(),
    (_, Some(path)) => std::fs::read_to_string(path)
      .with_context(|| format!("failed to read service-account key at {path:?}"))?,
    _ => anyhow::bail!(
      "no service-account credentials configured \
       (set service_account_path or service_account_json)",
    ),
  };
  let key = ServiceAccountKey::from_json(&raw_key)?;

  let backend = SheetsBackend::connect(key, &server_cfg.spreadsheet, &server_cfg.worksheet)
    .await
    .context("failed to connect to the membership spreadsheet")?;

  let store = MemberStore::new(backend, offset);
  let tokens = TokenService::new(
    store,
    TokenConfig {
      validity_days: server_cfg.default_validity_days,
      plan:          server_cfg.default_plan.clone(),
    },
  );

  let state = AppState {
    gate:   Arc::new(SessionGate::new(tokens)),
    config: Arc::new(server_cfg.clone()),
  };

  let app = wicket_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
