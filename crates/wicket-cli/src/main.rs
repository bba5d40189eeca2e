//! `wicket` — operator utility for the membership table.
//!
//! Talks straight to the spreadsheet backend, bypassing the HTTP server,
//! with the same `config.toml` the server reads. The plaintext token is
//! printed exactly once on `issue`; it is never stored or logged anywhere.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use wicket_core::{
  expiry::offset_from_hours,
  store::MemberStore,
  token::{TokenConfig, TokenService},
};
use wicket_store_sheets::{ServiceAccountKey, SheetsBackend};

#[derive(Parser)]
#[command(author, version, about = "Wicket membership operator utility")]
struct Cli {
  /// Path to the TOML configuration file (shared with the server).
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Issue (or re-issue) an access token. Prints the plaintext once.
  Issue {
    email: String,
    /// Validity in days; defaults to the configured value.
    #[arg(long)]
    days: Option<i64>,
  },
  /// Revoke access. Keeps the row for audit; safe to repeat.
  Revoke { email: String },
  /// Show one member's row and whether access is currently valid.
  Status { email: String },
  /// Dump every membership row.
  List,
}

/// The subset of the server's configuration the CLI needs. Extra keys in a
/// shared config file are ignored.
#[derive(Deserialize)]
struct CliConfig {
  #[serde(default = "default_spreadsheet")]
  spreadsheet: String,
  #[serde(default = "default_worksheet")]
  worksheet: String,
  #[serde(default = "default_validity_days")]
  default_validity_days: i64,
  #[serde(default = "default_plan")]
  default_plan: String,
  #[serde(default = "default_utc_offset_hours")]
  utc_offset_hours: i32,
  #[serde(default)]
  service_account_path: Option<PathBuf>,
  #[serde(default)]
  service_account_json: Option<String>,
}

fn default_spreadsheet() -> String {
  "members".to_string()
}

fn default_worksheet() -> String {
  "usuarios".to_string()
}

fn default_validity_days() -> i64 {
  30
}

fn default_plan() -> String {
  "mensal".to_string()
}

fn default_utc_offset_hours() -> i32 {
  -3
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("WICKET"))
    .build()
    .context("failed to read config file")?;

  let cfg: CliConfig = settings
    .try_deserialize()
    .context("failed to deserialise configuration")?;

  let offset = offset_from_hours(cfg.utc_offset_hours)
    .context("utc_offset_hours out of range")?;

  let raw_key = match (&cfg.service_account_json, &cfg.service_account_path) {
    (Some(json), _) if !json.trim().is_empty() => json.clone(),
    (_, Some(path)) => std::fs::read_to_string(path)
      .with_context(|| format!("failed to read service-account key at {path:?}"))?,
    _ => anyhow::bail!(
      "no service-account credentials configured \
       (set service_account_path or service_account_json)",
    ),
  };
  let key = ServiceAccountKey::from_json(&raw_key)?;

  let backend = SheetsBackend::connect(key, &cfg.spreadsheet, &cfg.worksheet)
    .await
    .context("failed to connect to the membership spreadsheet")?;

  let store  = MemberStore::new(backend, offset);
  let tokens = TokenService::new(
    store,
    TokenConfig {
      validity_days: cfg.default_validity_days,
      plan:          cfg.default_plan,
    },
  );

  match cli.command {
    Command::Issue { email, days } => {
      let token = tokens.issue(&email, days).await?;
      println!("issued:{}:{token}", email.trim().to_lowercase());
    }
    Command::Revoke { email } => {
      tokens.revoke(&email).await?;
      println!("revoked:{}", email.trim().to_lowercase());
    }
    Command::Status { email } => match tokens.store().get(&email).await? {
      None => println!("not_found:{}", email.trim().to_lowercase()),
      Some(record) => {
        let valid = tokens.store().is_active(&email).await?;
        println!(
          "{}\t{}\t{}\t{}\t{}",
          record.identifier,
          record.status.as_str(),
          record.plan,
          record.expires_at,
          if valid { "valid" } else { "invalid" },
        );
      }
    },
    Command::List => {
      for record in tokens.store().list().await? {
        println!(
          "{}\t{}\t{}\t{}\t{}",
          record.identifier,
          record.status.as_str(),
          record.plan,
          record.expires_at,
          record.updated_at,
        );
      }
    }
  }

  Ok(())
}
