//! formdesk server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), layers
//! `FORMDESK_*` environment variables on top, opens the SQLite record store
//! and serves the API, uploads and public form pages over HTTP.
//!
//! Without `store_path` the store is in memory: every record is lost when
//! the process exits. Uploaded files are written to `upload_dir` either way.

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use formdesk_server::{AppState, ServerConfig};
use formdesk_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "formdesk document and form server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// SQLite file to use instead of the configured `store_path`.
  #[arg(long)]
  store: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("FORMDESK").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if let Some(path) = cli.store {
    server_cfg.store_path = Some(path);
  }
  server_cfg.store_path = server_cfg.store_path.as_deref().map(expand_tilde);
  server_cfg.upload_dir = expand_tilde(&server_cfg.upload_dir);

  let store = open_store(server_cfg.store_path.as_deref()).await?;
  check_store(&store).await?;

  tokio::fs::create_dir_all(&server_cfg.upload_dir)
    .await
    .with_context(|| format!("failed to create {:?}", server_cfg.upload_dir))?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state = AppState {
    store:  Arc::new(store),
    config: Arc::new(server_cfg),
  };
  let app = formdesk_server::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .await
    .context("server error")?;

  Ok(())
}

/// Open the configured store, saying plainly whether records will outlive
/// the process.
async fn open_store(path: Option<&Path>) -> anyhow::Result<SqliteStore> {
  match path {
    Some(path) => {
      let store = SqliteStore::open(path)
        .await
        .with_context(|| format!("failed to open store at {path:?}"))?;
      tracing::info!(path = %path.display(), "opened persistent store");
      Ok(store)
    }
    None => {
      let store = SqliteStore::open_in_memory()
        .await
        .context("failed to open in-memory store")?;
      tracing::warn!(
        "no store_path configured; records are kept in memory and lost on exit"
      );
      Ok(store)
    }
  }
}

/// Report counter drift and orphaned submissions left in a store file.
async fn check_store(store: &SqliteStore) -> anyhow::Result<()> {
  let mismatches = store
    .counter_mismatches()
    .await
    .context("failed to check submission counters")?;
  for (form_id, stored, actual) in &mismatches {
    tracing::warn!(%form_id, stored, actual, "submission counter does not match submissions");
  }

  let orphans = store
    .orphaned_submissions()
    .await
    .context("failed to check for orphaned submissions")?;
  if orphans > 0 {
    tracing::warn!(orphans, "submissions reference missing forms");
  }

  if mismatches.is_empty() && orphans == 0 {
    tracing::debug!("store consistency check passed");
  }
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
