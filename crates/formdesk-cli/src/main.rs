//! `formdesk`, the command-line client for the formdesk API.
//!
//! # Usage
//!
//! ```text
//! formdesk --url http://localhost:8080 forms list
//! formdesk csv derive 5b0c… --database customers
//! formdesk tool query_database --args '{"database":"orders"}'
//! formdesk --config ~/.config/formdesk/config.toml stats
//! ```

mod client;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use formdesk_core::DatabaseName;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DEFAULT_URL: &str = "http://localhost:8080";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "formdesk", about = "Command-line client for the formdesk server")]
struct Args {
  /// Path to a TOML config file (`url = "..."`).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the formdesk server (default: http://localhost:8080).
  #[arg(long, env = "FORMDESK_URL")]
  url: Option<String>,

  /// Print lists as JSON instead of tables.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Published forms.
  #[command(subcommand)]
  Forms(FormsCommand),
  /// Uploaded documents.
  #[command(subcommand)]
  Documents(DocumentsCommand),
  /// CSV imports.
  #[command(subcommand)]
  Csv(CsvCommand),
  /// Totals per database-name.
  Stats,
  /// Invoke an assistant tool by name.
  Tool {
    name: String,
    /// Tool arguments as a JSON object.
    #[arg(long, value_name = "JSON", default_value = "{}")]
    args: String,
  },
}

#[derive(Subcommand, Debug)]
enum FormsCommand {
  List,
  Show { id: Uuid },
  /// Delete a form and all of its submissions.
  Delete { id: Uuid },
  Submissions { id: Uuid },
}

#[derive(Subcommand, Debug)]
enum DocumentsCommand {
  List,
}

#[derive(Subcommand, Debug)]
enum CsvCommand {
  List,
  /// Create a form from an import's headers.
  Derive {
    id: Uuid,
    #[arg(long, value_parser = parse_database)]
    database: DatabaseName,
  },
}

fn parse_database(s: &str) -> Result<DatabaseName, String> {
  DatabaseName::parse(s).map_err(|e| e.to_string())
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url: String,
}

fn load_config(path: Option<&Path>) -> Result<ConfigFile> {
  let Some(path) = path else {
    return Ok(ConfigFile::default());
  };
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading config file {}", path.display()))?;
  toml::from_str(&raw).context("parsing config file")
}

/// Flag (or `FORMDESK_URL`) overrides the config file, which overrides the
/// default.
fn resolve_url(flag: Option<String>, file: &ConfigFile) -> String {
  flag
    .filter(|u| !u.trim().is_empty())
    .or_else(|| (!file.url.is_empty()).then(|| file.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_string())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let file_cfg = load_config(args.config.as_deref())?;
  let client = ApiClient::new(ApiConfig { base_url: resolve_url(args.url, &file_cfg) })?;

  run(&client, args.command, args.json).await
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value).context("serialising output")?);
  Ok(())
}

async fn run(client: &ApiClient, command: Command, json: bool) -> Result<()> {
  match command {
    Command::Forms(FormsCommand::List) => {
      let forms = client.list_forms().await?;
      if json { print_json(&forms)? } else { print!("{}", output::forms(&forms)) }
    }
    Command::Forms(FormsCommand::Show { id }) => print_json(&client.get_form(id).await?)?,
    Command::Forms(FormsCommand::Delete { id }) => {
      client.delete_form(id).await?;
      println!("deleted form {id}");
    }
    Command::Forms(FormsCommand::Submissions { id }) => {
      let submissions = client.list_submissions(id).await?;
      if json {
        print_json(&submissions)?
      } else {
        print!("{}", output::submissions(&submissions))
      }
    }
    Command::Documents(DocumentsCommand::List) => {
      let documents = client.list_documents().await?;
      if json {
        print_json(&documents)?
      } else {
        print!("{}", output::documents(&documents))
      }
    }
    Command::Csv(CsvCommand::List) => {
      let imports = client.list_csv_imports().await?;
      if json {
        print_json(&imports)?
      } else {
        print!("{}", output::csv_imports(&imports))
      }
    }
    Command::Csv(CsvCommand::Derive { id, database }) => {
      let form = client.derive_form(id, database).await?;
      println!("created form {} ({})", form.form_id, form.public_path);
    }
    Command::Stats => print_json(&client.stats().await?)?,
    Command::Tool { name, args } => {
      let arguments: serde_json::Value =
        serde_json::from_str(&args).context("--args must be a JSON object")?;
      print_json(&client.call_tool(&name, arguments).await?)?;
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_nested_subcommands() {
    let id = Uuid::new_v4();
    let args = Args::try_parse_from([
      "formdesk",
      "csv",
      "derive",
      id.to_string().as_str(),
      "--database",
      "Customers",
    ])
    .unwrap();
    match args.command {
      Command::Csv(CsvCommand::Derive { id: got, database }) => {
        assert_eq!(got, id);
        assert_eq!(database, DatabaseName::Customers);
      }
      other => panic!("unexpected command: {other:?}"),
    }
  }

  #[test]
  fn rejects_unknown_database() {
    let id = Uuid::new_v4().to_string();
    let err = Args::try_parse_from(["formdesk", "csv", "derive", id.as_str(), "--database", "payroll"]);
    assert!(err.is_err());
  }

  #[test]
  fn tool_args_default_to_empty_object() {
    let args = Args::try_parse_from(["formdesk", "tool", "get_all_forms"]).unwrap();
    match args.command {
      Command::Tool { name, args } => {
        assert_eq!(name, "get_all_forms");
        assert_eq!(args, "{}");
      }
      other => panic!("unexpected command: {other:?}"),
    }
  }

  #[test]
  fn url_precedence() {
    let file = ConfigFile { url: "http://from-file".into() };
    assert_eq!(resolve_url(Some("http://flag".into()), &file), "http://flag");
    assert_eq!(resolve_url(None, &file), "http://from-file");
    assert_eq!(resolve_url(None, &ConfigFile::default()), DEFAULT_URL);
  }

  #[test]
  fn config_file_is_toml() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(&file, "url = \"http://configured:9000\"\n").unwrap();
    let cfg = load_config(Some(&file)).unwrap();
    assert_eq!(cfg.url, "http://configured:9000");
  }
}
