use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::{AppServices, Clock};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ui::{App, UiApp, build_app_context};

/// Desktop deck editor and study app.
#[derive(Debug, Parser)]
#[command(name = "deckflow", version)]
struct Args {
    /// SQLite URL or file path of the database.
    #[arg(long = "db", env = "DECKFLOW_DB_URL", default_value = "sqlite://deckflow.sqlite3")]
    db_url: String,
}

#[derive(Debug, Error)]
enum StartupError {
    #[error("invalid --db value: {raw}")]
    InvalidDbUrl { raw: String },
    #[error("could not prepare database file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Services(#[from] services::AppServicesError),
}

fn normalize_sqlite_url(raw: &str) -> Result<String, StartupError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StartupError::InvalidDbUrl { raw: raw.to_owned() });
    }
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return Ok(trimmed.to_owned());
    }

    let path = Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    Ok(format!("sqlite://{}", absolute.display()))
}

/// Creates the database file and its parent directories when missing.
fn prepare_sqlite_file(db_url: &str) -> Result<(), StartupError> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let invalid = || StartupError::InvalidDbUrl {
        raw: db_url.to_owned(),
    };
    let path = db_url.strip_prefix("sqlite://").ok_or_else(invalid)?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(invalid());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

async fn run(args: Args) -> Result<(), StartupError> {
    let db_url = normalize_sqlite_url(&args.db_url)?;
    prepare_sqlite_file(&db_url)?;

    let services = AppServices::new_sqlite(&db_url, Clock::default()).await?;
    info!(db_url = %db_url, "database ready");

    let app: Arc<dyn UiApp> = Arc::new(services);
    let context = build_app_context(&app);

    // Some dev setups default the window to always-on-top.
    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Deckflow")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    if let Err(err) = run(args).await {
        tracing::error!(error = %err, "startup failed");
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_pass_through_and_paths_become_absolute() {
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:").unwrap(),
            "sqlite::memory:"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/decks.db").unwrap(),
            "sqlite:///tmp/decks.db"
        );

        let relative = normalize_sqlite_url("sqlite:data/decks.db").unwrap();
        assert!(relative.starts_with("sqlite:///"), "{relative}");
        assert!(relative.ends_with("data/decks.db"), "{relative}");

        assert!(normalize_sqlite_url("  ").is_err());
    }

    #[test]
    fn prepare_creates_missing_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("decks.sqlite3");
        let url = format!("sqlite://{}?mode=rwc", path.display());

        prepare_sqlite_file(&url).unwrap();
        assert!(path.exists());
        prepare_sqlite_file(&url).unwrap();
    }

    #[test]
    fn prepare_rejects_non_sqlite_urls() {
        assert!(matches!(
            prepare_sqlite_file("postgres://localhost/decks"),
            Err(StartupError::InvalidDbUrl { .. })
        ));
        assert!(prepare_sqlite_file("sqlite::memory:").is_ok());
    }

    #[test]
    fn db_flag_overrides_default() {
        let args = Args::try_parse_from(["deckflow", "--db", "sqlite::memory:"]).unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
    }
}
