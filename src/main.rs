//! # tasks
//!
//! Task CRUD HTTP service binary: parses flags, applies environment
//! overrides, opens the selected repository and serves it until Ctrl-C or
//! SIGTERM.

#![deny(unsafe_code)]

mod settings;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tasks_core::TaskRepository;
use tasks_server::ServerConfig;
use tasks_store::{Database, MemoryTaskRepo, SqliteTaskRepo};
use tasks_telemetry::{LogFormat, TelemetryConfig};
use tracing::Level;

use crate::settings::EnvOverrides;

/// Storage backend selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// `SQLite` at `--database` (`:memory:` for a private in-memory database).
    Sqlite,
    /// Map held in process memory; `--database` is ignored.
    Memory,
}

/// Task CRUD HTTP service.
#[derive(Parser, Debug)]
#[command(name = "tasks", about = "Task CRUD HTTP service")]
struct Cli {
    /// Address to listen on. A bare `:port` binds every interface.
    #[arg(short = 'b', long, default_value = ":5000")]
    bind: String,

    /// Database location, or `:memory:`.
    #[arg(short = 'd', long, default_value = ":memory:")]
    database: String,

    #[arg(long, value_enum, default_value = "sqlite")]
    backend: Backend,

    /// Per-request deadline in seconds.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
    request_timeout_secs: u64,

    #[arg(long, default_value = "info")]
    log_level: Level,

    /// `json` or `pretty`.
    #[arg(long, default_value = "json")]
    log_format: LogFormat,
}

impl Cli {
    fn apply(&mut self, overrides: EnvOverrides) {
        if let Some(bind) = overrides.bind {
            self.bind = bind;
        }
        if let Some(database) = overrides.database {
            self.database = database;
        }
        if let Some(secs) = overrides.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
    }

    fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            log_level: self.log_level,
            format: self.log_format,
            ..TelemetryConfig::default()
        }
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind: self.bind.clone(),
            request_timeout_secs: self.request_timeout_secs,
            ..ServerConfig::default()
        }
    }
}

fn open_repository(backend: Backend, database: &str) -> Result<Arc<dyn TaskRepository>> {
    let repo: Arc<dyn TaskRepository> = match backend {
        Backend::Memory => Arc::new(MemoryTaskRepo::new()),
        Backend::Sqlite => {
            let db = Database::connect(database)
                .with_context(|| format!("Failed to open database: {database}"))?;
            Arc::new(SqliteTaskRepo::new(db))
        }
    };
    Ok(repo)
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res.context("Failed to listen for ctrl-c")?,
        _ = terminate.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")
}

async fn run(cli: Cli) -> Result<()> {
    let repo = open_repository(cli.backend, &cli.database)?;
    let config = cli.server_config();

    let handle = tasks_server::start(config, repo)
        .await
        .with_context(|| format!("Failed to bind {}", cli.bind))?;

    tracing::info!(
        addr = %handle.addr(),
        backend = ?cli.backend,
        database = %cli.database,
        "tasks service listening"
    );

    shutdown_signal().await?;

    tracing::info!("Shutting down...");
    handle.shutdown().await.context("Server task failed")?;
    tracing::info!("Shutdown complete");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    tasks_telemetry::init_telemetry(&cli.telemetry_config())
        .context("Failed to initialize logging")?;

    cli.apply(EnvOverrides::from_env());

    if let Err(err) = run(cli).await {
        tracing::error!(error = %format!("{err:#}"), "tasks service failed");
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["tasks"]).unwrap();
        assert_eq!(cli.bind, ":5000");
        assert_eq!(cli.database, ":memory:");
        assert_eq!(cli.backend, Backend::Sqlite);
        assert_eq!(cli.request_timeout_secs, 2);
        assert_eq!(cli.log_level, Level::INFO);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn short_flags() {
        let cli = Cli::try_parse_from(["tasks", "-b", "127.0.0.1:8080", "-d", "/tmp/t.db"]).unwrap();
        assert_eq!(cli.bind, "127.0.0.1:8080");
        assert_eq!(cli.database, "/tmp/t.db");
    }

    #[test]
    fn long_flags() {
        let cli = Cli::try_parse_from([
            "tasks",
            "--backend",
            "memory",
            "--request-timeout-secs",
            "9",
            "--log-level",
            "debug",
            "--log-format",
            "pretty",
        ])
        .unwrap();
        assert_eq!(cli.backend, Backend::Memory);
        assert_eq!(cli.request_timeout_secs, 9);
        assert_eq!(cli.log_level, Level::DEBUG);
        assert_eq!(cli.log_format, LogFormat::Pretty);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Cli::try_parse_from(["tasks", "--backend", "postgres"]).is_err());
        assert!(Cli::try_parse_from(["tasks", "--request-timeout-secs", "0"]).is_err());
        assert!(Cli::try_parse_from(["tasks", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn env_overrides_win_over_flags() {
        let mut cli = Cli::try_parse_from(["tasks", "-b", ":6000"]).unwrap();
        cli.apply(EnvOverrides {
            bind: Some(":7000".into()),
            database: None,
            request_timeout_secs: Some(4),
        });
        assert_eq!(cli.bind, ":7000");
        assert_eq!(cli.database, ":memory:");

        let config = cli.server_config();
        assert_eq!(config.bind_addr(), "0.0.0.0:7000");
        assert_eq!(config.request_timeout_secs, 4);
    }

    #[test]
    fn telemetry_config_from_flags() {
        let cli = Cli::try_parse_from(["tasks", "--log-level", "warn"]).unwrap();
        let config = cli.telemetry_config();
        assert_eq!(config.log_level, Level::WARN);
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn open_memory_repository() {
        let repo = open_repository(Backend::Memory, "ignored").unwrap();
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn open_sqlite_repository_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("tasks.db");
        let repo = open_repository(Backend::Sqlite, path.to_str().unwrap()).unwrap();
        let task = repo.create(tasks_core::NewTask::new("on disk")).unwrap();
        assert_eq!(repo.retrieve(&task.id).unwrap(), task);
        assert!(path.exists());
    }

    #[test]
    fn open_sqlite_repository_failure_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = match open_repository(Backend::Sqlite, dir.path().to_str().unwrap()) {
            Ok(_) => panic!("opening a directory as a database should fail"),
            Err(err) => err,
        };
        assert!(format!("{err:#}").contains("Failed to open database"));
    }
}
