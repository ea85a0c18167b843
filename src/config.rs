use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// JSON file on this machine
    Local,
    /// Postgres database
    Postgres,
}

/// Store selection flags shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// Where sessions are kept
    #[arg(long, global = true, env = "WORKOUT_STORE", value_enum, default_value_t = StoreKind::Local)]
    pub store: StoreKind,
    /// Session history file for the local store
    #[arg(long, global = true, env = "WORKOUT_DATA_FILE", default_value = "workout_history.json")]
    pub data_file: PathBuf,
    /// Connection string for the postgres store
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
    #[arg(long, global = true, default_value_t = 5)]
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub data_file: PathBuf,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl StoreConfig {
    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .context("DATABASE_URL must be set to use the postgres store")
    }
}

impl From<StoreArgs> for StoreConfig {
    fn from(args: StoreArgs) -> Self {
        StoreConfig {
            kind: args.store,
            data_file: args.data_file,
            database_url: args.database_url,
            max_connections: args.max_connections.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(kind: StoreKind, database_url: Option<&str>) -> StoreConfig {
        StoreConfig {
            kind,
            data_file: PathBuf::from("workout_history.json"),
            database_url: database_url.map(str::to_string),
            max_connections: 5,
        }
    }

    #[test]
    fn postgres_requires_a_database_url() {
        assert!(config(StoreKind::Postgres, None).require_database_url().is_err());
        assert!(config(StoreKind::Postgres, Some("  ")).require_database_url().is_err());
        assert_eq!(
            config(StoreKind::Postgres, Some("postgres://localhost/workouts"))
                .require_database_url()
                .unwrap(),
            "postgres://localhost/workouts"
        );
    }

    #[test]
    fn pool_size_is_at_least_one() {
        let args = StoreArgs {
            store: StoreKind::Local,
            data_file: PathBuf::from("history.json"),
            database_url: None,
            max_connections: 0,
        };
        assert_eq!(StoreConfig::from(args).max_connections, 1);
    }
}
