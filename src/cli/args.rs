//! Argument definitions for the `scancache` binary.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

use crate::config::Config;

/// Persistent content-addressed cache store driver
#[derive(Parser, Debug)]
#[command(name = "scancache", version, about)]
pub struct Cli {
    /// Database file (overrides SCANCACHE_DB_PATH)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Store and read values compressed (overrides SCANCACHE_COMPRESSION)
    #[arg(long, global = true)]
    pub compression: Option<bool>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a fresh store and fill it with generated entries
    Create {
        #[arg(long, default_value_t = 1000)]
        count: usize,
    },
    /// Read randomly sampled keys
    Read {
        #[arg(long, default_value_t = 1000)]
        count: usize,
    },
    /// Bump ref_count of randomly sampled keys
    Update {
        #[arg(long, default_value_t = 1000)]
        count: usize,
    },
    /// Delete randomly sampled keys
    Delete {
        #[arg(long, default_value_t = 1000)]
        count: usize,
    },
    /// Look up a single key
    Search {
        #[arg(long)]
        key: String,
    },
    /// Delete entries by ref_last range (TTL purge)
    Purge(PurgeArgs),
    /// Print store statistics as JSON
    Stats,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
#[command(group(ArgGroup::new("bounds").required(true).args(["start", "older_than"])))]
pub struct PurgeArgs {
    /// Inclusive lower ref_last bound (Unix seconds)
    #[arg(long, requires = "end")]
    pub start: Option<i64>,

    /// Inclusive upper ref_last bound (Unix seconds)
    #[arg(long, requires = "start")]
    pub end: Option<i64>,

    /// Purge everything last referenced more than this many seconds ago
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub older_than: Option<u64>,
}

impl Cli {
    /// Applies command-line overrides on top of `config`.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(db) = &self.db {
            config.db_path = db.clone();
        }
        if let Some(compression) = self.compression {
            config.compression = compression;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create() {
        let cli = Cli::try_parse_from(["scancache", "create", "--count", "5"]).unwrap();
        assert_eq!(cli.command, Command::Create { count: 5 });
        assert!(cli.db.is_none());
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "scancache",
            "read",
            "--db",
            "/tmp/x.db",
            "--compression",
            "false",
        ])
        .unwrap();

        let config = cli.apply(Config::default());
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert!(!config.compression);
    }

    #[test]
    fn test_parse_purge_range() {
        let cli =
            Cli::try_parse_from(["scancache", "purge", "--start", "200", "--end", "400"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Purge(PurgeArgs {
                start: Some(200),
                end: Some(400),
                older_than: None,
            })
        );
    }

    #[test]
    fn test_parse_purge_requires_bounds() {
        assert!(Cli::try_parse_from(["scancache", "purge"]).is_err());
        assert!(Cli::try_parse_from(["scancache", "purge", "--start", "1"]).is_err());
        assert!(Cli::try_parse_from([
            "scancache",
            "purge",
            "--older-than",
            "60",
            "--start",
            "1",
            "--end",
            "2"
        ])
        .is_err());
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from(["scancache", "search", "--key", "abc"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Search {
                key: "abc".to_string()
            }
        );
    }
}
