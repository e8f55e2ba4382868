//! Command-line and environment configuration.

use clap::{Args, Parser, Subcommand};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o";

#[derive(Debug, Parser)]
#[command(name = "dxtrack", version, about = "Digital maturity evaluation tracker")]
pub struct Cli {
    /// Path to the redb database file.
    #[arg(long, global = true, env = "DXTRACK_DB", default_value = "dxtrack.redb")]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Create a new database holding the default rubric.
    Init {
        /// Overwrite an existing database.
        #[arg(long)]
        force: bool,
    },
    /// Load a JSON snapshot into the database.
    Import { file: PathBuf },
    /// Write the database out as a JSON snapshot.
    Export { output: PathBuf },
    /// Per-department averages and the sector figure.
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Headline counts and pipeline distribution.
    Dashboard {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    #[arg(long, env = "DXTRACK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Bearer key required on /api routes. Empty disables auth.
    #[arg(long, env = "DXTRACK_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Global request budget per second. 0 disables limiting.
    #[arg(long, env = "DXTRACK_RATE_LIMIT", default_value_t = 50)]
    pub rate_limit: u32,

    /// Keep everything in memory instead of opening `--db`.
    #[arg(long)]
    pub in_memory: bool,

    #[arg(long, env = "DXTRACK_LLM_BASE_URL", default_value = DEFAULT_LLM_BASE_URL)]
    pub llm_base_url: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    #[arg(long, env = "DXTRACK_LLM_MODEL", default_value = DEFAULT_LLM_MODEL)]
    pub llm_model: String,

    /// Survey feed endpoint. Without it only the snapshot file is served.
    #[arg(long, env = "DXTRACK_FEED_URL")]
    pub feed_url: Option<String>,

    #[arg(long, env = "DXTRACK_FEED_API_KEY", hide_env_values = true)]
    pub feed_api_key: Option<String>,

    #[arg(long, env = "DXTRACK_FEED_SCHEMA_ID")]
    pub feed_schema_id: Option<String>,

    /// Last-known-good copy of the feed.
    #[arg(long, env = "DXTRACK_FEED_SNAPSHOT")]
    pub feed_snapshot: Option<PathBuf>,
}

impl ServeArgs {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// `None` when the key is empty.
    pub fn api_key(&self) -> Option<String> {
        let key = self.api_key.trim();
        (!key.is_empty()).then(|| key.to_string())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["dxtrack", "serve"]).unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, DEFAULT_PORT);
        assert_eq!(args.llm_model, "gpt-4o");
        assert_eq!(args.api_key(), None);
        assert_eq!(args.addr().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn global_db_flag_after_subcommand() {
        let cli =
            Cli::try_parse_from(["dxtrack", "stats", "--json", "--db", "/tmp/x.redb"]).unwrap();
        assert_eq!(cli.db, PathBuf::from("/tmp/x.redb"));
        assert!(matches!(cli.command, Command::Stats { json: true }));
    }

    #[test]
    fn blank_api_key_disables_auth() {
        let cli = Cli::try_parse_from(["dxtrack", "serve", "--api-key", "  "]).unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.api_key(), None);
    }
}
