//! dxtrack binary: HTTP server and CLI.

use clap::Parser;
use dxtrack::api::{self, AppState};
use dxtrack::cli;
use dxtrack::config::{Cli, Command, ServeArgs};
use dxtrack::feed::{HttpFeed, StaticFeed, SubmissionSource};
use dxtrack::narrative::{Disabled, NarrativeGenerator, OpenAiClient};
use dxtrack_core::Engine;
use dxtrack_core::storage::{MemoryStore, RedbStore};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let opts = Cli::parse();
    let result = match opts.command {
        Command::Serve(args) => run_server(&opts.db, args),
        Command::Init { force } => cli::cmd_init(&opts.db, force).map_err(Into::into),
        Command::Import { file } => cli::cmd_import(&opts.db, &file).map_err(Into::into),
        Command::Export { output } => cli::cmd_export(&opts.db, &output).map_err(Into::into),
        Command::Stats { json } => cli::cmd_stats(&opts.db, json).map_err(Into::into),
        Command::Dashboard { json } => cli::cmd_dashboard(&opts.db, json).map_err(Into::into),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run_server(db: &Path, args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = if args.in_memory {
        info!("using in-memory store");
        Engine::new(MemoryStore::new())
    } else {
        info!(path = %db.display(), "opening redb store");
        Engine::new(RedbStore::open(db)?)
    };

    let feed: Arc<dyn SubmissionSource> = match &args.feed_url {
        Some(url) => {
            let mut feed = HttpFeed::new(
                url.as_str(),
                args.feed_api_key.clone().unwrap_or_default(),
                args.feed_schema_id.clone().unwrap_or_default(),
            )?;
            if let Some(path) = &args.feed_snapshot {
                feed = feed.with_snapshot(path);
            }
            Arc::new(feed)
        }
        None => {
            warn!("no feed URL configured, serving submissions from the snapshot only");
            match &args.feed_snapshot {
                Some(path) => Arc::new(StaticFeed::from_snapshot(path)?),
                None => Arc::new(StaticFeed::default()),
            }
        }
    };

    let narrative: Arc<dyn NarrativeGenerator> = match &args.llm_api_key {
        Some(key) if !key.is_empty() => Arc::new(OpenAiClient::new(
            args.llm_base_url.as_str(),
            key.as_str(),
            args.llm_model.as_str(),
        )?),
        _ => {
            warn!("no LLM API key configured, roadmap generation disabled");
            Arc::new(Disabled)
        }
    };

    let api_key = args.api_key();
    if api_key.is_none() {
        warn!("no API key configured, /api routes are open");
    }
    let state = AppState::new(engine, feed, narrative)
        .with_api_key(api_key)
        .with_rate_limit(args.rate_limit);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(api::serve(state, args.addr()))?;
    Ok(())
}
