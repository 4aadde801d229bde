//! Gerrit Events - query Gerrit and listen to its event stream.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gerrit_events::config::{ConfigLoader, GerritConfig};
use gerrit_events::dispatch::{EventDispatcher, EventListener};
use gerrit_events::events::GerritEvent;
use gerrit_events::query::{Query, QueryHandler};
use gerrit_events::stream::StreamEventsReader;
use gerrit_events::transport::ProcessLineSource;

#[derive(Parser)]
#[command(
    name = "gerrit-events",
    about = "Query Gerrit and listen to its event stream",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file to use instead of the default search path.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query and print each result as JSON.
    Query {
        /// Gerrit query, e.g. "status:open project:foo".
        query: String,
        /// Include all patch sets.
        #[arg(long)]
        patch_sets: bool,
        /// Include the current patch set.
        #[arg(long)]
        current_patch_set: bool,
        /// Include patch set file lists.
        #[arg(long)]
        files: bool,
        /// Include review comments.
        #[arg(long)]
        comments: bool,
        /// Include full commit messages.
        #[arg(long)]
        commit_message: bool,
        /// Print raw lines, keeping in-band error records.
        #[arg(long)]
        raw: bool,
    },
    /// List the files of a change's current patch set.
    Files {
        /// Change number or Change-Id.
        change: String,
    },
    /// Listen to the event stream until interrupted.
    Listen,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Prints every delivered event as a JSON line.
struct PrintListener;

#[async_trait]
impl EventListener for PrintListener {
    async fn on_event(&self, event: &GerritEvent) {
        match serde_json::to_string(event) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::warn!(kind = %event.kind(), error = %e, "Could not render event"),
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<GerritConfig, String> {
    let loader = path.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    loader.load().map_err(|e| e.to_string())
}

async fn run_query(handler: &QueryHandler, query: &Query, raw: bool) -> Result<(), String> {
    if raw {
        let lines = handler.query_strings(query).await.map_err(|e| e.to_string())?;
        for line in lines {
            println!("{line}");
        }
    } else {
        let records = handler.query_objects(query).await.map_err(|e| e.to_string())?;
        for record in records {
            println!("{}", serde_json::Value::Object(record));
        }
    }
    Ok(())
}

async fn listen(config: &GerritConfig, source: Arc<ProcessLineSource>) -> Result<(), String> {
    let dispatcher = EventDispatcher::new(&config.dispatch);
    dispatcher.add_listener(Arc::new(PrintListener));

    let reader = StreamEventsReader::new(source, Some(config.ssh.provider()), dispatcher.sender());
    let cancel = CancellationToken::new();

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping");
        }
        interrupt.cancel();
    });

    let result = reader.run(&cancel).await;
    dispatcher.shutdown().await.map_err(|e| e.to_string())?;
    result.map(|_| ()).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let source = Arc::new(ProcessLineSource::ssh(&config.ssh));
    let handler = QueryHandler::new(source.clone());

    tracing::info!(host = %config.ssh.host, port = config.ssh.port, "Using Gerrit server");

    let result = match cli.command {
        Commands::Query {
            query,
            patch_sets,
            current_patch_set,
            files,
            comments,
            commit_message,
            raw,
        } => {
            let query = Query::new(query)
                .patch_sets(patch_sets)
                .current_patch_set(current_patch_set)
                .files(files)
                .comments(comments)
                .commit_message(commit_message);
            run_query(&handler, &query, raw).await
        }
        Commands::Files { change } => {
            for file in handler.files_by_change(&change).await {
                println!("{file}");
            }
            Ok(())
        }
        Commands::Listen => listen(&config, source).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
