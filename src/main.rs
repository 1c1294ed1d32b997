//! newscache - batch topic search with a persistent cache
//!
//! Reads a batch file of topic requests, resolves them through a worker pool
//! that prefers the local cache over the paid NewsAPI, and writes a results
//! file, looping interactively until the user exits.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use newscache::batch;
use newscache::cli::{Cli, Settings};
use newscache::dispatcher::Dispatcher;
use newscache::provider::NewsApiClient;
use newscache::resolver::Resolver;
use newscache::store::JsonStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newscache=info")),
        )
        .init();

    let settings = Settings::from_cli(Cli::parse())?;

    let api_key = std::env::var("NEWSAPI_KEY")
        .map_err(|_| "NEWSAPI_KEY is not set (export it or put it in a .env file)")?;

    let store = match &settings.cache_dir {
        Some(dir) => JsonStore::open_in_dir(dir.clone())?,
        None => JsonStore::open_default()
            .ok_or("could not determine a cache directory; pass --cache-dir")??,
    };
    let resolver = Resolver::new(Arc::new(store), Arc::new(NewsApiClient::new(api_key)));
    let dispatcher = Dispatcher::spawn(resolver, settings.workers, settings.queue_capacity);

    let outcome = run_loop(&dispatcher, &settings).await;

    // Let in-flight tasks finish before reporting any loop error.
    dispatcher.shutdown().await;
    outcome
}

/// Runs batches until the user exits (or immediately once with `--once`)
///
/// The input file is re-read on every iteration, so it can be edited between
/// runs.
async fn run_loop(
    dispatcher: &Dispatcher,
    settings: &Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let entries = batch::parse_batch_file(&settings.input).map_err(|err| {
            format!(
                "failed to read input file {}: {err}",
                settings.input.display()
            )
        })?;

        let results = batch::run_batch(dispatcher, entries, settings.task_timeout).await;

        std::fs::create_dir_all(&settings.output_dir)?;
        let stem = settings
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("batch");
        let out_path = settings.output_dir.join(format!("{stem}_results.txt"));
        let mut out = BufWriter::new(File::create(&out_path)?);
        batch::write_report(&mut out, &results)?;
        out.flush()?;

        println!("Execution completed. Results stored in {}", out_path.display());

        if settings.once {
            return Ok(());
        }
        print!("Press Enter to run again, or type 'exit' to quit: ");
        std::io::stdout().flush()?;
        let line = match stdin.next_line().await? {
            Some(line) => line,
            None => return Ok(()),
        };
        if line.trim().eq_ignore_ascii_case("exit") {
            println!("Exiting");
            return Ok(());
        }
    }
}
