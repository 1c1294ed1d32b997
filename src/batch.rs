//! Batch execution of topic searches
//!
//! Reads a line-oriented input file of requests, runs them concurrently
//! through the dispatcher with a per-task deadline, and formats the results
//! file. Results always come back in input order, even for duplicate topics.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::dispatcher::Dispatcher;
use crate::task::{SearchRequest, TaskError, TaskResult};

/// How long to wait between submission attempts when the queue is full
const SUBMIT_RETRY_DELAY: Duration = Duration::from_millis(50);

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub topic: String,
    pub days: u32,
    pub max_items: u32,
}

/// Parses the batch input format: one `topic,days,max_items` record per line
///
/// Blank lines are ignored. Lines with the wrong field count or non-numeric
/// day/item fields are skipped with a diagnostic rather than failing the
/// whole batch.
pub fn parse_batch_file(path: &Path) -> std::io::Result<Vec<BatchEntry>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_batch_lines(&content))
}

fn parse_batch_lines(content: &str) -> Vec<BatchEntry> {
    let mut entries = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() != 3 {
            warn!(line, "skipping input line with wrong field count");
            continue;
        }
        let (days, max_items) = match (
            parts[1].trim().parse::<u32>(),
            parts[2].trim().parse::<u32>(),
        ) {
            (Ok(days), Ok(max_items)) => (days, max_items),
            _ => {
                warn!(line, "skipping input line with non-numeric fields");
                continue;
            }
        };
        entries.push(BatchEntry {
            topic: parts[0].trim().to_string(),
            days,
            max_items,
        });
    }
    entries
}

/// Runs every entry through the dispatcher and collects results in input
/// order
///
/// Each entry gets its own cancellation token wired to `task_timeout`; one
/// submission future per entry, joined together, replaces any shared mutable
/// results map.
pub async fn run_batch(
    dispatcher: &Dispatcher,
    entries: Vec<BatchEntry>,
    task_timeout: Duration,
) -> Vec<(BatchEntry, TaskResult)> {
    let submissions = entries.into_iter().map(|entry| async move {
        let result = run_entry(dispatcher, &entry, task_timeout).await;
        (entry, result)
    });
    futures::future::join_all(submissions).await
}

/// Submits one entry and waits out its deadline
///
/// Submission races the task's own deadline: a full queue is retried until
/// the deadline would pass. Once enqueued, a fired deadline cancels the token
/// and then awaits the worker's definitive answer (the resolver observes the
/// token, so this never waits out a slow provider call).
async fn run_entry(
    dispatcher: &Dispatcher,
    entry: &BatchEntry,
    task_timeout: Duration,
) -> TaskResult {
    let cancel = CancellationToken::new();
    let deadline = tokio::time::Instant::now() + task_timeout;
    let request = SearchRequest::new(entry.topic.clone(), entry.days, entry.max_items);

    let handle = loop {
        match dispatcher.submit(request.clone(), cancel.clone()) {
            Ok(handle) => break handle,
            Err(TaskError::QueueFull) => {
                if tokio::time::Instant::now() + SUBMIT_RETRY_DELAY >= deadline {
                    return Err(TaskError::QueueFull);
                }
                tokio::time::sleep(SUBMIT_RETRY_DELAY).await;
            }
            Err(err) => return Err(err),
        }
    };

    let wait = handle.wait();
    tokio::pin!(wait);
    tokio::select! {
        result = &mut wait => result,
        _ = tokio::time::sleep_until(deadline) => {
            cancel.cancel();
            wait.await
        }
    }
}

/// Writes one block per entry, in input order
///
/// Failed tasks render as an `(error: ...)` block without affecting the rest
/// of the batch.
pub fn write_report<W: Write>(
    out: &mut W,
    results: &[(BatchEntry, TaskResult)],
) -> std::io::Result<()> {
    for (entry, result) in results {
        match result {
            Err(err) => {
                writeln!(out, "Results for \"{}\" (error: {})", entry.topic, err)?;
                writeln!(out)?;
            }
            Ok(outcome) => {
                writeln!(
                    out,
                    "Results for \"{}\" (fetched from: {}):",
                    entry.topic, outcome.provenance
                )?;
                if outcome.items.is_empty() {
                    writeln!(out, "- No results found")?;
                } else {
                    for item in &outcome.items {
                        writeln!(out, "- {} ({})", item.title, item.url)?;
                    }
                }
                writeln!(out)?;
            }
        }
    }
    Ok(())
}
