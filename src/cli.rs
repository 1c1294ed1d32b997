//! Command-line interface parsing for newscache
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into validated runtime settings for the worker pool and the batch loop.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// A numeric option that must be at least 1 was zero
    #[error("--{0} must be at least 1")]
    MustBePositive(&'static str),
}

/// newscache - cached topic search against the NewsAPI
#[derive(Parser, Debug)]
#[command(name = "newscache")]
#[command(about = "Batch topic search with a persistent cache in front of the NewsAPI")]
#[command(version)]
pub struct Cli {
    /// Input file with one request per line ("topic,days,max_items")
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Directory where result reports are written
    #[arg(long, value_name = "DIR", default_value = "outputs")]
    pub output_dir: PathBuf,

    /// Number of concurrent workers
    #[arg(long, default_value_t = 8)]
    pub workers: usize,

    /// Capacity of the bounded task queue
    #[arg(long, default_value_t = 1000)]
    pub queue_capacity: usize,

    /// Per-task deadline in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 20)]
    pub timeout: u64,

    /// Cache directory override (defaults to the XDG cache directory)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Run a single batch and exit instead of prompting to run again
    #[arg(long)]
    pub once: bool,
}

/// Validated configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct Settings {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub workers: usize,
    pub queue_capacity: usize,
    pub task_timeout: Duration,
    pub cache_dir: Option<PathBuf>,
    pub once: bool,
}

impl Settings {
    /// Creates validated settings from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Settings)` with appropriate values
    /// * `Err(CliError)` if a pool or timeout option is zero
    pub fn from_cli(cli: Cli) -> Result<Self, CliError> {
        if cli.workers == 0 {
            return Err(CliError::MustBePositive("workers"));
        }
        if cli.queue_capacity == 0 {
            return Err(CliError::MustBePositive("queue-capacity"));
        }
        if cli.timeout == 0 {
            return Err(CliError::MustBePositive("timeout"));
        }
        Ok(Self {
            input: cli.input,
            output_dir: cli.output_dir,
            workers: cli.workers,
            queue_capacity: cli.queue_capacity,
            task_timeout: Duration::from_secs(cli.timeout),
            cache_dir: cli.cache_dir,
            once: cli.once,
        })
    }
}
