use clap::{Parser, ValueEnum};
use std::path::PathBuf;

// ── Defaults ───────────────────────────────────────────────────────────────────

/// Input file used when `--infile` is not given.
pub const DEFAULT_INFILE: &str = "example.xml";

/// Capacity of the session and result handoff queues.
pub const DEFAULT_QUEUE_DEPTH: usize = 1024;

/// Upper bound accepted for `--workers`.
pub const MAX_WORKERS: usize = 1024;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Output format for the totals report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Two plain-text tables.
    Table,
    /// Pretty-printed JSON.
    Json,
}

/// Sum call-detail records by direction
#[derive(Parser, Debug, Clone)]
#[command(
    name = "cdr-totals",
    about = "Sum call-detail records by direction",
    version
)]
pub struct Settings {
    /// CDR XML file to read
    #[arg(long, env = "CDR_INFILE", default_value = DEFAULT_INFILE)]
    pub infile: PathBuf,

    /// Number of concurrent record workers (defaults to available parallelism)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=MAX_WORKERS as i64))]
    pub workers: Option<u16>,

    /// Capacity of the record and result queues
    #[arg(long, default_value_t = DEFAULT_QUEUE_DEPTH, value_parser = parse_queue_depth)]
    pub queue_depth: usize,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Logging level
    #[arg(long, env = "CDR_LOG_LEVEL", default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments and resolve derived values.
    pub fn load() -> Self {
        Self::parse().resolve()
    }

    /// Same as [`Settings::load`] but with an explicit argument list.
    pub fn load_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(args).resolve()
    }

    /// Apply the `--debug` override.
    fn resolve(mut self) -> Self {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }

    /// Effective worker count: the explicit `--workers` value, otherwise the
    /// machine's available parallelism (at least one).
    pub fn worker_count(&self) -> usize {
        match self.workers {
            Some(n) => usize::from(n),
            None => default_workers(),
        }
    }
}

/// Available parallelism, falling back to a single worker when it cannot be
/// determined.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_WORKERS)
}

fn parse_queue_depth(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|e| format!("{e}"))?;
    if n == 0 {
        return Err("queue depth must be at least 1".to_string());
    }
    Ok(n)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
