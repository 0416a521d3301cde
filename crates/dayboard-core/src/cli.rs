use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "dayboard",
    version,
    about = "Task list and month calendar over one local task collection"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Path of the TOML config file.
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Path of the JSON task file (overrides the config).
    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    /// Config overrides, e.g. --set page_size=25.
    #[arg(
        long = "set",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub overrides: Vec<KeyVal>,

    #[command(subcommand)]
    pub command: Command,
}

/// The list-view selectors, shared by every command that projects the
/// filtered list.
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// all | low | medium | high
    #[arg(long, default_value = "all")]
    pub priority: String,

    /// all | completed | pending
    #[arg(long, default_value = "all")]
    pub status: String,

    /// all | today | week | overdue
    #[arg(long, default_value = "all")]
    pub deadline: String,

    /// Case-insensitive substring over title and description.
    #[arg(long, default_value = "")]
    pub search: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a task.
    Add {
        title: String,

        /// Due date-time, e.g. 2026-08-07T14:30.
        #[arg(long)]
        due: String,

        #[arg(long)]
        description: Option<String>,

        /// low | medium | high
        #[arg(long, default_value = "medium")]
        priority: String,
    },

    /// Show one page of the filtered task list.
    List {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Edit fields of an existing task.
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        due: Option<String>,

        #[arg(long)]
        priority: Option<String>,
    },

    /// Toggle a task between pending and completed.
    Done { id: String },

    /// Delete a task. Deleting an unknown id is a no-op.
    Delete { id: String },

    /// Move a task to a new 1-based position within the current listing.
    /// With filters, hidden tasks keep their places in the stored order.
    Move {
        id: String,

        position: usize,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show a month grid with per-day task previews.
    Cal {
        /// Months relative to the current one, e.g. -1 for last month.
        #[arg(long, default_value_t = 0)]
        offset: i32,

        /// Absolute month to show, e.g. 2026-09. Wins over --offset.
        #[arg(long)]
        month: Option<String>,
    },

    /// Show the header counts (due today / upcoming).
    Counts,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
