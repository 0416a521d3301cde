pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod filter;
pub mod page;
pub mod render;
pub mod reorder;
pub mod session;
pub mod store;
pub mod task;
pub mod view;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);
    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(verbose = cli.verbose, quiet = cli.quiet, "starting dayboard");

    let mut cfg = config::Config::load(cli.config.as_deref())?;
    cfg.apply_overrides(
        cli.overrides
            .into_iter()
            .map(|kv| (kv.key, kv.value)),
    )?;

    let data_file = config::resolve_data_file(&cfg, cli.data.as_deref())
        .context("failed to resolve data file")?;
    debug!(data_file = %data_file.display(), "resolved data file");

    let backend = store::FileBackend::open(&data_file)
        .with_context(|| format!("failed to open data file at {}", data_file.display()))?;
    let mut store = store::TaskStore::open(Box::new(backend), cfg.max_tasks);

    let mut renderer = render::TermRenderer::new(&cfg);
    commands::dispatch(&mut store, &cfg, &mut renderer, cli.command)?;

    info!("done");
    Ok(())
}
