use anyhow::Context;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use tracing::{info, instrument, warn};

use crate::cli::{Command, FilterArgs};
use crate::config::Config;
use crate::datetime::parse_wall_time;
use crate::filter::FilterCriteria;
use crate::reorder;
use crate::session::{CalendarSession, ListSession, task_counts};
use crate::store::{StoreError, TaskStore};
use crate::task::{TaskDraft, TaskId, TaskPatch};
use crate::view::ViewRenderer;

pub fn dispatch(
    store: &mut TaskStore,
    cfg: &Config,
    renderer: &mut dyn ViewRenderer,
    command: Command,
) -> anyhow::Result<()> {
    let now = Local::now().naive_local();
    match command {
        Command::Add {
            title,
            due,
            description,
            priority,
        } => cmd_add(store, renderer, title, due, description, priority, now),
        Command::List {
            filter,
            page,
            page_size,
        } => cmd_list(store, cfg, renderer, &filter, page, page_size, now),
        Command::Edit {
            id,
            title,
            description,
            due,
            priority,
        } => cmd_edit(store, renderer, id, title, description, due, priority),
        Command::Done { id } => cmd_done(store, renderer, id),
        Command::Delete { id } => cmd_delete(store, renderer, id),
        Command::Move {
            id,
            position,
            filter,
        } => cmd_move(store, renderer, id, position, &filter, now),
        Command::Cal { offset, month } => cmd_cal(store, cfg, renderer, offset, month, now),
        Command::Counts => cmd_counts(store, renderer, now),
    }
}

fn criteria_from_args(args: &FilterArgs) -> anyhow::Result<FilterCriteria> {
    Ok(FilterCriteria {
        priority: args.priority.parse().context("invalid --priority")?,
        status: args.status.parse().context("invalid --status")?,
        deadline: args.deadline.parse().context("invalid --deadline")?,
        search: args.search.clone(),
    })
}

#[instrument(skip_all, fields(title = %title))]
fn cmd_add(
    store: &mut TaskStore,
    renderer: &mut dyn ViewRenderer,
    title: String,
    due: String,
    description: Option<String>,
    priority: String,
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    info!("command add");

    let draft = TaskDraft {
        title,
        description,
        due: parse_wall_time(&due).context("invalid --due")?,
        priority: priority.parse().context("invalid --priority")?,
    };

    match store.add(draft, now) {
        Ok(task) => renderer.notify(&format!("Created task {}.", task.id)),
        // a full collection is a user-visible warning, not a failure
        Err(err @ StoreError::CapacityExceeded { .. }) => {
            warn!(%err, "add rejected");
            renderer.notify(&err.to_string())
        }
        Err(err) => Err(err.into()),
    }
}

#[instrument(skip_all)]
fn cmd_list(
    store: &mut TaskStore,
    cfg: &Config,
    renderer: &mut dyn ViewRenderer,
    filter: &FilterArgs,
    page: usize,
    page_size: Option<usize>,
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    info!("command list");

    let mut session = ListSession::new(page_size.unwrap_or(cfg.page_size));
    session.on_filter_change(criteria_from_args(filter)?);
    session.on_page_change(page);

    let view = session.view(&store.snapshot(), now);
    renderer.render_list(&view)
}

#[instrument(skip_all, fields(id = %id))]
fn cmd_edit(
    store: &mut TaskStore,
    renderer: &mut dyn ViewRenderer,
    id: String,
    title: Option<String>,
    description: Option<String>,
    due: Option<String>,
    priority: Option<String>,
) -> anyhow::Result<()> {
    info!("command edit");

    let patch = TaskPatch {
        title,
        description,
        due: due
            .map(|raw| parse_wall_time(&raw))
            .transpose()
            .context("invalid --due")?,
        priority: priority.map(|raw| raw.parse()).transpose()?,
    };

    let id = TaskId::new(id);
    match store.update(&id, patch) {
        Ok(task) => renderer.notify(&format!("Updated task {}.", task.id)),
        Err(err @ StoreError::NotFound(_)) => {
            warn!(%err, "edit was a no-op");
            renderer.notify(&format!("{err}; nothing changed."))
        }
        Err(err) => Err(err.into()),
    }
}

#[instrument(skip_all, fields(id = %id))]
fn cmd_done(
    store: &mut TaskStore,
    renderer: &mut dyn ViewRenderer,
    id: String,
) -> anyhow::Result<()> {
    info!("command done");

    let id = TaskId::new(id);
    match store.toggle_complete(&id) {
        Ok(task) => {
            let state = if task.completed { "completed" } else { "pending" };
            renderer.notify(&format!("Task {} is now {state}.", task.id))
        }
        Err(err @ StoreError::NotFound(_)) => {
            warn!(%err, "toggle was a no-op");
            renderer.notify(&format!("{err}; nothing changed."))
        }
        Err(err) => Err(err.into()),
    }
}

#[instrument(skip_all, fields(id = %id))]
fn cmd_delete(
    store: &mut TaskStore,
    renderer: &mut dyn ViewRenderer,
    id: String,
) -> anyhow::Result<()> {
    info!("command delete");

    let id = TaskId::new(id);
    store.delete(&id);
    renderer.notify(&format!("Deleted task {id}."))
}

/// Rearranges the listed subset, then maps the result back onto the full
/// stored order so hidden tasks keep their places.
#[instrument(skip_all, fields(id = %id, position))]
fn cmd_move(
    store: &mut TaskStore,
    renderer: &mut dyn ViewRenderer,
    id: String,
    position: usize,
    filter: &FilterArgs,
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    info!("command move");

    let id = TaskId::new(id);
    let criteria = criteria_from_args(filter)?;
    let snapshot = store.snapshot();
    let mut visible: Vec<TaskId> = snapshot
        .iter()
        .filter(|task| criteria.matches(task, now))
        .map(|task| task.id.clone())
        .collect();

    let Some(from) = visible.iter().position(|v| v == &id) else {
        warn!(%id, "move target is not in the current listing");
        return renderer.notify(&format!("No task with id {id} in the current listing."));
    };
    let moved = visible.remove(from);
    let to = position.clamp(1, visible.len() + 1) - 1;
    visible.insert(to, moved);

    let next = reorder::reconcile(&store.ids(), &visible);
    store.reorder(&next).context("reorder rejected")?;
    renderer.notify(&format!("Moved task {id} to position {}.", to + 1))
}

#[instrument(skip_all)]
fn cmd_cal(
    store: &mut TaskStore,
    cfg: &Config,
    renderer: &mut dyn ViewRenderer,
    offset: i32,
    month: Option<String>,
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    info!("command cal");

    let today = now.date();
    let mut session = CalendarSession::new(today, cfg.calendar.max_tasks_per_day);
    if let Some(raw) = month {
        let (year, month) = parse_year_month(&raw)?;
        if !session.on_jump(year, month) {
            anyhow::bail!("invalid month: {raw}");
        }
    } else {
        session.on_month_change(offset);
    }

    let view = session.view(&store.snapshot(), today);
    renderer.render_calendar(&view)
}

#[instrument(skip_all)]
fn cmd_counts(
    store: &mut TaskStore,
    renderer: &mut dyn ViewRenderer,
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    info!("command counts");

    let counts = task_counts(&store.snapshot(), now);
    renderer.notify(&format!(
        "Due today: {} | Upcoming: {}",
        counts.due_today, counts.upcoming
    ))
}

fn parse_year_month(raw: &str) -> anyhow::Result<(i32, u32)> {
    // reuse the date parser by pinning the month to its first day
    let first = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
        .with_context(|| format!("expected YYYY-MM, got {raw}"))?;
    Ok((first.year(), first.month()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_month_parses() {
        assert_eq!(parse_year_month("2026-09").unwrap(), (2026, 9));
        assert_eq!(parse_year_month("2025-01").unwrap(), (2025, 1));
        assert!(parse_year_month("2026").is_err());
        assert!(parse_year_month("2026-13").is_err());
    }
}
