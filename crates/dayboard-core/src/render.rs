use std::io::{self, IsTerminal, Write};

use chrono::{Datelike, Local, NaiveDateTime};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::Config;
use crate::datetime::day_delta;
use crate::task::Task;
use crate::view::{CalendarView, ListView, ViewRenderer};

const CELL_WIDTH: usize = 14;
const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Terminal implementation of the view interface: a padded task table for
/// the list, a week-per-row grid for the calendar.
#[derive(Debug, Clone)]
pub struct TermRenderer {
    color: bool,
}

impl TermRenderer {
    pub fn new(cfg: &Config) -> Self {
        Self { color: cfg.color }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

impl ViewRenderer for TermRenderer {
    fn render_list(&mut self, view: &ListView) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        if let Some(message) = &view.empty_message {
            writeln!(out, "No tasks found. {message}")?;
            return Ok(());
        }

        let now = Local::now().naive_local();
        let headers = ["ID", "", "Pri", "Due", "Title", "Description"];
        let rows: Vec<Vec<String>> = view
            .items
            .iter()
            .map(|task| {
                let done = if task.completed { "x" } else { "" };
                let due = format_due(task.due, now);
                let due = if !task.completed && day_delta(task.due, now) < 0 {
                    self.paint(&due, "31")
                } else {
                    due
                };
                vec![
                    self.paint(task.id.as_str(), "33"),
                    done.to_string(),
                    task.priority.as_str().to_string(),
                    due,
                    task.title.clone(),
                    task.description.clone().unwrap_or_default(),
                ]
            })
            .collect();

        write_table(&mut out, &headers, rows)?;
        writeln!(
            out,
            "\nPage {} of {} ({} matching task{})",
            view.page,
            view.total_pages,
            view.total_matches,
            if view.total_matches == 1 { "" } else { "s" }
        )?;
        Ok(())
    }

    fn render_calendar(&mut self, view: &CalendarView) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "{}", view.month.format("%B %Y"))?;
        writeln!(out)?;
        for name in WEEKDAYS {
            write!(out, "{name:<CELL_WIDTH$}")?;
        }
        writeln!(out)?;

        for week in view.cells.chunks(7) {
            let preview_rows = week
                .iter()
                .map(|c| c.display.len() + usize::from(c.overflow > 0))
                .max()
                .unwrap_or(0);

            for cell in week {
                let day = cell.date.day();
                let label = if cell.other_month {
                    String::new()
                } else if cell.today {
                    format!("{day:>2}*")
                } else {
                    format!("{day:>2}")
                };
                write!(out, "{label:<CELL_WIDTH$}")?;
            }
            writeln!(out)?;

            for row in 0..preview_rows {
                for cell in week {
                    let entry = match cell.display.get(row) {
                        Some(task) => preview_entry(task),
                        None if row == cell.display.len() && cell.overflow > 0 => {
                            format!(
                                "+{} more task{}",
                                cell.overflow,
                                if cell.overflow == 1 { "" } else { "s" }
                            )
                        }
                        None => String::new(),
                    };
                    write!(out, "{:<CELL_WIDTH$}", fit(&entry, CELL_WIDTH - 1))?;
                }
                writeln!(out)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn notify(&mut self, message: &str) -> anyhow::Result<()> {
        println!("{message}");
        Ok(())
    }
}

/// `Today, 14:30` / `Tomorrow, 14:30` / `Aug 09, 14:30`, matching the
/// relative style of the list view's due column.
fn format_due(due: NaiveDateTime, now: NaiveDateTime) -> String {
    let time = due.format("%H:%M");
    if due.date() == now.date() {
        format!("Today, {time}")
    } else if Some(due.date()) == now.date().succ_opt() {
        format!("Tomorrow, {time}")
    } else {
        due.format("%b %d, %H:%M").to_string()
    }
}

fn preview_entry(task: &Task) -> String {
    let mark = if task.completed { "x " } else { "" };
    format!("{}{}{}", mark, task.due.format("%H:%M "), task.title)
}

/// Truncates to `width` terminal columns, with an ellipsis when cut.
fn fit(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width.saturating_sub(1) {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

fn write_table<W: Write>(
    mut writer: W,
    headers: &[&str],
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|h| UnicodeWidthStr::width(*h))
        .collect();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(visible_width(cell));
        }
    }

    for (idx, header) in headers.iter().enumerate() {
        write!(writer, "{:width$} ", header, width = widths[idx])?;
    }
    writeln!(writer)?;
    for width in widths.iter().copied() {
        write!(writer, "{:-<width$} ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let padding = widths[idx].saturating_sub(visible_width(cell));
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Terminal-column width of `s`, not counting ANSI color sequences.
fn visible_width(s: &str) -> usize {
    let mut width = 0;
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            for follow in chars.by_ref() {
                if follow == 'm' {
                    break;
                }
            }
            continue;
        }
        width += UnicodeWidthChar::width(ch).unwrap_or(0);
    }
    width
}
