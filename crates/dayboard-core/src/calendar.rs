use chrono::{Datelike, Duration, NaiveDate};

use crate::task::Task;

pub const DEFAULT_MAX_TASKS_PER_DAY: usize = 3;

/// One cell of the month grid. Other-month filler cells carry their date
/// but never any tasks.
#[derive(Debug, Clone)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub other_month: bool,
    pub today: bool,
    /// True iff the full bucket is non-empty, independent of the display cap.
    pub has_tasks: bool,
    /// At most `max_per_day` tasks, incomplete first, then by due time.
    pub display: Vec<Task>,
    /// How many bucketed tasks did not fit into `display`.
    pub overflow: usize,
}

/// Every task due on `date`, incomplete before completed, ascending due
/// time within each group. The sort is stable, so ties keep canonical order.
pub fn tasks_for_day(tasks: &[Task], date: NaiveDate) -> Vec<Task> {
    let mut bucket: Vec<Task> = tasks
        .iter()
        .filter(|task| task.due.date() == date)
        .cloned()
        .collect();
    bucket.sort_by_key(|task| (task.completed, task.due));
    bucket
}

/// Moves a first-of-month cursor by `offset` months.
pub fn shift_month(cursor: NaiveDate, offset: i32) -> NaiveDate {
    let months = cursor.year() * 12 + cursor.month0() as i32 + offset;
    let year = months.div_euclid(12);
    let month = months.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(cursor)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Enumerates the full grid for the month containing `cursor`: complete
/// weeks starting Sunday, padded with other-month filler on both ends.
pub fn month_cells(
    cursor: NaiveDate,
    tasks: &[Task],
    today: NaiveDate,
    max_per_day: usize,
) -> Vec<CalendarCell> {
    let first = first_of_month(cursor);
    let days_in_month = shift_month(first, 1).signed_duration_since(first).num_days();
    let start_offset = i64::from(first.weekday().num_days_from_sunday());
    let total_cells = ((days_in_month + start_offset) as u64).div_ceil(7) as i64 * 7;

    let mut cells = Vec::with_capacity(total_cells as usize);
    for i in 0..total_cells {
        let date = first + Duration::days(i - start_offset);
        if date.month() != first.month() || date.year() != first.year() {
            cells.push(CalendarCell {
                date,
                other_month: true,
                today: false,
                has_tasks: false,
                display: Vec::new(),
                overflow: 0,
            });
            continue;
        }

        let bucket = tasks_for_day(tasks, date);
        let has_tasks = !bucket.is_empty();
        let overflow = bucket.len().saturating_sub(max_per_day);
        let mut display = bucket;
        display.truncate(max_per_day);

        cells.push(CalendarCell {
            date,
            other_month: false,
            today: date == today,
            has_tasks,
            display,
            overflow,
        });
    }

    cells
}
