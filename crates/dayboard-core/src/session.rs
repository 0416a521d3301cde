use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::calendar::{first_of_month, month_cells, shift_month};
use crate::filter::{self, FilterCriteria};
use crate::page::{clamp_page, paginate, total_pages};
use crate::task::{Task, TaskId};
use crate::view::{CalendarView, ListView, TaskCounts};

/// Transient list-view state: the active criteria and pagination cursor.
/// Holds no tasks; every projection starts from a fresh store snapshot.
#[derive(Debug, Clone)]
pub struct ListSession {
    criteria: FilterCriteria,
    page: usize,
    page_size: usize,
}

impl ListSession {
    pub fn new(page_size: usize) -> Self {
        Self {
            criteria: FilterCriteria::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Changing any criterion drops back to page 1 so the user never lands
    /// on an empty page of a shrunken result set.
    pub fn on_filter_change(&mut self, criteria: FilterCriteria) {
        debug!(?criteria, "filter changed; resetting to page 1");
        self.criteria = criteria;
        self.page = 1;
    }

    pub fn on_page_change(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn on_page_size_change(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    /// Filter, clamp the pagination cursor, slice. The clamped page is kept
    /// so the next intent starts from what was actually rendered.
    pub fn view(&mut self, snapshot: &[Task], now: NaiveDateTime) -> ListView {
        let matches = filter::apply(snapshot, &self.criteria, now);
        let total = total_pages(matches.len(), self.page_size);
        self.page = clamp_page(self.page, total);

        let slice = paginate(&matches, self.page, self.page_size);
        let empty_message = matches.is_empty().then(|| self.empty_message());

        ListView {
            items: slice.items.to_vec(),
            page: self.page,
            total_pages: total,
            total_matches: matches.len(),
            empty_message,
        }
    }

    /// The ids the list view currently shows, in rendered order. This is
    /// the subset a drag gesture rearranges.
    pub fn visible_ids(&mut self, snapshot: &[Task], now: NaiveDateTime) -> Vec<TaskId> {
        self.view(snapshot, now)
            .items
            .into_iter()
            .map(|t| t.id)
            .collect()
    }

    fn empty_message(&self) -> String {
        if !self.criteria.search.is_empty() {
            format!("No tasks found matching \"{}\"", self.criteria.search)
        } else if !self.criteria.is_default() {
            "No tasks match the selected filters".to_string()
        } else {
            "Create your first task to get started!".to_string()
        }
    }
}

/// Transient calendar-view state: the displayed month and the per-day
/// display cap.
#[derive(Debug, Clone)]
pub struct CalendarSession {
    cursor: NaiveDate,
    max_per_day: usize,
}

impl CalendarSession {
    pub fn new(today: NaiveDate, max_per_day: usize) -> Self {
        Self {
            cursor: first_of_month(today),
            max_per_day: max_per_day.max(1),
        }
    }

    pub fn cursor(&self) -> NaiveDate {
        self.cursor
    }

    pub fn on_month_change(&mut self, offset: i32) {
        self.cursor = shift_month(self.cursor, offset);
        debug!(cursor = %self.cursor, "month changed");
    }

    pub fn on_today(&mut self, today: NaiveDate) {
        self.cursor = first_of_month(today);
    }

    pub fn on_jump(&mut self, year: i32, month: u32) -> bool {
        match NaiveDate::from_ymd_opt(year, month, 1) {
            Some(first) => {
                self.cursor = first;
                true
            }
            None => false,
        }
    }

    pub fn view(&self, snapshot: &[Task], today: NaiveDate) -> CalendarView {
        CalendarView {
            month: self.cursor,
            cells: month_cells(self.cursor, snapshot, today, self.max_per_day),
        }
    }
}

/// Header counts over the whole collection, ignoring list filters.
pub fn task_counts(snapshot: &[Task], now: NaiveDateTime) -> TaskCounts {
    let due_today = snapshot
        .iter()
        .filter(|t| !t.completed && t.due.date() == now.date())
        .count();
    let upcoming = snapshot
        .iter()
        .filter(|t| !t.completed && t.due > now)
        .count();
    TaskCounts { due_today, upcoming }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::parse_wall_time;
    use crate::filter::StatusFilter;
    use crate::task::{Priority, TaskId};

    fn at(raw: &str) -> NaiveDateTime {
        parse_wall_time(raw).unwrap()
    }

    fn task(id: &str, due: &str, completed: bool) -> Task {
        Task {
            id: TaskId::from(id),
            title: format!("task {id}"),
            description: None,
            due: at(due),
            priority: Priority::Medium,
            completed,
            created_at: at("2026-08-01T08:00:00"),
            extra: Default::default(),
        }
    }

    fn many(n: usize) -> Vec<Task> {
        (0..n)
            .map(|i| task(&format!("t{i}"), "2026-08-09T10:00:00", false))
            .collect()
    }

    #[test]
    fn filter_change_resets_to_page_one() {
        let mut session = ListSession::new(10);
        session.on_page_change(3);
        assert_eq!(session.page(), 3);

        session.on_filter_change(FilterCriteria {
            status: StatusFilter::Pending,
            ..Default::default()
        });
        assert_eq!(session.page(), 1);
    }

    #[test]
    fn page_size_change_resets_to_page_one() {
        let mut session = ListSession::new(10);
        session.on_page_change(2);
        session.on_page_size_change(5);
        assert_eq!(session.page(), 1);
    }

    #[test]
    fn out_of_range_page_is_clamped_at_render_time() {
        let tasks = many(25);
        let now = at("2026-08-07T12:00:00");

        let mut session = ListSession::new(10);
        session.on_page_change(9);
        let view = session.view(&tasks, now);
        assert_eq!(view.page, 3);
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.items.len(), 5);
    }

    #[test]
    fn empty_message_depends_on_why_nothing_matched() {
        let now = at("2026-08-07T12:00:00");
        let tasks = many(1);

        let mut session = ListSession::new(10);
        session.on_filter_change(FilterCriteria {
            search: "zeppelin".to_string(),
            ..Default::default()
        });
        let view = session.view(&tasks, now);
        assert_eq!(
            view.empty_message.as_deref(),
            Some("No tasks found matching \"zeppelin\"")
        );

        session.on_filter_change(FilterCriteria {
            status: StatusFilter::Completed,
            ..Default::default()
        });
        let view = session.view(&tasks, now);
        assert_eq!(
            view.empty_message.as_deref(),
            Some("No tasks match the selected filters")
        );

        let mut session = ListSession::new(10);
        let view = session.view(&[], now);
        assert_eq!(
            view.empty_message.as_deref(),
            Some("Create your first task to get started!")
        );

        let view = session.view(&tasks, now);
        assert_eq!(view.empty_message, None);
    }

    #[test]
    fn calendar_session_navigates_months_and_jumps() {
        let mut session = CalendarSession::new(at("2026-08-07T12:00:00").date(), 3);
        assert_eq!(session.cursor(), at("2026-08-01T00:00:00").date());

        session.on_month_change(1);
        assert_eq!(session.cursor(), at("2026-09-01T00:00:00").date());
        session.on_month_change(-2);
        assert_eq!(session.cursor(), at("2026-07-01T00:00:00").date());

        assert!(session.on_jump(2027, 2));
        assert_eq!(session.cursor(), at("2027-02-01T00:00:00").date());
        assert!(!session.on_jump(2027, 13));

        session.on_today(at("2026-08-07T12:00:00").date());
        assert_eq!(session.cursor(), at("2026-08-01T00:00:00").date());
    }

    #[test]
    fn counts_ignore_completed_tasks() {
        let now = at("2026-08-07T12:00:00");
        let tasks = vec![
            task("today-open", "2026-08-07T18:00:00", false),
            task("today-done", "2026-08-07T19:00:00", true),
            task("later", "2026-08-12T09:00:00", false),
            task("past", "2026-08-01T09:00:00", false),
        ];
        let counts = task_counts(&tasks, now);
        assert_eq!(counts.due_today, 1);
        assert_eq!(counts.upcoming, 2);
    }
}
