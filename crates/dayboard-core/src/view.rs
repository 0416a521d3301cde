use chrono::NaiveDate;

use crate::calendar::CalendarCell;
use crate::task::Task;

/// What the list view renders: one page of the filtered projection.
#[derive(Debug, Clone)]
pub struct ListView {
    pub items: Vec<Task>,
    pub page: usize,
    pub total_pages: usize,
    pub total_matches: usize,
    /// Set iff nothing matched; the message depends on why (see
    /// `ListSession::empty_message`).
    pub empty_message: Option<String>,
}

/// What the calendar view renders: a full month grid.
#[derive(Debug, Clone)]
pub struct CalendarView {
    /// First day of the displayed month.
    pub month: NaiveDate,
    pub cells: Vec<CalendarCell>,
}

/// Header counts: incomplete tasks due today / due strictly after now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskCounts {
    pub due_today: usize,
    pub upcoming: usize,
}

/// The rendering layer as seen from the core. Implementations own all
/// presentation concerns; the core only hands them projections and
/// dismissible notices.
pub trait ViewRenderer {
    fn render_list(&mut self, view: &ListView) -> anyhow::Result<()>;
    fn render_calendar(&mut self, view: &CalendarView) -> anyhow::Result<()>;
    fn notify(&mut self, message: &str) -> anyhow::Result<()>;
}
