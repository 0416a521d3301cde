use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDateTime;

use crate::datetime::day_delta;
use crate::task::{Priority, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl FromStr for PriorityFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(PriorityFilter::All);
        }
        s.parse::<Priority>().map(PriorityFilter::Only)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl FromStr for StatusFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "completed" | "done" => Ok(StatusFilter::Completed),
            "pending" => Ok(StatusFilter::Pending),
            other => Err(anyhow!(
                "unknown status filter: {other} (expected all, completed, or pending)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeadlineFilter {
    #[default]
    All,
    Today,
    Week,
    Overdue,
}

impl FromStr for DeadlineFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(DeadlineFilter::All),
            "today" => Ok(DeadlineFilter::Today),
            "week" => Ok(DeadlineFilter::Week),
            "overdue" => Ok(DeadlineFilter::Overdue),
            other => Err(anyhow!(
                "unknown deadline filter: {other} (expected all, today, week, or overdue)"
            )),
        }
    }
}

/// The four list-view selectors, ANDed together. The default criteria match
/// everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub priority: PriorityFilter,
    pub status: StatusFilter,
    pub deadline: DeadlineFilter,
    pub search: String,
}

impl FilterCriteria {
    pub fn is_default(&self) -> bool {
        *self == FilterCriteria::default()
    }

    pub fn matches(&self, task: &Task, now: NaiveDateTime) -> bool {
        self.matches_priority(task)
            && self.matches_status(task)
            && self.matches_search(task)
            && self.matches_deadline(task, now)
    }

    fn matches_priority(&self, task: &Task) -> bool {
        match self.priority {
            PriorityFilter::All => true,
            PriorityFilter::Only(priority) => task.priority == priority,
        }
    }

    fn matches_status(&self, task: &Task) -> bool {
        match self.status {
            StatusFilter::All => true,
            StatusFilter::Completed => task.completed,
            StatusFilter::Pending => !task.completed,
        }
    }

    /// Case-insensitive substring match against title or description. A
    /// task without a description never matches a non-empty search term on
    /// the description side.
    fn matches_search(&self, task: &Task) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        if task.title.to_lowercase().contains(&needle) {
            return true;
        }
        task.description
            .as_ref()
            .is_some_and(|d| d.to_lowercase().contains(&needle))
    }

    fn matches_deadline(&self, task: &Task, now: NaiveDateTime) -> bool {
        if self.deadline == DeadlineFilter::All {
            return true;
        }
        let delta = day_delta(task.due, now);
        match self.deadline {
            DeadlineFilter::All => true,
            DeadlineFilter::Today => delta == 0,
            DeadlineFilter::Week => (0..=7).contains(&delta),
            DeadlineFilter::Overdue => delta < 0,
        }
    }
}

/// Stable projection of a snapshot: canonical order in, canonical order out.
pub fn apply(tasks: &[Task], criteria: &FilterCriteria, now: NaiveDateTime) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| criteria.matches(task, now))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::parse_wall_time;
    use crate::task::{TaskDraft, TaskId};

    fn at(raw: &str) -> NaiveDateTime {
        parse_wall_time(raw).unwrap()
    }

    fn task(id: &str, title: &str, due: &str, priority: Priority, completed: bool) -> Task {
        let draft = TaskDraft {
            title: title.to_string(),
            description: None,
            due: at(due),
            priority,
        };
        Task {
            id: TaskId::from(id),
            title: draft.title,
            description: draft.description,
            due: draft.due,
            priority: draft.priority,
            completed,
            created_at: at("2026-08-01T08:00:00"),
            extra: Default::default(),
        }
    }

    fn fixture() -> Vec<Task> {
        vec![
            task("1", "Pay rent", "2026-08-07T09:00:00", Priority::High, false),
            task("2", "Water plants", "2026-08-08T10:00:00", Priority::Low, true),
            task("3", "File taxes", "2026-08-01T10:00:00", Priority::High, false),
            task("4", "Plan trip", "2026-08-20T10:00:00", Priority::Medium, false),
        ]
    }

    #[test]
    fn default_criteria_match_the_snapshot_in_order() {
        let tasks = fixture();
        let now = at("2026-08-07T12:00:00");
        let out = apply(&tasks, &FilterCriteria::default(), now);
        let ids: Vec<_> = out.iter().map(|t| t.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn predicates_are_anded() {
        let tasks = fixture();
        let now = at("2026-08-07T12:00:00");
        let criteria = FilterCriteria {
            priority: PriorityFilter::Only(Priority::High),
            status: StatusFilter::Pending,
            deadline: DeadlineFilter::Overdue,
            search: String::new(),
        };
        let out = apply(&tasks, &criteria, now);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id.as_str(), "3");
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let mut tasks = fixture();
        tasks[3].description = Some("Book the FERRY".to_string());
        let now = at("2026-08-07T12:00:00");

        let mut criteria = FilterCriteria {
            search: "ferry".to_string(),
            ..Default::default()
        };
        assert_eq!(apply(&tasks, &criteria, now).len(), 1);

        criteria.search = "PLANT".to_string();
        let out = apply(&tasks, &criteria, now);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id.as_str(), "2");

        // a task with no description never matches on the description side
        criteria.search = "nonexistent".to_string();
        assert!(apply(&tasks, &criteria, now).is_empty());
    }

    #[test]
    fn deadline_buckets_use_floored_day_deltas() {
        let tasks = vec![
            task("early", "t", "2026-08-07T01:00:00", Priority::Low, false),
            task("late", "t", "2026-08-07T23:00:00", Priority::Low, false),
            task("next-week", "t", "2026-08-14T12:00:00", Priority::Low, false),
            task("beyond", "t", "2026-08-15T12:00:00", Priority::Low, false),
        ];
        let now = at("2026-08-07T12:00:00");

        let today = FilterCriteria {
            deadline: DeadlineFilter::Today,
            ..Default::default()
        };
        let ids: Vec<_> = apply(&tasks, &today, now)
            .iter()
            .map(|t| t.id.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["late"]);

        let overdue = FilterCriteria {
            deadline: DeadlineFilter::Overdue,
            ..Default::default()
        };
        let ids: Vec<_> = apply(&tasks, &overdue, now)
            .iter()
            .map(|t| t.id.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["early"]);

        let week = FilterCriteria {
            deadline: DeadlineFilter::Week,
            ..Default::default()
        };
        let ids: Vec<_> = apply(&tasks, &week, now)
            .iter()
            .map(|t| t.id.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["late", "next-week"]);
    }

    #[test]
    fn filter_strings_parse_case_insensitively() {
        assert_eq!("All".parse::<PriorityFilter>().unwrap(), PriorityFilter::All);
        assert_eq!(
            "HIGH".parse::<PriorityFilter>().unwrap(),
            PriorityFilter::Only(Priority::High)
        );
        assert_eq!("done".parse::<StatusFilter>().unwrap(), StatusFilter::Completed);
        assert_eq!("Week".parse::<DeadlineFilter>().unwrap(), DeadlineFilter::Week);
        assert!("yesterday".parse::<DeadlineFilter>().is_err());
    }
}
