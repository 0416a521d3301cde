use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::datetime::wall_time_serde;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "med" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(anyhow!(
                "unknown priority: {other} (expected low, medium, or high)"
            )),
        }
    }
}

/// Opaque task identifier. Stable for the task's lifetime; derived from a
/// millisecond wall-clock reading at creation (see `TaskStore`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// The sole persisted entity. Field names in the JSON payload stay
/// camelCased where the stored schema uses camelCase; unknown fields are
/// kept in `extra` and written back verbatim on the next flush.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "dueDate", with = "wall_time_serde")]
    pub due: NaiveDateTime,

    pub priority: Priority,

    #[serde(default)]
    pub completed: bool,

    #[serde(rename = "createdAt", with = "wall_time_serde")]
    pub created_at: NaiveDateTime,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Caller-supplied fields for task creation. The store assigns the rest.
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub due: NaiveDateTime,
    pub priority: Priority,
}

/// Partial edit applied in place. `None` leaves a field unchanged; `id`,
/// `createdAt`, `completed`, and position are never patchable.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due: Option<NaiveDateTime>,
    pub priority: Option<Priority>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("LOW".parse::<Priority>().unwrap(), Priority::Low);
        assert_eq!("Medium".parse::<Priority>().unwrap(), Priority::Medium);
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn task_tolerates_missing_description_and_unknown_fields() {
        let raw = r#"{
            "id": "1754550000000",
            "title": "Water plants",
            "dueDate": "2026-08-07T09:00:00",
            "priority": "Low",
            "completed": false,
            "createdAt": "2026-08-01T12:00:00",
            "color": "green"
        }"#;

        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.description, None);
        assert_eq!(task.extra.get("color").and_then(|v| v.as_str()), Some("green"));

        let round = serde_json::to_string(&task).unwrap();
        assert!(round.contains("\"color\":\"green\""));
        assert!(round.contains("\"dueDate\":\"2026-08-07T09:00:00\""));
    }
}
