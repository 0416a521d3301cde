use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, anyhow};
use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::task::{Task, TaskDraft, TaskId, TaskPatch};

/// Domain errors surfaced by store mutations. All are recoverable; none
/// abort the session.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Creation beyond the configured collection cap is rejected outright.
    #[error("task limit reached ({max}); complete or remove existing tasks first")]
    CapacityExceeded { max: usize },

    /// The addressed task vanished (for example, removed from another tab
    /// sharing the same data file).
    #[error("no task with id {0}")]
    NotFound(TaskId),

    /// The supplied reorder sequence is not a permutation of the stored ids.
    #[error("reorder sequence is not a permutation of the stored tasks: {0}")]
    InvalidOrder(String),
}

/// Whole-payload persistence. One logical key, read and written as a single
/// string; the store never does partial writes.
pub trait StorageBackend {
    fn read(&self) -> anyhow::Result<Option<String>>;
    fn write(&self, payload: &str) -> anyhow::Result<()>;
}

/// Single JSON file on disk, replaced atomically on every flush.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl StorageBackend for FileBackend {
    fn read(&self) -> anyhow::Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&self.path)
            .map(Some)
            .with_context(|| format!("failed reading {}", self.path.display()))
    }

    fn write(&self, payload: &str) -> anyhow::Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(payload.as_bytes())?;
        temp.flush()?;
        temp.persist(&self.path)
            .map_err(|err| anyhow!("failed to persist {}: {}", self.path.display(), err))?;
        Ok(())
    }
}

/// In-memory backend. The shared cell lets tests reopen a store over the
/// same payload and inspect what was flushed.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    cell: Rc<RefCell<Option<String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(payload: &str) -> Self {
        Self {
            cell: Rc::new(RefCell::new(Some(payload.to_string()))),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.cell.borrow().clone()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self) -> anyhow::Result<Option<String>> {
        Ok(self.cell.borrow().clone())
    }

    fn write(&self, payload: &str) -> anyhow::Result<()> {
        *self.cell.borrow_mut() = Some(payload.to_string());
        Ok(())
    }
}

/// Exclusive owner of the ordered task collection. The stored order is the
/// manual (drag) order; projections copy, they never mutate.
pub struct TaskStore {
    tasks: Vec<Task>,
    backend: Box<dyn StorageBackend>,
    max_tasks: usize,
    last_id_millis: i64,
}

impl TaskStore {
    /// Loads the persisted collection. Missing or malformed data degrades
    /// to an empty collection with a logged diagnostic; this never fails.
    pub fn open(backend: Box<dyn StorageBackend>, max_tasks: usize) -> Self {
        let tasks = match backend.read() {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Task>>(&raw) {
                Ok(tasks) => tasks,
                Err(err) => {
                    warn!(error = %err, "persisted task data is malformed; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "could not read persisted tasks; starting empty");
                Vec::new()
            }
        };

        info!(count = tasks.len(), max_tasks, "opened task store");
        Self {
            tasks,
            backend,
            max_tasks,
            last_id_millis: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn max_tasks(&self) -> usize {
        self.max_tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Read-only copy of the collection in canonical order. Never aliases
    /// internal storage.
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    pub fn ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|t| t.id.clone()).collect()
    }

    #[tracing::instrument(skip(self, draft), fields(title = %draft.title))]
    pub fn add(&mut self, draft: TaskDraft, now: NaiveDateTime) -> Result<Task, StoreError> {
        if self.tasks.len() >= self.max_tasks {
            return Err(StoreError::CapacityExceeded {
                max: self.max_tasks,
            });
        }

        let task = Task {
            id: self.next_id(now),
            title: draft.title,
            description: draft.description,
            due: draft.due,
            priority: draft.priority,
            completed: false,
            created_at: now,
            extra: Default::default(),
        };
        self.tasks.push(task.clone());
        debug!(id = %task.id, count = self.tasks.len(), "task added");

        self.flush();
        Ok(task)
    }

    #[tracing::instrument(skip(self, patch))]
    pub fn update(&mut self, id: &TaskId, patch: TaskPatch) -> Result<Task, StoreError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(due) = patch.due {
            task.due = due;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        let updated = task.clone();

        self.flush();
        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    pub fn toggle_complete(&mut self, id: &TaskId) -> Result<Task, StoreError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        task.completed = !task.completed;
        let toggled = task.clone();

        self.flush();
        Ok(toggled)
    }

    /// Idempotent: deleting an unknown id is a no-op, not an error.
    #[tracing::instrument(skip(self))]
    pub fn delete(&mut self, id: &TaskId) {
        let before = self.tasks.len();
        self.tasks.retain(|t| &t.id != id);
        if self.tasks.len() == before {
            debug!(%id, "delete on unknown id; nothing removed");
        }
        self.flush();
    }

    /// Replaces the canonical order with `order`, which must be a
    /// permutation of the current ids. On rejection the store is unchanged.
    #[tracing::instrument(skip(self, order))]
    pub fn reorder(&mut self, order: &[TaskId]) -> Result<(), StoreError> {
        if order.len() != self.tasks.len() {
            return Err(StoreError::InvalidOrder(format!(
                "expected {} ids, got {}",
                self.tasks.len(),
                order.len()
            )));
        }

        let current: HashSet<&TaskId> = self.tasks.iter().map(|t| &t.id).collect();
        let mut seen = HashSet::new();
        for id in order {
            if !current.contains(id) {
                return Err(StoreError::InvalidOrder(format!("unknown id {id}")));
            }
            if !seen.insert(id) {
                return Err(StoreError::InvalidOrder(format!("duplicate id {id}")));
            }
        }

        let mut by_id: HashMap<TaskId, Task> = self
            .tasks
            .drain(..)
            .map(|t| (t.id.clone(), t))
            .collect();
        for id in order {
            if let Some(task) = by_id.remove(id) {
                self.tasks.push(task);
            }
        }
        debug!(count = self.tasks.len(), "order replaced");

        self.flush();
        Ok(())
    }

    /// Millisecond-clock id with a monotonic bump: two creations inside the
    /// same millisecond (or a clock step backwards) still get distinct ids.
    fn next_id(&mut self, now: NaiveDateTime) -> TaskId {
        let mut millis = now.and_utc().timestamp_millis();
        if millis <= self.last_id_millis {
            millis = self.last_id_millis + 1;
        }
        while self.tasks.iter().any(|t| t.id.as_str() == millis.to_string()) {
            millis += 1;
        }
        self.last_id_millis = millis;
        TaskId::new(millis.to_string())
    }

    /// Serializes the whole collection and hands it to the backend. A failed
    /// flush is logged and swallowed: the in-memory state is the primary
    /// contract for the rest of the session.
    fn flush(&self) {
        let payload = match serde_json::to_string(&self.tasks) {
            Ok(payload) => payload,
            Err(err) => {
                error!(error = %err, "could not serialize tasks; flush skipped");
                return;
            }
        };
        if let Err(err) = self.backend.write(&payload) {
            error!(error = %err, "could not persist tasks; keeping in-memory state");
        }
    }
}
