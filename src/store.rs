// Task list state and its persistence

use crate::filter::{Filter, Search};
use crate::kv::KvStore;
use crate::models::{Counts, Priority, Task, now_ms};
use crate::notify::{Notification, Notifier, TracingNotifier};
use chrono::NaiveDate;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

/// Key under which the serialized task array is stored
pub const TASKS_KEY: &str = "tasks";

/// A task in the visible list, paired with its position in the full list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleTask<'a> {
    pub index: usize,
    pub task: &'a Task,
}

/// Ordered task list with transient view state
///
/// Every mutation that changes the task list is written through to the
/// key-value medium and reported to the notifier. Filter, search term and the
/// editing marker live only for the session.
pub struct TaskStore<K: KvStore, N: Notifier = TracingNotifier> {
    kv: K,
    notifier: N,
    tasks: Vec<Task>,
    filter: Filter,
    search_term: String,
    editing_id: Option<i64>,
}

impl<K: KvStore, N: Notifier> TaskStore<K, N> {
    /// Load the task list from `kv`
    ///
    /// A missing, unreadable or malformed list starts the session empty.
    /// Individual entries that cannot be read are skipped.
    pub fn load(kv: K, notifier: N) -> Self {
        let tasks = Self::read_tasks(&kv);
        info!(count = tasks.len(), "Loaded tasks");

        Self {
            kv,
            notifier,
            tasks,
            filter: Filter::default(),
            search_term: String::new(),
            editing_id: None,
        }
    }

    fn read_tasks(kv: &K) -> Vec<Task> {
        let raw = match kv.get(TASKS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = ?e, "Failed to read tasks, starting empty");
                return Vec::new();
            }
        };

        let entries: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = ?e, "Failed to parse tasks, starting empty");
                return Vec::new();
            }
        };

        let mut tasks: Vec<Task> = Vec::with_capacity(entries.len());
        for (position, entry) in entries.into_iter().enumerate() {
            let task: Task = match serde_json::from_value(entry) {
                Ok(t) => t,
                Err(e) => {
                    warn!(position, error = ?e, "Failed to parse task, skipping");
                    continue;
                }
            };

            if tasks.iter().any(|t| t.id == task.id) {
                warn!(id = task.id, "Duplicate task id, skipping");
                continue;
            }
            tasks.push(task);
        }
        tasks
    }

    fn save(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.tasks).context("Failed to serialize tasks")?;
        self.kv.set(TASKS_KEY, &json).context("Failed to write tasks")?;
        debug!(count = self.tasks.len(), "Saved tasks");
        Ok(())
    }

    // Writes are best-effort; the in-memory list stays authoritative for the session.
    fn persist(&mut self) {
        if let Err(e) = self.save() {
            warn!(error = ?e, "Failed to persist tasks");
        }
    }

    fn next_id(&self) -> i64 {
        let now = now_ms();
        match self.tasks.iter().map(|t| t.id).max() {
            Some(max) if max >= now => max + 1,
            _ => now,
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a new task, returning its id
    ///
    /// Text is trimmed; blank text creates nothing. Priority defaults to medium.
    pub fn add(&mut self, text: &str, due_date: Option<NaiveDate>, priority: Option<Priority>) -> Option<i64> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring task with empty text");
            return None;
        }

        let task = Task {
            id: self.next_id(),
            text: text.to_string(),
            completed: false,
            due_date,
            priority: priority.unwrap_or_default(),
        };
        let id = task.id;
        debug!(id, priority = %task.priority, "Adding task");

        self.tasks.push(task);
        self.persist();
        self.notifier.notify(Notification::TaskAdded);
        Some(id)
    }

    /// Flip the completion state of a task; returns false if no task has `id`
    pub fn toggle(&mut self, id: i64) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };

        task.completed = !task.completed;
        let notification = if task.completed {
            Notification::TaskCompleted
        } else {
            Notification::TaskMarkedActive
        };
        debug!(id, completed = task.completed, "Toggled task");

        self.persist();
        self.notifier.notify(notification);
        true
    }

    /// Remove a task; returns false if no task has `id`
    pub fn delete(&mut self, id: i64) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };

        self.tasks.remove(pos);
        if self.editing_id == Some(id) {
            self.editing_id = None;
        }
        debug!(id, "Deleted task");

        self.persist();
        self.notifier.notify(Notification::TaskDeleted);
        true
    }

    /// Put a task into edit mode, replacing any other task being edited
    pub fn start_edit(&mut self, id: i64) -> bool {
        if self.position(id).is_none() {
            return false;
        }
        self.editing_id = Some(id);
        true
    }

    /// Apply an edit and leave edit mode
    ///
    /// Blank text is rejected and edit mode stays active. The text is stored as
    /// given; priority is kept when `new_priority` is `None`.
    pub fn save_edit(&mut self, id: i64, new_text: &str, new_priority: Option<Priority>) -> bool {
        if new_text.trim().is_empty() {
            debug!(id, "Ignoring edit with empty text");
            return false;
        }
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };

        task.text = new_text.to_string();
        if let Some(priority) = new_priority {
            task.priority = priority;
        }
        self.editing_id = None;
        debug!(id, "Updated task");

        self.persist();
        self.notifier.notify(Notification::TaskUpdated);
        true
    }

    pub fn cancel_edit(&mut self) {
        self.editing_id = None;
    }

    /// Move the task at `from` to `to`, both positions in the full list
    ///
    /// Out-of-range or equal positions are ignored.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.tasks.len();
        if from == to || from >= len || to >= len {
            return false;
        }

        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);
        debug!(from, to, "Reordered task");

        self.persist();
        true
    }

    /// Remove every completed task, returning how many were removed
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        let removed = before - self.tasks.len();

        if self.editing_id.is_some_and(|id| self.position(id).is_none()) {
            self.editing_id = None;
        }
        info!(removed, "Cleared completed tasks");

        self.persist();
        removed
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.search_term = term.to_string();
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Position of a task in the full list
    pub fn position(&self, id: i64) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn editing_id(&self) -> Option<i64> {
        self.editing_id
    }

    pub fn is_editing(&self, id: i64) -> bool {
        self.editing_id == Some(id)
    }

    /// Tasks passing the current filter and search, in list order
    pub fn visible_tasks(&self) -> Vec<VisibleTask<'_>> {
        let search = Search::new(&self.search_term);
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| self.filter.matches(task) && search.matches(task))
            .map(|(index, task)| VisibleTask { index, task })
            .collect()
    }

    /// Task at a zero-based slot of the visible list
    pub fn visible_at(&self, slot: usize) -> Option<VisibleTask<'_>> {
        self.visible_tasks().into_iter().nth(slot)
    }

    pub fn counts(&self) -> Counts {
        let total = self.tasks.len();
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        Counts {
            total,
            active: total - completed,
            completed,
        }
    }

    /// Share of completed tasks as a whole percentage, rounded half up
    pub fn progress_percent(&self) -> u8 {
        let Counts { total, completed, .. } = self.counts();
        if total == 0 {
            return 0;
        }
        ((200 * completed + total) / (2 * total)) as u8
    }

    pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
        task.is_overdue(today)
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    pub fn kv_mut(&mut self) -> &mut K {
        &mut self.kv
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn into_kv(self) -> K {
        self.kv
    }
}
