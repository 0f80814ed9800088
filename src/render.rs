// Terminal rendering of the task list

use crate::kv::KvStore;
use crate::models::{Counts, Priority, Task};
use crate::notify::Notifier;
use crate::store::TaskStore;
use crate::theme::Theme;
use chrono::NaiveDate;
use colored::{ColoredString, Colorize};
use std::fmt::Write;

const PROGRESS_WIDTH: usize = 20;

fn accent(s: &str, theme: Theme) -> ColoredString {
    match theme {
        Theme::Light => s.blue().bold(),
        Theme::Dark => s.bright_cyan().bold(),
    }
}

pub fn priority_badge(priority: Priority) -> ColoredString {
    let badge = format!("[{}]", priority.label());
    match priority {
        Priority::Low => badge.green(),
        Priority::Medium => badge.yellow(),
        Priority::High => badge.red().bold(),
    }
}

/// One line for a task; `position` is the 1-based slot in the visible list
pub fn task_line(position: usize, task: &Task, today: NaiveDate, editing: bool) -> String {
    let check = if task.completed { "[x]" } else { "[ ]" };
    let text = if task.completed {
        task.text.dimmed().strikethrough()
    } else {
        task.text.normal()
    };

    let mut line = format!("{:>3}. {} {} {}", position, check, text, priority_badge(task.priority));
    if let Some(due) = task.due_date {
        let label = format!("Due: {}", due.format("%Y-%m-%d"));
        if task.is_overdue(today) {
            let _ = write!(line, " {} {}", label.red(), "(overdue)".red().bold());
        } else {
            let _ = write!(line, " {}", label.dimmed());
        }
    }
    if editing {
        let _ = write!(line, " {}", "(editing)".magenta());
    }
    line
}

pub fn counts_line(counts: Counts) -> String {
    format!(
        "Total: {}  Active: {}  Completed: {}",
        counts.total, counts.active, counts.completed
    )
}

pub fn progress_line(percent: u8) -> String {
    let filled = (usize::from(percent) * PROGRESS_WIDTH + 50) / 100;
    format!(
        "[{}{}] {}% Done",
        "#".repeat(filled).green(),
        "-".repeat(PROGRESS_WIDTH - filled),
        percent
    )
}

/// The visible list plus counters and progress
pub fn render_list<K: KvStore, N: Notifier>(store: &TaskStore<K, N>, today: NaiveDate, theme: Theme) -> String {
    let mut out = String::new();

    let mut header = format!("Tasks ({})", store.filter());
    if !store.search_term().trim().is_empty() {
        let _ = write!(header, " matching \"{}\"", store.search_term().trim());
    }
    let _ = writeln!(out, "{}", accent(&header, theme));

    let visible = store.visible_tasks();
    if visible.is_empty() {
        let _ = writeln!(out, "  {}", "No tasks".dimmed());
    }
    for (i, entry) in visible.iter().enumerate() {
        let editing = store.is_editing(entry.task.id);
        let _ = writeln!(out, "{}", task_line(i + 1, entry.task, today, editing));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", counts_line(store.counts()));
    let _ = writeln!(out, "{}", progress_line(store.progress_percent()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::kv::MemoryKv;
    use crate::models::parse_due_date;
    use crate::notify::Notification;

    fn plain() {
        colored::control::set_override(false);
    }

    fn date(s: &str) -> NaiveDate {
        parse_due_date(s).unwrap()
    }

    fn task(text: &str) -> Task {
        Task {
            id: 1,
            text: text.to_string(),
            completed: false,
            due_date: None,
            priority: Priority::High,
        }
    }

    #[test]
    fn test_task_line_basic() {
        plain();
        let line = task_line(1, &task("Buy milk"), date("2024-01-01"), false);
        assert_eq!(line, "  1. [ ] Buy milk [High]");
    }

    #[test]
    fn test_task_line_overdue_and_editing() {
        plain();
        let mut t = task("Pay rent");
        t.due_date = Some(date("2024-01-01"));

        let line = task_line(2, &t, date("2024-01-02"), true);
        assert!(line.contains("Due: 2024-01-01"));
        assert!(line.contains("(overdue)"));
        assert!(line.ends_with("(editing)"));

        t.completed = true;
        let line = task_line(2, &t, date("2024-01-02"), false);
        assert!(line.contains("[x]"));
        assert!(!line.contains("(overdue)"));
    }

    #[test]
    fn test_counts_and_progress_lines() {
        plain();
        let counts = Counts {
            total: 4,
            active: 3,
            completed: 1,
        };
        assert_eq!(counts_line(counts), "Total: 4  Active: 3  Completed: 1");
        assert_eq!(progress_line(0), format!("[{}] 0% Done", "-".repeat(20)));
        assert_eq!(progress_line(100), format!("[{}] 100% Done", "#".repeat(20)));
        assert_eq!(progress_line(25), format!("[{}{}] 25% Done", "#".repeat(5), "-".repeat(15)));
    }

    #[test]
    fn test_render_list_uses_visible_positions() {
        plain();
        let mut store: TaskStore<MemoryKv, Vec<Notification>> = TaskStore::load(MemoryKv::new(), Vec::new());
        store.add("alpha", None, None);
        store.add("beta", None, None);
        store.add("gamma", None, None);
        store.toggle(store.tasks()[0].id);
        store.set_filter(Filter::Active);

        let out = render_list(&store, date("2024-01-01"), Theme::Light);
        assert!(out.starts_with("Tasks (active)"));
        assert!(out.contains("  1. [ ] beta"));
        assert!(out.contains("  2. [ ] gamma"));
        assert!(!out.contains("alpha"));
        assert!(out.contains("Total: 3  Active: 2  Completed: 1"));
        assert!(out.contains("33% Done"));
    }

    #[test]
    fn test_render_empty_list() {
        plain();
        let store: TaskStore<MemoryKv, Vec<Notification>> = TaskStore::load(MemoryKv::new(), Vec::new());
        let out = render_list(&store, date("2024-01-01"), Theme::Dark);
        assert!(out.contains("No tasks"));
        assert!(out.contains("0% Done"));
    }
}
