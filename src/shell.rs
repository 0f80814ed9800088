// Interactive session over a task store
//
// Filter, search and edit state last for the session and are never persisted.

use crate::filter::Filter;
use crate::kv::KvStore;
use crate::models::{parse_due_date, parse_optional_priority};
use crate::notify::{Notification, ToastSlot};
use crate::render;
use crate::store::TaskStore;
use crate::theme::Theme;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::Result;
use std::io::{BufRead, Write};
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "tasklist", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    /// Add a task
    Add {
        #[arg(required = true)]
        text: Vec<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(short, long)]
        due: Option<String>,
        /// Priority (low, medium, high); blank leaves it unset
        #[arg(short, long)]
        priority: Option<String>,
    },
    /// Show the visible tasks
    #[command(alias = "ls")]
    List,
    /// Toggle completion of the task at a visible position
    Toggle { position: usize },
    /// Start editing the task at a visible position
    Edit { position: usize },
    /// Save the task being edited
    Save {
        #[arg(required = true)]
        text: Vec<String>,
        /// Priority (low, medium, high); blank leaves it unset
        #[arg(short, long)]
        priority: Option<String>,
    },
    /// Leave edit mode without saving
    Cancel,
    /// Delete the task at a visible position
    #[command(alias = "rm")]
    Delete { position: usize },
    /// Move a task between visible positions
    #[command(alias = "mv")]
    Move { from: usize, to: usize },
    /// Show all, active or completed tasks
    Filter { filter: Filter },
    /// Search task text (no term clears the search)
    Search { term: Vec<String> },
    /// Remove all completed tasks
    Clear,
    /// Switch between light and dark theme
    Theme,
    /// End the session
    #[command(alias = "exit")]
    Quit,
}

enum Flow {
    Continue,
    Quit,
}

pub struct Shell<K: KvStore, R: BufRead, W: Write> {
    store: TaskStore<K, Vec<Notification>>,
    theme: Theme,
    toast: ToastSlot,
    today: NaiveDate,
    input: R,
    output: W,
}

impl<K: KvStore, R: BufRead, W: Write> Shell<K, R, W> {
    pub fn new(kv: K, today: NaiveDate, input: R, output: W) -> Self {
        let theme = Theme::load(&kv);
        Self {
            store: TaskStore::load(kv, Vec::new()),
            theme,
            toast: ToastSlot::default(),
            today,
            input,
            output,
        }
    }

    pub fn store(&self) -> &TaskStore<K, Vec<Notification>> {
        &self.store
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Read commands until end of input or `quit`
    pub fn run(&mut self) -> Result<()> {
        self.show_list()?;

        let mut line = String::new();
        loop {
            write!(self.output, "{} ", ">".bold())?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            let words: Vec<&str> = line.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }

            let command = match ShellLine::try_parse_from(words) {
                Ok(parsed) => parsed.command,
                Err(e) => {
                    write!(self.output, "{}", e)?;
                    continue;
                }
            };

            if let Flow::Quit = self.execute(command)? {
                break;
            }
            self.show_toast()?;
        }

        Ok(())
    }

    fn execute(&mut self, command: ShellCommand) -> Result<Flow> {
        match command {
            ShellCommand::Add { text, due, priority } => {
                let due = match due.as_deref().map(str::trim) {
                    None | Some("") => None,
                    Some(raw) => match parse_due_date(raw) {
                        Ok(date) => Some(date),
                        Err(e) => return self.complain(&e.to_string()),
                    },
                };
                let priority = match parse_optional_priority(priority.as_deref()) {
                    Ok(priority) => priority,
                    Err(e) => return self.complain(&e.to_string()),
                };
                if self.store.add(&text.join(" "), due, priority).is_none() {
                    return self.complain("Task text cannot be empty");
                }
                self.show_list()?;
            }
            ShellCommand::List => self.show_list()?,
            ShellCommand::Toggle { position } => {
                let Some(id) = self.id_at(position) else {
                    return self.no_task(position);
                };
                self.store.toggle(id);
                self.show_list()?;
            }
            ShellCommand::Edit { position } => {
                let Some(id) = self.id_at(position) else {
                    return self.no_task(position);
                };
                self.store.start_edit(id);
                if let Some(task) = self.store.get(id) {
                    writeln!(self.output, "Editing: {} [{}]", task.text, task.priority)?;
                }
                writeln!(self.output, "Use `save <text>` or `cancel`")?;
            }
            ShellCommand::Save { text, priority } => {
                let Some(id) = self.store.editing_id() else {
                    return self.complain("Not editing any task");
                };
                let priority = match parse_optional_priority(priority.as_deref()) {
                    Ok(priority) => priority,
                    Err(e) => return self.complain(&e.to_string()),
                };
                if !self.store.save_edit(id, &text.join(" "), priority) {
                    return self.complain("Task text cannot be empty");
                }
                self.show_list()?;
            }
            ShellCommand::Cancel => {
                self.store.cancel_edit();
                self.show_list()?;
            }
            ShellCommand::Delete { position } => {
                let Some(id) = self.id_at(position) else {
                    return self.no_task(position);
                };
                self.store.delete(id);
                self.show_list()?;
            }
            ShellCommand::Move { from, to } => {
                let (Some(from_index), Some(to_index)) = (self.index_at(from), self.index_at(to)) else {
                    return self.complain("Positions must refer to visible tasks");
                };
                self.store.reorder(from_index, to_index);
                self.show_list()?;
            }
            ShellCommand::Filter { filter } => {
                self.store.set_filter(filter);
                self.show_list()?;
            }
            ShellCommand::Search { term } => {
                self.store.set_search_term(&term.join(" "));
                self.show_list()?;
            }
            ShellCommand::Clear => {
                if self.confirm("Are you sure you want to clear all completed tasks?")? {
                    let removed = self.store.clear_completed();
                    writeln!(self.output, "Removed {} completed task(s)", removed)?;
                    self.show_list()?;
                }
            }
            ShellCommand::Theme => {
                self.theme = self.theme.toggled();
                if let Err(e) = self.theme.save(self.store.kv_mut()) {
                    warn!(error = ?e, "Failed to save theme");
                }
                writeln!(self.output, "Theme: {}", self.theme)?;
            }
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    // Visible positions are 1-based on screen
    fn index_at(&self, position: usize) -> Option<usize> {
        let slot = position.checked_sub(1)?;
        self.store.visible_at(slot).map(|entry| entry.index)
    }

    fn id_at(&self, position: usize) -> Option<i64> {
        let slot = position.checked_sub(1)?;
        self.store.visible_at(slot).map(|entry| entry.task.id)
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        write!(self.output, "{} [y/N] ", question)?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        let yes = matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes");
        debug!(yes, "Confirmation answered");
        Ok(yes)
    }

    fn show_list(&mut self) -> Result<()> {
        let out = render::render_list(&self.store, self.today, self.theme);
        write!(self.output, "{}", out)?;
        Ok(())
    }

    fn show_toast(&mut self) -> Result<()> {
        let now = Instant::now();
        if let Some(latest) = self.store.notifier_mut().drain(..).last() {
            self.toast.show(latest, now);
        }
        self.toast.tick(now);
        if let Some(notification) = self.toast.visible(now) {
            writeln!(self.output, "{}", notification.message().green())?;
        }
        Ok(())
    }

    fn no_task(&mut self, position: usize) -> Result<Flow> {
        self.complain(&format!("No task at position {}", position))
    }

    fn complain(&mut self, message: &str) -> Result<Flow> {
        writeln!(self.output, "{}", message.yellow())?;
        Ok(Flow::Continue)
    }
}
