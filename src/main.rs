use chrono::Local;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tasklist::config::{Backend, Config};
use tasklist::render;
use tasklist::shell::Shell;
use tasklist::{Filter, KvStore, Notification, Notifier, TaskStore, Theme, parse_due_date, parse_optional_priority};

#[derive(Parser)]
#[command(name = "tasklist")]
#[command(about = "Tasklist CLI - keep a local list of tasks with due dates and priorities")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file (default: ~/.config/tasklist/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the stored tasks (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage backend (overrides config)
    #[arg(long, value_enum, global = true)]
    backend: Option<Backend>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Which tasks positions refer to
#[derive(Args)]
struct ViewArgs {
    /// Show all, active or completed tasks
    #[arg(short, long, default_value = "all")]
    filter: Filter,

    /// Only tasks whose text contains this (case-insensitive)
    #[arg(short, long)]
    search: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
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

    /// List tasks
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Toggle completion of the task at a listed position
    Toggle {
        position: usize,
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Change the text (and optionally priority) of a task
    Edit {
        position: usize,
        #[arg(required = true)]
        text: Vec<String>,
        /// Priority (low, medium, high); blank leaves it unset
        #[arg(short, long)]
        priority: Option<String>,
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Delete the task at a listed position
    #[command(alias = "rm")]
    Delete {
        position: usize,
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Move a task from one listed position to another
    #[command(alias = "mv")]
    Move {
        from: usize,
        to: usize,
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Remove all completed tasks
    ClearCompleted {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show counters and progress
    Stats,

    /// Show or change the display theme (light, dark or toggle)
    Theme { theme: Option<String> },

    /// Start an interactive session
    Shell,
}

/// Prints notifications to stdout
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, notification: Notification) {
        println!("{}", notification.message().green());
    }
}

fn apply_view<K: KvStore, N: Notifier>(store: &mut TaskStore<K, N>, view: &ViewArgs) {
    store.set_filter(view.filter);
    store.set_search_term(view.search.as_deref().unwrap_or(""));
}

/// Resolve a 1-based listed position to (full-list index, id)
fn resolve<K: KvStore, N: Notifier>(store: &TaskStore<K, N>, position: usize) -> Result<(usize, i64)> {
    position
        .checked_sub(1)
        .and_then(|slot| store.visible_at(slot))
        .map(|entry| (entry.index, entry.task.id))
        .ok_or_else(|| eyre!("No task at position {}", position))
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    // Setup tracing
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        config.log_level()?
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .init();

    let kv = config.open_kv()?;
    let today = Local::now().date_naive();

    if let Commands::Shell = cli.command {
        let stdin = io::stdin();
        let mut shell = Shell::new(kv, today, stdin.lock(), io::stdout());
        return shell.run();
    }

    let theme = Theme::load(&kv);
    let mut store = TaskStore::load(kv, ConsoleNotifier);

    match cli.command {
        Commands::Add { text, due, priority } => {
            let due = match due.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(raw) => Some(parse_due_date(raw)?),
            };
            let priority = parse_optional_priority(priority.as_deref())?;
            if store.add(&text.join(" "), due, priority).is_none() {
                return Err(eyre!("Task text cannot be empty"));
            }
        }
        Commands::List { view } => {
            apply_view(&mut store, &view);
            print!("{}", render::render_list(&store, today, theme));
        }
        Commands::Toggle { position, view } => {
            apply_view(&mut store, &view);
            let (_, id) = resolve(&store, position)?;
            store.toggle(id);
        }
        Commands::Edit {
            position,
            text,
            priority,
            view,
        } => {
            let priority = parse_optional_priority(priority.as_deref())?;
            apply_view(&mut store, &view);
            let (_, id) = resolve(&store, position)?;
            store.start_edit(id);
            if !store.save_edit(id, &text.join(" "), priority) {
                store.cancel_edit();
                return Err(eyre!("Task text cannot be empty"));
            }
        }
        Commands::Delete { position, view } => {
            apply_view(&mut store, &view);
            let (_, id) = resolve(&store, position)?;
            store.delete(id);
        }
        Commands::Move { from, to, view } => {
            apply_view(&mut store, &view);
            let (from_index, _) = resolve(&store, from)?;
            let (to_index, _) = resolve(&store, to)?;
            if store.reorder(from_index, to_index) {
                print!("{}", render::render_list(&store, today, theme));
            }
        }
        Commands::ClearCompleted { yes } => {
            if store.counts().completed == 0 {
                println!("No completed tasks");
                return Ok(());
            }
            if yes || confirm("Are you sure you want to clear all completed tasks?")? {
                let removed = store.clear_completed();
                println!("Removed {} completed task(s)", removed);
            }
        }
        Commands::Stats => {
            let overdue = store.tasks().iter().filter(|t| t.is_overdue(today)).count();
            println!("{}", render::counts_line(store.counts()));
            if overdue > 0 {
                println!("{}", format!("Overdue: {}", overdue).red());
            }
            println!("{}", render::progress_line(store.progress_percent()));
        }
        Commands::Theme { theme: requested } => {
            let next = match requested.as_deref() {
                None => theme,
                Some("toggle") => theme.toggled(),
                Some(name) => name.parse()?,
            };
            if next != theme {
                next.save(store.kv_mut())?;
            }
            println!("Theme: {}", next);
        }
        Commands::Shell => unreachable!("handled above"),
    }

    Ok(())
}
