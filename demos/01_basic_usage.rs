//! Demo 01: Basic Usage
//!
//! Adds, completes, edits, reorders and filters tasks in a file-backed store,
//! then reloads the store to show that the list survives the session.
//!
//! Run with: cargo run --example 01_basic_usage

use eyre::Result;
use tasklist::{FileKv, Filter, Priority, TaskStore, TracingNotifier, parse_due_date};

fn main() -> Result<()> {
    // Create a temporary directory for this demo
    let temp_dir = tempfile::tempdir()?;
    let store_path = temp_dir.path().to_path_buf();

    println!("Tasklist Basic Usage Demo");
    println!("=========================\n");
    println!("Store path: {}\n", store_path.display());

    let mut store = TaskStore::load(FileKv::open(&store_path)?, TracingNotifier);

    println!("1. ADD - Creating three tasks...");
    let milk = store.add("Buy milk", Some(parse_due_date("2020-01-01")?), Some(Priority::High));
    store.add("Walk the dog", None, None);
    store.add("Read a book", None, Some(Priority::Low));
    for task in store.tasks() {
        println!("   - {} [{}]", task.text, task.priority);
    }
    println!();

    println!("2. TOGGLE - Completing the first task...");
    if let Some(id) = milk {
        store.toggle(id);
    }
    let counts = store.counts();
    println!(
        "   Total: {}  Active: {}  Completed: {}  ({}% done)\n",
        counts.total,
        counts.active,
        counts.completed,
        store.progress_percent()
    );

    println!("3. REORDER - Moving the last task to the top...");
    store.reorder(2, 0);
    for task in store.tasks() {
        println!("   - {}", task.text);
    }
    println!();

    println!("4. FILTER - Showing active tasks only...");
    store.set_filter(Filter::Active);
    for entry in store.visible_tasks() {
        println!("   - #{} {}", entry.index, entry.task.text);
    }
    println!();

    println!("5. RELOAD - Opening the store again...");
    drop(store);
    let reloaded = TaskStore::load(FileKv::open(&store_path)?, TracingNotifier);
    println!("   Tasks after reload: {}\n", reloaded.tasks().len());

    println!("Demo complete!");
    Ok(())
}
