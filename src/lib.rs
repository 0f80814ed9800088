// Tasklist - ordered task list with filtering, search and local persistence

pub mod config;
pub mod filter;
pub mod kv;
pub mod models;
pub mod notify;
pub mod render;
pub mod shell;
pub mod store;
pub mod theme;

// Re-export main types for convenience
pub use filter::{Filter, Search};
pub use kv::{FileKv, KvStore, MemoryKv, SqliteKv};
pub use models::{Counts, Priority, Task, now_ms, parse_due_date, parse_optional_priority};
pub use notify::{Notification, Notifier, ToastSlot, TracingNotifier};
pub use store::{TaskStore, VisibleTask};
pub use theme::Theme;
