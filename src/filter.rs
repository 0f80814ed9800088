// View filtering for the task list

use crate::models::Task;
use eyre::{Result, eyre};
use std::fmt;
use std::str::FromStr;

/// Completion filter applied to the visible list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.completed,
            Filter::Completed => task.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Filter {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Filter::All),
            "active" => Ok(Filter::Active),
            "completed" | "done" => Ok(Filter::Completed),
            other => Err(eyre!("Invalid filter: {} (expected all, active or completed)", other)),
        }
    }
}

/// Case-insensitive substring search over task text
///
/// The term is trimmed and lowercased once; an empty term matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Search {
    needle: String,
}

impl Search {
    pub fn new(term: &str) -> Self {
        Self {
            needle: term.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.is_empty() || task.text.to_lowercase().contains(&self.needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;

    fn task(text: &str, completed: bool) -> Task {
        Task {
            id: 1,
            text: text.to_string(),
            completed,
            due_date: None,
            priority: Priority::Medium,
        }
    }

    #[test]
    fn test_filter_matches() {
        let open = task("open", false);
        let done = task("done", true);

        assert!(Filter::All.matches(&open));
        assert!(Filter::All.matches(&done));
        assert!(Filter::Active.matches(&open));
        assert!(!Filter::Active.matches(&done));
        assert!(Filter::Completed.matches(&done));
        assert!(!Filter::Completed.matches(&open));
    }

    #[test]
    fn test_filter_from_str() {
        assert_eq!("Active".parse::<Filter>().unwrap(), Filter::Active);
        assert_eq!("completed".parse::<Filter>().unwrap(), Filter::Completed);
        assert!("pending".parse::<Filter>().is_err());
        assert_eq!(Filter::default(), Filter::All);
    }

    #[test]
    fn test_search_case_insensitive() {
        let search = Search::new("  MILK ");
        assert!(search.matches(&task("Buy milk", false)));
        assert!(search.matches(&task("Milkshake", false)));
        assert!(!search.matches(&task("Buy bread", false)));
    }

    #[test]
    fn test_search_blank_matches_all() {
        let search = Search::new("   ");
        assert!(search.is_empty());
        assert!(search.matches(&task("anything", true)));
    }
}
