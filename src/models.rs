// Data models for the task list

use chrono::NaiveDate;
use eyre::{Result, eyre};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// A single entry in the task list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "dueDate", default, deserialize_with = "optional_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Priority,
}

impl Task {
    /// True when the task has a due date strictly before `today` and is still open
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => !self.completed && due < today,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Capitalized label used for badges ("Low", "Medium", "High")
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(eyre!("Invalid priority: {} (expected low, medium or high)", other)),
        }
    }
}

/// Counters over the full task list, regardless of filter or search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

// Stored priority: "", null, missing or unknown all read as medium.
fn lenient_priority<'de, D>(deserializer: D) -> std::result::Result<Priority, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(Priority::Medium),
        Some(s) => Ok(s.parse().unwrap_or_else(|e| {
            warn!(error = ?e, "Unknown stored priority, using medium");
            Priority::Medium
        })),
    }
}

// Stored due date: "", null, missing or unparseable all read as no due date.
fn optional_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => match parse_due_date(s) {
            Ok(date) => Ok(Some(date)),
            Err(e) => {
                warn!(error = ?e, "Unparseable stored due date, dropping it");
                Ok(None)
            }
        },
    }
}

/// Parse an optional priority argument; a blank value means "not given"
pub fn parse_optional_priority(raw: Option<&str>) -> Result<Option<Priority>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some),
    }
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_due_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| eyre!("Invalid due date '{}': {}", s, e))
}

/// Helper function to get current timestamp in milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_due_date(s).unwrap()
    }

    #[test]
    fn test_now_ms() {
        let ts = now_ms();
        // Should be reasonable timestamp (after year 2020)
        assert!(ts > 1_600_000_000_000);
    }

    #[test]
    fn test_priority_serialization() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
        assert_eq!(serde_json::to_string(&Priority::Low).unwrap(), "\"low\"");
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::Medium.label(), "Medium");
    }

    #[test]
    fn test_task_serialization_field_names() {
        let task = Task {
            id: 1700000000000,
            text: "Buy milk".to_string(),
            completed: false,
            due_date: Some(date("2024-03-09")),
            priority: Priority::High,
        };

        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"dueDate\":\"2024-03-09\""));
        assert!(json.contains("\"priority\":\"high\""));

        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_task_deserialize_lenient_fields() {
        let json = r#"{"id":5,"text":"Old task","dueDate":"","priority":""}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.due_date, None);
        assert!(!task.completed);

        let json = r#"{"id":6,"text":"Null fields","completed":true,"dueDate":null,"priority":null}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.completed);
    }

    #[test]
    fn test_task_deserialize_degrades_bad_fields() {
        let json = r#"{"id":7,"text":"Bad date","dueDate":"2024-13-45","priority":"high"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.due_date, None);
        assert_eq!(task.priority, Priority::High);

        let json = r#"{"id":8,"text":"Bad priority","dueDate":"2024-01-15","priority":"urgent"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.due_date, Some(date("2024-01-15")));
    }

    #[test]
    fn test_parse_optional_priority() {
        assert_eq!(parse_optional_priority(None).unwrap(), None);
        assert_eq!(parse_optional_priority(Some("")).unwrap(), None);
        assert_eq!(parse_optional_priority(Some("  ")).unwrap(), None);
        assert_eq!(parse_optional_priority(Some("Low")).unwrap(), Some(Priority::Low));
        assert!(parse_optional_priority(Some("urgent")).is_err());
    }

    #[test]
    fn test_is_overdue() {
        let today = date("2024-05-10");
        let mut task = Task {
            id: 1,
            text: "Pay rent".to_string(),
            completed: false,
            due_date: Some(date("2024-05-09")),
            priority: Priority::Medium,
        };
        assert!(task.is_overdue(today));

        // Due today is not overdue
        task.due_date = Some(today);
        assert!(!task.is_overdue(today));

        task.due_date = Some(date("2024-05-01"));
        task.completed = true;
        assert!(!task.is_overdue(today));

        task.completed = false;
        task.due_date = None;
        assert!(!task.is_overdue(today));
    }
}
