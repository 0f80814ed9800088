// Display theme, stored next to the task list

use crate::kv::KvStore;
use eyre::{Result, eyre};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Read the saved theme, falling back to light when absent or unreadable
    pub fn load<K: KvStore>(kv: &K) -> Self {
        match kv.get(THEME_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                warn!(error = ?e, "Ignoring saved theme");
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!(error = ?e, "Failed to read saved theme");
                Theme::default()
            }
        }
    }

    pub fn save<K: KvStore>(self, kv: &mut K) -> Result<()> {
        kv.set(THEME_KEY, self.as_str())
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Theme {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(eyre!("Invalid theme: {} (expected light or dark)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;

    #[test]
    fn test_default_is_light() {
        let kv = MemoryKv::new();
        assert_eq!(Theme::load(&kv), Theme::Light);
    }

    #[test]
    fn test_save_and_load() {
        let mut kv = MemoryKv::new();
        Theme::Dark.save(&mut kv).unwrap();
        assert_eq!(kv.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert_eq!(Theme::load(&kv), Theme::Dark);
    }

    #[test]
    fn test_garbage_falls_back_to_light() {
        let mut kv = MemoryKv::new();
        kv.set(THEME_KEY, "purple").unwrap();
        assert_eq!(Theme::load(&kv), Theme::Light);
    }

    #[test]
    fn test_toggle() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().toggled(), Theme::Dark);
    }
}
