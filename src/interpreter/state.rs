use crate::graph::{ScreenId, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The mutable state of one dialogue session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub current_screen: ScreenId,
    /// Last write wins; variables are never removed.
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
    /// Append-only; one entry per screen visit.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(1)
    }
}

impl SessionState {
    pub fn new(current_screen: ScreenId) -> Self {
        Self {
            current_screen,
            variables: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A record of one screen visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub screen: ScreenId,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

impl HistoryEntry {
    pub fn new(screen: ScreenId, timestamp: DateTime<Utc>) -> Self {
        Self {
            screen,
            timestamp,
            choice: None,
            input: None,
        }
    }
}
