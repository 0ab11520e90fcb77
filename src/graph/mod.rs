//! The compiled, flat dialogue graph.
//!
//! A graph is produced once per compile and is immutable thereafter; it can be
//! shared by any number of sessions, written out as a JSON document, or cached
//! as a binary artifact.

pub mod artifact;
pub mod document;
pub mod integrity;
pub mod predicate;
pub mod screen;
pub mod validation;
pub mod value;

pub use document::*;
pub use predicate::*;
pub use screen::*;
pub use validation::*;
pub use value::*;

use crate::source::{CodeDefinitions, DomainData};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueGraph {
    /// Screens in id order.
    pub screens: Vec<Screen>,
    pub code_definitions: CodeDefinitions,
    pub domain_data: DomainData,
    /// The screen a new session starts on.
    pub entry: ScreenId,
}

impl DialogueGraph {
    pub fn screen(&self, id: ScreenId) -> Option<&Screen> {
        self.screens.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// The labels a choice screen offers, in display order. Empty for every
    /// other kind of screen.
    pub fn choice_labels(&self, screen: &Screen) -> Vec<String> {
        match &screen.kind {
            ScreenKind::Choice {
                choices: ChoiceSource::Labels(labels),
                ..
            } => labels.clone(),
            ScreenKind::Choice {
                choices: ChoiceSource::Code(code_id),
                ..
            } => self
                .code_definitions
                .get(code_id)
                .map(|entries| entries.iter().map(|e| e.label.clone()).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// The label a code definition gives to a stored value.
    pub fn code_label(&self, code_id: &str, value: &str) -> Option<&str> {
        self.code_definitions
            .get(code_id)?
            .iter()
            .find(|entry| entry.value == value)
            .map(|entry| entry.label.as_str())
    }

    /// Screens of a given terminal end type, in id order.
    pub fn terminals(&self, end: EndType) -> impl Iterator<Item = &Screen> {
        self.screens
            .iter()
            .filter(move |s| matches!(s.kind, ScreenKind::Terminal { end: e } if e == end))
    }
}
