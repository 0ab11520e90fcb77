use super::predicate::{Condition, Predicate};
use super::validation::ValidationSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a compiled screen. Compiled graphs number screens from 1.
pub type ScreenId = u32;

/// One addressable unit of a compiled dialogue graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    pub id: ScreenId,
    pub prompt: String,
    /// The source node this screen was compiled from, when known.
    pub source_id: Option<String>,
    pub kind: ScreenKind,
    /// Ordered; the first matching transition wins.
    pub transitions: Vec<Transition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScreenKind {
    Choice {
        choices: ChoiceSource,
        /// Non-empty on confirmation screens.
        display: Vec<DisplayItem>,
    },
    Input {
        validation: ValidationSpec,
    },
    Condition {
        condition: Condition,
    },
    Terminal {
        end: EndType,
    },
}

/// Where a choice screen's selectable labels come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChoiceSource {
    Labels(Vec<String>),
    /// The labels of a code definition, in declaration order.
    Code(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndType {
    Success,
    Error,
}

impl fmt::Display for EndType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndType::Success => write!(f, "success"),
            EndType::Error => write!(f, "error"),
        }
    }
}

/// A labelled variable shown on a confirmation screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayItem {
    pub label: String,
    pub field: String,
    pub format: DisplayFormat,
}

/// How a displayed variable is rendered. Written as `currency`, `text` or
/// `code:<codeId>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DisplayFormat {
    Currency,
    Text,
    Code(String),
}

impl TryFrom<String> for DisplayFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "currency" => Ok(DisplayFormat::Currency),
            "text" => Ok(DisplayFormat::Text),
            other => match other.strip_prefix("code:") {
                Some(code_id) if !code_id.is_empty() => {
                    Ok(DisplayFormat::Code(code_id.to_string()))
                }
                _ => Err(format!("unknown display format '{}'", other)),
            },
        }
    }
}

impl From<DisplayFormat> for String {
    fn from(format: DisplayFormat) -> Self {
        format.to_string()
    }
}

impl fmt::Display for DisplayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayFormat::Currency => write!(f, "currency"),
            DisplayFormat::Text => write!(f, "text"),
            DisplayFormat::Code(code_id) => write!(f, "code:{}", code_id),
        }
    }
}

/// A directed, guarded edge between two screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub guard: Guard,
    pub target: ScreenId,
    pub assignments: BTreeMap<String, AssignedValue>,
}

impl Transition {
    pub fn new(guard: Guard, target: ScreenId) -> Self {
        Self {
            guard,
            target,
            assignments: BTreeMap::new(),
        }
    }

    pub fn assign(mut self, field: impl Into<String>, value: AssignedValue) -> Self {
        self.assignments.insert(field.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Guard {
    /// Matches the selected label exactly.
    Choice(String),
    /// Matches any selection.
    Wildcard,
    /// Matches any input that passed validation.
    Valid,
    /// Taken by a condition screen when its condition holds.
    Match,
    /// Taken by a condition screen when its condition does not hold.
    Default,
    /// Matches when the predicate holds for the pending input.
    Predicate(Predicate),
}

impl Guard {
    /// Whether this guard accepts a selected choice label.
    pub fn accepts_choice(&self, label: &str) -> bool {
        match self {
            Guard::Choice(expected) => expected == label,
            Guard::Wildcard => true,
            _ => false,
        }
    }

    /// Whether this guard accepts a validated input, given as text.
    pub fn accepts_input(&self, input: &str) -> bool {
        match self {
            Guard::Valid => true,
            Guard::Predicate(predicate) => predicate.evaluate(input),
            _ => false,
        }
    }
}

/// The value a transition assigns to a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssignedValue {
    Literal(String),
    /// Replaced by the accepted input when an input screen's response is taken.
    FromUserInput,
}
