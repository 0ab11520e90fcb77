//! The JSON graph document: the serialization boundary through which a
//! compiled graph is handed to other tools, or loaded back.
//!
//! The document keeps the flat, field-per-concern layout of the authoring
//! tools (`isInputField`, `dynamicChoices`, `nextNodes`, ...). Wildcards and
//! guard markers only exist here as strings; loading turns them back into
//! typed guards and re-checks graph integrity.

use super::{
    AssignedValue, ChoiceSource, Combinator, Condition, DialogueGraph, DisplayItem, EndType,
    Guard, InputType, Operator, Predicate, Screen, ScreenId, ScreenKind, Transition,
    ValidationSpec, integrity,
};
use crate::error::DocumentError;
use crate::interpreter::SessionState;
use crate::source::{CodeDefinitions, DomainData};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Choice text that stands for "any response" in a graph document.
pub const WILDCARD_CHOICE: &str = "*";
const VALID: &str = "valid";
const MATCH: &str = "match";
const DEFAULT: &str = "default";
const CODE_SOURCE_PREFIX: &str = "codeDefinitions.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    pub nodes: Vec<ScreenDocument>,
    #[serde(default)]
    pub code_definitions: CodeDefinitions,
    #[serde(default)]
    pub domain_data: DomainData,
    #[serde(default)]
    pub runtime: SessionState,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenDocument {
    pub screen: ScreenId,
    #[serde(default)]
    pub nav_text: String,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub is_input_field: bool,
    #[serde(default)]
    pub conditions: Option<ConditionDocument>,
    #[serde(default)]
    pub dynamic_choices: Option<DynamicChoicesDocument>,
    #[serde(default)]
    pub input_validation: Option<ValidationDocument>,
    #[serde(default)]
    pub display_data: Option<Vec<DisplayItem>>,
    #[serde(default)]
    pub next_nodes: Vec<TransitionDocument>,
    #[serde(default)]
    pub is_end_node: bool,
    #[serde(default)]
    pub end_type: Option<EndType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDocument {
    #[serde(default)]
    pub operator: Combinator,
    #[serde(default)]
    pub rules: Vec<PredicateDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateDocument {
    pub field: String,
    pub operator: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicChoicesDocument {
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDocument {
    #[serde(rename = "type", default)]
    pub input_type: InputType,
    #[serde(default = "required_by_default")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

fn required_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<GuardDocument>,
    pub next_screen: ScreenId,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set_value: BTreeMap<String, AssignedValue>,
}

/// A transition condition: a marker string or an input predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GuardDocument {
    Marker(String),
    Predicate(PredicateDocument),
}

impl GraphDocument {
    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(|e| DocumentError::Json(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(json).map_err(|e| DocumentError::Json(e.to_string()))
    }
}

impl DialogueGraph {
    /// Writes the graph as a pretty-printed graph document.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        GraphDocument::from(self).to_json()
    }

    /// Loads and verifies a graph from a graph document.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        DialogueGraph::try_from(GraphDocument::from_json(json)?)
    }
}

impl From<&DialogueGraph> for GraphDocument {
    fn from(graph: &DialogueGraph) -> Self {
        GraphDocument {
            nodes: graph
                .screens
                .iter()
                .map(|screen| screen_document(graph, screen))
                .collect(),
            code_definitions: graph.code_definitions.clone(),
            domain_data: graph.domain_data.clone(),
            runtime: SessionState::new(graph.entry),
        }
    }
}

fn screen_document(graph: &DialogueGraph, screen: &Screen) -> ScreenDocument {
    let mut doc = ScreenDocument {
        screen: screen.id,
        nav_text: screen.prompt.clone(),
        source_id: screen.source_id.clone(),
        next_nodes: screen.transitions.iter().map(transition_document).collect(),
        ..ScreenDocument::default()
    };

    match &screen.kind {
        ScreenKind::Choice { choices, display } => {
            doc.choices = graph.choice_labels(screen);
            if let ChoiceSource::Code(code_id) = choices {
                doc.dynamic_choices = Some(DynamicChoicesDocument {
                    source: format!("{}{}", CODE_SOURCE_PREFIX, code_id),
                });
            }
            if !display.is_empty() {
                doc.display_data = Some(display.clone());
            }
        }
        ScreenKind::Input { validation } => {
            doc.is_input_field = true;
            doc.input_validation = Some(ValidationDocument::from(validation));
        }
        ScreenKind::Condition { condition } => {
            doc.conditions = Some(ConditionDocument {
                operator: condition.combinator,
                rules: condition.predicates.iter().map(PredicateDocument::from).collect(),
            });
        }
        ScreenKind::Terminal { end } => {
            doc.is_end_node = true;
            doc.end_type = Some(*end);
        }
    }
    doc
}

fn transition_document(transition: &Transition) -> TransitionDocument {
    let marker = |m: &str| Some(GuardDocument::Marker(m.to_string()));
    let (choice, condition) = match &transition.guard {
        Guard::Choice(label) => (Some(label.clone()), None),
        Guard::Wildcard => (Some(WILDCARD_CHOICE.to_string()), None),
        Guard::Valid => (None, marker(VALID)),
        Guard::Match => (None, marker(MATCH)),
        Guard::Default => (None, marker(DEFAULT)),
        Guard::Predicate(p) => (None, Some(GuardDocument::Predicate(PredicateDocument::from(p)))),
    };
    TransitionDocument {
        choice,
        condition,
        next_screen: transition.target,
        set_value: transition.assignments.clone(),
    }
}

impl From<&Predicate> for PredicateDocument {
    fn from(p: &Predicate) -> Self {
        PredicateDocument {
            field: p.field.clone(),
            operator: p.operator.as_str().to_string(),
            value: literal_to_json(&p.literal),
        }
    }
}

impl From<&PredicateDocument> for Predicate {
    fn from(doc: &PredicateDocument) -> Self {
        Predicate::new(
            doc.field.clone(),
            Operator::parse(&doc.operator),
            json_to_literal(&doc.value),
        )
    }
}

impl From<&ValidationSpec> for ValidationDocument {
    fn from(spec: &ValidationSpec) -> Self {
        ValidationDocument {
            input_type: spec.input_type,
            required: spec.required,
            min: spec.min,
            max: spec.max,
            min_length: spec.min_length,
            pattern: spec.pattern.clone(),
            error_message: spec.error_message.clone(),
        }
    }
}

impl From<ValidationDocument> for ValidationSpec {
    fn from(doc: ValidationDocument) -> Self {
        ValidationSpec {
            input_type: doc.input_type,
            required: doc.required,
            min: doc.min,
            max: doc.max,
            min_length: doc.min_length,
            pattern: doc.pattern,
            error_message: doc.error_message,
        }
    }
}

/// Numeric literals are written as JSON numbers, integers preferred, when
/// they read back as the same text. `007` and `1.50` stay strings.
fn literal_to_json(literal: &str) -> serde_json::Value {
    if let Ok(i) = literal.parse::<i64>() {
        if i.to_string() == literal {
            return serde_json::Value::from(i);
        }
    }
    match literal.parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() != 0.0 && n.to_string() == literal => {
            serde_json::Value::from(n)
        }
        _ => serde_json::Value::String(literal.to_string()),
    }
}

fn json_to_literal(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl TryFrom<GraphDocument> for DialogueGraph {
    type Error = DocumentError;

    fn try_from(doc: GraphDocument) -> Result<Self, Self::Error> {
        let screens = doc
            .nodes
            .into_iter()
            .map(screen_from_document)
            .collect::<Result<Vec<_>, _>>()?;

        let graph = DialogueGraph {
            screens,
            code_definitions: doc.code_definitions,
            domain_data: doc.domain_data,
            entry: doc.runtime.current_screen,
        };
        integrity::check(&graph)?;
        Ok(graph)
    }
}

fn screen_from_document(doc: ScreenDocument) -> Result<Screen, DocumentError> {
    let id = doc.screen;
    let invalid = |message: String| DocumentError::InvalidScreen { screen: id, message };

    let kind = if doc.is_end_node {
        ScreenKind::Terminal {
            end: doc.end_type.unwrap_or(EndType::Success),
        }
    } else if doc.is_input_field {
        ScreenKind::Input {
            validation: doc
                .input_validation
                .map(ValidationSpec::from)
                .unwrap_or_else(ValidationSpec::text),
        }
    } else if let Some(conditions) = &doc.conditions {
        ScreenKind::Condition {
            condition: Condition {
                combinator: conditions.operator,
                predicates: conditions.rules.iter().map(Predicate::from).collect(),
            },
        }
    } else {
        let choices = match &doc.dynamic_choices {
            Some(dynamic) => match dynamic.source.strip_prefix(CODE_SOURCE_PREFIX) {
                Some(code_id) if !code_id.is_empty() => ChoiceSource::Code(code_id.to_string()),
                _ => {
                    return Err(invalid(format!(
                        "unsupported dynamic choice source '{}'",
                        dynamic.source
                    )));
                }
            },
            None => ChoiceSource::Labels(doc.choices.clone()),
        };
        ScreenKind::Choice {
            choices,
            display: doc.display_data.clone().unwrap_or_default(),
        }
    };

    let transitions = doc
        .next_nodes
        .into_iter()
        .map(|t| {
            let guard = match (t.choice, t.condition) {
                (Some(choice), _) if choice == WILDCARD_CHOICE => Guard::Wildcard,
                (Some(choice), _) => Guard::Choice(choice),
                (None, Some(GuardDocument::Marker(marker))) => match marker.as_str() {
                    VALID => Guard::Valid,
                    MATCH => Guard::Match,
                    DEFAULT => Guard::Default,
                    other => return Err(invalid(format!("unknown transition marker '{}'", other))),
                },
                (None, Some(GuardDocument::Predicate(p))) => Guard::Predicate(Predicate::from(&p)),
                (None, None) => {
                    return Err(invalid(format!(
                        "transition to screen {} has neither a choice nor a condition",
                        t.next_screen
                    )));
                }
            };
            Ok(Transition {
                guard,
                target: t.next_screen,
                assignments: t.set_value,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Screen {
        id,
        prompt: doc.nav_text,
        source_id: doc.source_id,
        kind,
        transitions,
    })
}
