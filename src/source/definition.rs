use crate::graph::{Combinator, DisplayFormat};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The complete, canonical description of a guided procedure, ready for
/// compilation. This is the target structure for any custom format conversion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureDefinition {
    /// The top-level sequence of nodes.
    pub workflow: Vec<SourceNode>,
    #[serde(default)]
    pub code_definitions: CodeDefinitions,
    #[serde(default)]
    pub domain_data: DomainData,
}

/// Named, ordered enumerations of selectable label/value pairs.
pub type CodeDefinitions = BTreeMap<String, Vec<CodeEntry>>;

/// Declared business variables, keyed by variable name.
pub type DomainData = BTreeMap<String, DomainVariable>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeEntry {
    pub label: String,
    pub value: String,
}

impl CodeEntry {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A declared business variable with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainVariable {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default = "default_value_type")]
    pub value_type: String,
    #[serde(default)]
    pub value: String,
    /// Inputs into this variable above the limit are refused.
    #[serde(default)]
    pub ceiling: Option<Ceiling>,
}

fn default_value_type() -> String {
    "string".to_string()
}

impl DomainVariable {
    pub fn new(index: u32, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            value_type: default_value_type(),
            value: String::new(),
            ceiling: None,
        }
    }

    pub fn with_ceiling(mut self, limit: f64) -> Self {
        self.ceiling = Some(Ceiling {
            limit,
            target: None,
        });
        self
    }
}

/// A ceiling business rule on an amount-like variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ceiling {
    pub limit: f64,
    /// Source node id of the terminal reached on overflow. Defaults to the
    /// first blocked terminal of the procedure.
    #[serde(default)]
    pub target: Option<String>,
}

/// A node of the procedure tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceNode {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    /// A transparent container; its children are spliced in place.
    Group { children: Vec<SourceNode> },
    /// A leaf that becomes exactly one screen.
    Regular(RegularNode),
    /// Conditional branching; `conditions[i]` guards `branches[i]`.
    Switch(SwitchNode),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegularNode {
    #[serde(default)]
    pub nav_text: Option<String>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub marker: Option<TerminalMarker>,
    #[serde(default)]
    pub routes: RoutingTable,
}

/// Explicit routing for a regular node.
///
/// A chosen value is routed through `by_value`, then `otherwise`, then to the
/// screen that follows the node. Input nodes route through `otherwise` only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingTable {
    #[serde(default)]
    pub by_value: BTreeMap<String, String>,
    #[serde(default)]
    pub otherwise: Option<String>,
}

impl RoutingTable {
    pub fn is_empty(&self) -> bool {
        self.by_value.is_empty() && self.otherwise.is_none()
    }

    pub fn route(mut self, value: impl Into<String>, target: impl Into<String>) -> Self {
        self.by_value.insert(value.into(), target.into());
        self
    }

    pub fn otherwise(mut self, target: impl Into<String>) -> Self {
        self.otherwise = Some(target.into());
        self
    }

    /// The declared target for a value, if any.
    pub fn target_for(&self, value: &str) -> Option<&str> {
        self.by_value
            .get(value)
            .or(self.otherwise.as_ref())
            .map(String::as_str)
    }
}

/// Explicit terminal flag of a regular node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TerminalMarker {
    Success,
    Blocked,
}

impl fmt::Display for TerminalMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalMarker::Success => write!(f, "success"),
            TerminalMarker::Blocked => write!(f, "blocked"),
        }
    }
}

/// Leaf content of a regular node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Item {
    ChoiceField(ChoiceField),
    InputField(InputField),
    DisplayField(DisplayField),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceField {
    pub field: String,
    pub code_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputField {
    pub field: String,
    /// Amount-like flag. When absent, inferred from the field name.
    #[serde(default)]
    pub amount: Option<bool>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl InputField {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }

    /// Whether the field holds an amount of money.
    pub fn is_amount(&self) -> bool {
        self.amount
            .unwrap_or_else(|| is_amount_like(&self.field))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayField {
    pub label: String,
    pub field: String,
    #[serde(default)]
    pub format: Option<DisplayFormat>,
}

/// Amount-like naming: `depositAmount`, `Amount`, `transfer_amount`.
pub fn is_amount_like(field: &str) -> bool {
    field.contains("Amount") || field.to_ascii_lowercase().ends_with("amount")
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SwitchNode {
    #[serde(default)]
    pub conditions: Vec<SwitchCondition>,
    #[serde(default)]
    pub branches: Vec<Branch>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SwitchCondition {
    #[serde(default)]
    pub combinator: Combinator,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

/// A declared comparison, before its comparator is normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub field: String,
    pub comparator: String,
    #[serde(deserialize_with = "literal_string")]
    pub value: String,
}

impl RuleDefinition {
    pub fn new(
        field: impl Into<String>,
        comparator: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            comparator: comparator.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Branch {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub children: Vec<SourceNode>,
}

/// Accepts a JSON string, number or boolean as literal text.
pub(crate) fn literal_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl SourceNode {
    pub fn group(
        id: impl Into<String>,
        title: impl Into<String>,
        children: Vec<SourceNode>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: NodeKind::Group { children },
        }
    }

    pub fn regular(id: impl Into<String>, title: impl Into<String>, node: RegularNode) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: NodeKind::Regular(node),
        }
    }

    pub fn switch(id: impl Into<String>, title: impl Into<String>, node: SwitchNode) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: NodeKind::Switch(node),
        }
    }
}
