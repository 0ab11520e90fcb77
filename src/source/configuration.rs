//! Conversion from the configuration documents produced by the screen
//! authoring tool (`codedef` + `wfmanager` layout) into a
//! [`ProcedureDefinition`].

use super::conversion::IntoProcedure;
use super::definition::*;
use super::definition::literal_string;
use crate::error::ConversionError;
use crate::graph::Combinator;
use serde::Deserialize;

const CHOICE_ITEM: &str = "CodeButtonFeild";
const INPUT_ITEM: &str = "FormInputTextField";
const DISPLAY_ITEM: &str = "DomainDataWithLabelDisplayFeild";

const SUCCESS_TITLE: &str = "手続き完了";
const BLOCKED_TITLE: &str = "手続き不可";
const DONE_COMPONENT: &str = "DoneIconTemplate";

/// A configuration document as written by the authoring tool.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigurationDocument {
    #[serde(default)]
    codedef: CodeSection,
    wfmanager: WorkflowManager,
    #[serde(skip)]
    ceilings: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CodeSection {
    #[serde(default)]
    codes: Vec<CodeDocument>,
}

#[derive(Debug, Clone, Deserialize)]
struct CodeDocument {
    codeid: String,
    #[serde(default)]
    items: Vec<CodeEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowManager {
    #[serde(default)]
    domain_work_flows: Vec<DomainWorkflow>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DomainWorkflow {
    #[serde(default)]
    domain_data: DomainData,
    root_workflow: WorkflowBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WorkflowBody {
    #[serde(default)]
    workflow: Vec<NodeDocument>,
}

#[derive(Debug, Clone, Deserialize)]
struct NodeDocument {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    group: Option<WorkflowBody>,
    #[serde(default)]
    content: Option<ContentDocument>,
    #[serde(default)]
    conditions: Vec<ConditionDocument>,
    #[serde(default)]
    branches: Vec<BranchDocument>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDocument {
    #[serde(default)]
    component: String,
    #[serde(default)]
    customized_data: CustomizedData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomizedData {
    #[serde(default)]
    nav_text: Option<String>,
    #[serde(default)]
    items: Vec<ItemDocument>,
    #[serde(default)]
    routes: RoutingTable,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemDocument {
    #[serde(rename = "type")]
    item_type: String,
    #[serde(default)]
    field: String,
    #[serde(default)]
    codeid: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    required: Option<bool>,
    #[serde(default)]
    min_length: Option<usize>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ConditionDocument {
    #[serde(default)]
    operator: Option<OperatorDocument>,
}

#[derive(Debug, Clone, Deserialize)]
struct OperatorDocument {
    #[serde(rename = "type", default)]
    combinator: Combinator,
    #[serde(default)]
    child: Vec<RuleDocument>,
}

#[derive(Debug, Clone, Deserialize)]
struct RuleDocument {
    field: String,
    state: String,
    #[serde(deserialize_with = "literal_string", default)]
    value: String,
}

#[derive(Debug, Clone, Deserialize)]
struct BranchDocument {
    #[serde(default)]
    id: String,
    #[serde(default)]
    workflow: Vec<NodeDocument>,
}

impl ConfigurationDocument {
    pub fn from_json(json: &str) -> Result<Self, ConversionError> {
        serde_json::from_str(json).map_err(|e| ConversionError::Json(e.to_string()))
    }

    /// Declares a ceiling on a domain variable. Configuration documents carry
    /// no business rules of their own, so limits are attached here.
    pub fn with_ceiling(mut self, field: impl Into<String>, limit: f64) -> Self {
        self.ceilings.push((field.into(), limit));
        self
    }
}

impl IntoProcedure for ConfigurationDocument {
    fn into_procedure(self) -> Result<ProcedureDefinition, ConversionError> {
        let code_definitions: CodeDefinitions = self
            .codedef
            .codes
            .into_iter()
            .map(|code| (code.codeid, code.items))
            .collect();

        let domain_workflow = self
            .wfmanager
            .domain_work_flows
            .into_iter()
            .next()
            .ok_or_else(|| {
                ConversionError::ValidationError("document declares no domain workflow".to_string())
            })?;

        let mut domain_data = domain_workflow.domain_data;
        for (field, limit) in self.ceilings {
            let next_index = domain_data.len() as u32 + 1;
            let variable = domain_data
                .entry(field.clone())
                .or_insert_with(|| DomainVariable::new(next_index, field));
            variable.ceiling = Some(Ceiling {
                limit,
                target: None,
            });
        }

        let workflow = convert_sequence(domain_workflow.root_workflow.workflow)?;
        log::debug!(
            "Converted configuration document: {} top-level nodes, {} code definitions",
            workflow.len(),
            code_definitions.len()
        );

        Ok(ProcedureDefinition {
            workflow,
            code_definitions,
            domain_data,
        })
    }
}

fn convert_sequence(nodes: Vec<NodeDocument>) -> Result<Vec<SourceNode>, ConversionError> {
    nodes.into_iter().map(convert_node).collect()
}

fn convert_node(node: NodeDocument) -> Result<SourceNode, ConversionError> {
    match node.node_type.as_str() {
        "G" => {
            let children = convert_sequence(node.group.unwrap_or_default().workflow)?;
            Ok(SourceNode::group(node.id, node.title, children))
        }
        "R" => {
            let regular = convert_regular(&node.id, &node.title, node.content)?;
            Ok(SourceNode::regular(node.id, node.title, regular))
        }
        "S" => {
            let conditions = node
                .conditions
                .into_iter()
                .map(|condition| {
                    let operator = condition.operator.ok_or_else(|| ConversionError::InvalidNode {
                        node_id: node.id.clone(),
                        message: "switch condition has no operator".to_string(),
                    })?;
                    Ok(SwitchCondition {
                        combinator: operator.combinator,
                        rules: operator
                            .child
                            .into_iter()
                            .map(|rule| RuleDefinition::new(rule.field, rule.state, rule.value))
                            .collect(),
                    })
                })
                .collect::<Result<Vec<_>, ConversionError>>()?;
            let branches = node
                .branches
                .into_iter()
                .map(|branch| {
                    Ok(Branch {
                        id: branch.id,
                        children: convert_sequence(branch.workflow)?,
                    })
                })
                .collect::<Result<Vec<_>, ConversionError>>()?;
            Ok(SourceNode::switch(
                node.id,
                node.title,
                SwitchNode {
                    conditions,
                    branches,
                },
            ))
        }
        other => Err(ConversionError::UnsupportedNodeType {
            node_id: node.id.clone(),
            type_name: other.to_string(),
        }),
    }
}

fn convert_regular(
    node_id: &str,
    title: &str,
    content: Option<ContentDocument>,
) -> Result<RegularNode, ConversionError> {
    let content = content.ok_or_else(|| ConversionError::InvalidNode {
        node_id: node_id.to_string(),
        message: "regular node has no content".to_string(),
    })?;

    let marker = if title == SUCCESS_TITLE || content.component == DONE_COMPONENT {
        Some(TerminalMarker::Success)
    } else if title == BLOCKED_TITLE {
        Some(TerminalMarker::Blocked)
    } else {
        None
    };

    let data = content.customized_data;
    let mut items = Vec::with_capacity(data.items.len());
    for item in data.items {
        match item.item_type.as_str() {
            CHOICE_ITEM => {
                let code_id = item.codeid.ok_or_else(|| ConversionError::InvalidNode {
                    node_id: node_id.to_string(),
                    message: format!("choice item '{}' has no codeid", item.field),
                })?;
                items.push(Item::ChoiceField(ChoiceField {
                    field: item.field,
                    code_id,
                }));
            }
            INPUT_ITEM => items.push(Item::InputField(InputField {
                field: item.field,
                amount: None,
                required: item.required,
                min_length: item.min_length,
                pattern: item.pattern,
                error_message: item.error_message,
            })),
            DISPLAY_ITEM => items.push(Item::DisplayField(DisplayField {
                label: item.label.unwrap_or_else(|| item.field.clone()),
                field: item.field,
                format: None,
            })),
            other => {
                log::warn!("Node '{}': skipping unsupported item type '{}'", node_id, other);
            }
        }
    }

    Ok(RegularNode {
        nav_text: data.nav_text,
        items,
        marker,
        routes: data.routes,
    })
}
