use super::CompilerOptions;
use super::builder::{Layout, Slot, SlotRole};
use super::parsing::OperatorTable;
use crate::error::CompileError;
use crate::graph::{
    AssignedValue, ChoiceSource, Condition, DisplayFormat, DisplayItem, EndType, Guard,
    Operator, Predicate, Screen, ScreenId, ScreenKind, Transition, ValidationSpec,
    WILDCARD_CHOICE, format_number,
};
use crate::source::{
    ChoiceField, DisplayField, InputField, Item, ProcedureDefinition, RegularNode,
    SwitchCondition, TerminalMarker, is_amount_like,
};
use regex::Regex;

const CONDITION_PROMPT: &str = "条件判定中...";

/// Turns reserved slots into screens with complete transition tables.
pub(super) struct TransitionSynthesizer<'a> {
    procedure: &'a ProcedureDefinition,
    layout: &'a Layout<'a>,
    options: &'a CompilerOptions,
    operators: &'a OperatorTable,
    entry: ScreenId,
    first_success: Option<ScreenId>,
    first_blocked: Option<ScreenId>,
}

impl<'a> TransitionSynthesizer<'a> {
    pub(super) fn new(
        procedure: &'a ProcedureDefinition,
        layout: &'a Layout<'a>,
        options: &'a CompilerOptions,
        operators: &'a OperatorTable,
        entry: ScreenId,
    ) -> Self {
        let first_marked = |wanted: TerminalMarker| {
            layout
                .slots
                .iter()
                .find(|slot| matches!(slot.role, SlotRole::Regular(r) if r.marker == Some(wanted)))
                .map(|slot| slot.id)
        };
        Self {
            procedure,
            layout,
            options,
            operators,
            entry,
            first_success: first_marked(TerminalMarker::Success),
            first_blocked: first_marked(TerminalMarker::Blocked),
        }
    }

    pub(super) fn synthesize(&self) -> Result<Vec<Screen>, CompileError> {
        let mut screens = self
            .layout
            .slots
            .iter()
            .map(|slot| self.screen(slot))
            .collect::<Result<Vec<_>, _>>()?;
        screens.sort_by_key(|s| s.id);
        Ok(screens)
    }

    fn screen(&self, slot: &Slot<'a>) -> Result<Screen, CompileError> {
        let node = slot.node;
        let (prompt, kind, transitions) = match slot.role {
            SlotRole::Regular(regular) => {
                let prompt = regular
                    .nav_text
                    .clone()
                    .unwrap_or_else(|| node.title.clone());
                let (kind, transitions) = self.regular(slot, regular)?;
                (prompt, kind, transitions)
            }
            SlotRole::Condition {
                condition,
                on_match,
                on_default,
            } => {
                let prompt = if node.title.is_empty() {
                    CONDITION_PROMPT.to_string()
                } else {
                    node.title.clone()
                };
                let kind = ScreenKind::Condition {
                    condition: self.condition(&node.id, condition),
                };
                let transitions = vec![
                    Transition::new(Guard::Match, self.require(&node.id, on_match)?),
                    Transition::new(Guard::Default, self.require(&node.id, on_default)?),
                ];
                (prompt, kind, transitions)
            }
        };

        Ok(Screen {
            id: slot.id,
            prompt,
            source_id: Some(node.id.clone()),
            kind,
            transitions,
        })
    }

    fn regular(
        &self,
        slot: &Slot<'a>,
        regular: &RegularNode,
    ) -> Result<(ScreenKind, Vec<Transition>), CompileError> {
        let node_id = slot.node.id.as_str();

        // A marker wins over any items the node declares.
        if let Some(marker) = regular.marker {
            let end = match marker {
                TerminalMarker::Success => EndType::Success,
                TerminalMarker::Blocked => EndType::Error,
            };
            return Ok((ScreenKind::Terminal { end }, Vec::new()));
        }

        let mut choices = Vec::new();
        let mut inputs = Vec::new();
        let mut displays = Vec::new();
        for item in &regular.items {
            match item {
                Item::ChoiceField(c) => choices.push(c),
                Item::InputField(i) => inputs.push(i),
                Item::DisplayField(d) => displays.push(d),
            }
        }

        let conflict = |message: &str| CompileError::ConflictingItems {
            node_id: node_id.to_string(),
            message: message.to_string(),
        };
        if choices.len() > 1 {
            return Err(conflict("more than one choice field"));
        }
        if inputs.len() > 1 {
            return Err(conflict("more than one input field"));
        }
        if !choices.is_empty() && !inputs.is_empty() {
            return Err(conflict("a choice field and an input field"));
        }
        if !displays.is_empty() && (!choices.is_empty() || !inputs.is_empty()) {
            return Err(conflict("display fields alongside a choice or input field"));
        }

        if let Some(choice) = choices.first() {
            self.choice(slot, regular, choice)
        } else if let Some(input) = inputs.first() {
            self.input(slot, regular, input)
        } else if !displays.is_empty() {
            self.confirmation(node_id, regular, &displays)
        } else {
            // Acknowledgement screen: any response moves on.
            let next = self.require(node_id, slot.continuation)?;
            Ok((
                ScreenKind::Choice {
                    choices: ChoiceSource::Labels(Vec::new()),
                    display: Vec::new(),
                },
                vec![Transition::new(Guard::Wildcard, next)],
            ))
        }
    }

    fn choice(
        &self,
        slot: &Slot<'a>,
        regular: &RegularNode,
        choice: &ChoiceField,
    ) -> Result<(ScreenKind, Vec<Transition>), CompileError> {
        let node_id = slot.node.id.as_str();
        let entries = self
            .procedure
            .code_definitions
            .get(&choice.code_id)
            .ok_or_else(|| CompileError::UnknownCodeDefinition {
                node_id: node_id.to_string(),
                code_id: choice.code_id.clone(),
            })?;

        let transitions = entries
            .iter()
            .map(|entry| {
                let label = self.label(node_id, &entry.label)?;
                let target = match regular.routes.target_for(&entry.value) {
                    Some(target) => self.resolve(node_id, target)?,
                    None => self.require(node_id, slot.continuation)?,
                };
                Ok(Transition::new(Guard::Choice(label), target).assign(
                    choice.field.clone(),
                    AssignedValue::Literal(entry.value.clone()),
                ))
            })
            .collect::<Result<Vec<_>, CompileError>>()?;

        Ok((
            ScreenKind::Choice {
                choices: ChoiceSource::Code(choice.code_id.clone()),
                display: Vec::new(),
            },
            transitions,
        ))
    }

    fn input(
        &self,
        slot: &Slot<'a>,
        regular: &RegularNode,
        input: &InputField,
    ) -> Result<(ScreenKind, Vec<Transition>), CompileError> {
        let node_id = slot.node.id.as_str();
        let validation = self.validation(node_id, input)?;

        let next = match &regular.routes.otherwise {
            Some(target) => self.resolve(node_id, target)?,
            None => self.require(node_id, slot.continuation)?,
        };
        let accept = |guard: Guard| {
            Transition::new(guard, next).assign(input.field.clone(), AssignedValue::FromUserInput)
        };

        let ceiling = self
            .procedure
            .domain_data
            .get(&input.field)
            .and_then(|variable| variable.ceiling.as_ref());

        let transitions = match ceiling {
            None => vec![accept(Guard::Valid)],
            Some(ceiling) => {
                let overflow = match &ceiling.target {
                    Some(target) => self.resolve(node_id, target)?,
                    None => self.first_blocked.ok_or_else(|| CompileError::MissingTerminal {
                        node_id: node_id.to_string(),
                        marker: TerminalMarker::Blocked,
                    })?,
                };
                let limit = format_number(ceiling.limit);
                vec![
                    Transition::new(
                        Guard::Predicate(Predicate::on_input(Operator::Greater, limit.clone())),
                        overflow,
                    ),
                    accept(Guard::Predicate(Predicate::on_input(Operator::LessEquals, limit))),
                ]
            }
        };

        Ok((ScreenKind::Input { validation }, transitions))
    }

    fn validation(
        &self,
        node_id: &str,
        input: &InputField,
    ) -> Result<ValidationSpec, CompileError> {
        if let Some(pattern) = &input.pattern {
            Regex::new(pattern).map_err(|e| CompileError::InvalidPattern {
                node_id: node_id.to_string(),
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        }

        let mut spec = if input.is_amount() {
            let mut spec = ValidationSpec::number(self.options.amount_min, self.options.amount_max);
            spec.error_message = self.options.amount_error_message.clone();
            spec
        } else {
            ValidationSpec::text()
        };
        spec.required = input.required.unwrap_or(true);
        spec.min_length = input.min_length;
        spec.pattern = input.pattern.clone();
        if input.error_message.is_some() {
            spec.error_message = input.error_message.clone();
        }
        Ok(spec)
    }

    fn confirmation(
        &self,
        node_id: &str,
        regular: &RegularNode,
        displays: &[&DisplayField],
    ) -> Result<(ScreenKind, Vec<Transition>), CompileError> {
        let display = displays
            .iter()
            .map(|d| DisplayItem {
                label: d.label.clone(),
                field: d.field.clone(),
                format: d.format.clone().unwrap_or_else(|| self.display_format(&d.field)),
            })
            .collect();

        let confirmed = match &regular.routes.otherwise {
            Some(target) => self.resolve(node_id, target)?,
            None => self.first_success.ok_or_else(|| CompileError::MissingTerminal {
                node_id: node_id.to_string(),
                marker: TerminalMarker::Success,
            })?,
        };

        let confirm = self.label(node_id, &self.options.confirm_label)?;
        let amend = self.label(node_id, &self.options.amend_label)?;
        Ok((
            ScreenKind::Choice {
                choices: ChoiceSource::Labels(vec![confirm.clone(), amend.clone()]),
                display,
            },
            vec![
                Transition::new(Guard::Choice(confirm), confirmed),
                Transition::new(Guard::Choice(amend), self.entry),
            ],
        ))
    }

    fn display_format(&self, field: &str) -> DisplayFormat {
        if is_amount_like(field) {
            DisplayFormat::Currency
        } else if self.procedure.code_definitions.contains_key(field) {
            DisplayFormat::Code(field.to_string())
        } else {
            DisplayFormat::Text
        }
    }

    fn condition(&self, node_id: &str, condition: &SwitchCondition) -> Condition {
        Condition {
            combinator: condition.combinator,
            predicates: condition
                .rules
                .iter()
                .map(|rule| {
                    Predicate::new(
                        rule.field.clone(),
                        self.operators.normalize(node_id, &rule.comparator),
                        rule.value.clone(),
                    )
                })
                .collect(),
        }
    }

    /// A choice label as its transition guard. The wildcard text would read
    /// back from a graph document as a catch-all, so it cannot be a label.
    fn label(&self, node_id: &str, label: &str) -> Result<String, CompileError> {
        if label == WILDCARD_CHOICE {
            return Err(CompileError::ReservedChoiceLabel {
                node_id: node_id.to_string(),
                label: label.to_string(),
            });
        }
        Ok(label.to_string())
    }

    /// Resolves a declared routing target to its entry screen.
    fn resolve(&self, node_id: &str, target: &str) -> Result<ScreenId, CompileError> {
        self.layout
            .entries
            .get(target)
            .copied()
            .ok_or_else(|| CompileError::DanglingTarget {
                node_id: node_id.to_string(),
                target: target.to_string(),
            })
    }

    fn require(&self, node_id: &str, next: Option<ScreenId>) -> Result<ScreenId, CompileError> {
        next.ok_or_else(|| CompileError::NoContinuation {
            node_id: node_id.to_string(),
        })
    }
}
