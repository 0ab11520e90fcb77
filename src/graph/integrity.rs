use super::{ChoiceSource, DialogueGraph, Guard, ScreenId, ScreenKind};
use crate::error::IntegrityError;
use ahash::AHashSet;
use regex::Regex;

/// Verifies the invariants of a dialogue graph: unique screen ids, an
/// existing entry screen, no dangling transition targets, choice screens that
/// cover every choice (or carry a wildcard), complete condition screens and
/// compilable input patterns.
///
/// Runs as the final link step of compilation, when a graph document is
/// loaded, and when an interpreter is constructed.
pub fn check(graph: &DialogueGraph) -> Result<(), IntegrityError> {
    if graph.screens.is_empty() {
        return Err(IntegrityError::NoScreens);
    }

    let mut ids: AHashSet<ScreenId> = AHashSet::with_capacity(graph.screens.len());
    for screen in &graph.screens {
        if !ids.insert(screen.id) {
            return Err(IntegrityError::DuplicateScreen(screen.id));
        }
    }
    if !ids.contains(&graph.entry) {
        return Err(IntegrityError::MissingEntry(graph.entry));
    }

    for screen in &graph.screens {
        if let Some(t) = screen.transitions.iter().find(|t| !ids.contains(&t.target)) {
            return Err(IntegrityError::DanglingTarget {
                screen: screen.id,
                target: t.target,
            });
        }

        match &screen.kind {
            ScreenKind::Choice { choices, .. } => {
                if let ChoiceSource::Code(code_id) = choices {
                    if !graph.code_definitions.contains_key(code_id) {
                        return Err(IntegrityError::UnknownCodeDefinition {
                            screen: screen.id,
                            code_id: code_id.clone(),
                        });
                    }
                }
                let has_wildcard = screen
                    .transitions
                    .iter()
                    .any(|t| matches!(t.guard, Guard::Wildcard));
                if !has_wildcard {
                    for label in graph.choice_labels(screen) {
                        if !screen.transitions.iter().any(|t| t.guard.accepts_choice(&label)) {
                            return Err(IntegrityError::UncoveredChoice {
                                screen: screen.id,
                                label,
                            });
                        }
                    }
                }
            }
            ScreenKind::Condition { .. } => {
                let has = |wanted: &Guard| screen.transitions.iter().any(|t| &t.guard == wanted);
                if !has(&Guard::Match) || !has(&Guard::Default) {
                    return Err(IntegrityError::IncompleteCondition(screen.id));
                }
            }
            ScreenKind::Input { validation } => {
                if let Some(pattern) = &validation.pattern {
                    Regex::new(pattern).map_err(|e| IntegrityError::InvalidPattern {
                        screen: screen.id,
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    })?;
                }
            }
            ScreenKind::Terminal { .. } => {}
        }
    }

    Ok(())
}
