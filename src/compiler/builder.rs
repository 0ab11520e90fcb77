use crate::error::CompileError;
use crate::graph::ScreenId;
use crate::source::{NodeKind, RegularNode, SourceNode, SwitchCondition};
use ahash::AHashSet;
use std::collections::BTreeMap;

/// A screen position reserved during flattening, before its transitions
/// are known.
#[derive(Debug)]
pub(super) struct Slot<'a> {
    pub id: ScreenId,
    pub node: &'a SourceNode,
    pub role: SlotRole<'a>,
    /// The first screen following this one in its enclosing sequence.
    pub continuation: Option<ScreenId>,
}

#[derive(Debug)]
pub(super) enum SlotRole<'a> {
    Regular(&'a RegularNode),
    /// One condition screen of a switch.
    Condition {
        condition: &'a SwitchCondition,
        on_match: Option<ScreenId>,
        on_default: Option<ScreenId>,
    },
}

/// The flattened form of a (sub)sequence of source nodes.
#[derive(Debug, Default)]
pub(super) struct Layout<'a> {
    pub slots: Vec<Slot<'a>>,
    /// Source node id -> entry screen.
    pub entries: BTreeMap<&'a str, ScreenId>,
}

impl<'a> Layout<'a> {
    fn absorb(&mut self, other: Layout<'a>) {
        self.slots.extend(other.slots);
        self.entries.extend(other.entries);
    }

    fn enter(&mut self, node_id: &'a str, screen: ScreenId) {
        if !node_id.is_empty() {
            self.entries.insert(node_id, screen);
        }
    }
}

/// Number of screens a node flattens to.
pub(super) fn screen_count(node: &SourceNode) -> u32 {
    match &node.kind {
        NodeKind::Regular(_) => 1,
        NodeKind::Group { children } => sequence_count(children),
        NodeKind::Switch(switch) => {
            switch.conditions.len() as u32
                + switch
                    .branches
                    .iter()
                    .map(|b| sequence_count(&b.children))
                    .sum::<u32>()
        }
    }
}

fn sequence_count(nodes: &[SourceNode]) -> u32 {
    nodes.iter().map(screen_count).sum()
}

/// Rejects procedures that declare the same node (or branch) id twice.
pub(super) fn check_unique_ids(nodes: &[SourceNode]) -> Result<(), CompileError> {
    fn visit<'a>(
        nodes: &'a [SourceNode],
        seen: &mut AHashSet<&'a str>,
    ) -> Result<(), CompileError> {
        for node in nodes {
            claim(&node.id, seen)?;
            match &node.kind {
                NodeKind::Regular(_) => {}
                NodeKind::Group { children } => visit(children, seen)?,
                NodeKind::Switch(switch) => {
                    for branch in &switch.branches {
                        claim(&branch.id, seen)?;
                        visit(&branch.children, seen)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn claim<'a>(id: &'a str, seen: &mut AHashSet<&'a str>) -> Result<(), CompileError> {
        if !id.is_empty() && !seen.insert(id) {
            return Err(CompileError::DuplicateNodeId {
                node_id: id.to_string(),
            });
        }
        Ok(())
    }

    visit(nodes, &mut AHashSet::new())
}

/// Flattens a sequence depth-first, pre-order, numbering screens from
/// `first`. `after` is the screen the sequence continues to once exhausted.
pub(super) fn flatten_sequence<'a>(
    nodes: &'a [SourceNode],
    first: ScreenId,
    after: Option<ScreenId>,
) -> Result<Layout<'a>, CompileError> {
    let mut layout = Layout::default();
    let mut next = first;

    for (index, node) in nodes.iter().enumerate() {
        let count = screen_count(node);
        let end = next + count;
        let continuation = if sequence_count(&nodes[index + 1..]) > 0 {
            Some(end)
        } else {
            after
        };
        layout.absorb(flatten_node(node, next, continuation)?);
        next = end;
    }

    Ok(layout)
}

fn flatten_node<'a>(
    node: &'a SourceNode,
    first: ScreenId,
    continuation: Option<ScreenId>,
) -> Result<Layout<'a>, CompileError> {
    log::debug!(
        "Flattening node '{}' ({}) at screen {}",
        node.id,
        node.title,
        first
    );

    match &node.kind {
        NodeKind::Regular(regular) => {
            let mut layout = Layout::default();
            layout.enter(&node.id, first);
            layout.slots.push(Slot {
                id: first,
                node,
                role: SlotRole::Regular(regular),
                continuation,
            });
            Ok(layout)
        }
        NodeKind::Group { children } => {
            let mut layout = flatten_sequence(children, first, continuation)?;
            if sequence_count(children) > 0 {
                layout.enter(&node.id, first);
            }
            Ok(layout)
        }
        NodeKind::Switch(switch) => {
            if switch.conditions.len() != switch.branches.len() {
                return Err(CompileError::BranchCountMismatch {
                    node_id: node.id.clone(),
                    conditions: switch.conditions.len(),
                    branches: switch.branches.len(),
                });
            }

            let conditions = switch.conditions.len() as u32;
            let mut layout = Layout::default();
            if conditions > 0 {
                layout.enter(&node.id, first);
            }

            // Branch sub-sequences follow the condition screens in order.
            let mut branch_start = first + conditions;
            let mut branches = Vec::with_capacity(switch.branches.len());
            for branch in &switch.branches {
                let count = sequence_count(&branch.children);
                let entry = (count > 0).then_some(branch_start);
                if let Some(entry) = entry {
                    layout.enter(&branch.id, entry);
                }
                branches.push((branch, branch_start, entry));
                branch_start += count;
            }

            for (index, (condition, &(_, _, entry))) in
                switch.conditions.iter().zip(&branches).enumerate()
            {
                let index = index as u32;
                let on_default = if index + 1 < conditions {
                    Some(first + index + 1)
                } else {
                    continuation
                };
                layout.slots.push(Slot {
                    id: first + index,
                    node,
                    role: SlotRole::Condition {
                        condition,
                        on_match: entry.or(continuation),
                        on_default,
                    },
                    continuation,
                });
            }

            for (branch, start, _) in branches {
                layout.absorb(flatten_sequence(&branch.children, start, continuation)?);
            }

            Ok(layout)
        }
    }
}
