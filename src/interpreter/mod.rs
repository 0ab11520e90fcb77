//! Executes compiled dialogue graphs as per-session state machines.

use crate::error::{DialogueError, IntegrityError};
use crate::graph::{DialogueGraph, Screen, ScreenId, ScreenKind, integrity};
use ahash::AHashMap;
use regex::Regex;

mod adapter;
mod clock;
mod session;
mod state;

pub use adapter::{AdapterEvent, PresentationAdapter, ScriptedAdapter};
pub use clock::{Clock, FixedClock, SystemClock};
pub use session::{Session, SessionStatus, StepOutcome};
pub use state::{HistoryEntry, SessionState};

/// Drives sessions over one verified dialogue graph.
///
/// An `Interpreter` is immutable once built and can be shared by reference
/// between any number of concurrent sessions.
pub struct Interpreter<'g> {
    graph: &'g DialogueGraph,
    index: AHashMap<ScreenId, usize>,
    patterns: AHashMap<ScreenId, Regex>,
}

impl<'g> Interpreter<'g> {
    /// Verifies and indexes a graph, compiling every input pattern up front.
    pub fn new(graph: &'g DialogueGraph) -> Result<Self, DialogueError> {
        integrity::check(graph)?;

        let index = graph
            .screens
            .iter()
            .enumerate()
            .map(|(position, screen)| (screen.id, position))
            .collect();

        let mut patterns = AHashMap::new();
        for screen in &graph.screens {
            if let ScreenKind::Input { validation } = &screen.kind {
                if let Some(pattern) = &validation.pattern {
                    let regex = Regex::new(pattern).map_err(|e| IntegrityError::InvalidPattern {
                        screen: screen.id,
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    })?;
                    patterns.insert(screen.id, regex);
                }
            }
        }

        Ok(Self {
            graph,
            index,
            patterns,
        })
    }

    pub fn graph(&self) -> &'g DialogueGraph {
        self.graph
    }

    pub fn screen(&self, id: ScreenId) -> Option<&'g Screen> {
        let graph = self.graph;
        self.index.get(&id).map(|&position| &graph.screens[position])
    }

    pub(crate) fn pattern(&self, id: ScreenId) -> Option<&Regex> {
        self.patterns.get(&id)
    }

    /// Starts a new session on the entry screen, timestamped by the system clock.
    pub fn session(&self) -> Session<'_> {
        Session::new(self, Box::new(SystemClock))
    }

    pub fn session_with_clock(&self, clock: Box<dyn Clock>) -> Session<'_> {
        Session::new(self, clock)
    }
}
