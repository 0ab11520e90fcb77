use super::{Clock, HistoryEntry, Interpreter, PresentationAdapter, SessionState};
use crate::error::DialogueError;
use crate::graph::{
    AssignedValue, DisplayItem, EndType, Guard, Screen, ScreenId, ScreenKind, Transition,
    ValidationSpec, Value,
};
use crate::render::PromptFormatter;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    /// A terminal screen was reached; only `restart` or `jump_to` revive it.
    Finished(EndType),
    /// A fatal error occurred.
    Aborted,
}

/// What one step of a session did.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// A response was accepted and the session moved on.
    Advanced { from: ScreenId, to: ScreenId },
    /// The input failed validation; the screen will be shown again.
    Rejected { screen: ScreenId, message: String },
    /// No transition accepted the response; the screen will be shown again.
    NoTransition { screen: ScreenId, response: String },
    /// A terminal screen was reached.
    Finished { screen: ScreenId, end: EndType },
    /// The adapter had no response to give.
    Suspended { screen: ScreenId },
}

impl StepOutcome {
    /// Whether `run` stops at this outcome.
    pub fn is_final(&self) -> bool {
        matches!(self, StepOutcome::Finished { .. } | StepOutcome::Suspended { .. })
    }
}

/// One conversation over a dialogue graph.
///
/// Dropping a session cancels it.
pub struct Session<'a> {
    interpreter: &'a Interpreter<'a>,
    state: SessionState,
    status: SessionStatus,
    /// The current visit already has a history entry.
    visit_open: bool,
    clock: Box<dyn Clock>,
}

impl<'a> Session<'a> {
    pub(super) fn new(interpreter: &'a Interpreter<'a>, clock: Box<dyn Clock>) -> Self {
        Self {
            interpreter,
            state: SessionState::new(interpreter.graph().entry),
            status: SessionStatus::Active,
            visit_open: false,
            clock,
        }
    }

    /// Seeds the variable environment before the first step.
    pub fn with_variables(mut self, variables: BTreeMap<String, Value>) -> Self {
        self.state.variables.extend(variables);
        self
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.state.variable(name)
    }

    pub fn current_screen(&self) -> Option<&'a Screen> {
        self.interpreter.screen(self.state.current_screen)
    }

    /// A copy of the current state, for diagnostics.
    pub fn snapshot(&self) -> SessionState {
        self.state.clone()
    }

    /// Moves the session to `screen` without any validation, recording one
    /// history entry. A finished or aborted session becomes active again.
    ///
    /// An unknown screen is only detected by the next `step`.
    pub fn jump_to(&mut self, screen: ScreenId) {
        log::debug!(
            "Jumping from screen {} to screen {}",
            self.state.current_screen,
            screen
        );
        self.state.current_screen = screen;
        self.state
            .history
            .push(HistoryEntry::new(screen, self.clock.now()));
        self.visit_open = true;
        self.status = SessionStatus::Active;
    }

    /// Returns to the entry screen. Variables are kept.
    pub fn restart(&mut self) {
        self.jump_to(self.interpreter.graph().entry);
    }

    /// Runs until a terminal screen is reached or the adapter stops
    /// supplying responses.
    pub fn run(
        &mut self,
        adapter: &mut dyn PresentationAdapter,
    ) -> Result<StepOutcome, DialogueError> {
        loop {
            let outcome = self.step(adapter)?;
            if outcome.is_final() {
                return Ok(outcome);
            }
        }
    }

    /// Executes one turn of the dialogue.
    ///
    /// Condition screens are resolved synchronously, so a single step may
    /// pass through several screens before it prompts the adapter.
    ///
    /// # Returns
    ///
    /// * `Ok(StepOutcome)`: what happened. Rejected input and unmatched
    ///   choices are outcomes, reported to the adapter through
    ///   `show_validation_error`.
    /// * `Err(DialogueError)`: the session is finished or aborted, or the
    ///   current screen does not exist (which aborts the session).
    pub fn step(
        &mut self,
        adapter: &mut dyn PresentationAdapter,
    ) -> Result<StepOutcome, DialogueError> {
        match self.status {
            SessionStatus::Finished(_) => return Err(DialogueError::SessionFinished),
            SessionStatus::Aborted => return Err(DialogueError::SessionAborted),
            SessionStatus::Active => {}
        }

        let start = self.state.current_screen;
        let mut hops = 0;
        loop {
            let screen = self.enter()?;
            match &screen.kind {
                ScreenKind::Terminal { end } => {
                    adapter.show_terminal(&screen.prompt, *end);
                    self.status = SessionStatus::Finished(*end);
                    log::info!("Session finished on screen {} ({})", screen.id, end);
                    return Ok(StepOutcome::Finished {
                        screen: screen.id,
                        end: *end,
                    });
                }
                ScreenKind::Condition { condition } => {
                    hops += 1;
                    if hops > self.interpreter.graph().len() {
                        self.status = SessionStatus::Aborted;
                        return Err(DialogueError::ConditionCycle(start));
                    }
                    let wanted = if condition.evaluate(&self.state.variables) {
                        Guard::Match
                    } else {
                        Guard::Default
                    };
                    let Some(transition) = screen.transitions.iter().find(|t| t.guard == wanted)
                    else {
                        self.status = SessionStatus::Aborted;
                        return Err(DialogueError::ConditionUnresolved(screen.id));
                    };
                    self.advance(screen.id, transition.target);
                }
                ScreenKind::Choice { display, .. } => {
                    return Ok(self.choose(screen, display, adapter));
                }
                ScreenKind::Input { validation } => {
                    return Ok(self.input(screen, validation, adapter));
                }
            }
        }
    }

    /// Looks up the current screen and opens a visit on it.
    fn enter(&mut self) -> Result<&'a Screen, DialogueError> {
        let id = self.state.current_screen;
        let Some(screen) = self.interpreter.screen(id) else {
            log::error!("Screen {} not found; aborting session", id);
            self.status = SessionStatus::Aborted;
            return Err(DialogueError::ScreenNotFound(id));
        };
        if !self.visit_open {
            self.state
                .history
                .push(HistoryEntry::new(id, self.clock.now()));
            self.visit_open = true;
        }
        Ok(screen)
    }

    fn choose(
        &mut self,
        screen: &'a Screen,
        display: &[DisplayItem],
        adapter: &mut dyn PresentationAdapter,
    ) -> StepOutcome {
        let graph = self.interpreter.graph();
        let lines = PromptFormatter::format_items(graph, display, &self.state.variables);
        let prompt = PromptFormatter::compose(&screen.prompt, &lines);
        let labels = graph.choice_labels(screen);

        let Some(response) = adapter.show_choice_prompt(&prompt, &labels) else {
            return StepOutcome::Suspended { screen: screen.id };
        };

        let Some(transition) = screen
            .transitions
            .iter()
            .find(|t| t.guard.accepts_choice(&response))
        else {
            adapter.show_validation_error(&format!(
                "'{}' is not one of the available choices",
                response
            ));
            return StepOutcome::NoTransition {
                screen: screen.id,
                response,
            };
        };

        if let Some(entry) = self.state.history.last_mut() {
            entry.choice = Some(response);
        }
        self.assign(screen.id, transition, None);
        self.advance(screen.id, transition.target)
    }

    fn input(
        &mut self,
        screen: &'a Screen,
        validation: &ValidationSpec,
        adapter: &mut dyn PresentationAdapter,
    ) -> StepOutcome {
        let Some(raw) = adapter.show_input_prompt(&screen.prompt, validation) else {
            return StepOutcome::Suspended { screen: screen.id };
        };

        let value = match validation.validate(&raw, self.interpreter.pattern(screen.id)) {
            Ok(value) => value,
            Err(failure) => {
                let message = validation.message_for(&failure);
                log::debug!("Screen {} rejected '{}': {}", screen.id, raw, failure);
                adapter.show_validation_error(&message);
                return StepOutcome::Rejected {
                    screen: screen.id,
                    message,
                };
            }
        };

        let text = value.as_text();
        let Some(transition) = screen
            .transitions
            .iter()
            .find(|t| t.guard.accepts_input(&text))
        else {
            adapter.show_validation_error(&format!("No transition accepts the input '{}'", raw));
            return StepOutcome::NoTransition {
                screen: screen.id,
                response: raw,
            };
        };

        if let Some(entry) = self.state.history.last_mut() {
            entry.input = Some(raw);
        }
        self.assign(screen.id, transition, Some(&value));
        self.advance(screen.id, transition.target)
    }

    /// Merges a transition's assignments into the variable environment.
    fn assign(&mut self, screen: ScreenId, transition: &Transition, input: Option<&Value>) {
        for (field, assigned) in &transition.assignments {
            let value = match (assigned, input) {
                (AssignedValue::Literal(literal), _) => Value::Text(literal.clone()),
                (AssignedValue::FromUserInput, Some(input)) => input.clone(),
                (AssignedValue::FromUserInput, None) => {
                    log::warn!(
                        "Screen {}: '{}' expects user input, but the screen takes none",
                        screen,
                        field
                    );
                    continue;
                }
            };
            self.state.variables.insert(field.clone(), value);
        }
    }

    fn advance(&mut self, from: ScreenId, to: ScreenId) -> StepOutcome {
        log::debug!("Screen {} -> screen {}", from, to);
        self.state.current_screen = to;
        self.visit_open = false;
        StepOutcome::Advanced { from, to }
    }
}
