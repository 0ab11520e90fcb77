use crate::graph::{EndType, ValidationSpec};
use std::collections::VecDeque;

/// The boundary between a dialogue session and whatever renders it.
///
/// Prompt methods block until the user responds; returning `None` means no
/// response is available and the session suspends on the current screen.
pub trait PresentationAdapter {
    fn show_choice_prompt(&mut self, text: &str, choices: &[String]) -> Option<String>;

    fn show_input_prompt(&mut self, text: &str, validation: &ValidationSpec) -> Option<String>;

    fn show_terminal(&mut self, text: &str, end: EndType);

    /// Reports a rejected response. The session stays on the same screen.
    fn show_validation_error(&mut self, message: &str);
}

/// Everything a [`ScriptedAdapter`] was shown, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEvent {
    ChoicePrompt { text: String, choices: Vec<String> },
    InputPrompt { text: String },
    Terminal { text: String, end: EndType },
    ValidationError(String),
}

/// Answers prompts from a queue of prepared responses and records a
/// transcript. Used by tests and non-interactive runs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAdapter {
    responses: VecDeque<String>,
    transcript: Vec<AdapterEvent>,
}

impl ScriptedAdapter {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    pub fn push_response(&mut self, response: impl Into<String>) {
        self.responses.push_back(response.into());
    }

    pub fn remaining(&self) -> usize {
        self.responses.len()
    }

    pub fn transcript(&self) -> &[AdapterEvent] {
        &self.transcript
    }

    pub fn validation_errors(&self) -> impl Iterator<Item = &str> {
        self.transcript.iter().filter_map(|event| match event {
            AdapterEvent::ValidationError(message) => Some(message.as_str()),
            _ => None,
        })
    }

    pub fn last_prompt(&self) -> Option<&str> {
        self.transcript.iter().rev().find_map(|event| match event {
            AdapterEvent::ChoicePrompt { text, .. } | AdapterEvent::InputPrompt { text } => {
                Some(text.as_str())
            }
            _ => None,
        })
    }
}

impl PresentationAdapter for ScriptedAdapter {
    fn show_choice_prompt(&mut self, text: &str, choices: &[String]) -> Option<String> {
        self.transcript.push(AdapterEvent::ChoicePrompt {
            text: text.to_string(),
            choices: choices.to_vec(),
        });
        self.responses.pop_front()
    }

    fn show_input_prompt(&mut self, text: &str, _validation: &ValidationSpec) -> Option<String> {
        self.transcript.push(AdapterEvent::InputPrompt {
            text: text.to_string(),
        });
        self.responses.pop_front()
    }

    fn show_terminal(&mut self, text: &str, end: EndType) {
        self.transcript.push(AdapterEvent::Terminal {
            text: text.to_string(),
            end,
        });
    }

    fn show_validation_error(&mut self, message: &str) {
        self.transcript
            .push(AdapterEvent::ValidationError(message.to_string()));
    }
}
