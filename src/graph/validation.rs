use super::value::{Value, format_number, parse_number};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The declared type of an input screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Text,
    Number,
}

/// The validation rules of an input screen.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationSpec {
    pub input_type: InputType,
    pub required: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_length: Option<usize>,
    pub pattern: Option<String>,
    pub error_message: Option<String>,
}

/// The first rule an input failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    #[error("A value is required")]
    Required,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("The value must be at least {min}")]
    BelowMinimum { min: String },

    #[error("The value must be at most {max}")]
    AboveMaximum { max: String },

    #[error("The value must be at least {min_length} characters long")]
    TooShort { min_length: usize },

    #[error("The value does not match the expected format")]
    PatternMismatch,
}

impl ValidationSpec {
    /// Free text, required.
    pub fn text() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    /// A required number within inclusive bounds.
    pub fn number(min: f64, max: f64) -> Self {
        Self {
            input_type: InputType::Number,
            required: true,
            min: Some(min),
            max: Some(max),
            ..Self::default()
        }
    }

    /// Checks a raw input against every configured rule and returns the value
    /// to store: the parsed number on numeric screens, the raw text otherwise.
    ///
    /// `pattern` is the compiled form of `self.pattern`; callers cache it.
    pub fn validate(&self, raw: &str, pattern: Option<&Regex>) -> Result<Value, ValidationFailure> {
        if raw.trim().is_empty() {
            if self.required {
                return Err(ValidationFailure::Required);
            }
            return Ok(Value::Text(raw.to_string()));
        }

        let value = match self.input_type {
            InputType::Number => {
                let n = parse_number(raw)
                    .ok_or_else(|| ValidationFailure::NotANumber(raw.to_string()))?;
                if let Some(min) = self.min {
                    if n < min {
                        return Err(ValidationFailure::BelowMinimum {
                            min: format_number(min),
                        });
                    }
                }
                if let Some(max) = self.max {
                    if n > max {
                        return Err(ValidationFailure::AboveMaximum {
                            max: format_number(max),
                        });
                    }
                }
                Value::Number(n)
            }
            InputType::Text => Value::Text(raw.to_string()),
        };

        if let Some(min_length) = self.min_length {
            if raw.chars().count() < min_length {
                return Err(ValidationFailure::TooShort { min_length });
            }
        }

        if let Some(regex) = pattern {
            if !regex.is_match(raw) {
                return Err(ValidationFailure::PatternMismatch);
            }
        }

        Ok(value)
    }

    /// The message reported to the user for a failure: the screen's own
    /// message when one is configured, otherwise the rule's.
    pub fn message_for(&self, failure: &ValidationFailure) -> String {
        self.error_message
            .clone()
            .unwrap_or_else(|| failure.to_string())
    }
}
