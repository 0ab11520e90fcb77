use super::value::{Value, parse_number};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// The fixed comparison-operator set.
///
/// `Unknown` only arises from loaded graph documents; it never matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Equals,
    NotEquals,
    Greater,
    Less,
    GreaterEquals,
    LessEquals,
    Contains,
    Unknown(String),
}

impl Operator {
    /// Strict parse of a canonical operator name.
    pub fn parse(name: &str) -> Self {
        match name {
            "EQUALS" => Operator::Equals,
            "NOT_EQUALS" => Operator::NotEquals,
            "GREATER" => Operator::Greater,
            "LESS" => Operator::Less,
            "GREATER_EQUALS" => Operator::GreaterEquals,
            "LESS_EQUALS" => Operator::LessEquals,
            "CONTAINS" => Operator::Contains,
            other => Operator::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "EQUALS",
            Operator::NotEquals => "NOT_EQUALS",
            Operator::Greater => "GREATER",
            Operator::Less => "LESS",
            Operator::GreaterEquals => "GREATER_EQUALS",
            Operator::LessEquals => "LESS_EQUALS",
            Operator::Contains => "CONTAINS",
            Operator::Unknown(name) => name,
        }
    }

    /// Applies the operator with numeric-or-lexical coercion: when both sides
    /// parse as numbers they are compared numerically, otherwise as strings.
    pub fn apply(&self, operand: &str, literal: &str) -> bool {
        if let Operator::Contains = self {
            return operand.contains(literal);
        }
        let ordering = match (parse_number(operand), parse_number(literal)) {
            (Some(l), Some(r)) => l.partial_cmp(&r),
            _ => Some(operand.cmp(literal)),
        };
        let Some(ordering) = ordering else {
            return false;
        };
        match self {
            Operator::Equals => ordering == Ordering::Equal,
            Operator::NotEquals => ordering != Ordering::Equal,
            Operator::Greater => ordering == Ordering::Greater,
            Operator::Less => ordering == Ordering::Less,
            Operator::GreaterEquals => ordering != Ordering::Less,
            Operator::LessEquals => ordering != Ordering::Greater,
            Operator::Contains | Operator::Unknown(_) => false,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::GreaterEquals => ">=",
            Operator::LessEquals => "<=",
            Operator::Contains => "contains",
            Operator::Unknown(name) => name,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the predicates of a condition are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

/// A single `field operator literal` comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Predicate {
    pub field: String,
    pub operator: Operator,
    pub literal: String,
}

impl Predicate {
    /// The field name input predicates are written against.
    pub const INPUT_FIELD: &'static str = "input";

    pub fn new(field: impl Into<String>, operator: Operator, literal: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            literal: literal.into(),
        }
    }

    /// A predicate over the pending input of an input screen.
    pub fn on_input(operator: Operator, literal: impl Into<String>) -> Self {
        Self::new(Self::INPUT_FIELD, operator, literal)
    }

    pub fn evaluate(&self, operand: &str) -> bool {
        self.operator.apply(operand, &self.literal)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${} {} {}",
            self.field,
            self.operator.symbol(),
            self.literal
        )
    }
}

/// The condition carried by a condition screen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    pub combinator: Combinator,
    pub predicates: Vec<Predicate>,
}

impl Condition {
    /// Evaluates the condition against a variable environment. A variable
    /// that has not been set compares as the empty string.
    pub fn evaluate(&self, variables: &BTreeMap<String, Value>) -> bool {
        let holds = |p: &Predicate| {
            let operand = variables
                .get(&p.field)
                .map(|v| v.as_text().into_owned())
                .unwrap_or_default();
            p.evaluate(&operand)
        };
        match self.combinator {
            Combinator::And => self.predicates.iter().all(holds),
            Combinator::Or => self.predicates.iter().any(holds),
        }
    }
}
