use crate::graph::Operator;
use ahash::AHashMap;

/// Master macro to define the comparator names the compiler understands and
/// the canonical operator each one normalizes to.
macro_rules! define_comparators {
    ( $( ($name:expr, $operator:expr) ),* $(,)? ) => {
        /// Resolves a built-in comparator name.
        pub fn builtin_operator(name: &str) -> Option<Operator> {
            match name {
                $( $name => Some($operator), )*
                _ => None,
            }
        }

        fn register_default_comparators(table: &mut AHashMap<String, Operator>) {
            $( table.insert($name.to_string(), $operator); )*
        }
    };
}

define_comparators! {
    // Canonical names
    ("EQUALS", Operator::Equals),
    ("NOT_EQUALS", Operator::NotEquals),
    ("GREATER", Operator::Greater),
    ("LESS", Operator::Less),
    ("GREATER_EQUALS", Operator::GreaterEquals),
    ("LESS_EQUALS", Operator::LessEquals),
    ("CONTAINS", Operator::Contains),

    // Authoring-tool aliases
    ("EQUALS_LESS_THAN", Operator::LessEquals),
    ("EQUALS_GREATER_THAN", Operator::GreaterEquals),
}

/// Maps declared comparator names onto the fixed operator set.
#[derive(Debug, Clone)]
pub struct OperatorTable {
    entries: AHashMap<String, Operator>,
}

impl Default for OperatorTable {
    fn default() -> Self {
        let mut entries = AHashMap::new();
        register_default_comparators(&mut entries);
        Self { entries }
    }
}

impl OperatorTable {
    /// Registers `alias` as another name for a built-in comparator. Returns
    /// false, leaving the table unchanged, if `canonical` is not built in.
    pub fn alias(&mut self, alias: &str, canonical: &str) -> bool {
        match builtin_operator(canonical) {
            Some(operator) => {
                self.entries.insert(alias.to_string(), operator);
                true
            }
            None => false,
        }
    }

    /// Normalizes a comparator. Unrecognised names fall back to `EQUALS`.
    pub fn normalize(&self, node_id: &str, name: &str) -> Operator {
        match self.entries.get(name) {
            Some(operator) => operator.clone(),
            None => {
                log::warn!(
                    "Node '{}': unknown comparator '{}', falling back to EQUALS",
                    node_id,
                    name
                );
                Operator::Equals
            }
        }
    }
}
