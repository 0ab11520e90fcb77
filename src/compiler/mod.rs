use crate::error::CompileError;
use crate::graph::{DialogueGraph, ScreenId, integrity};
use crate::source::ProcedureDefinition;

mod builder;
pub mod parsing;
mod synthesis;

use builder::{check_unique_ids, flatten_sequence};
use parsing::OperatorTable;
use synthesis::TransitionSynthesizer;

/// Compiled graphs always start on screen 1.
const ENTRY_SCREEN: ScreenId = 1;

/// Tunable compile behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerOptions {
    /// Inclusive bounds for amount-like inputs.
    pub amount_min: f64,
    pub amount_max: f64,
    /// Reported when an amount-like input fails validation and the field
    /// declares no message of its own.
    pub amount_error_message: Option<String>,
    pub confirm_label: String,
    pub amend_label: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            amount_min: 1.0,
            amount_max: 10_000_000.0,
            amount_error_message: Some("1円以上1000万円以下で入力してください".to_string()),
            confirm_label: "確認".to_string(),
            amend_label: "修正".to_string(),
        }
    }
}

pub struct Compiler {
    procedure: ProcedureDefinition,
    options: CompilerOptions,
    operators: OperatorTable,
}

pub struct CompilerBuilder {
    procedure: ProcedureDefinition,
    options: CompilerOptions,
    operators: OperatorTable,
}

impl CompilerBuilder {
    pub fn new(procedure: ProcedureDefinition) -> Self {
        Self {
            procedure,
            options: CompilerOptions::default(),
            operators: OperatorTable::default(),
        }
    }

    pub fn with_amount_bounds(mut self, min: f64, max: f64) -> Self {
        self.options.amount_min = min;
        self.options.amount_max = max;
        self
    }

    pub fn with_amount_error_message(mut self, message: Option<&str>) -> Self {
        self.options.amount_error_message = message.map(str::to_string);
        self
    }

    pub fn with_confirmation_labels(mut self, confirm: &str, amend: &str) -> Self {
        self.options.confirm_label = confirm.to_string();
        self.options.amend_label = amend.to_string();
        self
    }

    /// Maps a comparator name used by an authoring tool onto a built-in one.
    /// Unknown canonical names are ignored.
    pub fn with_operator_alias(mut self, alias: &str, canonical: &str) -> Self {
        if !self.operators.alias(alias, canonical) {
            log::warn!(
                "Ignoring alias '{}': '{}' is not a built-in comparator",
                alias,
                canonical
            );
        }
        self
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            procedure: self.procedure,
            options: self.options,
            operators: self.operators,
        }
    }
}

impl Compiler {
    pub fn builder(procedure: ProcedureDefinition) -> CompilerBuilder {
        CompilerBuilder::new(procedure)
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compiles the procedure into a flat dialogue graph.
    ///
    /// Compilation is deterministic: the same procedure and options always
    /// yield an identical graph. It is also all-or-nothing; the first
    /// structural error aborts it.
    pub fn compile(&self) -> Result<DialogueGraph, CompileError> {
        let procedure = &self.procedure;
        check_unique_ids(&procedure.workflow)?;

        // 1. Flatten the tree into numbered slots
        let layout = flatten_sequence(&procedure.workflow, ENTRY_SCREEN, None)?;
        if layout.slots.is_empty() {
            return Err(CompileError::EmptyProcedure);
        }

        // 2. Synthesize each screen's transitions
        let synthesizer = TransitionSynthesizer::new(
            procedure,
            &layout,
            &self.options,
            &self.operators,
            ENTRY_SCREEN,
        );
        let screens = synthesizer.synthesize()?;

        let graph = DialogueGraph {
            screens,
            code_definitions: procedure.code_definitions.clone(),
            domain_data: procedure.domain_data.clone(),
            entry: ENTRY_SCREEN,
        };

        // 3. Link: the finished graph must satisfy every graph invariant
        integrity::check(&graph).map_err(|source| {
            let screen = source.screen().unwrap_or(graph.entry);
            CompileError::Integrity {
                node_id: graph
                    .screen(screen)
                    .and_then(|s| s.source_id.clone())
                    .unwrap_or_default(),
                screen,
                source,
            }
        })?;

        log::info!(
            "Compiled {} nodes into {} screens",
            layout.entries.len(),
            graph.len()
        );
        Ok(graph)
    }
}

/// Compiles a procedure with the default options.
pub fn compile(procedure: &ProcedureDefinition) -> Result<DialogueGraph, CompileError> {
    Compiler::builder(procedure.clone()).build().compile()
}
