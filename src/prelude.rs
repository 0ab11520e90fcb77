//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the annai crate.
//! Import this module to get access to the core functionality without having to import
//! each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use annai::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/procedure.json")?;
//! let procedure: ProcedureDefinition = serde_json::from_str(&json)?;
//! let graph = compile(&procedure)?;
//! graph.save("path/to/graph.bin")?;
//! # Ok(())
//! # }
//! ```

// Compilation
pub use crate::compiler::{Compiler, CompilerBuilder, CompilerOptions, compile};

// Source model and conversion
pub use crate::source::{
    Branch, CodeEntry, ChoiceField, ConfigurationDocument, DisplayField, DomainVariable,
    InputField, IntoProcedure, Item, ProcedureDefinition, RegularNode, RoutingTable,
    RuleDefinition, SourceNode, SwitchCondition, SwitchNode, TerminalMarker,
};

// Compiled graph
pub use crate::graph::{
    AssignedValue, DialogueGraph, DisplayFormat, EndType, Guard, Screen, ScreenId, ScreenKind,
    Transition, ValidationSpec, Value,
};

// Runtime
pub use crate::interpreter::{
    FixedClock, Interpreter, PresentationAdapter, ScriptedAdapter, Session, SessionState,
    SessionStatus, StepOutcome, SystemClock,
};

// Error types
pub use crate::error::{
    ArtifactError, CompileError, ConversionError, DialogueError, DocumentError, IntegrityError,
};

// Prompt rendering
pub use crate::render::PromptFormatter;

// Result type alias for convenience
pub type Result<T, E = Box<dyn std::error::Error>> = std::result::Result<T, E>;
