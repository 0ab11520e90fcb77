use crate::graph::ScreenId;
use crate::source::TerminalMarker;
use thiserror::Error;

/// Structural errors raised while compiling a procedure tree.
///
/// Compilation is all-or-nothing: any of these aborts the compile and no
/// partial graph is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("The procedure produced no screens")]
    EmptyProcedure,

    #[error("Node id '{node_id}' is used more than once in the procedure")]
    DuplicateNodeId { node_id: String },

    #[error(
        "Switch node '{node_id}' declares {conditions} conditions but {branches} branches"
    )]
    BranchCountMismatch {
        node_id: String,
        conditions: usize,
        branches: usize,
    },

    #[error("Node '{node_id}' references unknown code definition '{code_id}'")]
    UnknownCodeDefinition { node_id: String, code_id: String },

    #[error("Node '{node_id}' routes to '{target}', which does not produce a screen")]
    DanglingTarget { node_id: String, target: String },

    #[error("Node '{node_id}' has no following screen to continue to")]
    NoContinuation { node_id: String },

    #[error("Node '{node_id}' needs a {marker} terminal, but the procedure declares none")]
    MissingTerminal {
        node_id: String,
        marker: TerminalMarker,
    },

    #[error("Node '{node_id}' combines incompatible items: {message}")]
    ConflictingItems { node_id: String, message: String },

    #[error("Node '{node_id}' declares an invalid input pattern '{pattern}': {message}")]
    InvalidPattern {
        node_id: String,
        pattern: String,
        message: String,
    },

    #[error("Node '{node_id}' uses the reserved choice label '{label}'")]
    ReservedChoiceLabel { node_id: String, label: String },

    #[error("Compiled screen {screen} of node '{node_id}' is inconsistent: {source}")]
    Integrity {
        node_id: String,
        screen: ScreenId,
        source: IntegrityError,
    },
}

impl CompileError {
    /// The source node the error was raised for, if it concerns a single node.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            CompileError::EmptyProcedure => None,
            CompileError::DuplicateNodeId { node_id }
            | CompileError::BranchCountMismatch { node_id, .. }
            | CompileError::UnknownCodeDefinition { node_id, .. }
            | CompileError::DanglingTarget { node_id, .. }
            | CompileError::NoContinuation { node_id }
            | CompileError::MissingTerminal { node_id, .. }
            | CompileError::ConflictingItems { node_id, .. }
            | CompileError::InvalidPattern { node_id, .. }
            | CompileError::ReservedChoiceLabel { node_id, .. }
            | CompileError::Integrity { node_id, .. } => Some(node_id),
        }
    }
}

/// Violations of the invariants every dialogue graph must satisfy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrityError {
    #[error("The graph has no screens")]
    NoScreens,

    #[error("Screen id {0} is used more than once")]
    DuplicateScreen(ScreenId),

    #[error("Entry screen {0} does not exist")]
    MissingEntry(ScreenId),

    #[error("Screen {screen} has a transition to screen {target}, which does not exist")]
    DanglingTarget { screen: ScreenId, target: ScreenId },

    #[error("Choice screen {screen} has no transition for choice '{label}'")]
    UncoveredChoice { screen: ScreenId, label: String },

    #[error("Screen {screen} references unknown code definition '{code_id}'")]
    UnknownCodeDefinition { screen: ScreenId, code_id: String },

    #[error("Condition screen {0} needs both a match and a default transition")]
    IncompleteCondition(ScreenId),

    #[error("Input screen {screen} has an invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        screen: ScreenId,
        pattern: String,
        message: String,
    },
}

impl IntegrityError {
    /// The screen the violation was found on, if it concerns a single screen.
    pub fn screen(&self) -> Option<ScreenId> {
        match self {
            IntegrityError::NoScreens => None,
            IntegrityError::DuplicateScreen(screen)
            | IntegrityError::MissingEntry(screen)
            | IntegrityError::IncompleteCondition(screen)
            | IntegrityError::DanglingTarget { screen, .. }
            | IntegrityError::UncoveredChoice { screen, .. }
            | IntegrityError::UnknownCodeDefinition { screen, .. }
            | IntegrityError::InvalidPattern { screen, .. } => Some(*screen),
        }
    }
}

/// Errors raised while driving a dialogue session.
///
/// Only `ScreenNotFound` can occur on a verified graph; it aborts the session.
/// Unmatched responses and failed validation are recoverable and are reported
/// as step outcomes instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DialogueError {
    #[error("Screen {0} not found in the dialogue graph")]
    ScreenNotFound(ScreenId),

    #[error("The session has ended; restart it to continue")]
    SessionFinished,

    #[error("The session was aborted")]
    SessionAborted,

    #[error("Condition screen {0} could not be resolved")]
    ConditionUnresolved(ScreenId),

    #[error("Condition screens starting at {0} form a cycle")]
    ConditionCycle(ScreenId),

    #[error("Invalid dialogue graph: {0}")]
    InvalidGraph(#[from] IntegrityError),
}

/// Errors raised while reading or writing a graph document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Failed to parse graph document: {0}")]
    Json(String),

    #[error("Screen {screen} is malformed: {message}")]
    InvalidScreen { screen: ScreenId, message: String },

    #[error("Invalid dialogue graph: {0}")]
    Integrity(#[from] IntegrityError),
}

/// Errors raised while saving or loading a binary graph artifact.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArtifactError {
    #[error("Could not access '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Serialization failed: {0}")]
    Encode(String),

    #[error("Deserialization failed: {0}")]
    Decode(String),
}

/// Errors that can occur when converting a custom format into a `ProcedureDefinition`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Failed to parse source document: {0}")]
    Json(String),

    #[error("Invalid source document: {0}")]
    ValidationError(String),

    #[error("Node '{node_id}' has an unsupported node type '{type_name}'")]
    UnsupportedNodeType { node_id: String, type_name: String },

    #[error("Node '{node_id}' is malformed: {message}")]
    InvalidNode { node_id: String, message: String },
}
