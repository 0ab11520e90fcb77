use super::definition::ProcedureDefinition;
use crate::error::ConversionError;

/// A trait for custom data models that can be converted into a `ProcedureDefinition`.
///
/// This is the extension point for making the compiler format-agnostic. By
/// implementing this trait on your own authoring-tool structs, you provide a
/// translation layer into the canonical procedure tree.
///
/// # Example
///
/// ```rust,no_run
/// use annai::prelude::*;
///
/// struct MyStep { key: String, question: String, code: String }
/// struct MyScript { steps: Vec<MyStep> }
///
/// impl IntoProcedure for MyScript {
///     fn into_procedure(self) -> Result<ProcedureDefinition, ConversionError> {
///         let workflow = self
///             .steps
///             .into_iter()
///             .map(|step| {
///                 SourceNode::regular(
///                     step.key.clone(),
///                     step.question.clone(),
///                     RegularNode {
///                         nav_text: Some(step.question),
///                         items: vec![Item::ChoiceField(ChoiceField {
///                             field: step.key,
///                             code_id: step.code,
///                         })],
///                         ..RegularNode::default()
///                     },
///                 )
///             })
///             .collect();
///         Ok(ProcedureDefinition { workflow, ..ProcedureDefinition::default() })
///     }
/// }
/// ```
pub trait IntoProcedure {
    /// Consumes the object and converts it into a compilable procedure.
    fn into_procedure(self) -> Result<ProcedureDefinition, ConversionError>;
}

impl IntoProcedure for ProcedureDefinition {
    fn into_procedure(self) -> Result<ProcedureDefinition, ConversionError> {
        Ok(self)
    }
}
