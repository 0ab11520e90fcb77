//! # Annai - Guided Dialogue Compiler and Interpreter
//!
//! **Annai** turns a declarative, hierarchical description of a multi-step
//! guided procedure (nested groups, conditional switches, prompts, inputs and
//! confirmations) into a flat dialogue graph, then walks that graph as a
//! state machine that drives a turn-based conversation.
//!
//! ## Core Workflow
//!
//! 1.  **Load Your Procedure**: Deserialize a `ProcedureDefinition`, convert an authoring-tool
//!     configuration document with `ConfigurationDocument`, or implement `IntoProcedure` for your own format.
//! 2.  **Compile**: Use `Compiler::builder` to flatten the tree into a `DialogueGraph` of numbered
//!     screens with complete transition tables. Compilation is deterministic and all-or-nothing.
//! 3.  **Cache (optional)**: Write the graph as a JSON graph document, or as a binary artifact with `save`.
//! 4.  **Run**: Build an `Interpreter` over the graph and open a `Session` per conversation. A
//!     `PresentationAdapter` renders prompts and supplies responses.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use annai::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let json = std::fs::read_to_string("data/atm_configuration.json")?;
//!     let procedure = ConfigurationDocument::from_json(&json)?
//!         .with_ceiling("payoutAmount", 200_000.0)
//!         .into_procedure()?;
//!
//!     let graph = Compiler::builder(procedure).build().compile()?;
//!     println!("Compiled {} screens", graph.len());
//!
//!     let interpreter = Interpreter::new(&graph)?;
//!     let mut session = interpreter.session();
//!     let mut adapter = ScriptedAdapter::new(["日本語", "払出", "5000", "確認"]);
//!
//!     match session.run(&mut adapter)? {
//!         StepOutcome::Finished { end, .. } => println!("-> Finished: {}", end),
//!         outcome => println!("-> Stopped: {:?}", outcome),
//!     }
//!     println!("{}", session.snapshot().to_json()?);
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod error;
pub mod graph;
pub mod interpreter;
pub mod prelude;
pub mod render;
pub mod source;
