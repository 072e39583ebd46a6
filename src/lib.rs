//! # flipscript - Block Graph Compiler for Flipper Zero Applications
//!
//! **flipscript** turns a visually assembled program (a directed graph of typed
//! building blocks joined by control-flow links) into a single C translation
//! unit for the Flipper Zero firmware API.
//!
//! ## Core Workflow
//!
//! The compiler operates on a canonical graph model and is agnostic of the
//! editor that produced it. The pipeline is:
//!
//! 1.  **Load the Registry**: `BlockRegistry::standard()` (or `from_json`) loads the
//!     immutable catalog of block kinds: connectors, property schemas, subsystem
//!     ordering rules, resource teardowns and code templates.
//! 2.  **Load a Project**: parse the editor's JSON document into a `Project`, or implement
//!     `IntoGraph` for your own format.
//! 3.  **Validate**: structural, schema, ordering and manifest checks report every problem
//!     at once as `Diagnostic`s.
//! 4.  **Linearize**: branches and their reconvergence points become a `StatementTree` of
//!     structured, sequential statements.
//! 5.  **Emit**: templates are instantiated, global declarations hoisted, and every
//!     acquired resource released before each exit.
//!
//! ## Quick Start
//!
//! ```rust
//! use flipscript::prelude::*;
//!
//! let registry = BlockRegistry::standard().unwrap();
//! let project = Project::from_json(r#"{
//!     "manifest": { "name": "Hello", "appid": "hello", "version": "1.0", "requires": ["gui"] },
//!     "canvas": {
//!         "blocks": [
//!             { "id": "start", "type": "app_on_start" },
//!             { "id": "screen", "type": "gui_init" },
//!             { "id": "greet", "type": "display_text", "properties": { "text": "Hi!" } },
//!             { "id": "draw", "type": "refresh_display" },
//!             { "id": "wait", "type": "wait_for_input" },
//!             { "id": "stop", "type": "app_exit" }
//!         ],
//!         "connections": [
//!             { "from": { "block": "start", "port": "next" }, "to": { "block": "screen", "port": "in" } },
//!             { "from": { "block": "screen", "port": "next" }, "to": { "block": "greet", "port": "in" } },
//!             { "from": { "block": "greet", "port": "next" }, "to": { "block": "draw", "port": "in" } },
//!             { "from": { "block": "draw", "port": "next" }, "to": { "block": "wait", "port": "in" } },
//!             { "from": { "block": "wait", "port": "next" }, "to": { "block": "stop", "port": "in" } }
//!         ]
//!     }
//! }"#).unwrap();
//!
//! let output = flipscript::compile(&project, &registry).unwrap();
//! assert!(output.source().contains("int32_t app_main(void* p)"));
//! assert!(output.warnings.is_empty());
//! ```

pub mod compiler;
pub mod diagnostic;
pub mod emitter;
pub mod error;
pub mod graph;
pub mod linearizer;
pub mod prelude;
pub mod project;
pub mod registry;
pub mod validator;

use compiler::{CompileOutput, Compiler};
use diagnostic::Diagnostic;
use error::CompileError;
use project::Project;
use registry::BlockRegistry;

/// Compiles a project with default settings.
pub fn compile(project: &Project, registry: &BlockRegistry) -> Result<CompileOutput, CompileError> {
    Compiler::builder(registry).build().compile(project)
}

/// Returns every diagnostic for a project, warnings included, without emitting code.
pub fn validate(project: &Project, registry: &BlockRegistry) -> Vec<Diagnostic> {
    Compiler::builder(registry).build().validate(project)
}
