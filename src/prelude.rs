//! Prelude module for convenient imports
//!
//! Re-exports the types needed to load a registry, read a project and compile it.
//!
//! # Example
//!
//! ```rust,no_run
//! use flipscript::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let registry = BlockRegistry::standard()?;
//! let project = Project::from_json(&std::fs::read_to_string("path/to/project.json")?)?;
//!
//! let compiler = Compiler::builder(&registry).build();
//! match compiler.compile(&project) {
//!     Ok(output) => std::fs::write("app.c", output.source())?,
//!     Err(CompileError::Invalid(diagnostics)) => {
//!         for diagnostic in diagnostics {
//!             eprintln!("{}", diagnostic);
//!         }
//!     }
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

// Pipeline
pub use crate::compiler::{Analysis, CompileOutput, Compiler, CompilerBuilder};
pub use crate::emitter::{EmittedProgram, emit};
pub use crate::linearizer::{StatementTree, linearize, visualize};
pub use crate::validator::{ValidatedGraph, validate};

// Models
pub use crate::graph::{Block, BlockIdx, Connection, ConnectorRef, Graph};
pub use crate::project::{IntoGraph, Manifest, Project};
pub use crate::registry::{BlockRegistry, BlockRole, BlockTypeDefinition};

// Diagnostics and errors
pub use crate::diagnostic::{Diagnostic, DiagnosticCategory, DiagnosticCode, Severity};
pub use crate::error::{CompileError, EmitError, ProjectError, RegistryError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
