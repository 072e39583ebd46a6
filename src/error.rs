use crate::diagnostic::Diagnostic;
use thiserror::Error;

/// Errors raised while loading or querying the block type registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Failed to parse block catalog: {0}")]
    CatalogParse(String),

    #[error("Block kind '{0}' is not registered")]
    UnknownBlockKind(String),

    #[error("Block registry is misconfigured: {0}")]
    RegistryMisconfigured(String),

    #[error("Block kind '{kind}' has an invalid definition: {message}")]
    InvalidDefinition { kind: String, message: String },
}

/// Errors raised while reading a serialized project description.
#[derive(Error, Debug, Clone)]
pub enum ProjectError {
    #[error("Failed to parse project JSON: {0}")]
    JsonParseError(String),

    #[error("Invalid project data: {0}")]
    ConversionError(String),
}

/// Internal errors raised by the code emitter.
///
/// These only occur on a graph that already passed validation, so they point at
/// a defect in a block template or in the registry rather than in the user's
/// graph, or at a manifest whose checks were skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmitError {
    #[error("Block '{block_id}' leaves resource '{resource}' unpaired: {message}")]
    UnpairedResource {
        block_id: String,
        resource: String,
        message: String,
    },

    #[error(
        "Declaration '{key}' requested by block '{block_id}' conflicts with an earlier declaration of the same key"
    )]
    DeclarationConflict { key: String, block_id: String },

    #[error("Manifest field '{field}' value '{value}' is not a valid C identifier")]
    InvalidIdentifier { field: String, value: String },

    #[error("Template of block kind '{kind}' cannot be rendered: {message}")]
    TemplateError { kind: String, message: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors returned by the full compilation pipeline.
#[derive(Error, Debug, Clone)]
pub enum CompileError {
    /// The graph or manifest is invalid; every problem found is listed.
    #[error("Project is invalid ({} problem(s) found)", .0.len())]
    Invalid(Vec<Diagnostic>),

    /// An internal emission defect on an already validated graph.
    #[error("Internal emission error: {0}")]
    Emission(#[from] EmitError),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl CompileError {
    /// The user-facing diagnostics carried by this error, if any.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Invalid(diagnostics) => diagnostics,
            _ => &[],
        }
    }
}
