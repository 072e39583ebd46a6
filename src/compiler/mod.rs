use crate::diagnostic::{Diagnostic, DiagnosticCode, ElementRef, has_errors};
use crate::emitter::{self, Declaration, EmittedProgram};
use crate::error::CompileError;
use crate::linearizer::{self, StatementTree};
use crate::project::{IntoGraph, Project};
use crate::registry::BlockRegistry;
use crate::validator::{self, ValidatedGraph};
use std::borrow::Cow;

/// Everything known about a project once it has been validated and linearized.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub graph: ValidatedGraph,
    pub tree: StatementTree,
    /// Warnings from the manifest and graph checks.
    pub warnings: Vec<Diagnostic>,
}

/// The result of a successful compilation.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub program: EmittedProgram,
    pub warnings: Vec<Diagnostic>,
}

impl CompileOutput {
    pub fn source(&self) -> &str {
        &self.program.source
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.program.declarations
    }
}

/// Drives a project through validation, linearization and emission.
///
/// A compiler borrows an immutable registry, so one registry can serve many
/// compilations, on any number of threads.
pub struct Compiler<'r> {
    registry: Cow<'r, BlockRegistry>,
    check_manifest: bool,
    deny_warnings: bool,
}

pub struct CompilerBuilder<'r> {
    registry: Cow<'r, BlockRegistry>,
    check_manifest: bool,
    deny_warnings: bool,
}

impl<'r> CompilerBuilder<'r> {
    pub fn new(registry: &'r BlockRegistry) -> Self {
        Self {
            registry: Cow::Borrowed(registry),
            check_manifest: true,
            deny_warnings: false,
        }
    }

    /// Accepts `user_kind` in projects as another name for `registered_kind`.
    /// Unknown targets are ignored with a warning.
    pub fn with_kind_alias(mut self, user_kind: &str, registered_kind: &str) -> Self {
        match self.registry.clone().into_owned().with_alias(user_kind, registered_kind) {
            Ok(registry) => self.registry = Cow::Owned(registry),
            Err(e) => tracing::warn!(alias = user_kind, "ignoring kind alias: {}", e),
        }
        self
    }

    /// Skips the manifest field and requirement checks.
    pub fn without_manifest_checks(mut self) -> Self {
        self.check_manifest = false;
        self
    }

    /// Treats warning diagnostics as fatal.
    pub fn deny_warnings(mut self) -> Self {
        self.deny_warnings = true;
        self
    }

    pub fn build(self) -> Compiler<'r> {
        Compiler {
            registry: self.registry,
            check_manifest: self.check_manifest,
            deny_warnings: self.deny_warnings,
        }
    }
}

impl<'r> Compiler<'r> {
    pub fn builder(registry: &'r BlockRegistry) -> CompilerBuilder<'r> {
        CompilerBuilder::new(registry)
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Runs every check and returns all diagnostics, warnings included.
    pub fn validate(&self, project: &Project) -> Vec<Diagnostic> {
        diagnostics_of(self.analyze(project))
    }

    /// Validates and linearizes a project without emitting code.
    pub fn analyze(&self, project: &Project) -> Result<Analysis, CompileError> {
        let registry = self.registry.as_ref();
        let graph = project.into_graph()?;
        tracing::info!(
            app = %project.manifest.appid,
            blocks = graph.len(),
            connections = graph.connections().len(),
            "validating project"
        );

        let mut diagnostics = Vec::new();
        if self.check_manifest {
            diagnostics.extend(validator::validate_manifest(&project.manifest));
            diagnostics.extend(validator::check_requirements(
                &project.manifest,
                &graph,
                registry,
            ));
        }
        let validated = match validator::validate(graph, registry) {
            Ok(validated) => {
                diagnostics.extend(validated.warnings().iter().cloned());
                Some(validated)
            }
            Err(found) => {
                diagnostics.extend(found);
                None
            }
        };

        let fatal = has_errors(&diagnostics) || (self.deny_warnings && !diagnostics.is_empty());
        let Some(validated) = validated.filter(|_| !fatal) else {
            tracing::info!(problems = diagnostics.len(), "project rejected");
            return Err(CompileError::Invalid(diagnostics));
        };
        for warning in &diagnostics {
            tracing::warn!(code = ?warning.code, element = %warning.element, "{}", warning.message);
        }

        let tree = linearizer::linearize(&validated);
        tracing::info!(statements = tree.blocks().len(), "project linearized");
        Ok(Analysis {
            graph: validated,
            tree,
            warnings: diagnostics,
        })
    }

    /// Compiles a project into C source.
    pub fn compile(&self, project: &Project) -> Result<CompileOutput, CompileError> {
        let analysis = self.analyze(project)?;
        let program = emitter::emit(
            &analysis.tree,
            &analysis.graph,
            self.registry.as_ref(),
            &project.manifest,
        )?;
        tracing::info!(
            bytes = program.source.len(),
            declarations = program.declarations.len(),
            "program emitted"
        );
        Ok(CompileOutput {
            program,
            warnings: analysis.warnings,
        })
    }

    /// Parses a project document and compiles it.
    pub fn compile_json(&self, json: &str) -> Result<CompileOutput, CompileError> {
        let project = Project::from_json(json)?;
        self.compile(&project)
    }
}

/// Flattens an analysis result into diagnostics; a failure that carries none
/// is reported against the whole graph.
fn diagnostics_of(result: Result<Analysis, CompileError>) -> Vec<Diagnostic> {
    match result {
        Ok(analysis) => analysis.warnings,
        Err(CompileError::Invalid(diagnostics)) => diagnostics,
        Err(e) => {
            tracing::error!("project could not be analyzed: {}", e);
            vec![Diagnostic::error(
                DiagnosticCode::AnalysisFailed,
                ElementRef::Graph,
                e.to_string(),
            )]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProjectError;

    #[test]
    fn failed_analysis_is_not_reported_as_clean() {
        let err = CompileError::Project(ProjectError::ConversionError("no canvas".to_string()));
        let diagnostics = diagnostics_of(Err(err));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::AnalysisFailed);
        assert_eq!(diagnostics[0].element, ElementRef::Graph);
        assert!(diagnostics[0].is_error());
        assert!(diagnostics[0].message.contains("no canvas"));
    }
}
