use crate::diagnostic::{Diagnostic, DiagnosticCode, ElementRef};
use crate::emitter::is_c_identifier;
use crate::graph::Graph;
use crate::project::Manifest;
use crate::registry::BlockRegistry;
use ahash::AHashSet;

fn field(name: &str) -> ElementRef {
    ElementRef::Manifest {
        field: name.to_string(),
    }
}

/// Checks the manifest fields on their own.
pub fn validate_manifest(manifest: &Manifest) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut invalid = |name: &str, message: String| {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::InvalidManifestField,
            field(name),
            message,
        ))
    };

    if manifest.name.trim().is_empty() {
        invalid("name", "the application name is required".to_string());
    }
    if manifest.appid.is_empty() {
        invalid("appid", "the application id is required".to_string());
    } else if !manifest
        .appid
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        invalid(
            "appid",
            format!(
                "application id '{}' may only contain lowercase letters, digits and underscores",
                manifest.appid
            ),
        );
    } else if manifest.appid.starts_with(|c: char| c.is_ascii_digit()) {
        // The id prefixes generated C identifiers.
        invalid(
            "appid",
            format!("application id '{}' cannot start with a digit", manifest.appid),
        );
    }
    if manifest.version.trim().is_empty() {
        invalid("version", "the version is required".to_string());
    }
    if !is_c_identifier(&manifest.entry_point) {
        invalid(
            "entry_point",
            format!(
                "entry point '{}' is not a valid C identifier",
                manifest.entry_point
            ),
        );
    }
    if manifest.requires.is_empty() {
        invalid(
            "requires",
            "at least one required subsystem must be listed".to_string(),
        );
    }
    if manifest.stack_size == Some(0) {
        invalid("stack_size", "the stack size cannot be zero".to_string());
    }
    diagnostics
}

/// Every subsystem initialized by a block in the graph must be listed in `requires`.
pub fn check_requirements(
    manifest: &Manifest,
    graph: &Graph,
    registry: &BlockRegistry,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut reported = AHashSet::new();
    for block in graph.blocks() {
        let Ok(kind) = registry.lookup(&block.kind) else {
            continue;
        };
        let Some(subsystem) = &kind.provides else {
            continue;
        };
        if manifest.requires.iter().any(|r| r == subsystem) || !reported.insert(subsystem) {
            continue;
        }
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::MissingRequirement,
            field("requires"),
            format!(
                "block '{}' initializes subsystem '{}', which the manifest does not require",
                block.id, subsystem
            ),
        ));
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Block;

    #[test]
    fn default_manifest_is_valid() {
        assert!(validate_manifest(&Manifest::default()).is_empty());
    }

    #[test]
    fn rejects_malformed_ids() {
        let manifest = Manifest {
            appid: "My App".to_string(),
            entry_point: "3main".to_string(),
            ..Manifest::default()
        };
        let fields: Vec<String> = validate_manifest(&manifest)
            .into_iter()
            .map(|d| d.element.to_string())
            .collect();
        assert_eq!(
            fields,
            vec!["manifest field 'appid'", "manifest field 'entry_point'"]
        );
    }

    #[test]
    fn init_blocks_need_their_subsystem_listed() {
        let registry = BlockRegistry::standard().unwrap();
        let graph = Graph::new(
            vec![
                Block::new("start", "app_on_start"),
                Block::new("fs", "storage_init"),
                Block::new("fs2", "storage_init"),
                Block::new("screen", "gui_init"),
            ],
            vec![],
        );
        let diagnostics = check_requirements(&Manifest::default(), &graph, &registry);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::MissingRequirement);
        assert!(diagnostics[0].message.contains("'fs'"));
    }
}
