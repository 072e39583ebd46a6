//! Common test utilities for building projects and graphs.
use flipscript::prelude::*;
use flipscript::project::{BlockRecord, Canvas, ConnectionRecord, EndpointRecord};
use serde_json::{Map, Value};

/// Loads the built-in registry.
#[allow(dead_code)]
pub fn registry() -> BlockRegistry {
    BlockRegistry::standard().expect("built-in catalog must load")
}

/// Installs a test subscriber so `RUST_LOG=debug` shows pipeline logs.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Incrementally assembles a `Project` document.
#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub struct ProjectBuilder {
    manifest: Manifest,
    blocks: Vec<BlockRecord>,
    connections: Vec<ConnectionRecord>,
}

#[allow(dead_code)]
impl ProjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(self, id: &str, kind: &str) -> Self {
        self.block_with(id, kind, Value::Null)
    }

    /// Adds a block; `properties` must be a JSON object (or null for none).
    pub fn block_with(mut self, id: &str, kind: &str, properties: Value) -> Self {
        let properties = match properties {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.blocks.push(BlockRecord {
            id: id.to_string(),
            kind: kind.to_string(),
            properties,
            position: None,
        });
        self
    }

    /// Connects `from.port` to the `in` connector of `to`.
    pub fn link(self, from: &str, port: &str, to: &str) -> Self {
        self.connect(from, port, to, "in")
    }

    pub fn connect(mut self, from: &str, from_port: &str, to: &str, to_port: &str) -> Self {
        self.connections.push(ConnectionRecord {
            from: EndpointRecord {
                block: from.to_string(),
                port: from_port.to_string(),
            },
            to: EndpointRecord {
                block: to.to_string(),
                port: to_port.to_string(),
            },
        });
        self
    }

    pub fn requires(mut self, subsystems: &[&str]) -> Self {
        self.manifest.requires = subsystems.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn build(self) -> Project {
        Project {
            manifest: self.manifest,
            canvas: Canvas {
                blocks: self.blocks,
                connections: self.connections,
            },
            ..Project::default()
        }
    }

    pub fn graph(self) -> Graph {
        self.build().into_graph().expect("project converts")
    }
}

/// A straight-line program: each block's `next` feeds the following block.
#[allow(dead_code)]
pub fn chain(blocks: &[(&str, &str)]) -> ProjectBuilder {
    let mut builder = ProjectBuilder::new();
    for (id, kind) in blocks {
        builder = builder.block(id, kind);
    }
    for pair in blocks.windows(2) {
        builder = builder.link(pair[0].0, "next", pair[1].0);
    }
    builder
}

/// start -> gui_init -> <branch> with two arms reconverging on `done` (exit).
///
/// The `out_true` arm runs `bump` (counter_add); `out_false` goes straight to `done`.
#[allow(dead_code)]
pub fn diamond() -> ProjectBuilder {
    ProjectBuilder::new()
        .block("start", "app_on_start")
        .block("screen", "gui_init")
        .block("check", "counter_compare")
        .block("bump", "counter_add")
        .block("done", "app_exit")
        .link("start", "next", "screen")
        .link("screen", "next", "check")
        .link("check", "out_true", "bump")
        .link("check", "out_false", "done")
        .link("bump", "next", "done")
}

#[allow(dead_code)]
pub fn codes(diagnostics: &[Diagnostic]) -> Vec<DiagnosticCode> {
    diagnostics.iter().map(|d| d.code).collect()
}

/// Returns the diagnostics of a graph that is expected to be rejected.
#[allow(dead_code)]
pub fn rejected(graph: Graph) -> Vec<Diagnostic> {
    match validate(graph, &registry()) {
        Ok(validated) => panic!(
            "graph unexpectedly valid, warnings: {:?}",
            validated.warnings()
        ),
        Err(diagnostics) => diagnostics,
    }
}

/// Returns the validated form of a graph that is expected to pass.
#[allow(dead_code)]
pub fn accepted(graph: Graph) -> ValidatedGraph {
    match validate(graph, &registry()) {
        Ok(validated) => validated,
        Err(diagnostics) => panic!("graph unexpectedly invalid: {:#?}", diagnostics),
    }
}

/// Compiles a project with the built-in registry, panicking on failure.
#[allow(dead_code)]
pub fn compile_source(project: &Project) -> String {
    let registry = registry();
    match flipscript::compile(project, &registry) {
        Ok(output) => output.source().to_string(),
        Err(e) => panic!("compilation failed: {} {:#?}", e, e.diagnostics()),
    }
}

/// Byte offset of `needle` in `haystack`, panicking with context when absent.
#[allow(dead_code)]
pub fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("'{}' not found in:\n{}", needle, haystack))
}
