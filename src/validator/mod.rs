//! Structural, schema and ordering checks on a block graph.
//!
//! Validation never stops at the first problem: every pass runs (as far as the
//! earlier passes leave enough information for it to be meaningful) and all
//! diagnostics are returned together. A [`ValidatedGraph`] is only produced
//! when none of them is an error.

mod dominance;
mod manifest;
mod ordering;
mod pairing;
mod schema;
mod structure;

pub use manifest::{check_requirements, validate_manifest};

use crate::diagnostic::{Diagnostic, has_errors};
use crate::graph::{BlockIdx, Graph};
use crate::registry::{BlockRegistry, BlockRole, BlockTypeDefinition, PropertyValue};
use ahash::AHashMap;

/// Resolved properties of one block, keyed by property id.
pub type ResolvedProperties = AHashMap<String, PropertyValue>;

/// A control-flow link whose endpoints both exist and are well formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Edge {
    pub output: String,
    pub target: BlockIdx,
}

/// Working state shared by the validation passes.
pub(crate) struct ValidationContext<'a> {
    pub graph: &'a Graph,
    pub kinds: Vec<Option<&'a BlockTypeDefinition>>,
    /// Blocks hidden behind an earlier block with the same id.
    pub shadowed: Vec<bool>,
    pub edges: Vec<Vec<Edge>>,
    pub incoming: Vec<Vec<BlockIdx>>,
    pub properties: Vec<ResolvedProperties>,
    pub entry: Option<BlockIdx>,
    pub reachable: Vec<bool>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> ValidationContext<'a> {
    fn new(graph: &'a Graph) -> Self {
        let n = graph.len();
        Self {
            graph,
            kinds: vec![None; n],
            shadowed: vec![false; n],
            edges: vec![Vec::new(); n],
            incoming: vec![Vec::new(); n],
            properties: vec![ResolvedProperties::new(); n],
            entry: None,
            reachable: vec![false; n],
            diagnostics: Vec::new(),
        }
    }

    pub fn id(&self, idx: BlockIdx) -> &'a str {
        &self.graph.block(idx).id
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(code = ?diagnostic.code, element = %diagnostic.element, "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    /// Adjacency over well-formed edges, as arena indices.
    pub fn successor_indices(&self) -> Vec<Vec<usize>> {
        self.edges
            .iter()
            .map(|edges| edges.iter().map(|e| e.target.index()).collect())
            .collect()
    }
}

/// A graph that passed validation, together with everything later phases need.
#[derive(Debug, Clone)]
pub struct ValidatedGraph {
    graph: Graph,
    entry: BlockIdx,
    roles: Vec<BlockRole>,
    kinds: Vec<String>,
    successors: Vec<Vec<(String, Option<BlockIdx>)>>,
    properties: Vec<ResolvedProperties>,
    warnings: Vec<Diagnostic>,
}

impl ValidatedGraph {
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn entry(&self) -> BlockIdx {
        self.entry
    }

    pub fn role(&self, idx: BlockIdx) -> BlockRole {
        self.roles[idx.index()]
    }

    /// The registered kind id of a block, with aliases resolved.
    pub fn kind(&self, idx: BlockIdx) -> &str {
        &self.kinds[idx.index()]
    }

    /// One `(output connector, target)` pair per output, in declaration order.
    pub fn successors(&self, idx: BlockIdx) -> &[(String, Option<BlockIdx>)] {
        &self.successors[idx.index()]
    }

    /// The target of a single-output block's only output.
    pub fn next(&self, idx: BlockIdx) -> Option<BlockIdx> {
        self.successors(idx).first().and_then(|(_, target)| *target)
    }

    pub fn properties(&self, idx: BlockIdx) -> &ResolvedProperties {
        &self.properties[idx.index()]
    }

    /// Non-fatal diagnostics found during validation.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }
}

/// Validates a graph against the registry.
///
/// Returns every diagnostic found when at least one of them is an error.
pub fn validate(graph: Graph, registry: &BlockRegistry) -> Result<ValidatedGraph, Vec<Diagnostic>> {
    let mut ctx = ValidationContext::new(&graph);

    structure::check_blocks(&mut ctx, registry);
    schema::check_properties(&mut ctx);
    structure::check_connections(&mut ctx);
    structure::check_entry(&mut ctx);
    let has_cycle = structure::check_cycles(&mut ctx);
    if ctx.entry.is_some() {
        structure::check_reachability(&mut ctx);
        structure::check_terminals(&mut ctx);
        if !has_cycle {
            ordering::check_ordering(&mut ctx);
        }
    }

    let diagnostics = std::mem::take(&mut ctx.diagnostics);
    tracing::debug!(
        blocks = graph.len(),
        connections = graph.connections().len(),
        diagnostics = diagnostics.len(),
        "graph validated"
    );
    if has_errors(&diagnostics) {
        return Err(diagnostics);
    }

    // No errors means every block has a registered kind and there is a single entry.
    let Some(entry) = ctx.entry else {
        return Err(diagnostics);
    };
    let mut roles = Vec::with_capacity(graph.len());
    let mut kinds = Vec::with_capacity(graph.len());
    let mut successors = Vec::with_capacity(graph.len());
    let mut resources = Vec::with_capacity(graph.len());
    for idx in graph.indices() {
        let Some(kind) = ctx.kinds[idx.index()] else {
            return Err(diagnostics);
        };
        roles.push(kind.role);
        kinds.push(kind.id.clone());
        resources.push(kind.resource.as_ref().map(|r| r.key.clone()));
        successors.push(
            kind.outputs
                .iter()
                .map(|output| {
                    let target = ctx.edges[idx.index()]
                        .iter()
                        .find(|edge| edge.output == output.id)
                        .map(|edge| edge.target);
                    (output.id.clone(), target)
                })
                .collect(),
        );
    }
    let properties = std::mem::take(&mut ctx.properties);
    drop(ctx);

    let validated = ValidatedGraph {
        graph,
        entry,
        roles,
        kinds,
        successors,
        properties,
        warnings: diagnostics,
    };

    // Pairing follows the linearized paths, so it needs a well-formed graph.
    let conflicts = pairing::check_pairing(&validated, &resources);
    if !conflicts.is_empty() {
        let mut diagnostics = validated.warnings;
        diagnostics.extend(conflicts);
        return Err(diagnostics);
    }
    Ok(validated)
}
