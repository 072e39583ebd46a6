use super::{Edge, ValidationContext};
use crate::diagnostic::{Diagnostic, DiagnosticCode, ElementRef};
use crate::graph::{BlockIdx, ConnectorRef, Direction};
use crate::registry::{BlockRegistry, BlockRole, BlockTypeDefinition};
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;

fn block_ref(id: &str) -> ElementRef {
    ElementRef::Block {
        id: id.to_string(),
        property: None,
    }
}

/// Duplicate ids and kind resolution.
pub(super) fn check_blocks<'a>(ctx: &mut ValidationContext<'a>, registry: &'a BlockRegistry) {
    let graph = ctx.graph;
    for idx in graph.indices() {
        let block = graph.block(idx);
        if block.id.trim().is_empty() {
            ctx.push(Diagnostic::error(
                DiagnosticCode::InvalidBlockId,
                block_ref(&block.id),
                format!("block #{} has a blank id", idx.index()),
            ));
        }
        if graph.find(&block.id) != Some(idx) {
            ctx.shadowed[idx.index()] = true;
            ctx.push(Diagnostic::error(
                DiagnosticCode::DuplicateBlockId,
                block_ref(&block.id),
                format!("block id '{}' is used by more than one block", block.id),
            ));
            continue;
        }
        match registry.lookup(&block.kind) {
            Ok(kind) => ctx.kinds[idx.index()] = Some(kind),
            Err(_) => ctx.push(Diagnostic::error(
                DiagnosticCode::UnknownBlockKind,
                block_ref(&block.id),
                format!("block '{}' has unknown kind '{}'", block.id, block.kind),
            )),
        }
    }
}

/// Endpoint resolution, connector names and directions, duplicates and arity.
///
/// Connections that pass are recorded as edges for the graph passes.
pub(super) fn check_connections(ctx: &mut ValidationContext) {
    let mut seen: AHashSet<(BlockIdx, &str, BlockIdx, &str)> = AHashSet::new();
    let mut outputs_used: AHashMap<(BlockIdx, &str), usize> = AHashMap::new();
    let mut inputs_used: AHashMap<(BlockIdx, &str), usize> = AHashMap::new();

    let graph = ctx.graph;
    for (index, connection) in graph.connections().iter().enumerate() {
        let element = ElementRef::Connection { index };
        let (Some(from), Some(to)) = (
            resolve(ctx, &connection.from, index),
            resolve(ctx, &connection.to, index),
        ) else {
            continue;
        };
        let from_kind = ctx.kinds[from.index()];
        let to_kind = ctx.kinds[to.index()];

        if let Some(kind) = from_kind {
            if let Err(diagnostic) = check_connector(kind, &connection.from, index) {
                ctx.push(diagnostic);
                continue;
            }
        }
        let mut merge_input = false;
        if let Some(kind) = to_kind {
            if let Err(diagnostic) = check_connector(kind, &connection.to, index) {
                ctx.push(diagnostic);
                continue;
            }
            merge_input = kind
                .input(&connection.to.connector)
                .is_some_and(|input| input.merge);
        }

        let from_port = connection.from.connector.as_str();
        let to_port = connection.to.connector.as_str();
        if !seen.insert((from, from_port, to, to_port)) {
            ctx.push(Diagnostic::error(
                DiagnosticCode::DuplicateConnection,
                element,
                format!("connection {} is declared more than once", connection),
            ));
            continue;
        }
        if let Some(first) = outputs_used.get(&(from, from_port)) {
            ctx.push(Diagnostic::error(
                DiagnosticCode::ArityViolation,
                element,
                format!(
                    "output {} is already connected by connection #{}",
                    connection.from, first
                ),
            ));
            continue;
        }
        if let Some(first) = inputs_used.get(&(to, to_port)) {
            if !merge_input {
                ctx.push(Diagnostic::error(
                    DiagnosticCode::ArityViolation,
                    element,
                    format!(
                        "input {} accepts a single connection and is already connected by connection #{}",
                        connection.to, first
                    ),
                ));
                continue;
            }
        }

        outputs_used.insert((from, from_port), index);
        inputs_used.entry((to, to_port)).or_insert(index);
        ctx.edges[from.index()].push(Edge {
            output: connection.from.connector.clone(),
            target: to,
        });
        ctx.incoming[to.index()].push(from);
    }
}

fn resolve(ctx: &mut ValidationContext, endpoint: &ConnectorRef, index: usize) -> Option<BlockIdx> {
    let found = ctx.graph.find(&endpoint.block);
    if found.is_none() {
        let side = match endpoint.direction {
            Direction::Out => "source",
            Direction::In => "destination",
        };
        ctx.push(Diagnostic::error(
            DiagnosticCode::DanglingConnection,
            ElementRef::Connection { index },
            format!("{} block '{}' does not exist", side, endpoint.block),
        ));
    }
    found
}

fn check_connector(
    kind: &BlockTypeDefinition,
    endpoint: &ConnectorRef,
    index: usize,
) -> Result<(), Diagnostic> {
    let name = endpoint.connector.as_str();
    let (expected, opposite, wanted, other) = match endpoint.direction {
        Direction::Out => (kind.output(name), kind.input(name), "output", "input"),
        Direction::In => (kind.input(name), kind.output(name), "input", "output"),
    };
    if expected.is_some() {
        return Ok(());
    }
    let element = ElementRef::Connection { index };
    if opposite.is_some() {
        Err(Diagnostic::error(
            DiagnosticCode::WrongConnectorDirection,
            element,
            format!(
                "{} is an {} of kind '{}' but is used as an {}",
                endpoint, other, kind.id, wanted
            ),
        ))
    } else {
        Err(Diagnostic::error(
            DiagnosticCode::UnknownConnector,
            element,
            format!("kind '{}' has no {} named '{}'", kind.id, wanted, name),
        ))
    }
}

/// Exactly one entry block, with nothing flowing into it.
pub(super) fn check_entry(ctx: &mut ValidationContext) {
    let entries: Vec<BlockIdx> = ctx
        .graph
        .indices()
        .filter(|idx| {
            ctx.kinds[idx.index()].is_some_and(|kind| kind.role == BlockRole::Entry)
        })
        .collect();

    match entries.as_slice() {
        [] => ctx.push(Diagnostic::error(
            DiagnosticCode::MissingEntry,
            ElementRef::Graph,
            "the program has no entry block",
        )),
        [first, rest @ ..] => {
            let first_id = ctx.id(*first);
            for extra in rest {
                let id = ctx.id(*extra);
                ctx.push(Diagnostic::error(
                    DiagnosticCode::DuplicateEntry,
                    block_ref(id),
                    format!(
                        "block '{}' is a second entry block (the first is '{}')",
                        id, first_id
                    ),
                ));
            }
            if rest.is_empty() {
                ctx.entry = Some(*first);
            }
            if !ctx.incoming[first.index()].is_empty() {
                ctx.push(Diagnostic::error(
                    DiagnosticCode::EntryHasIncoming,
                    block_ref(first_id),
                    format!("entry block '{}' has incoming connections", first_id),
                ));
            }
        }
    }
}

/// Every block must be reachable from the entry.
pub(super) fn check_reachability(ctx: &mut ValidationContext) {
    let Some(entry) = ctx.entry else {
        return;
    };
    let mut queue = VecDeque::from([entry]);
    ctx.reachable[entry.index()] = true;
    while let Some(idx) = queue.pop_front() {
        for edge in &ctx.edges[idx.index()] {
            if !ctx.reachable[edge.target.index()] {
                ctx.reachable[edge.target.index()] = true;
                queue.push_back(edge.target);
            }
        }
    }

    for idx in ctx.graph.indices() {
        if ctx.reachable[idx.index()] || ctx.shadowed[idx.index()] {
            continue;
        }
        let id = ctx.id(idx);
        ctx.push(Diagnostic::error(
            DiagnosticCode::UnreachableBlock,
            block_ref(id),
            format!("block '{}' cannot be reached from the entry block", id),
        ));
    }
}

/// Reports each block that closes a cycle. Returns whether any cycle exists.
pub(super) fn check_cycles(ctx: &mut ValidationContext) -> bool {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }

    let n = ctx.graph.len();
    let mut marks = vec![Mark::New; n];
    let mut closing: Vec<BlockIdx> = Vec::new();

    for root in ctx.graph.indices() {
        if marks[root.index()] != Mark::New {
            continue;
        }
        // (block, next edge to explore)
        let mut stack = vec![(root, 0usize)];
        marks[root.index()] = Mark::Active;
        while let Some((idx, cursor)) = stack.last_mut() {
            let edges = &ctx.edges[idx.index()];
            if *cursor == edges.len() {
                marks[idx.index()] = Mark::Done;
                stack.pop();
                continue;
            }
            let target = edges[*cursor].target;
            *cursor += 1;
            match marks[target.index()] {
                Mark::New => {
                    marks[target.index()] = Mark::Active;
                    stack.push((target, 0));
                }
                Mark::Active => {
                    if !closing.contains(&target) {
                        closing.push(target);
                    }
                }
                Mark::Done => {}
            }
        }
    }

    for idx in &closing {
        let id = ctx.id(*idx);
        ctx.push(Diagnostic::error(
            DiagnosticCode::CycleDetected,
            block_ref(id),
            format!("control flow loops back to block '{}'", id),
        ));
    }
    !closing.is_empty()
}

/// Warns about paths that stop somewhere other than an exit block.
pub(super) fn check_terminals(ctx: &mut ValidationContext) {
    for idx in ctx.graph.indices() {
        if !ctx.reachable[idx.index()] {
            continue;
        }
        let Some(kind) = ctx.kinds[idx.index()] else {
            continue;
        };
        if kind.role == BlockRole::Exit {
            continue;
        }
        let id = ctx.id(idx);
        let open: Vec<&str> = kind
            .outputs
            .iter()
            .map(|output| output.id.as_str())
            .filter(|output| !ctx.edges[idx.index()].iter().any(|e| e.output == *output))
            .collect();
        if kind.outputs.is_empty() {
            ctx.push(Diagnostic::warning(
                DiagnosticCode::PathWithoutExit,
                block_ref(id),
                format!("path ends at block '{}', which is not an exit block", id),
            ));
        }
        for output in open {
            ctx.push(Diagnostic::warning(
                DiagnosticCode::PathWithoutExit,
                block_ref(id),
                format!(
                    "output '{}' of block '{}' is not connected; the program returns there",
                    output, id
                ),
            ));
        }
    }
}
