use super::ValidatedGraph;
use crate::diagnostic::{Diagnostic, DiagnosticCode, ElementRef};
use crate::graph::BlockIdx;
use crate::linearizer::{Sequence, Statement, linearize};

/// Resources held on one linearized path, oldest first, with their holder.
type Held = Vec<(String, BlockIdx)>;

/// Resource pairing along the linearized program.
///
/// Walks every path the way it is emitted: an arm gives back what it acquired
/// when it reaches its branch's join, so only the blocks of one path hold a
/// resource at a time. Acquiring a resource that is still held on the path is
/// a `DuplicateInit`, even when no single holder dominates the block.
pub(super) fn check_pairing(graph: &ValidatedGraph, resources: &[Option<String>]) -> Vec<Diagnostic> {
    let tree = linearize(graph);
    let mut walk = PairingWalk {
        graph,
        resources,
        found: Vec::new(),
    };
    walk.sequence(&tree.root, &mut Held::new());
    walk.found
}

struct PairingWalk<'a> {
    graph: &'a ValidatedGraph,
    resources: &'a [Option<String>],
    found: Vec<Diagnostic>,
}

impl PairingWalk<'_> {
    fn sequence(&mut self, sequence: &Sequence, held: &mut Held) {
        for statement in &sequence.statements {
            match statement {
                Statement::Block(idx) => self.acquire(*idx, held),
                Statement::Branch(branch) => {
                    self.acquire(branch.block, held);
                    for arm in &branch.arms {
                        self.sequence(&arm.body, &mut held.clone());
                    }
                }
            }
        }
    }

    fn acquire(&mut self, idx: BlockIdx, held: &mut Held) {
        let Some(key) = &self.resources[idx.index()] else {
            return;
        };
        let Some((_, holder)) = held.iter().find(|(k, _)| k == key) else {
            held.push((key.clone(), idx));
            return;
        };

        // A block duplicated into several arms is reported once.
        let id = &self.graph.graph().block(idx).id;
        let element = ElementRef::Block {
            id: id.clone(),
            property: None,
        };
        if self.found.iter().any(|d| d.element == element) {
            return;
        }
        let diagnostic = Diagnostic::error(
            DiagnosticCode::DuplicateInit,
            element,
            format!(
                "block '{}' acquires '{}' again while '{}' still holds it on a path reaching it",
                id,
                key,
                self.graph.graph().block(*holder).id
            ),
        );
        tracing::debug!(code = ?diagnostic.code, element = %diagnostic.element, "{}", diagnostic.message);
        self.found.push(diagnostic);
    }
}
