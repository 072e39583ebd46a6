use super::ValidationContext;
use super::dominance::DominatorTree;
use crate::diagnostic::{Diagnostic, DiagnosticCode, ElementRef};
use crate::graph::BlockIdx;
use itertools::Itertools;

/// Subsystem initialization order.
///
/// Every block that requires a subsystem must be dominated by a block that
/// provides it, and a resource may not be acquired again on a path that
/// already holds it.
pub(super) fn check_ordering(ctx: &mut ValidationContext) {
    let Some(entry) = ctx.entry else {
        return;
    };
    let tree = DominatorTree::compute(entry.index(), &ctx.successor_indices());
    let reachable: Vec<BlockIdx> = ctx
        .graph
        .indices()
        .filter(|idx| ctx.reachable[idx.index()] && ctx.kinds[idx.index()].is_some())
        .collect();

    let mut found = Vec::new();
    for &block in &reachable {
        let Some(kind) = ctx.kinds[block.index()] else {
            continue;
        };
        let id = ctx.id(block);

        for subsystem in &kind.requires {
            let providers: Vec<BlockIdx> = reachable
                .iter()
                .copied()
                .filter(|p| {
                    ctx.kinds[p.index()]
                        .and_then(|k| k.provides.as_deref())
                        .is_some_and(|provided| provided == subsystem)
                })
                .collect();
            if providers
                .iter()
                .any(|p| tree.dominates(p.index(), block.index()))
            {
                continue;
            }
            let message = if providers.is_empty() {
                format!(
                    "block '{}' uses subsystem '{}', but no block initializes it",
                    id, subsystem
                )
            } else {
                format!(
                    "block '{}' uses subsystem '{}', which is not initialized on every path reaching it (initialized by {})",
                    id,
                    subsystem,
                    providers.iter().map(|p| format!("'{}'", ctx.id(*p))).join(", ")
                )
            };
            found.push(Diagnostic::error(
                DiagnosticCode::InitDoesNotDominate,
                ElementRef::Block {
                    id: id.to_string(),
                    property: None,
                },
                message,
            ));
        }

        let Some(resource) = &kind.resource else {
            continue;
        };
        let earlier = reachable.iter().copied().find(|other| {
            *other != block
                && ctx.kinds[other.index()]
                    .and_then(|k| k.resource.as_ref())
                    .is_some_and(|r| r.key == resource.key)
                && tree.dominates(other.index(), block.index())
        });
        if let Some(earlier) = earlier {
            found.push(Diagnostic::error(
                DiagnosticCode::DuplicateInit,
                ElementRef::Block {
                    id: id.to_string(),
                    property: None,
                },
                format!(
                    "block '{}' acquires '{}' again although '{}' already holds it on every path",
                    id,
                    resource.key,
                    ctx.id(earlier)
                ),
            ));
        }
    }

    for diagnostic in found {
        ctx.push(diagnostic);
    }
}
