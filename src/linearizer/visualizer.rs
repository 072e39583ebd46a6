use super::{Sequence, SequenceEnd, Statement, StatementTree};
use crate::validator::ValidatedGraph;
use std::fmt::{self, Write};

/// Formats a `StatementTree` as an indented listing for debugging.
///
/// ```text
/// app_on_start start
/// counter_compare check  (join: done)
///   [out_true]
///     counter_add bump
///     -> join
///   [out_false]
///     -> join
/// app_exit done
/// -> exit
/// ```
pub fn visualize(tree: &StatementTree, graph: &ValidatedGraph) -> String {
    TreeListing { tree, graph }.to_string()
}

struct TreeListing<'a> {
    tree: &'a StatementTree,
    graph: &'a ValidatedGraph,
}

impl fmt::Display for TreeListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.sequence(f, &self.tree.root, 0)
    }
}

impl TreeListing<'_> {
    fn label(&self, idx: crate::graph::BlockIdx) -> String {
        format!("{} {}", self.graph.kind(idx), self.graph.graph().block(idx).id)
    }

    fn sequence(&self, f: &mut fmt::Formatter<'_>, sequence: &Sequence, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        for statement in &sequence.statements {
            match statement {
                Statement::Block(idx) => writeln!(f, "{}{}", indent, self.label(*idx))?,
                Statement::Branch(branch) => {
                    write!(f, "{}{}", indent, self.label(branch.block))?;
                    if let Some(join) = branch.join {
                        write!(f, "  (join: {})", self.graph.graph().block(join).id)?;
                    }
                    f.write_char('\n')?;
                    for arm in &branch.arms {
                        writeln!(f, "{}  [{}]", indent, arm.output)?;
                        self.sequence(f, &arm.body, depth + 2)?;
                    }
                }
            }
        }
        let end = match sequence.end {
            SequenceEnd::Exit => "-> exit",
            SequenceEnd::Join => "-> join",
            SequenceEnd::Open => "-> return (no exit block)",
            SequenceEnd::Split => return Ok(()),
        };
        writeln!(f, "{}{}", indent, end)
    }
}
