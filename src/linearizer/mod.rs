//! Turns a validated block graph into structured, sequential statements.
//!
//! The walk starts at the entry block and follows each block's outputs in
//! declaration order. A branching block opens one arm per output; when arms
//! reconverge, the nearest shared block becomes the branch's join and the
//! enclosing sequence resumes there, so the join is placed exactly once. Arms
//! that never reach the join end on their own inside the branch.

mod join;
pub mod visualizer;

pub use visualizer::visualize;

use crate::graph::BlockIdx;
use crate::registry::BlockRole;
use crate::validator::ValidatedGraph;
use join::find_join;

/// How control leaves a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceEnd {
    /// The last statement is an exit block.
    Exit,
    /// The sequence reached the join of the branch that encloses it.
    Join,
    /// The path stops on a block with no successor; the program returns there.
    Open,
    /// The last statement is a branch without a join; every arm ends on its own.
    Split,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub statements: Vec<Statement>,
    pub end: SequenceEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Block(BlockIdx),
    Branch(Branch),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// The block whose outputs select the arm.
    pub block: BlockIdx,
    /// One arm per output connector, in declaration order.
    pub arms: Vec<Arm>,
    /// Where the arms reconverge. Sequencing resumes here after the branch.
    pub join: Option<BlockIdx>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arm {
    pub output: String,
    pub body: Sequence,
}

/// The structured form of a whole program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementTree {
    pub root: Sequence,
}

impl StatementTree {
    /// Every block statement in emission order, arms before their join.
    pub fn blocks(&self) -> Vec<BlockIdx> {
        let mut out = Vec::new();
        collect_blocks(&self.root, &mut out);
        out
    }
}

fn collect_blocks(sequence: &Sequence, out: &mut Vec<BlockIdx>) {
    for statement in &sequence.statements {
        match statement {
            Statement::Block(idx) => out.push(*idx),
            Statement::Branch(branch) => {
                out.push(branch.block);
                for arm in &branch.arms {
                    collect_blocks(&arm.body, out);
                }
            }
        }
    }
}

/// Linearizes a validated graph. Deterministic for a given graph.
pub fn linearize(graph: &ValidatedGraph) -> StatementTree {
    let root = walk(graph, Some(graph.entry()), None);
    tracing::debug!(blocks = graph.graph().len(), "graph linearized");
    StatementTree { root }
}

fn walk(graph: &ValidatedGraph, start: Option<BlockIdx>, stop: Option<BlockIdx>) -> Sequence {
    let mut statements = Vec::new();
    let mut current = start;
    loop {
        let Some(idx) = current else {
            return Sequence {
                statements,
                end: SequenceEnd::Open,
            };
        };
        if Some(idx) == stop {
            return Sequence {
                statements,
                end: SequenceEnd::Join,
            };
        }

        match graph.role(idx) {
            BlockRole::Exit => {
                statements.push(Statement::Block(idx));
                return Sequence {
                    statements,
                    end: SequenceEnd::Exit,
                };
            }
            BlockRole::Branch => {
                let heads: Vec<Option<BlockIdx>> =
                    graph.successors(idx).iter().map(|(_, t)| *t).collect();
                let join = find_join(graph, &heads, stop);
                let arm_stop = join.or(stop);
                let arms = graph
                    .successors(idx)
                    .iter()
                    .map(|(output, head)| Arm {
                        output: output.clone(),
                        body: walk(graph, *head, arm_stop),
                    })
                    .collect();
                tracing::trace!(
                    branch = %graph.graph().block(idx).id,
                    join = ?join.map(|j| &graph.graph().block(j).id),
                    "branch linearized"
                );
                statements.push(Statement::Branch(Branch {
                    block: idx,
                    arms,
                    join,
                }));
                match join {
                    Some(join) => current = Some(join),
                    None => {
                        return Sequence {
                            statements,
                            end: SequenceEnd::Split,
                        };
                    }
                }
            }
            BlockRole::Entry | BlockRole::Action => {
                statements.push(Statement::Block(idx));
                current = graph.next(idx);
            }
        }
    }
}
