use crate::graph::BlockIdx;
use crate::validator::ValidatedGraph;
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;

/// Blocks reachable from `head` in breadth-first discovery order, with their
/// distance. The walk includes `stop` but does not continue past it.
fn reach(
    graph: &ValidatedGraph,
    head: BlockIdx,
    stop: Option<BlockIdx>,
) -> (Vec<BlockIdx>, AHashMap<BlockIdx, usize>) {
    let mut order = vec![head];
    let mut distance = AHashMap::from_iter([(head, 0)]);
    let mut queue = VecDeque::from([head]);
    while let Some(idx) = queue.pop_front() {
        if Some(idx) == stop {
            continue;
        }
        let next = distance[&idx] + 1;
        for target in graph.successors(idx).iter().filter_map(|(_, t)| *t) {
            if !distance.contains_key(&target) {
                distance.insert(target, next);
                order.push(target);
                queue.push_back(target);
            }
        }
    }
    (order, distance)
}

/// Finds where the arms of a branch reconverge.
///
/// A join is a block reachable from at least two arms; every arm that does not
/// reach it must end on its own without reaching the enclosing `stop`, so
/// control only falls out of the branch at the join. The block shared by the
/// most arms wins, then the one whose largest distance from the sharing arm
/// heads is smallest; remaining ties go to the block discovered first, arm by
/// arm. Returns `None` when no two arms meet before `stop`.
pub(super) fn find_join(
    graph: &ValidatedGraph,
    heads: &[Option<BlockIdx>],
    stop: Option<BlockIdx>,
) -> Option<BlockIdx> {
    let arms: Vec<Option<(Vec<BlockIdx>, AHashMap<BlockIdx, usize>)>> = heads
        .iter()
        .map(|head| head.map(|head| reach(graph, head, stop)))
        .collect();

    let mut seen = AHashSet::new();
    let candidates: Vec<BlockIdx> = arms
        .iter()
        .flatten()
        .flat_map(|(order, _)| order.iter().copied())
        .filter(|idx| Some(*idx) != stop && seen.insert(*idx))
        .collect();

    let mut best: Option<(usize, usize, BlockIdx)> = None;
    for candidate in candidates {
        let mut shared = 0;
        let mut cost = 0;
        let mut escapes = false;
        for (_, distances) in arms.iter().flatten() {
            match distances.get(&candidate) {
                Some(d) => {
                    shared += 1;
                    cost = cost.max(*d);
                }
                None => escapes |= stop.is_some_and(|stop| distances.contains_key(&stop)),
            }
        }
        if escapes || shared < 2 {
            continue;
        }
        let better = best.is_none_or(|(best_shared, best_cost, _)| {
            shared > best_shared || (shared == best_shared && cost < best_cost)
        });
        if better {
            best = Some((shared, cost, candidate));
        }
    }

    best.map(|(_, _, join)| join)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Block, Connection, Graph};
    use crate::linearizer::{SequenceEnd, Statement, linearize};
    use crate::registry::BlockRegistry;
    use crate::validator::validate;

    fn validated(blocks: &[(&str, &str)], links: &[(&str, &str, &str)]) -> ValidatedGraph {
        let registry = BlockRegistry::standard().unwrap();
        let graph = Graph::new(
            blocks.iter().map(|(id, kind)| Block::new(*id, *kind)).collect(),
            links
                .iter()
                .map(|(from, port, to)| Connection::new(from, port, to, "in"))
                .collect(),
        );
        validate(graph, &registry).expect("graph should validate")
    }

    fn idx(graph: &ValidatedGraph, id: &str) -> BlockIdx {
        graph.graph().find(id).unwrap()
    }

    #[test]
    fn diamond_joins_at_the_shared_successor() {
        let graph = validated(
            &[
                ("start", "app_on_start"),
                ("check", "counter_compare"),
                ("yes", "counter_add"),
                ("no", "counter_set"),
                ("done", "app_exit"),
            ],
            &[
                ("start", "next", "check"),
                ("check", "out_true", "yes"),
                ("check", "out_false", "no"),
                ("yes", "next", "done"),
                ("no", "next", "done"),
            ],
        );
        let heads = [Some(idx(&graph, "yes")), Some(idx(&graph, "no"))];
        assert_eq!(find_join(&graph, &heads, None), Some(idx(&graph, "done")));
    }

    #[test]
    fn empty_arm_makes_the_other_arms_target_the_join() {
        let graph = validated(
            &[
                ("start", "app_on_start"),
                ("check", "counter_compare"),
                ("bump", "counter_add"),
                ("done", "app_exit"),
            ],
            &[
                ("start", "next", "check"),
                ("check", "out_true", "bump"),
                ("check", "out_false", "done"),
                ("bump", "next", "done"),
            ],
        );
        let heads = [Some(idx(&graph, "bump")), Some(idx(&graph, "done"))];
        assert_eq!(find_join(&graph, &heads, None), Some(idx(&graph, "done")));

        let tree = linearize(&graph);
        let Statement::Branch(branch) = &tree.root.statements[1] else {
            panic!("expected a branch");
        };
        assert!(branch.arms[1].body.statements.is_empty());
        assert_eq!(branch.arms[1].body.end, SequenceEnd::Join);
    }

    #[test]
    fn unconnected_arm_has_no_join() {
        let graph = validated(
            &[
                ("start", "app_on_start"),
                ("check", "counter_compare"),
                ("done", "app_exit"),
            ],
            &[("start", "next", "check"), ("check", "out_true", "done")],
        );
        let heads = [Some(idx(&graph, "done")), None];
        assert_eq!(find_join(&graph, &heads, None), None);
    }

    #[test]
    fn arms_meeting_only_at_the_enclosing_stop_have_no_join() {
        let graph = validated(
            &[
                ("start", "app_on_start"),
                ("outer", "counter_compare"),
                ("inner", "counter_compare"),
                ("a", "counter_add"),
                ("b", "counter_set"),
                ("c", "counter_set"),
                ("done", "app_exit"),
            ],
            &[
                ("start", "next", "outer"),
                ("outer", "out_true", "inner"),
                ("outer", "out_false", "c"),
                ("inner", "out_true", "a"),
                ("inner", "out_false", "b"),
                ("a", "next", "done"),
                ("b", "next", "done"),
                ("c", "next", "done"),
            ],
        );
        let done = idx(&graph, "done");
        let heads = [Some(idx(&graph, "a")), Some(idx(&graph, "b"))];
        assert_eq!(find_join(&graph, &heads, Some(done)), None);
        assert_eq!(find_join(&graph, &heads, None), Some(done));
    }

    #[test]
    fn arms_that_reconverge_join_while_the_others_exit() {
        let graph = validated(
            &[
                ("start", "app_on_start"),
                ("screen", "gui_init"),
                ("keys", "input_switch"),
                ("fs", "storage_init"),
                ("files", "storage_init"),
                ("stop", "app_exit"),
                ("bye", "app_exit"),
            ],
            &[
                ("start", "next", "screen"),
                ("screen", "next", "keys"),
                ("keys", "out_ok", "fs"),
                ("keys", "out_back", "files"),
                ("keys", "out_other", "bye"),
                ("fs", "next", "files"),
                ("files", "next", "stop"),
            ],
        );
        let heads = [
            Some(idx(&graph, "fs")),
            Some(idx(&graph, "files")),
            Some(idx(&graph, "bye")),
        ];
        assert_eq!(find_join(&graph, &heads, None), Some(idx(&graph, "files")));

        // An arm that leaves for the enclosing stop rules the partial join out.
        let heads = [Some(idx(&graph, "fs")), Some(idx(&graph, "files")), Some(idx(&graph, "stop"))];
        let stop = Some(idx(&graph, "stop"));
        assert_eq!(find_join(&graph, &heads[..2], stop), Some(idx(&graph, "files")));
        assert_eq!(find_join(&graph, &heads, stop), None);
    }
}
