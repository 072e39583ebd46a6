//! Dominator tree over a rooted control-flow graph.
//!
//! Uses the iterative algorithm of Cooper, Harvey and Kennedy: immediate
//! dominators are refined in reverse postorder until they stop changing.

const UNDEFINED: usize = usize::MAX;

#[derive(Debug, Clone)]
pub(super) struct DominatorTree {
    root: usize,
    /// Immediate dominator per node; `UNDEFINED` for nodes the root cannot reach.
    idom: Vec<usize>,
}

impl DominatorTree {
    pub fn compute(root: usize, successors: &[Vec<usize>]) -> Self {
        let n = successors.len();
        let postorder = postorder(root, successors);

        let mut order = vec![UNDEFINED; n];
        for (rank, &node) in postorder.iter().rev().enumerate() {
            order[node] = rank;
        }
        let mut predecessors = vec![Vec::new(); n];
        for &node in &postorder {
            for &succ in &successors[node] {
                predecessors[succ].push(node);
            }
        }

        let mut idom = vec![UNDEFINED; n];
        idom[root] = root;
        let mut changed = true;
        while changed {
            changed = false;
            for &node in postorder.iter().rev() {
                if node == root {
                    continue;
                }
                let mut candidate = UNDEFINED;
                for &pred in &predecessors[node] {
                    if idom[pred] == UNDEFINED {
                        continue;
                    }
                    candidate = if candidate == UNDEFINED {
                        pred
                    } else {
                        intersect(&idom, &order, pred, candidate)
                    };
                }
                if candidate != UNDEFINED && idom[node] != candidate {
                    idom[node] = candidate;
                    changed = true;
                }
            }
        }

        Self { root, idom }
    }

    pub fn is_reachable(&self, node: usize) -> bool {
        self.idom[node] != UNDEFINED
    }

    /// Whether every path from the root to `b` passes through `a`.
    pub fn dominates(&self, a: usize, b: usize) -> bool {
        if !self.is_reachable(a) || !self.is_reachable(b) {
            return false;
        }
        let mut node = b;
        loop {
            if node == a {
                return true;
            }
            if node == self.root {
                return false;
            }
            node = self.idom[node];
        }
    }

    #[cfg(test)]
    fn immediate_dominator(&self, node: usize) -> Option<usize> {
        if node == self.root || !self.is_reachable(node) {
            None
        } else {
            Some(self.idom[node])
        }
    }
}

fn intersect(idom: &[usize], order: &[usize], mut a: usize, mut b: usize) -> usize {
    while a != b {
        while order[a] > order[b] {
            a = idom[a];
        }
        while order[b] > order[a] {
            b = idom[b];
        }
    }
    a
}

fn postorder(root: usize, successors: &[Vec<usize>]) -> Vec<usize> {
    let mut visited = vec![false; successors.len()];
    let mut result = Vec::with_capacity(successors.len());
    let mut stack = vec![(root, 0usize)];
    visited[root] = true;
    while let Some((node, cursor)) = stack.last_mut() {
        let node = *node;
        if let Some(&succ) = successors[node].get(*cursor) {
            *cursor += 1;
            if !visited[succ] {
                visited[succ] = true;
                stack.push((succ, 0));
            }
        } else {
            result.push(node);
            stack.pop();
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    //     0
    //    / \
    //   1   2
    //    \ /
    //     3 -> 4
    fn diamond() -> Vec<Vec<usize>> {
        vec![vec![1, 2], vec![3], vec![3], vec![4], vec![]]
    }

    #[test]
    fn diamond_join_is_dominated_by_the_fork_only() {
        let tree = DominatorTree::compute(0, &diamond());
        assert_eq!(tree.immediate_dominator(3), Some(0));
        assert_eq!(tree.immediate_dominator(4), Some(3));
        assert!(tree.dominates(0, 4));
        assert!(!tree.dominates(1, 3));
        assert!(!tree.dominates(2, 4));
        assert!(tree.dominates(3, 3));
    }

    #[test]
    fn chain_dominance_is_transitive() {
        let graph = vec![vec![1], vec![2], vec![3], vec![]];
        let tree = DominatorTree::compute(0, &graph);
        assert!(tree.dominates(1, 3));
        assert!(!tree.dominates(3, 1));
        assert_eq!(tree.immediate_dominator(3), Some(2));
    }

    #[test]
    fn unreachable_nodes_are_dominated_by_nothing() {
        let graph = vec![vec![1], vec![], vec![1]];
        let tree = DominatorTree::compute(0, &graph);
        assert!(!tree.is_reachable(2));
        assert!(!tree.dominates(0, 2));
        assert_eq!(tree.immediate_dominator(2), None);
    }
}
