use std::collections::HashMap;

use crate::{Edge, NodeId};

/// The retained subgraph: an undirected adjacency over the edges currently
/// held in any partition, annotated with a per-edge `det` flag.
///
/// `det = true` means the edge is held deterministically (waiting room or
/// heavy set); `false` means it lives in the reservoir and may be evicted at
/// random. The two endpoint entries always carry the same flag.
#[derive(Clone, Debug, Default)]
pub struct SubGraph {
    adj: HashMap<NodeId, HashMap<NodeId, bool>>,
    num_edges: usize,
}

impl SubGraph {
    pub fn new() -> SubGraph {
        SubGraph::default()
    }

    /// Nodes with at least one retained edge.
    pub fn num_nodes(&self) -> usize {
        self.adj.len()
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn contains(&self, e: Edge) -> bool {
        self.det(e).is_some()
    }

    /// The `det` flag of `e`, or `None` if the edge is not retained.
    pub fn det(&self, e: Edge) -> Option<bool> {
        let (u, v) = e.endpoints();
        self.adj.get(&u)?.get(&v).copied()
    }

    /// The neighbour map of `u`: neighbour id to `det` flag.
    pub fn neighbors(&self, u: NodeId) -> Option<&HashMap<NodeId, bool>> {
        self.adj.get(&u)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.adj.keys().copied()
    }

    pub fn add(&mut self, e: Edge, det: bool) {
        let (u, v) = e.endpoints();
        self.adj.entry(u).or_default().insert(v, det);
        self.adj.entry(v).or_default().insert(u, det);
        self.num_edges += 1;
    }

    /// Rewrites the `det` flag of an edge already present; both endpoint
    /// entries move together.
    pub fn set_det(&mut self, e: Edge, det: bool) {
        let (u, v) = e.endpoints();
        let mut hit = false;
        if let Some(flag) = self.adj.get_mut(&u).and_then(|n| n.get_mut(&v)) {
            *flag = det;
            hit = true;
        }
        if let Some(flag) = self.adj.get_mut(&v).and_then(|n| n.get_mut(&u)) {
            *flag = det;
        }
        debug_assert!(hit, "set_det on an edge that is not retained");
    }

    /// Removes `e` if present.
    pub fn remove(&mut self, e: Edge) -> bool {
        self.remove_classify(e).is_some()
    }

    /// Removes `e` and reports how it was held: `None` if it was not
    /// retained at all, otherwise its `det` flag. Nodes left without
    /// neighbours are dropped from the outer map.
    pub fn remove_classify(&mut self, e: Edge) -> Option<bool> {
        let (u, v) = e.endpoints();
        let det = {
            let neighs = self.adj.get_mut(&u)?;
            let det = neighs.remove(&v)?;
            if neighs.is_empty() {
                self.adj.remove(&u);
            }
            det
        };
        if let Some(neighs) = self.adj.get_mut(&v) {
            let mirror = neighs.remove(&u);
            debug_assert_eq!(mirror, Some(det), "endpoint entries disagree");
            if neighs.is_empty() {
                self.adj.remove(&v);
            }
        }
        self.num_edges -= 1;
        Some(det)
    }

    /// Both endpoint entries agree and the degree sum is twice the edge
    /// count. Test support.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let mut degree_sum = 0;
        for (&u, neighs) in &self.adj {
            assert!(!neighs.is_empty(), "node {u} retained with no neighbours");
            degree_sum += neighs.len();
            for (&v, &det) in neighs {
                let mirror = self.adj.get(&v).and_then(|n| n.get(&u));
                assert_eq!(mirror, Some(&det), "edge ({u}, {v}) flags disagree");
            }
        }
        assert_eq!(degree_sum, 2 * self.num_edges);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_classify() {
        let mut g = SubGraph::new();
        g.add(Edge::new(1, 2), true);
        g.add(Edge::new(2, 3), false);
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.det(Edge::new(2, 1)), Some(true));
        assert_eq!(g.det(Edge::new(3, 2)), Some(false));
        assert_eq!(g.det(Edge::new(1, 3)), None);
        g.assert_consistent();

        assert_eq!(g.remove_classify(Edge::new(1, 2)), Some(true));
        assert_eq!(g.remove_classify(Edge::new(1, 2)), None);
        // Node 1 lost its last neighbour and disappears.
        assert_eq!(g.num_nodes(), 2);
        assert_eq!(g.num_edges(), 1);
        g.assert_consistent();
    }

    #[test]
    fn set_det_moves_both_entries() {
        let mut g = SubGraph::new();
        g.add(Edge::new(4, 9), true);
        g.set_det(Edge::new(9, 4), false);
        assert_eq!(g.det(Edge::new(4, 9)), Some(false));
        g.assert_consistent();
    }
}
