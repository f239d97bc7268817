use std::collections::HashMap;

use crate::{Edge, NodeId};

/// A caller-supplied predictor of per-edge triangle participation.
///
/// Heaviness is a ranking, not a probability: higher scores mean the edge is
/// expected to close more triangles. A lookup miss is "unknown", which is
/// distinct from a score of zero; unknown edges never compete for the heavy
/// set.
#[derive(Clone, Debug)]
pub enum Oracle {
    /// Scores keyed by canonical edge.
    Edges(HashMap<Edge, i32>),
    /// Scores keyed by node; an edge scores the minimum of its endpoints,
    /// and is unknown unless both endpoints are present.
    Nodes(HashMap<NodeId, i32>),
}

impl Oracle {
    pub fn heaviness(&self, e: Edge) -> Option<i32> {
        match self {
            Oracle::Edges(scores) => scores.get(&e).copied(),
            Oracle::Nodes(scores) => {
                let (u, v) = e.endpoints();
                match (scores.get(&u), scores.get(&v)) {
                    (Some(&su), Some(&sv)) => Some(su.min(sv)),
                    _ => None,
                }
            }
        }
    }

    /// Number of entries the predictor holds.
    pub fn len(&self) -> usize {
        match self {
            Oracle::Edges(scores) => scores.len(),
            Oracle::Nodes(scores) => scores.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_oracle_is_a_direct_lookup() {
        let oracle = Oracle::Edges(HashMap::from([(Edge::new(1, 2), 7)]));
        assert_eq!(oracle.heaviness(Edge::new(2, 1)), Some(7));
        assert_eq!(oracle.heaviness(Edge::new(1, 3)), None);
    }

    #[test]
    fn node_oracle_takes_the_minimum() {
        let oracle = Oracle::Nodes(HashMap::from([(1, 10), (2, 3)]));
        assert_eq!(oracle.heaviness(Edge::new(1, 2)), Some(3));
        // One endpoint missing means no prediction, not a zero.
        assert_eq!(oracle.heaviness(Edge::new(1, 4)), None);
    }
}
