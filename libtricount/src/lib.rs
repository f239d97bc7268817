//! Triangle-count estimation over unbounded edge streams with a fixed
//! memory budget.
//!
//! The estimators keep at most `k` edges, split across three partitions: a
//! waiting room that shelters the freshest arrivals, a heavy set of edges a
//! caller-supplied predictor expects to close many triangles, and a uniform
//! reservoir over everything else. Triangles are counted as each edge
//! arrives, with closed-form corrections for the reservoir's subsampling.
//!
//! [`InsertionSampler`] handles insertion-only streams and also tracks
//! per-node counts; [`DynamicSampler`] handles streams that mix insertions
//! and deletions, compensating deleted samples with good/bad deletion
//! counters.

use std::fmt;

mod count;
mod error;
pub mod oracle;
pub mod subgraph;

mod dynamic;
mod insertion;

pub use crate::{
    dynamic::{DynamicSampler, Sign},
    error::Error,
    insertion::InsertionSampler,
    oracle::Oracle,
    subgraph::SubGraph,
};

/// Node identifier in the streamed graph.
pub type NodeId = u32;

/// An undirected edge in canonical form: the smaller endpoint first.
///
/// `Edge` is the identity used by every container and oracle; two events
/// naming the same endpoints in either order refer to the same edge.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Edge {
    u: NodeId,
    v: NodeId,
}

impl Edge {
    /// Canonicalizes the endpoint pair. The endpoints must differ.
    pub fn new(a: NodeId, b: NodeId) -> Edge {
        debug_assert_ne!(a, b, "self-loops must be filtered by the caller");
        if a <= b { Edge { u: a, v: b } } else { Edge { u: b, v: a } }
    }

    /// The endpoints, smaller first.
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.u, self.v)
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Edge({}-{})", self.u, self.v)
    }
}

/// Partition capacities, computed once from the memory budget and frozen.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Caps {
    /// Waiting-room slots (`W`).
    pub waiting_room: usize,
    /// Heavy-set slots (`H`).
    pub heavy: usize,
    /// Reservoir slots (`S`).
    pub reservoir: usize,
}

impl Caps {
    /// Splits the budget `k` into the three partitions:
    /// `W = round(k·α)`, `H = round((k−W)·β)`, `S = k − W − H`.
    ///
    /// Fails if `α` or `β` falls outside `(0, 1)` or if any partition comes
    /// out empty; every regime needs at least one slot in each.
    pub fn from_budget(k: usize, alpha: f64, beta: f64) -> Result<Caps, Error> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(Error::AlphaOutOfRange(alpha));
        }
        if !(beta > 0.0 && beta < 1.0) {
            return Err(Error::BetaOutOfRange(beta));
        }
        if k == 0 {
            return Err(Error::EmptyBudget);
        }
        let w = (k as f64 * alpha).round() as usize;
        let h = ((k - w) as f64 * beta).round() as usize;
        let s = k - w - h;
        if w == 0 || h == 0 || s == 0 {
            return Err(Error::BudgetTooSmall { k, w, h, s });
        }
        Ok(Caps {
            waiting_room: w,
            heavy: h,
            reservoir: s,
        })
    }

    /// The total number of retained edges, `k`.
    pub fn total(&self) -> usize {
        self.waiting_room + self.heavy + self.reservoir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn edge_is_canonical() {
        assert_eq!(Edge::new(7, 3), Edge::new(3, 7));
        assert_eq!(Edge::new(3, 7).endpoints(), (3, 7));
    }

    #[test]
    fn caps_split_the_budget() {
        let caps = Caps::from_budget(100, 0.1, 0.5).unwrap();
        assert_eq!(
            caps,
            Caps {
                waiting_room: 10,
                heavy: 45,
                reservoir: 45
            }
        );
        assert_eq!(caps.total(), 100);
    }

    #[test]
    fn caps_round_rather_than_truncate() {
        // 3·0.33 rounds up to one waiting-room slot; truncation would starve
        // the room and make the steady state unreachable.
        let caps = Caps::from_budget(3, 0.33, 0.5).unwrap();
        assert_eq!(
            caps,
            Caps {
                waiting_room: 1,
                heavy: 1,
                reservoir: 1
            }
        );
    }

    #[test]
    fn caps_reject_bad_parameters() {
        assert!(matches!(
            Caps::from_budget(100, 0.0, 0.5),
            Err(Error::AlphaOutOfRange(_))
        ));
        assert!(matches!(
            Caps::from_budget(100, 0.5, 1.0),
            Err(Error::BetaOutOfRange(_))
        ));
        assert!(matches!(Caps::from_budget(0, 0.5, 0.5), Err(Error::EmptyBudget)));
        // Two slots cannot feed three partitions.
        assert!(matches!(
            Caps::from_budget(2, 0.5, 0.5),
            Err(Error::BudgetTooSmall { .. })
        ));
    }
}
