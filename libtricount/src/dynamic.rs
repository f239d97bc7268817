use std::collections::{HashMap, HashSet};

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tricount_sketch::{BoundedMinHeap, Reservoir, WaitingRoom};

use crate::count::count_closing;
use crate::oracle::Oracle;
use crate::subgraph::SubGraph;
use crate::{Caps, Edge, Error, NodeId};

/// Whether a stream event adds or removes its edge.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Sign {
    Insert,
    Delete,
}

/// Triangle-count estimator for fully-dynamic edge streams.
///
/// Insertions fill the heavy set, then the waiting room; once both are full,
/// each arrival pushes the oldest waiting-room edge through the
/// heavy-promotion and reservoir pipeline. Deletions classify the edge:
/// never retained ("good"), deterministically retained (waiting room or
/// heavy set), or a reservoir sample ("bad"). Good and bad deletion counts
/// bias later reservoir admissions so the sample stays uniform over the
/// surviving light stream.
///
/// The raw global counter is signed and may transiently dip below zero;
/// [`DynamicSampler::global_triangles`] clips on read only, because clipping
/// internally would bias subsequent updates. Per-node counts are not
/// maintained in this regime.
#[derive(Clone, Debug)]
pub struct DynamicSampler {
    caps: Caps,
    rng: StdRng,
    oracle: Option<Oracle>,
    subgraph: SubGraph,
    waiting_room: WaitingRoom<Edge>,
    // The heap may carry entries for edges no longer heavy; `heavy_set` is
    // the authoritative membership and stale tops are discarded lazily.
    heavy: BoundedMinHeap<Option<i32>, Edge>,
    heavy_set: HashSet<Edge>,
    reservoir: Reservoir<Edge>,
    /// Net light-stream positions: ages-out minus deletions of light edges.
    ell: i64,
    good_deletions: i64,
    bad_deletions: i64,
    events: u64,
    last_timestamp: i64,
    global: f64,
}

impl DynamicSampler {
    /// Creates a sampler with memory budget `k` split according to `alpha`
    /// and `beta` (see [`Caps::from_budget`]). Equal seeds and equal event
    /// sequences produce bit-identical estimates.
    pub fn new(seed: u64, k: usize, alpha: f64, beta: f64) -> Result<DynamicSampler, Error> {
        let caps = Caps::from_budget(k, alpha, beta)?;
        debug!(
            "dynamic sampler: waiting room {}, heavy {}, reservoir {} (k = {k})",
            caps.waiting_room, caps.heavy, caps.reservoir
        );
        Ok(DynamicSampler {
            caps,
            rng: StdRng::seed_from_u64(seed),
            oracle: None,
            subgraph: SubGraph::new(),
            waiting_room: WaitingRoom::new(),
            heavy: BoundedMinHeap::with_cap(caps.heavy),
            heavy_set: HashSet::with_capacity(caps.heavy),
            reservoir: Reservoir::with_cap(caps.reservoir),
            ell: 0,
            good_deletions: 0,
            bad_deletions: 0,
            events: 0,
            last_timestamp: 0,
            global: 0.0,
        })
    }

    /// Installs an edge-keyed heaviness predictor. Call before the first
    /// event.
    pub fn set_edge_oracle(&mut self, scores: HashMap<Edge, i32>) {
        self.oracle = Some(Oracle::Edges(scores));
    }

    /// Installs a node-keyed heaviness predictor. Call before the first
    /// event.
    pub fn set_node_oracle(&mut self, scores: HashMap<NodeId, i32>) {
        self.oracle = Some(Oracle::Nodes(scores));
    }

    /// Feeds one signed event. `t` is advisory: it is recorded for
    /// diagnostics but plays no role in the sampling.
    pub fn process_edge(&mut self, a: NodeId, b: NodeId, t: i64, sign: Sign) {
        let e = Edge::new(a, b);
        self.last_timestamp = t;
        self.events += 1;

        let n_l = self.ell + self.good_deletions + self.bad_deletions;
        let cum = count_closing(&self.subgraph, e, n_l, self.caps.reservoir, |_, _| {});
        match sign {
            Sign::Insert => {
                self.global += cum;
                self.place(e);
                self.subgraph.add(e, true);
            }
            Sign::Delete => {
                self.global -= cum;
                self.delete(e);
            }
        }
    }

    /// The current global estimate, clipped at zero.
    pub fn global_triangles(&self) -> f64 {
        self.global.max(0.0)
    }

    pub fn num_nodes(&self) -> usize {
        self.subgraph.num_nodes()
    }

    pub fn num_edges(&self) -> usize {
        self.subgraph.num_edges()
    }

    pub fn edges_processed(&self) -> u64 {
        self.events
    }

    /// The timestamp of the most recent event.
    pub fn last_timestamp(&self) -> i64 {
        self.last_timestamp
    }

    fn heaviness(&self, e: Edge) -> Option<i32> {
        self.oracle.as_ref().and_then(|o| o.heaviness(e))
    }

    /// Routes an inserted edge. The arrival itself always lands in a
    /// deterministic partition; in the steady state it is the edge aging out
    /// of the waiting room that faces the reservoir.
    fn place(&mut self, e: Edge) {
        if self.heavy_set.len() < self.caps.heavy {
            self.heavy.push(self.heaviness(e), e);
            self.heavy_set.insert(e);
            return;
        }

        if self.waiting_room.len() < self.caps.waiting_room {
            self.waiting_room.add(e);
            return;
        }

        self.ell += 1;
        let oldest = self.waiting_room.pop_oldest().unwrap();
        self.waiting_room.add(e);

        let mut candidate = oldest;
        if let Some(h) = self.heaviness(candidate) {
            self.discard_stale_tops();
            if self.beats_lightest(h) {
                let (_, demoted) = self.heavy.pop_min().unwrap();
                self.heavy_set.remove(&demoted);
                self.heavy.push(Some(h), candidate);
                self.heavy_set.insert(candidate);
                candidate = demoted;
            }
        }

        if self.good_deletions + self.bad_deletions == 0 {
            if !self.reservoir.is_full() {
                self.reservoir.insert(candidate);
                self.subgraph.set_det(candidate, false);
            } else {
                let p = self.caps.reservoir as f64 / self.ell as f64;
                if self.rng.random::<f64>() < p {
                    self.subgraph.set_det(candidate, false);
                    let victim = self.reservoir.replace_random(&mut self.rng, candidate);
                    let removed = self.subgraph.remove(victim);
                    assert!(removed, "reservoir victim {victim:?} missing from the subgraph");
                } else {
                    self.subgraph.remove(candidate);
                }
            }
        } else {
            // Deletions freed reservoir slots; refill them at the rate that
            // keeps the sample uniform over the surviving light stream.
            let p = self.bad_deletions as f64
                / (self.good_deletions + self.bad_deletions) as f64;
            if self.rng.random::<f64>() < p {
                self.reservoir.insert(candidate);
                self.subgraph.set_det(candidate, false);
                self.bad_deletions -= 1;
            } else {
                self.subgraph.remove(candidate);
                self.good_deletions -= 1;
            }
        }
    }

    fn delete(&mut self, e: Edge) {
        match self.subgraph.remove_classify(e) {
            None => {
                // Never retained: remember the miss so future admissions
                // compensate.
                debug_assert!(
                    !self.reservoir.contains(&e),
                    "{e:?} indexed in the reservoir but absent from the subgraph"
                );
                self.good_deletions += 1;
                self.ell -= 1;
            }
            Some(true) => {
                if !self.waiting_room.remove(&e) {
                    let was_heavy = self.heavy_set.remove(&e);
                    debug_assert!(was_heavy, "{e:?} was deterministic but in neither W nor H");
                    // The heap entry stays behind as a tombstone.
                }
            }
            Some(false) => {
                self.bad_deletions += 1;
                self.ell -= 1;
                let removed = self.reservoir.swap_remove(&e);
                assert!(removed, "light edge {e:?} missing from the reservoir index");
            }
        }
    }

    /// Drops heap tops whose edges have left the heavy set, so the live
    /// minimum surfaces.
    fn discard_stale_tops(&mut self) {
        while let Some((_, e)) = self.heavy.peek_min() {
            if self.heavy_set.contains(e) {
                return;
            }
            self.heavy.pop_min();
        }
    }

    /// Whether a candidate with known heaviness `h` displaces the lightest
    /// heavy edge. Ties fall to a coin flip. Stale tops must have been
    /// discarded first.
    fn beats_lightest(&mut self, h: i32) -> bool {
        let Some((&lightest, _)) = self.heavy.peek_min() else {
            return false;
        };
        Some(h) > lightest || (Some(h) == lightest && self.rng.random::<f64>() < 0.5)
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        self.subgraph.assert_consistent();
        assert!(self.waiting_room.len() <= self.caps.waiting_room);
        assert!(self.heavy_set.len() <= self.caps.heavy);
        assert!(self.reservoir.len() <= self.caps.reservoir);
        assert!(self.good_deletions >= 0);
        assert!(self.bad_deletions >= 0);
        assert_eq!(
            self.subgraph.num_edges(),
            self.waiting_room.len() + self.heavy_set.len() + self.reservoir.len()
        );
        for e in self.reservoir.iter() {
            assert_eq!(self.subgraph.det(*e), Some(false), "{e:?} in reservoir");
        }
        for e in self.waiting_room.iter() {
            assert_eq!(self.subgraph.det(*e), Some(true), "{e:?} in waiting room");
        }
        // Every live heavy edge still has a heap entry backing it.
        for e in &self.heavy_set {
            assert_eq!(self.subgraph.det(*e), Some(true), "{e:?} in heavy set");
            assert!(self.heavy.iter().any(|(_, he)| he == e));
        }
    }
}
