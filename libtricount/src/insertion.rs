use std::collections::HashMap;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tricount_sketch::{BoundedMinHeap, Reservoir, WaitingRoom};

use crate::count::count_closing;
use crate::oracle::Oracle;
use crate::subgraph::SubGraph;
use crate::{Caps, Edge, Error, NodeId};

/// Triangle-count estimator for insertion-only edge streams.
///
/// Retains at most `k` edges. Arrivals fill the heavy set first, then the
/// reservoir, then the waiting room; once all three are full, each new edge
/// shelters in the waiting room while the edge aging out of it either
/// displaces the lightest heavy edge or runs the reservoir-sampling
/// gauntlet. Estimates are updated before every admission, so both the
/// global and the per-node counts are unbiased under the reservoir's
/// subsampling.
///
/// The caller must feed distinct, self-loop-free edges; duplicates degrade
/// estimation quality silently.
#[derive(Clone, Debug)]
pub struct InsertionSampler {
    caps: Caps,
    rng: StdRng,
    oracle: Option<Oracle>,
    subgraph: SubGraph,
    waiting_room: WaitingRoom<Edge>,
    heavy: BoundedMinHeap<Option<i32>, Edge>,
    reservoir: Reservoir<Edge>,
    /// Edges that have entered the light pipeline so far; the subsampling
    /// denominator once the reservoir is full.
    light_stream: u64,
    events: u64,
    global: f64,
    local: HashMap<NodeId, f64>,
}

impl InsertionSampler {
    /// Creates a sampler with memory budget `k` split according to `alpha`
    /// and `beta` (see [`Caps::from_budget`]). Equal seeds and equal event
    /// sequences produce bit-identical estimates.
    pub fn new(seed: u64, k: usize, alpha: f64, beta: f64) -> Result<InsertionSampler, Error> {
        let caps = Caps::from_budget(k, alpha, beta)?;
        debug!(
            "insertion sampler: waiting room {}, heavy {}, reservoir {} (k = {k})",
            caps.waiting_room, caps.heavy, caps.reservoir
        );
        Ok(InsertionSampler {
            caps,
            rng: StdRng::seed_from_u64(seed),
            oracle: None,
            subgraph: SubGraph::new(),
            waiting_room: WaitingRoom::new(),
            heavy: BoundedMinHeap::with_cap(caps.heavy),
            reservoir: Reservoir::with_cap(caps.reservoir),
            light_stream: 0,
            events: 0,
            global: 0.0,
            local: HashMap::new(),
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

    /// Feeds one edge arrival.
    pub fn process_edge(&mut self, a: NodeId, b: NodeId) {
        let e = Edge::new(a, b);
        self.count_triangles(e);
        let det = self.sample(e);
        self.subgraph.add(e, det);
        self.events += 1;
    }

    /// The current global triangle estimate.
    pub fn global_triangles(&self) -> f64 {
        self.global
    }

    /// The triangle estimate local to `v`; zero for nodes never seen in a
    /// triangle.
    pub fn local_triangles(&self, v: NodeId) -> f64 {
        self.local.get(&v).copied().unwrap_or(0.0)
    }

    /// All nodes with a nonzero local estimate, in arbitrary order.
    pub fn local_counts(&self) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.local.iter().map(|(&v, &cnt)| (v, cnt))
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

    fn heaviness(&self, e: Edge) -> Option<i32> {
        self.oracle.as_ref().and_then(|o| o.heaviness(e))
    }

    fn count_triangles(&mut self, e: Edge) {
        let (u, v) = e.endpoints();
        let local = &mut self.local;
        let cum = count_closing(
            &self.subgraph,
            e,
            self.light_stream as i64,
            self.caps.reservoir,
            |w, weight| {
                *local.entry(w).or_insert(0.0) += weight;
            },
        );
        if cum > 0.0 {
            self.global += cum;
            *local.entry(u).or_insert(0.0) += cum;
            *local.entry(v).or_insert(0.0) += cum;
        }
    }

    /// Places `e` in a partition, evicting as needed, and returns the `det`
    /// flag it should carry in the subgraph.
    fn sample(&mut self, e: Edge) -> bool {
        if self.heavy.len() < self.caps.heavy {
            self.heavy.push(self.heaviness(e), e);
            return true;
        }

        if self.light_stream < self.caps.reservoir as u64 {
            // The reservoir is still filling: the arrival competes with the
            // lightest heavy edge, and the loser takes the free slot.
            let mut sampled = e;
            let mut det = false;
            if let Some(h) = self.heaviness(e) {
                if self.beats_lightest(h) {
                    let (_, demoted) = self.heavy.pop_min().unwrap();
                    self.subgraph.set_det(demoted, false);
                    self.heavy.push(Some(h), e);
                    det = true;
                    sampled = demoted;
                }
            }
            self.reservoir.insert(sampled);
            self.light_stream += 1;
            return det;
        }

        if self.waiting_room.len() < self.caps.waiting_room {
            self.waiting_room.add(e);
            return true;
        }

        // Steady state: the arrival shelters in the waiting room, and the
        // edge aging out of it becomes the light-pipeline candidate.
        self.light_stream += 1;
        let oldest = self.waiting_room.pop_oldest().unwrap();
        self.waiting_room.add(e);

        let mut candidate = oldest;
        if let Some(h) = self.heaviness(candidate) {
            if self.beats_lightest(h) {
                let (_, demoted) = self.heavy.pop_min().unwrap();
                self.subgraph.set_det(demoted, false);
                self.heavy.push(Some(h), candidate);
                candidate = demoted;
            }
        }

        let p = self.caps.reservoir as f64 / self.light_stream as f64;
        if self.rng.random::<f64>() < p {
            self.subgraph.set_det(candidate, false);
            let victim = self.reservoir.replace_random(&mut self.rng, candidate);
            self.subgraph.remove(victim);
        } else {
            self.subgraph.remove(candidate);
        }
        true
    }

    /// Whether a candidate with known heaviness `h` displaces the lightest
    /// heavy edge. Ties fall to a coin flip.
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
        assert!(self.heavy.len() <= self.caps.heavy);
        assert!(self.reservoir.len() <= self.caps.reservoir);
        assert_eq!(
            self.subgraph.num_edges(),
            self.waiting_room.len() + self.heavy.len() + self.reservoir.len()
        );
        for e in self.reservoir.iter() {
            assert_eq!(self.subgraph.det(*e), Some(false), "{e:?} in reservoir");
        }
        for e in self.waiting_room.iter() {
            assert_eq!(self.subgraph.det(*e), Some(true), "{e:?} in waiting room");
        }
        let min = self.heavy.peek_min().map(|(w, _)| *w);
        for (w, e) in self.heavy.iter() {
            assert_eq!(self.subgraph.det(*e), Some(true), "{e:?} in heavy set");
            assert!(Some(*w) >= min);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashSet;

    // Pseudo-random distinct edges on `nodes` nodes; deterministic so test
    // failures reproduce.
    fn distinct_edges(count: usize, nodes: u32, mut state: u64) -> Vec<(u32, u32)> {
        let mut seen = HashSet::new();
        let mut edges = Vec::with_capacity(count);
        while edges.len() < count {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let u = (state >> 33) as u32 % nodes;
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let v = (state >> 33) as u32 % nodes;
            if u != v && seen.insert(Edge::new(u, v)) {
                edges.push((u, v));
            }
        }
        edges
    }

    fn exact_triangles(edges: &[(u32, u32)]) -> f64 {
        let mut adj: HashMap<u32, HashSet<u32>> = HashMap::new();
        let mut total = 0u64;
        for &(u, v) in edges {
            let common = adj
                .get(&u)
                .into_iter()
                .flatten()
                .filter(|w| adj.get(&v).is_some_and(|n| n.contains(w)))
                .count() as u64;
            total += common;
            adj.entry(u).or_default().insert(v);
            adj.entry(v).or_default().insert(u);
        }
        total as f64
    }

    #[test]
    fn one_triangle_with_room_to_spare() {
        let mut s = InsertionSampler::new(0, 100, 0.1, 0.5).unwrap();
        s.process_edge(1, 2);
        s.process_edge(2, 3);
        s.process_edge(1, 3);
        assert_eq!(s.global_triangles(), 1.0);
        assert_eq!(s.local_triangles(1), 1.0);
        assert_eq!(s.local_triangles(2), 1.0);
        assert_eq!(s.local_triangles(3), 1.0);
        assert_eq!(s.local_triangles(42), 0.0);
        assert_eq!(s.num_edges(), 3);
        assert_eq!(s.num_nodes(), 3);
        assert_eq!(s.edges_processed(), 3);
        s.assert_consistent();
    }

    #[test]
    fn heavier_edges_displace_the_lightest() {
        let mut s = InsertionSampler::new(0, 3, 0.33, 0.5).unwrap();
        s.set_edge_oracle(HashMap::from([
            (Edge::new(1, 2), 10),
            (Edge::new(1, 3), 5),
            (Edge::new(2, 3), 1),
            (Edge::new(1, 4), 0),
        ]));
        s.process_edge(2, 3);
        s.process_edge(1, 3);
        s.process_edge(1, 2);
        s.process_edge(1, 4);

        // The heaviest edge won the single heavy slot, the latest arrival
        // sits in the waiting room, and one light edge survived.
        assert_eq!(s.heavy.len(), 1);
        assert_eq!(
            s.heavy.peek_min().map(|(w, e)| (*w, *e)),
            Some((Some(10), Edge::new(1, 2)))
        );
        assert!(s.waiting_room.contains(&Edge::new(1, 4)));
        assert_eq!(s.reservoir.len(), 1);
        assert_eq!(s.num_edges(), 3);
        s.assert_consistent();
    }

    #[test]
    fn reservoir_stays_at_its_cap() {
        let mut s = InsertionSampler::new(1, 10, 0.1, 0.1).unwrap();
        assert_eq!(s.caps.reservoir, 8);
        for (u, v) in distinct_edges(10_000, 200, 99) {
            s.process_edge(u, v);
        }
        assert_eq!(s.reservoir.len(), 8);
        assert!(s.num_edges() <= 10);
        s.assert_consistent();
    }

    #[test]
    fn missing_oracle_equals_oracle_that_never_answers() {
        let edges = distinct_edges(2_000, 80, 7);
        let mut bare = InsertionSampler::new(42, 50, 0.2, 0.5).unwrap();
        let mut blank = InsertionSampler::new(42, 50, 0.2, 0.5).unwrap();
        blank.set_edge_oracle(HashMap::new());
        for &(u, v) in &edges {
            bare.process_edge(u, v);
            blank.process_edge(u, v);
        }
        assert_eq!(bare.global_triangles(), blank.global_triangles());
        assert_eq!(bare.num_edges(), blank.num_edges());
    }

    #[test]
    fn equal_seeds_give_bit_identical_estimates() {
        let edges = distinct_edges(3_000, 100, 11);
        let run = |seed| {
            let mut s = InsertionSampler::new(seed, 60, 0.2, 0.3).unwrap();
            for &(u, v) in &edges {
                s.process_edge(u, v);
            }
            (s.global_triangles(), s.local_triangles(5), s.num_edges())
        };
        assert_eq!(run(7), run(7));
        // Different seeds are allowed to disagree once subsampling starts;
        // equality here would make the determinism check vacuous.
        assert_eq!(run(7).0.is_finite(), run(8).0.is_finite());
    }

    #[test]
    fn exact_when_everything_fits() {
        let edges = distinct_edges(80, 25, 3);
        let mut s = InsertionSampler::new(5, 200, 0.2, 0.5).unwrap();
        for &(u, v) in &edges {
            s.process_edge(u, v);
        }
        assert_eq!(s.global_triangles(), exact_triangles(&edges));
        assert_eq!(s.num_edges(), edges.len());
    }

    #[test]
    fn estimates_are_unbiased_across_seeds() {
        let edges = distinct_edges(600, 60, 13);
        let truth = exact_triangles(&edges);
        assert!(truth > 0.0);

        let mean = (0..40)
            .map(|seed| {
                let mut s = InsertionSampler::new(seed, 200, 0.1, 0.3).unwrap();
                for &(u, v) in &edges {
                    s.process_edge(u, v);
                }
                s.global_triangles()
            })
            .sum::<f64>()
            / 40.0;

        // The estimator is unbiased; forty seeds keep the sample mean well
        // inside half an order of magnitude of the truth.
        assert!(
            mean > 0.5 * truth && mean < 1.5 * truth,
            "mean estimate {mean} too far from the true count {truth}"
        );
    }

    proptest! {
        #[test]
        fn invariants_hold_on_random_streams(
            seed in 0u64..500,
            raw in proptest::collection::vec((0u32..25, 0u32..25), 1..150),
        ) {
            let mut s = InsertionSampler::new(seed, 12, 0.25, 0.5).unwrap();
            let mut seen = HashSet::new();
            for (u, v) in raw {
                if u != v && seen.insert(Edge::new(u, v)) {
                    s.process_edge(u, v);
                    s.assert_consistent();
                }
            }
            prop_assert!(s.global_triangles() >= 0.0);
        }
    }
}
