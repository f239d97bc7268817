use crate::subgraph::SubGraph;
use crate::{Edge, NodeId};

/// Enumerates the triangles that the arriving edge `e` closes against the
/// retained subgraph, calling `found(w, weight)` once per closing third
/// vertex. Returns the summed weight.
///
/// Must run before `e` itself is admitted. `n_l` is the effective size of
/// the light-edge stream; each triangle is inverse-probability weighted by
/// how many of its two existing edges are reservoir samples.
pub(crate) fn count_closing<F>(g: &SubGraph, e: Edge, n_l: i64, s_cap: usize, mut found: F) -> f64
where
    F: FnMut(NodeId, f64),
{
    let (u, v) = e.endpoints();
    let Some(u_neighs) = g.neighbors(u) else {
        return 0.0;
    };
    let Some(v_neighs) = g.neighbors(v) else {
        return 0.0;
    };

    // Scan the smaller neighbourhood and probe the larger.
    let (scan, probe) = if u_neighs.len() <= v_neighs.len() {
        (u_neighs, v_neighs)
    } else {
        (v_neighs, u_neighs)
    };

    let mut cum = 0.0;
    for (&w, &scan_det) in scan {
        if w == u || w == v {
            continue;
        }
        if let Some(&probe_det) = probe.get(&w) {
            let weight = triangle_weight(n_l, s_cap, !scan_det, !probe_det);
            cum += weight;
            found(w, weight);
        }
    }
    cum
}

/// Weight of one discovered triangle. A light edge survives in the
/// reservoir with probability `s_cap / n_l`, so a triangle whose two
/// existing edges include `j` light ones is scaled by the inverse of that
/// probability taken `j` times (without replacement for `j = 2`).
fn triangle_weight(n_l: i64, s_cap: usize, first_light: bool, second_light: bool) -> f64 {
    if n_l <= s_cap as i64 {
        return 1.0;
    }
    let n_l = n_l as f64;
    let s = s_cap as f64;
    if first_light && second_light {
        (n_l / s) * (n_l - 1.0) / (s - 1.0)
    } else if first_light || second_light {
        n_l / s
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wedge_graph(det_uw: bool, det_vw: bool) -> SubGraph {
        let mut g = SubGraph::new();
        g.add(Edge::new(1, 3), det_uw);
        g.add(Edge::new(2, 3), det_vw);
        g
    }

    #[test]
    fn no_correction_within_budget() {
        let g = wedge_graph(false, false);
        let mut closed = Vec::new();
        let cum = count_closing(&g, Edge::new(1, 2), 5, 10, |w, inc| closed.push((w, inc)));
        assert_eq!(cum, 1.0);
        assert_eq!(closed, vec![(3, 1.0)]);
    }

    #[test]
    fn one_light_edge_scales_linearly() {
        let g = wedge_graph(true, false);
        let cum = count_closing(&g, Edge::new(1, 2), 20, 10, |_, _| {});
        assert_eq!(cum, 2.0);
    }

    #[test]
    fn two_light_edges_scale_quadratically() {
        let g = wedge_graph(false, false);
        let cum = count_closing(&g, Edge::new(1, 2), 20, 10, |_, _| {});
        assert_eq!(cum, (20.0 / 10.0) * (19.0 / 9.0));
    }

    #[test]
    fn deterministic_edges_always_weigh_one() {
        let g = wedge_graph(true, true);
        let cum = count_closing(&g, Edge::new(1, 2), 1000, 10, |_, _| {});
        assert_eq!(cum, 1.0);
    }

    #[test]
    fn absent_endpoint_contributes_nothing() {
        let g = wedge_graph(true, true);
        assert_eq!(count_closing(&g, Edge::new(1, 9), 0, 10, |_, _| {}), 0.0);
        assert_eq!(count_closing(&g, Edge::new(8, 9), 0, 10, |_, _| {}), 0.0);
    }

    #[test]
    fn the_shared_edge_is_not_a_wedge() {
        // With (1, 2) already retained, 2 appears in N(1) but must not be
        // reported as a closing vertex for the re-arriving (1, 2).
        let mut g = wedge_graph(true, true);
        g.add(Edge::new(1, 2), true);
        let mut closed = Vec::new();
        let cum = count_closing(&g, Edge::new(1, 2), 0, 10, |w, inc| closed.push((w, inc)));
        assert_eq!(cum, 1.0);
        assert_eq!(closed, vec![(3, 1.0)]);
    }
}
