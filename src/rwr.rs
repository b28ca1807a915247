//! Random walk with restart over a feature-weighted graph.
//!
//! Restart links are assumed to be explicit edges in the graph, so a walk step is a plain
//! weighted propagation. Mass is **not** renormalized: a node whose outgoing weight is zero
//! absorbs its mass, and that mass leaves the distribution for good.

use crate::graph::FeatureGraph;
use crate::params::ParamVec;
use crate::weights::{edge_weight, total_edge_weight};
use std::collections::BTreeMap;

/// Node -> mass. Not required to sum to 1.
pub type Distribution<N> = BTreeMap<N, f64>;

/// One propagation step away from `dist`.
///
/// Each node `u` with mass `m` sends `m * w(u,v) / Z_u` along every outgoing edge. Dead ends
/// (`Z_u == 0`) are skipped and their mass is dropped.
pub fn walk_once<G: FeatureGraph>(
    graph: &G,
    dist: &Distribution<G::Node>,
    params: &ParamVec,
) -> Distribution<G::Node> {
    let mut next: Distribution<G::Node> = BTreeMap::new();
    for (k, (u, &mass)) in dist.iter().enumerate() {
        if k > 0 && k % 100 == 0 {
            tracing::debug!(nodes = k, "walked from nodes");
        }
        let z = total_edge_weight(graph, u, params);
        if z == 0.0 {
            tracing::debug!(node = ?u, mass, "0 total edge weight; skipping");
            continue;
        }
        for v in graph.neighbors(u) {
            let inc = mass * edge_weight(graph, u, &v, params) / z;
            *next.entry(v).or_insert(0.0) += inc;
        }
    }
    if next.is_empty() {
        tracing::warn!(input_nodes = dist.len(), "no entries after walk step");
    }
    next
}

/// Apply [`walk_once`] exactly `steps` times.
///
/// `steps == 0` returns `start` unchanged. There is no convergence check and no early exit,
/// even once the distribution is empty.
pub fn rwr<G: FeatureGraph>(
    graph: &G,
    start: &Distribution<G::Node>,
    params: &ParamVec,
    steps: usize,
) -> Distribution<G::Node> {
    let mut dist = start.clone();
    for _ in 0..steps {
        dist = walk_once(graph, &dist, params);
    }
    dist
}

/// Total mass held by `dist`.
pub fn total_mass<N>(dist: &Distribution<N>) -> f64 {
    dist.values().sum()
}
