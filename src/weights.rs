//! Edge weights as a linear function of edge features and the parameter vector.
//!
//! \[
//!   w(u,v) = \sum_{f \in \phi(u,v)} \theta_f \cdot x_f
//! \]
//!
//! Features absent from the parameter vector contribute 0.

use crate::graph::FeatureGraph;
use crate::params::ParamVec;
use std::collections::BTreeMap;

/// Unnormalized weight of the edge `u -> v`.
pub fn edge_weight<G: FeatureGraph>(graph: &G, u: &G::Node, v: &G::Node, params: &ParamVec) -> f64 {
    graph
        .features(u, v)
        .iter()
        .map(|f| params.get(&f.name).copied().unwrap_or(0.0) * f.weight)
        .sum()
}

/// Sum of the unnormalized weights of all outgoing edges of `u`.
///
/// Zero means `u` is a dead end for the walk.
pub fn total_edge_weight<G: FeatureGraph>(graph: &G, u: &G::Node, params: &ParamVec) -> f64 {
    graph
        .neighbors(u)
        .iter()
        .map(|v| edge_weight(graph, u, v, params))
        .sum()
}

/// \(\partial w(u,v) / \partial \theta_f\) for every feature on `u -> v`.
///
/// The model is linear, so this is just the feature weight and does not depend on the
/// current parameters. Repeated feature names on one edge are summed.
pub fn deriv_edge_weight_by_params<G: FeatureGraph>(
    graph: &G,
    u: &G::Node,
    v: &G::Node,
) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    for f in graph.features(u, v) {
        *out.entry(f.name.clone()).or_insert(0.0) += f.weight;
    }
    out
}
