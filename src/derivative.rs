//! Derivative of the RWR output with respect to the parameter vector.
//!
//! The forward walk and a per-feature derivative table are advanced together for a fixed
//! number of steps. With \(p^{(t)}\) the distribution after step \(t\) and
//! \(d^{(t)}_u[f] = \partial p^{(t)}_u / \partial \theta_f\):
//!
//! \[
//!   d^{(t+1)}_u[f] \mathrel{+}= w(j,u)\, d^{(t)}_j[f] + p^{(t)}_j\, \frac{\partial Q_{ju}}{\partial \theta_f}
//! \]
//!
//! for every node `j` with positive mass, every out-neighbor `u` of `j`, and every trainable
//! feature `f` on the edge `j -> u`. The transition derivative uses the quotient rule:
//!
//! \[
//!   \frac{\partial Q_{ju}}{\partial \theta_f}
//!   = \frac{x_f(j,u)\, Z_j - w(j,u) \sum_v x_f(j,v)}{Z_j^2}
//! \]
//!
//! Dead ends (\(Z_j = 0\)) contribute nothing, exactly as in the forward walk.
//!
//! Public invariants:
//! - Untrained features never appear in the output table.
//! - The start distribution has zero derivative (the table starts empty).
//! - `steps == 0` yields the start distribution and an empty table.

use crate::gate::FeatureGate;
use crate::graph::FeatureGraph;
use crate::params::ParamVec;
use crate::rwr::{walk_once, Distribution};
use crate::weights::{deriv_edge_weight_by_params, edge_weight};
use std::collections::BTreeMap;

/// Node -> feature -> \(\partial\,\text{mass} / \partial \theta_f\).
pub type Derivatives<N> = BTreeMap<N, BTreeMap<String, f64>>;

/// Output of [`deriv_rwr_by_params`].
#[derive(Debug, Clone)]
pub struct RwrGradient<N> {
    /// Forward distribution after the same number of steps (matches [`crate::rwr::rwr`]).
    pub scores: Distribution<N>,
    /// Derivative table after the last step.
    pub derivatives: Derivatives<N>,
}

impl<N: Ord> RwrGradient<N> {
    /// \(\partial\,\text{mass}(node) / \partial \theta_f\); 0 if absent.
    pub fn derivative(&self, node: &N, feature: &str) -> f64 {
        self.derivatives
            .get(node)
            .and_then(|row| row.get(feature))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn score(&self, node: &N) -> f64 {
        self.scores.get(node).copied().unwrap_or(0.0)
    }
}

/// Outgoing edges of one node, with the quantities shared by every transition out of it.
struct OutEdges<N> {
    targets: Vec<(N, f64)>,
    total: f64,
    /// \(\sum_v x_f(j,v)\) per feature.
    feature_sums: BTreeMap<String, f64>,
}

impl<N: Ord + Clone> OutEdges<N> {
    fn new<G: FeatureGraph<Node = N>>(graph: &G, j: &N, params: &ParamVec) -> Self {
        let mut targets = Vec::new();
        let mut total = 0.0;
        let mut feature_sums: BTreeMap<String, f64> = BTreeMap::new();
        for v in graph.neighbors(j) {
            let ew = edge_weight(graph, j, &v, params);
            total += ew;
            for f in graph.features(j, &v) {
                *feature_sums.entry(f.name.clone()).or_insert(0.0) += f.weight;
            }
            targets.push((v, ew));
        }
        Self { targets, total, feature_sums }
    }

    fn transition_derivative(&self, feature: &str, dw: f64, ew: f64) -> f64 {
        let z = self.total;
        let sum = self.feature_sums.get(feature).copied().unwrap_or(0.0);
        (dw * z - ew * sum) / (z * z)
    }
}

/// \(\partial Q_{ju} / \partial \theta_f\) for every trainable feature on `j -> u`.
///
/// Empty when `j` is a dead end.
pub fn deriv_walk_prob_by_params<G: FeatureGraph>(
    graph: &G,
    j: &G::Node,
    u: &G::Node,
    params: &ParamVec,
    gate: &FeatureGate,
) -> BTreeMap<String, f64> {
    let out = OutEdges::new(graph, j, params);
    if out.total == 0.0 {
        return BTreeMap::new();
    }
    let ew = edge_weight(graph, j, u, params);
    deriv_edge_weight_by_params(graph, j, u)
        .into_iter()
        .filter(|(f, _)| gate.is_trainable(f))
        .map(|(f, dw)| {
            let dq = out.transition_derivative(&f, dw, ew);
            (f, dq)
        })
        .collect()
}

/// Run the walk for `steps` steps and return both the final distribution and
/// \(\partial\,\text{rwr}(start)_u / \partial \theta_f\).
pub fn deriv_rwr_by_params<G: FeatureGraph>(
    graph: &G,
    start: &Distribution<G::Node>,
    params: &ParamVec,
    steps: usize,
    gate: &FeatureGate,
) -> RwrGradient<G::Node> {
    let mut p = start.clone();
    let mut d: Derivatives<G::Node> = BTreeMap::new();

    for step in 0..steps {
        let mut d_next: Derivatives<G::Node> = BTreeMap::new();
        for (j, &mass) in &p {
            if mass <= 0.0 {
                continue;
            }
            let out = OutEdges::new(graph, j, params);
            if out.total == 0.0 {
                continue;
            }
            let d_j = d.get(j);
            for (u, ew) in &out.targets {
                for (f, dw) in deriv_edge_weight_by_params(graph, j, u) {
                    if !gate.is_trainable(&f) {
                        continue;
                    }
                    let dq = out.transition_derivative(&f, dw, *ew);
                    let prev = d_j.and_then(|row| row.get(&f)).copied().unwrap_or(0.0);
                    *d_next
                        .entry(u.clone())
                        .or_default()
                        .entry(f)
                        .or_insert(0.0) += ew * prev + mass * dq;
                }
            }
        }
        p = walk_once(graph, &p, params);
        d = d_next;
        tracing::trace!(step, nodes = p.len(), rows = d.len(), "derivative step");
    }

    RwrGradient { scores: p, derivatives: d }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AnnotatedGraph, Feature};
    use crate::rwr::rwr;

    fn params(pairs: &[(&str, f64)]) -> ParamVec {
        pairs.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }

    fn start<N: Ord>(node: N) -> Distribution<N> {
        [(node, 1.0)].into_iter().collect()
    }

    #[test]
    fn single_edge_transition_is_constant() {
        // Q(A->B) is 1 whatever the parameters are.
        let g = AnnotatedGraph::new().with_edge("A", "B", [Feature::new("f", 1.0)]);
        let out = deriv_rwr_by_params(&g, &start("A"), &params(&[("f", 1.0)]), 1, &FeatureGate::new());
        assert_eq!(out.derivative(&"B", "f"), 0.0);
        assert!((out.score(&"B") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn untrained_feature_is_absent() {
        let g = AnnotatedGraph::new()
            .with_edge("A", "B", [Feature::new("f", 1.0), Feature::new("g", 1.0)])
            .with_edge("A", "C", [Feature::new("f", 1.0)]);
        let gate = FeatureGate::with_untrained(["g"]);
        let out = deriv_rwr_by_params(&g, &start("A"), &params(&[("f", 1.0), ("g", 1.0)]), 1, &gate);

        for row in out.derivatives.values() {
            assert!(!row.contains_key("g"));
        }
        // Z=3, w(A,B)=2, sum_f=2: (1*3 - 2*2)/9 and (1*3 - 1*2)/9
        assert!((out.derivative(&"B", "f") + 1.0 / 9.0).abs() < 1e-12);
        assert!((out.derivative(&"C", "f") - 1.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn dead_end_contributes_nothing() {
        let g = AnnotatedGraph::new().with_edge("A", "B", [Feature::new("f", 1.0)]);
        let out = deriv_rwr_by_params(&g, &start("B"), &params(&[("f", 1.0)]), 3, &FeatureGate::new());
        assert!(out.scores.is_empty());
        assert!(out.derivatives.is_empty());
    }

    #[test]
    fn zero_steps_is_identity_with_empty_table() {
        let g = AnnotatedGraph::new().with_edge(0u32, 1, [Feature::new("f", 1.0)]);
        let out = deriv_rwr_by_params(&g, &start(0u32), &params(&[("f", 1.0)]), 0, &FeatureGate::new());
        assert_eq!(out.scores, start(0u32));
        assert!(out.derivatives.is_empty());
    }

    #[test]
    fn scores_match_forward_walk() {
        let g = AnnotatedGraph::new()
            .with_edge(0u32, 1, [Feature::new("f", 1.0)])
            .with_edge(0, 2, [Feature::new("g", 2.0)])
            .with_edge(1, 0, [Feature::new("restart", 1.0)])
            .with_edge(2, 0, [Feature::new("restart", 1.0)])
            .with_edge(2, 1, [Feature::new("f", 0.5)]);
        let p = params(&[("f", 1.1), ("g", 0.9), ("restart", 1.0)]);
        let out = deriv_rwr_by_params(&g, &start(0u32), &p, 6, &FeatureGate::new());
        assert_eq!(out.scores, rwr(&g, &start(0u32), &p, 6));
    }

    #[test]
    fn walk_prob_derivative_matches_quotient_rule() {
        let g = AnnotatedGraph::new()
            .with_edge(0u32, 1, [Feature::new("f", 2.0)])
            .with_edge(0, 2, [Feature::new("f", 1.0), Feature::new("g", 1.0)]);
        let p = params(&[("f", 1.0), ("g", 1.0)]);
        // Z = 2 + 2 = 4, w(0,1) = 2, sum_f = 3, sum_g = 1
        let d01 = deriv_walk_prob_by_params(&g, &0, &1, &p, &FeatureGate::new());
        assert!((d01["f"] - (2.0 * 4.0 - 2.0 * 3.0) / 16.0).abs() < 1e-12);
        assert!(!d01.contains_key("g"));

        let d02 = deriv_walk_prob_by_params(&g, &0, &2, &p, &FeatureGate::new());
        assert!((d02["f"] - (1.0 * 4.0 - 2.0 * 3.0) / 16.0).abs() < 1e-12);
        assert!((d02["g"] - (1.0 * 4.0 - 2.0 * 1.0) / 16.0).abs() < 1e-12);

        assert!(deriv_walk_prob_by_params(&g, &1, &0, &p, &FeatureGate::new()).is_empty());
    }
}
