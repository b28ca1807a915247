//! Pairwise squared-hinge ranking loss.
//!
//! For a query distribution and labeled positive/negative nodes, every pair whose scores are
//! not separated by `margin` (i.e. \(\delta = s_{neg} - s_{pos} + \text{margin} > 0\)) costs
//! \(\delta^2\). An L2 penalty \(\mu \sum_f \theta_f^2\) over trainable features is added, with
//! \(\mu\) taken from the session config.

use crate::graph::FeatureGraph;
use crate::params::ParamVec;
use crate::rwr::Distribution;
use crate::session::Srw;
use crate::trainer::{Example, LossStrategy};
use crate::Result;
use std::collections::{BTreeMap, BTreeSet};

/// A query with labeled positive and negative nodes.
#[derive(Debug, Clone)]
pub struct PosNegExample<G: FeatureGraph> {
    pub graph: G,
    /// Start distribution of the walk (restart links live in the graph).
    pub query: Distribution<G::Node>,
    pub pos: Vec<G::Node>,
    pub neg: Vec<G::Node>,
}

impl<G: FeatureGraph> PosNegExample<G> {
    pub fn new(graph: G, query: Distribution<G::Node>, pos: Vec<G::Node>, neg: Vec<G::Node>) -> Self {
        Self { graph, query, pos, neg }
    }
}

impl<G: FeatureGraph> Example for PosNegExample<G> {
    type Graph = G;

    fn graph(&self) -> &G {
        &self.graph
    }

    /// Number of labeled nodes.
    fn length(&self) -> usize {
        self.pos.len() + self.neg.len()
    }
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PairwiseL2SqLoss {
    pub margin: f64,
}

impl Default for PairwiseL2SqLoss {
    fn default() -> Self {
        Self { margin: 0.01 }
    }
}

impl PairwiseL2SqLoss {
    pub fn new(margin: f64) -> Self {
        Self { margin }
    }

    fn regularization(&self, srw: &Srw, params: &ParamVec) -> f64 {
        let mu = srw.config().mu;
        params
            .iter()
            .filter(|(f, _)| srw.gate().is_trainable(f))
            .map(|(_, w)| mu * w * w)
            .sum()
    }
}

impl<G: FeatureGraph> LossStrategy<PosNegExample<G>> for PairwiseL2SqLoss {
    fn gradient(&self, srw: &Srw, params: &ParamVec, example: &PosNegExample<G>) -> Result<ParamVec> {
        let run = srw.deriv_rwr_by_params(&example.graph, &example.query, params);
        let empty = BTreeMap::new();

        let mut grad: ParamVec = BTreeMap::new();
        for pos in &example.pos {
            let d_pos = run.derivatives.get(pos).unwrap_or(&empty);
            for neg in &example.neg {
                let delta = run.score(neg) - run.score(pos) + self.margin;
                if delta <= 0.0 {
                    continue;
                }
                let d_neg = run.derivatives.get(neg).unwrap_or(&empty);
                let features: BTreeSet<&String> = d_pos.keys().chain(d_neg.keys()).collect();
                for f in features {
                    let dn = d_neg.get(f).copied().unwrap_or(0.0);
                    let dp = d_pos.get(f).copied().unwrap_or(0.0);
                    *grad.entry(f.clone()).or_insert(0.0) += 2.0 * delta * (dn - dp);
                }
            }
        }

        let mu = srw.config().mu;
        for (f, w) in params {
            if srw.gate().is_trainable(f) {
                *grad.entry(f.clone()).or_insert(0.0) += 2.0 * mu * w;
            }
        }
        Ok(grad)
    }

    fn loss(&self, srw: &Srw, params: &ParamVec, example: &PosNegExample<G>) -> Result<f64> {
        let scores = srw.rwr(&example.graph, &example.query, params);
        let score = |n: &G::Node| scores.get(n).copied().unwrap_or(0.0);

        let mut loss = 0.0;
        for pos in &example.pos {
            for neg in &example.neg {
                let delta = score(neg) - score(pos) + self.margin;
                if delta > 0.0 {
                    loss += delta * delta;
                }
            }
        }
        Ok(loss + self.regularization(srw, params))
    }
}
