//! Walk session: hyperparameters plus the frozen-feature gate.

use crate::config::SrwConfig;
use crate::derivative::{deriv_rwr_by_params, RwrGradient};
use crate::gate::FeatureGate;
use crate::graph::FeatureGraph;
use crate::params::ParamVec;
use crate::rwr::{rwr, Distribution};

/// What a loss strategy needs to run walks the way the trainer is configured.
///
/// Walks and derivatives are pure in `(graph, start, params)`; the session only fixes the step
/// count and which features are frozen.
#[derive(Debug, Clone, Default)]
pub struct Srw {
    config: SrwConfig,
    gate: FeatureGate,
}

impl Srw {
    pub fn new(config: SrwConfig) -> Self {
        Self { config, gate: FeatureGate::new() }
    }

    pub fn with_gate(config: SrwConfig, gate: FeatureGate) -> Self {
        Self { config, gate }
    }

    pub fn config(&self) -> &SrwConfig {
        &self.config
    }

    pub fn gate(&self) -> &FeatureGate {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut FeatureGate {
        &mut self.gate
    }

    /// [`rwr`] with the configured step count.
    pub fn rwr<G: FeatureGraph>(
        &self,
        graph: &G,
        start: &Distribution<G::Node>,
        params: &ParamVec,
    ) -> Distribution<G::Node> {
        rwr(graph, start, params, self.config.steps)
    }

    /// [`deriv_rwr_by_params`] with the configured step count and gate.
    pub fn deriv_rwr_by_params<G: FeatureGraph>(
        &self,
        graph: &G,
        start: &Distribution<G::Node>,
        params: &ParamVec,
    ) -> RwrGradient<G::Node> {
        deriv_rwr_by_params(graph, start, params, self.config.steps, &self.gate)
    }
}
