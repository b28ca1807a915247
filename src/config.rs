//! Hyperparameters.

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SrwConfig {
    /// Walk length: number of propagation steps.
    pub steps: usize,
    /// Regularization strength. Only loss strategies read it.
    pub mu: f64,
    /// Base learning rate \(\eta\), decayed as \(\eta / \text{epoch}^2\).
    pub eta: f64,
    /// Seed for default-weight jitter.
    pub seed: u64,
}

impl Default for SrwConfig {
    fn default() -> Self {
        Self { steps: 10, mu: 0.001, eta: 1.0, seed: 42 }
    }
}

impl SrwConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.eta.is_finite() || self.eta < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "eta must be finite and non-negative (eta={})",
                self.eta
            )));
        }
        if !self.mu.is_finite() || self.mu < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "mu must be finite and non-negative (mu={})",
                self.mu
            )));
        }
        Ok(())
    }
}
