//! `srw`: supervised random walks with restart.
//!
//! Edge weights are a linear function of per-edge features and a shared, nonnegative
//! parameter vector. This crate provides the numeric substrate a ranking-loss trainer needs:
//! the forward walk, the derivative of the walk output with respect to the parameters, and a
//! single-example SGD step that never pushes a weight below zero.
//!
//! Public invariants (must not drift):
//! - **Fixed step count**: walks and derivatives always run exactly the configured number of
//!   steps; there is no convergence test.
//! - **No silent normalization**: distributions are never renormalized. Mass reaching a node
//!   with zero outgoing weight is dropped.
//! - **Nonnegative parameters**: a successful [`Trainer::train_on_example`] leaves every
//!   updated weight \(\ge 0\); a failing one leaves the vector untouched.
//! - **Determinism**: walks and derivatives iterate ordered maps, so results are bit-for-bit
//!   reproducible given identical inputs.
//!
//! Swappable (allowed to change without breaking the contract):
//! - the loss strategy (anything implementing [`LossStrategy`])
//! - serial vs parallel epoch drivers
//! - the graph representation (anything implementing [`FeatureGraph`])

pub mod config;
pub mod derivative;
pub mod gate;
pub mod graph;
pub mod loss;
pub mod params;
pub mod rwr;
pub mod session;
pub mod topk;
pub mod trainer;
pub mod weights;

pub use config::SrwConfig;
pub use derivative::{deriv_rwr_by_params, deriv_walk_prob_by_params, Derivatives, RwrGradient};
pub use gate::FeatureGate;
pub use graph::{AnnotatedGraph, Feature, FeatureGraph};
pub use loss::{PairwiseL2SqLoss, PosNegExample};
pub use params::{add_default_weights, ParamVec, SharedParams, DEFAULT_WEIGHT_JITTER};
pub use rwr::{rwr, total_mass, walk_once, Distribution};
pub use session::Srw;
pub use topk::top_k;
pub use trainer::{Example, LossStrategy, Trainer, Unbound};
pub use weights::{deriv_edge_weight_by_params, edge_weight, total_edge_weight};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported operation: {0} requires a bound loss strategy")]
    Unsupported(&'static str),
    #[error("parameter weight {feature} can't be negative (got {value})")]
    NegativeWeight { feature: String, value: f64 },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, Error>;
