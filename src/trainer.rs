//! Single-example SGD over a nonnegative parameter vector.
//!
//! The per-example gradient and loss come from a [`LossStrategy`] supplied at construction;
//! the trainer only owns the step: learning-rate decay, rate clipping, and the locked update.
//!
//! Public invariants:
//! - After `train_on_example` returns `Ok`, every weight it touched is \(\ge 0\).
//! - A failed update writes nothing.
//! - The clip/apply sequence runs under one write guard on the [`SharedParams`].

use crate::config::SrwConfig;
use crate::gate::FeatureGate;
use crate::graph::FeatureGraph;
use crate::params::{add_default_weights, ParamVec, SharedParams};
use crate::session::Srw;
use crate::{Error, Result};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A training example: a graph plus whatever the loss strategy needs to rank on it.
pub trait Example {
    type Graph: FeatureGraph;

    fn graph(&self) -> &Self::Graph;

    /// Size normalizer for the learning rate (and for [`Trainer::average_loss`]). Must be > 0.
    fn length(&self) -> usize;
}

/// Ranking loss over one example.
///
/// `gradient` is the gradient of `loss` with respect to the parameters: the trainer
/// subtracts `rate * gradient[f]` from each weight.
pub trait LossStrategy<E: Example> {
    fn gradient(&self, srw: &Srw, params: &ParamVec, example: &E) -> Result<ParamVec>;

    fn loss(&self, srw: &Srw, params: &ParamVec, example: &E) -> Result<f64>;
}

/// Placeholder strategy: every call fails with [`Error::Unsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbound;

impl<E: Example> LossStrategy<E> for Unbound {
    fn gradient(&self, _srw: &Srw, _params: &ParamVec, _example: &E) -> Result<ParamVec> {
        Err(Error::Unsupported("gradient"))
    }

    fn loss(&self, _srw: &Srw, _params: &ParamVec, _example: &E) -> Result<f64> {
        Err(Error::Unsupported("loss"))
    }
}

/// Training session: walk configuration, frozen features, epoch counter, and the strategy.
#[derive(Debug)]
pub struct Trainer<S> {
    srw: Srw,
    strategy: S,
    epoch: usize,
    rng: Mutex<ChaCha8Rng>,
}

impl<S> Trainer<S> {
    pub fn new(config: SrwConfig, strategy: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            srw: Srw::new(config),
            strategy,
            epoch: 1,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(config.seed)),
        })
    }

    pub fn srw(&self) -> &Srw {
        &self.srw
    }

    pub fn config(&self) -> &SrwConfig {
        self.srw.config()
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn gate(&self) -> &FeatureGate {
        self.srw.gate()
    }

    /// Exclude `feature` from derivatives and updates.
    pub fn untrain(&mut self, feature: impl Into<String>) -> bool {
        self.srw.gate_mut().untrain(feature)
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn next_epoch(&mut self) -> usize {
        self.epoch += 1;
        self.epoch
    }

    pub fn set_epoch(&mut self, epoch: usize) -> Result<()> {
        if epoch == 0 {
            return Err(Error::InvalidParameter("epoch must be >= 1".to_string()));
        }
        self.epoch = epoch;
        Ok(())
    }

    /// Base learning rate for an example of the given length: \(\eta / \text{epoch}^2 / \text{length}\).
    pub fn base_rate(&self, length: usize) -> f64 {
        let epoch = self.epoch as f64;
        self.config().eta / (epoch * epoch) / length as f64
    }

    /// Add default weights for the graph's features. Returns the number inserted.
    pub fn ensure_default_weights<G: FeatureGraph>(&self, graph: &G, params: &SharedParams) -> usize {
        let names = graph.feature_names();
        {
            let current = params.read();
            if names.iter().all(|f| current.contains_key(f)) {
                return 0;
            }
        }
        let mut rng = self.rng.lock();
        let mut guard = params.write();
        add_default_weights(graph, &mut guard, &mut *rng)
    }

    /// One SGD step on `params` from `example`. Returns the rate actually applied.
    ///
    /// The gradient is computed on a snapshot without holding the lock. The rate is then
    /// clipped against the *current* weights and applied under the write guard, so no other
    /// writer can move a weight between the clip and the update.
    pub fn train_on_example<E>(&self, params: &SharedParams, example: &E) -> Result<f64>
    where
        E: Example,
        S: LossStrategy<E>,
    {
        let length = checked_length(example)?;
        self.ensure_default_weights(example.graph(), params);

        let snapshot = params.snapshot();
        let grad: Vec<(String, f64)> = self
            .strategy
            .gradient(&self.srw, &snapshot, example)?
            .into_iter()
            .filter(|(f, _)| self.gate().is_trainable(f))
            .collect();
        tracing::debug!(features = grad.len(), "gradient");

        let base = self.base_rate(length);

        let mut guard = params.write();
        let rate = clip_rate(base, &guard, &grad);
        tracing::debug!(base, rate, epoch = self.epoch, "rate");

        let staged = stage_update(&guard, &grad, rate)?;
        for (f, w) in staged {
            guard.insert(f, w);
        }
        Ok(rate)
    }

    /// Mean of `loss / length` over `examples`.
    ///
    /// NaN for an empty collection.
    pub fn average_loss<E>(&self, params: &SharedParams, examples: &[E]) -> Result<f64>
    where
        E: Example,
        S: LossStrategy<E>,
    {
        let mut total = 0.0;
        let mut count = 0usize;
        for example in examples {
            let length = checked_length(example)?;
            self.ensure_default_weights(example.graph(), params);
            let loss = self.strategy.loss(&self.srw, &params.snapshot(), example)?;
            total += loss / length as f64;
            count += 1;
        }
        Ok(total / count as f64)
    }

    /// Train on every example once, in order. Does not advance the epoch.
    pub fn train_epoch<E>(&self, params: &SharedParams, examples: &[E]) -> Result<()>
    where
        E: Example,
        S: LossStrategy<E>,
    {
        for example in examples {
            self.train_on_example(params, example)?;
        }
        Ok(())
    }

    /// [`Trainer::train_epoch`] across rayon workers.
    ///
    /// The parameter vector is the only shared state; update order is unspecified.
    #[cfg(feature = "parallel")]
    pub fn train_epoch_parallel<E>(&self, params: &SharedParams, examples: &[E]) -> Result<()>
    where
        E: Example + Sync,
        S: LossStrategy<E> + Sync,
    {
        use rayon::prelude::*;

        examples
            .par_iter()
            .try_for_each(|example| self.train_on_example(params, example).map(|_| ()))
    }
}

fn checked_length<E: Example>(example: &E) -> Result<usize> {
    match example.length() {
        0 => Err(Error::InvalidParameter("example length must be > 0".to_string())),
        n => Ok(n),
    }
}

/// Shrink `rate` so that no feature with a positive gradient can go below zero.
fn clip_rate(mut rate: f64, params: &ParamVec, grad: &[(String, f64)]) -> f64 {
    for (f, g) in grad {
        if *g > 0.0 {
            let w = params.get(f).copied().unwrap_or(0.0);
            rate = rate.min(w / g);
        }
    }
    rate
}

/// New weights for every feature in `grad`, or the first one that would be negative.
fn stage_update(params: &ParamVec, grad: &[(String, f64)], rate: f64) -> Result<Vec<(String, f64)>> {
    let mut staged = Vec::with_capacity(grad.len());
    for (f, g) in grad {
        let w = params.get(f).copied().unwrap_or(0.0);
        let mut step = rate * g;
        if *g > 0.0 && w >= 0.0 && rate <= w / g && step > w {
            // clipped on this feature: step exceeds w by rounding only
            step = w;
        }
        let next = w - step;
        if !(next >= 0.0) {
            tracing::error!(feature = %f, weight = w, gradient = *g, rate, next, "negative weight after update");
            return Err(Error::NegativeWeight { feature: f.clone(), value: next });
        }
        staged.push((f.clone(), next));
    }
    Ok(staged)
}
