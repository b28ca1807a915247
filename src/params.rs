//! The learned parameter vector.

use crate::graph::FeatureGraph;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rand::Rng;
use std::collections::BTreeMap;

/// Feature name -> nonnegative weight.
pub type ParamVec = BTreeMap<String, f64>;

/// Jitter added on top of the default weight of 1.0.
pub const DEFAULT_WEIGHT_JITTER: f64 = 0.01;

/// Insert a default weight for every graph feature missing from `params`.
///
/// New weights are `1.0 + 0.01 * U[0,1)`, so features start near 1 but not tied.
/// Existing entries are never touched, which makes this idempotent once every feature is
/// present. Returns the number of inserted features.
pub fn add_default_weights<G, R>(graph: &G, params: &mut ParamVec, rng: &mut R) -> usize
where
    G: FeatureGraph,
    R: Rng + ?Sized,
{
    let mut added = 0usize;
    for name in graph.feature_names() {
        if params.contains_key(&name) {
            continue;
        }
        let w = 1.0 + DEFAULT_WEIGHT_JITTER * rng.random::<f64>();
        tracing::trace!(feature = %name, weight = w, "default weight");
        params.insert(name, w);
        added += 1;
    }
    added
}

/// A parameter vector shared between training workers.
///
/// Walks and gradients should run on a [`SharedParams::snapshot`]; only the trainer's
/// clip-and-apply step takes the write guard. A snapshot may be stale by the time it is
/// used; that race is accepted for every path except the update itself.
///
/// Lock order inside the crate is: jitter rng mutex, then this lock. Outside callers only
/// get copies ([`SharedParams::snapshot`], [`SharedParams::get`]), never a guard.
#[derive(Debug, Default)]
pub struct SharedParams {
    inner: RwLock<ParamVec>,
}

impl SharedParams {
    pub fn new(params: ParamVec) -> Self {
        Self { inner: RwLock::new(params) }
    }

    /// Clone the current vector.
    pub fn snapshot(&self) -> ParamVec {
        self.inner.read().clone()
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.inner.read().get(feature).copied()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Guards stay crate-private: the trainer takes the jitter rng mutex *before* this lock,
    /// and never holds a guard across a call back into the trainer. A caller holding a guard
    /// while training on the same vector would deadlock.
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, ParamVec> {
        self.inner.read()
    }

    /// Exclusive access. Hold the guard for the whole read-modify-write sequence.
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, ParamVec> {
        self.inner.write()
    }

    pub fn into_inner(self) -> ParamVec {
        self.inner.into_inner()
    }
}

impl From<ParamVec> for SharedParams {
    fn from(params: ParamVec) -> Self {
        Self::new(params)
    }
}
