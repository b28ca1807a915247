//! Frozen ("untrained") features.

use crate::graph::Feature;
use std::collections::BTreeSet;

/// Filters feature names against a set of features excluded from training.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureGate {
    untrained: BTreeSet<String>,
}

impl FeatureGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_untrained<I, S>(untrained: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { untrained: untrained.into_iter().map(Into::into).collect() }
    }

    /// Freeze `feature`. Returns false if it was already frozen.
    pub fn untrain(&mut self, feature: impl Into<String>) -> bool {
        self.untrained.insert(feature.into())
    }

    /// Unfreeze `feature`. Returns false if it was not frozen.
    pub fn retrain(&mut self, feature: &str) -> bool {
        self.untrained.remove(feature)
    }

    pub fn untrained_features(&self) -> &BTreeSet<String> {
        &self.untrained
    }

    pub fn is_trainable(&self, feature: &str) -> bool {
        !self.untrained.contains(feature)
    }

    /// The subset of `candidates` that is not frozen.
    ///
    /// Accepts anything that yields names: a name set, `params.keys()`, and so on.
    pub fn trainable_features<I, S>(&self, candidates: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        candidates
            .into_iter()
            .filter(|f| self.is_trainable(f.as_ref()))
            .map(|f| f.as_ref().to_string())
            .collect()
    }

    /// [`FeatureGate::trainable_features`] over feature records, reduced to their names.
    pub fn trainable_feature_names(&self, features: &[Feature]) -> BTreeSet<String> {
        self.trainable_features(features.iter().map(|f| f.name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamVec;

    #[test]
    fn filters_all_input_shapes() {
        let gate = FeatureGate::with_untrained(["restart"]);

        let names: BTreeSet<String> = ["f", "restart"].iter().map(|s| s.to_string()).collect();
        let from_set = gate.trainable_features(&names);

        let params: ParamVec = [("f".to_string(), 1.0), ("restart".to_string(), 1.0)]
            .into_iter()
            .collect();
        let from_params = gate.trainable_features(params.keys());

        let from_records =
            gate.trainable_feature_names(&[Feature::new("f", 1.0), Feature::new("restart", 2.0)]);

        let expected: BTreeSet<String> = ["f".to_string()].into_iter().collect();
        assert_eq!(from_set, expected);
        assert_eq!(from_params, expected);
        assert_eq!(from_records, expected);
    }

    #[test]
    fn untrain_and_retrain() {
        let mut gate = FeatureGate::new();
        assert!(gate.is_trainable("f"));
        assert!(gate.untrain("f"));
        assert!(!gate.untrain("f"));
        assert!(!gate.is_trainable("f"));
        assert!(gate.retrain("f"));
        assert!(gate.untrained_features().is_empty());
    }
}
