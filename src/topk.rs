//! Ranking utilities.

use crate::rwr::Distribution;
use ordered_float::NotNan;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// The `k` highest-mass nodes of `dist`, by descending mass.
///
/// Non-finite and non-positive masses are skipped. Ties keep the smaller node first.
pub fn top_k<N: Ord + Clone>(dist: &Distribution<N>, k: usize) -> Vec<(N, f64)> {
    if k == 0 || dist.is_empty() {
        return Vec::new();
    }
    // min-heap on (mass, Reverse(node)): the root is the weakest kept entry
    let mut heap = BinaryHeap::with_capacity(k + 1);
    for (node, &mass) in dist {
        if !mass.is_finite() || mass <= 0.0 {
            continue;
        }
        let Ok(m) = NotNan::new(mass) else { continue };
        heap.push(Reverse((m, Reverse(node))));
        if heap.len() > k {
            heap.pop();
        }
    }
    let mut results: Vec<(NotNan<f64>, &N)> =
        heap.into_iter().map(|Reverse((m, Reverse(n)))| (m, n)).collect();
    results.sort_unstable_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    results
        .into_iter()
        .map(|(m, n)| (n.clone(), m.into_inner()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_mass_and_skips_empty_mass() {
        let dist: Distribution<&str> =
            [("a", 0.1), ("b", 0.5), ("c", 0.0), ("d", f64::NAN), ("e", 0.3)].into_iter().collect();
        assert_eq!(top_k(&dist, 2), vec![("b", 0.5), ("e", 0.3)]);
        assert_eq!(top_k(&dist, 10).len(), 3);
        assert!(top_k(&dist, 0).is_empty());
    }

    #[test]
    fn ties_prefer_smaller_node() {
        let dist: Distribution<u32> = [(3, 1.0), (1, 1.0), (2, 1.0)].into_iter().collect();
        assert_eq!(top_k(&dist, 2), vec![(1, 1.0), (2, 1.0)]);
    }
}
