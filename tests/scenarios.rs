use srw::{
    deriv_rwr_by_params, rwr, AnnotatedGraph, Distribution, Feature, FeatureGate, ParamVec,
};

fn params(pairs: &[(&str, f64)]) -> ParamVec {
    pairs.iter().map(|&(k, v)| (k.to_string(), v)).collect()
}

fn start(node: &'static str) -> Distribution<&'static str> {
    [(node, 1.0)].into_iter().collect()
}

#[test]
fn single_edge_moves_mass_to_target() {
    let g = AnnotatedGraph::new().with_edge("A", "B", [Feature::new("f", 1.0)]);
    let out = rwr(&g, &start("A"), &params(&[("f", 1.0)]), 1);
    let expected: Distribution<&str> = [("B", 1.0)].into_iter().collect();
    assert_eq!(out, expected);
}

#[test]
fn node_without_out_edges_empties_distribution() {
    let g: AnnotatedGraph<&str> = AnnotatedGraph::new().with_edge("B", "C", [Feature::new("f", 1.0)]);
    let out = rwr(&g, &start("A"), &params(&[("f", 1.0)]), 1);
    assert!(out.is_empty());
}

/// Frozen "g" beside trained "f" on `A -> B`, plus a competing `A -> C` edge so that "f"
/// actually moves mass: "f" gets a non-zero derivative, "g" none.
#[test]
fn untrained_feature_absent_while_trained_feature_moves_mass() {
    let p = params(&[("f", 1.0), ("g", 1.0)]);
    let gate = FeatureGate::with_untrained(["g"]);
    let g = AnnotatedGraph::new()
        .with_edge("A", "B", [Feature::new("f", 1.0), Feature::new("g", 1.0)])
        .with_edge("A", "C", [Feature::new("f", 1.0)]);

    let out = deriv_rwr_by_params(&g, &start("A"), &p, 1, &gate);
    assert!(out.derivatives.values().all(|row| !row.contains_key("g")));
    assert!(out.derivative(&"B", "f") != 0.0);
    assert!(out.derivative(&"C", "f") != 0.0);
}

/// With `A -> B` as the only out-edge the transition probability is 1 for any parameters,
/// so the quotient rule gives "f" an exact zero there. "g" is still absent.
#[test]
fn lone_edge_untrained_feature_absent_and_trained_derivative_zero() {
    let p = params(&[("f", 1.0), ("g", 1.0)]);
    let gate = FeatureGate::with_untrained(["g"]);
    let g = AnnotatedGraph::new().with_edge("A", "B", [Feature::new("f", 1.0), Feature::new("g", 1.0)]);

    let out = deriv_rwr_by_params(&g, &start("A"), &p, 1, &gate);
    assert!(out.derivatives.values().all(|row| !row.contains_key("g")));
    assert_eq!(out.derivative(&"B", "f"), 0.0);
}

#[test]
fn equal_edges_split_mass_evenly() {
    let g = AnnotatedGraph::new()
        .with_edge("A", "B", [Feature::new("f", 1.0)])
        .with_edge("A", "C", [Feature::new("g", 0.5), Feature::new("h", 0.5)]);
    let out = rwr(&g, &start("A"), &params(&[("f", 1.0), ("g", 1.0), ("h", 1.0)]), 1);
    assert_eq!(out.len(), 2);
    assert!((out["B"] - 0.5).abs() < 1e-12);
    assert!((out["C"] - 0.5).abs() < 1e-12);
}

#[test]
fn one_step_derivative_matches_finite_difference() {
    // Every out-edge of A carries both features, so the one-step recursion is the exact
    // derivative of the walk output.
    let g = AnnotatedGraph::new()
        .with_edge("A", "B", [Feature::new("f", 1.0), Feature::new("g", 2.0)])
        .with_edge("A", "C", [Feature::new("f", 3.0), Feature::new("g", 0.5)]);
    let p = params(&[("f", 1.2), ("g", 0.7)]);
    let out = deriv_rwr_by_params(&g, &start("A"), &p, 1, &FeatureGate::new());

    let h = 1e-6;
    for f in ["f", "g"] {
        let mut hi = p.clone();
        let mut lo = p.clone();
        *hi.get_mut(f).unwrap() += h;
        *lo.get_mut(f).unwrap() -= h;
        let up = rwr(&g, &start("A"), &hi, 1);
        let down = rwr(&g, &start("A"), &lo, 1);
        for node in ["B", "C"] {
            let fd = (up[node] - down[node]) / (2.0 * h);
            let an = out.derivative(&node, f);
            assert!((fd - an).abs() < 1e-6, "node={node} f={f} fd={fd} analytic={an}");
        }
    }
}

#[test]
fn empty_distribution_survives_remaining_steps() {
    let g = AnnotatedGraph::new().with_edge("A", "B", [Feature::new("f", 1.0)]);
    let p = params(&[("f", 1.0)]);
    let out = deriv_rwr_by_params(&g, &start("A"), &p, 10, &FeatureGate::new());
    assert!(out.scores.is_empty());
    assert!(out.derivatives.is_empty());
    assert!(rwr(&g, &start("A"), &p, 10).is_empty());
}
