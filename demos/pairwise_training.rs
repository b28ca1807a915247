//! End-to-end sketch: learn edge-feature weights so that a walk from a query node ranks its
//! own community above the other one.
//!
//! The graph is a seeded two-block model. Every edge carries either `same_block` or
//! `cross_block`, and every node has a `restart` edge back to the query. A pairwise loss with
//! positives in the query's block and negatives in the other block should drive
//! `cross_block` down relative to `same_block`.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use srw::{
    top_k, AnnotatedGraph, Distribution, Feature, PairwiseL2SqLoss, PosNegExample, SharedParams,
    SrwConfig, Trainer,
};

fn two_block(n: usize, p_in: f64, p_out: f64, query: usize, seed: u64) -> AnnotatedGraph<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let half = n / 2;
    let mut g = AnnotatedGraph::new();
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let same = (i < half) == (j < half);
            let p = if same { p_in } else { p_out };
            if rng.random::<f64>() < p {
                let name = if same { "same_block" } else { "cross_block" };
                g.add_edge(i, j, [Feature::new(name, 1.0)]);
            }
        }
        if i != query {
            g.add_edge(i, query, [Feature::new("restart", 0.5)]);
        }
    }
    g
}

fn main() {
    let n = 40usize;
    let query = 0usize;
    let half = n / 2;

    let examples: Vec<PosNegExample<AnnotatedGraph<usize>>> = (0..4u64)
        .map(|seed| {
            let graph = two_block(n, 0.3, 0.15, query, seed);
            let start: Distribution<usize> = [(query, 1.0)].into_iter().collect();
            let pos = (1..half).step_by(3).collect();
            let neg = (half..n).step_by(3).collect();
            PosNegExample::new(graph, start, pos, neg)
        })
        .collect();

    let config = SrwConfig { steps: 6, eta: 2.0, ..SrwConfig::default() };
    let mut trainer = match Trainer::new(config, PairwiseL2SqLoss::new(0.01)) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("bad config: {e}");
            std::process::exit(1);
        }
    };
    trainer.untrain("restart");
    let params = SharedParams::default();

    let report = |label: &str, trainer: &Trainer<PairwiseL2SqLoss>| {
        let loss = trainer.average_loss(&params, &examples).unwrap_or(f64::NAN);
        println!("{label}: avg loss={loss:.6e} params={:?}", params.snapshot());
    };

    report("before", &trainer);
    for _ in 0..5 {
        if let Err(e) = trainer.train_epoch(&params, &examples) {
            eprintln!("epoch {} failed: {e}", trainer.epoch());
            std::process::exit(1);
        }
        report(&format!("epoch {}", trainer.epoch()), &trainer);
        trainer.next_epoch();
    }

    let scores = trainer.srw().rwr(&examples[0].graph, &examples[0].query, &params.snapshot());
    println!();
    println!("top-10 after training (nodes < {half} share the query's block):");
    for (node, mass) in top_k(&scores, 10) {
        println!("  node {node:3}  mass={mass:.6e}");
    }
}
