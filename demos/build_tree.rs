use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use scentree::{build_tree, check_tree, NeuralGasConfig, Realizations};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=scentree=debug shows validation and fit progress.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Two branches after the first step, each splitting again.
    let m = array![[1, 1, 1, 1], [2, 2, 5, 5], [3, 4, 6, 7]];
    let structure = check_tree(&m)?;
    println!("{}", structure.stats());

    // Noisy samples around four reference paths.
    let reference = [[0.0, -4.0, -7.0], [0.0, -4.0, -1.0], [0.0, 4.0, 1.0], [0.0, 4.0, 7.0]];
    let noise = Normal::new(0.0, 0.5)?;
    let mut rng = StdRng::seed_from_u64(1);
    let n = 200;
    let mut x = Array2::zeros((3, n));
    for k in 0..n {
        let path = reference[k % reference.len()];
        for t in 0..3 {
            x[[t, k]] = path[t] + noise.sample(&mut rng);
        }
    }
    let x = Realizations::from_paths(x)?;

    let config = NeuralGasConfig {
        j_max: 10_000,
        seed: Some(42),
        ..Default::default()
    };
    let tree = build_tree(&x, &m, &config)?;

    println!("{tree}");
    for (id, value) in tree.iter_nodes() {
        println!("node {id}: {:.3}", value[0]);
    }

    Ok(())
}
