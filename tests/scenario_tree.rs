use std::ops::ControlFlow;

use ndarray::{array, Array2, Array3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use scentree::{
    build_tree, check_tree, NeuralGas, NeuralGasConfig, Realizations, TreeInitializer,
};

fn example_structure() -> Array2<usize> {
    array![[1, 1, 1, 1], [2, 2, 5, 5], [3, 4, 6, 7]]
}

/// Leaf paths of the reference tree: root 0, branches -4 / 4, leaves spread by 3.
fn known_paths() -> Array2<f64> {
    array![
        [0.0, 0.0, 0.0, 0.0],
        [-4.0, -4.0, 4.0, 4.0],
        [-7.0, -1.0, 1.0, 7.0],
    ]
}

/// `n` noisy copies of the reference scenarios, cycling through them.
fn noisy_realizations(n: usize, sigma: f64, seed: u64) -> Realizations {
    let paths = known_paths();
    let noise = Normal::new(0.0, sigma).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut x = Array2::zeros((paths.nrows(), n));
    for k in 0..n {
        for t in 0..paths.nrows() {
            x[[t, k]] = paths[[t, k % paths.ncols()]] + noise.sample(&mut rng);
        }
    }
    Realizations::from_paths(x).unwrap()
}

/// Scenario paths `(T, S)` of univariate node values under `structure`.
fn expand(structure: &Array2<usize>, values: &Array2<f64>) -> Array2<f64> {
    Array2::from_shape_fn(structure.dim(), |(t, s)| values[[structure[[t, s]] - 1, 0]])
}

fn permutations(n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    for p in permutations(n - 1) {
        for pos in 0..=p.len() {
            let mut q = p.clone();
            q.insert(pos, n - 1);
            out.push(q);
        }
    }
    out
}

/// Mean absolute deviation between fitted and reference paths under the
/// best scenario relabeling.
fn path_deviation(fitted: &Array2<f64>, known: &Array2<f64>) -> f64 {
    permutations(known.ncols())
        .into_iter()
        .map(|p| {
            let mut total = 0.0;
            for t in 0..known.nrows() {
                for (s, &ps) in p.iter().enumerate() {
                    total += (fitted[[t, ps]] - known[[t, s]]).abs();
                }
            }
            total / known.len() as f64
        })
        .fold(f64::INFINITY, f64::min)
}

#[test]
fn test_end_to_end_four_scenarios() {
    let m = example_structure();
    let x = noisy_realizations(20, 0.5, 1);
    let config = NeuralGasConfig {
        j_max: 1000,
        seed: Some(2024),
        ..Default::default()
    };

    let tree = build_tree(&x, &m, &config).unwrap();

    assert_eq!(tree.structure(), &m);
    assert_eq!(tree.n_nodes(), 7);
    assert_eq!(tree.iter_nodes().count(), 7);
    assert_eq!(tree.probabilities().len(), 4);
    assert!((tree.probabilities().iter().sum::<f64>() - 1.0).abs() < 1e-12);
    assert_eq!(tree.counts().iter().sum::<usize>(), 20);
    assert_eq!(tree.assignments().len(), 20);
    assert!(tree.probabilities().iter().all(|&p| p >= 0.0));
}

#[test]
fn test_fitting_beats_initialization() {
    let m = example_structure();
    let structure = check_tree(&m).unwrap();
    let x = noisy_realizations(200, 0.3, 7);
    let known = known_paths();
    let config = NeuralGasConfig {
        j_max: 5000,
        ..Default::default()
    };
    let builder = NeuralGas::from_config(config);

    let mut initial_total = 0.0;
    let mut fitted_total = 0.0;
    for seed in 0..5u64 {
        let init = TreeInitializer::new(&structure, &x)
            .unwrap()
            .initialize(&mut StdRng::seed_from_u64(seed));
        initial_total += path_deviation(&expand(&m, &init), &known);

        // Same generator state sequence as the initializer above.
        let tree = builder
            .fit_with(&x, &structure, &mut StdRng::seed_from_u64(seed), |_| {
                ControlFlow::Continue(())
            })
            .unwrap();
        fitted_total += path_deviation(&expand(&m, tree.node_values()), &known);

        assert!((tree.probabilities().iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    assert!(
        fitted_total < initial_total,
        "fitted deviation {fitted_total} should be below initial {initial_total}"
    );
}

#[test]
fn test_unbranched_structure_collapses_to_one_scenario() {
    let m = array![[1, 1, 1, 1], [2, 2, 2, 2], [3, 3, 3, 3]];
    let x = noisy_realizations(40, 0.5, 3);
    let tree = NeuralGas::new()
        .with_j_max(2000)
        .with_seed(5)
        .fit(&x, &m)
        .unwrap();

    assert_eq!(tree.n_nodes(), 3);
    let paths = tree.scenarios();
    for s in 1..4 {
        for t in 0..3 {
            assert_eq!(paths[[t, s, 0]], paths[[t, 0, 0]]);
        }
    }
    assert_eq!(tree.probabilities(), &[1.0, 0.0, 0.0, 0.0]);
}

#[test]
fn test_seeded_fits_are_reproducible() {
    let m = example_structure();
    let x = noisy_realizations(30, 0.5, 11);
    let config = NeuralGasConfig {
        j_max: 800,
        seed: Some(99),
        ..Default::default()
    };
    let a = build_tree(&x, &m, &config).unwrap();
    let b = build_tree(&x, &m, &config).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_multivariate_steps_fit_per_component() {
    let m = array![[1, 1], [2, 3]];
    let mut data = Array3::zeros((2, 8, 2));
    for k in 0..8 {
        let sign = if k % 2 == 0 { -1.0 } else { 1.0 };
        data[[1, k, 0]] = sign * 5.0;
        data[[1, k, 1]] = sign * 2.0 + 0.01 * k as f64;
    }
    let x = Realizations::new(data).unwrap();
    let tree = NeuralGas::new()
        .with_j_max(2000)
        .with_seed(17)
        .fit(&x, &m)
        .unwrap();

    assert_eq!(tree.node_values().dim(), (3, 2));
    assert_eq!(tree.scenario(0).dim(), (2, 2));
    assert!((tree.probabilities().iter().sum::<f64>() - 1.0).abs() < 1e-12);
}

#[test]
fn test_cancellation_returns_no_tree() {
    let m = example_structure();
    let structure = check_tree(&m).unwrap();
    let x = noisy_realizations(20, 0.5, 4);
    let builder = NeuralGas::new().with_j_max(1000).with_checkpoint_every(100);
    let result = builder.fit_with(&x, &structure, &mut StdRng::seed_from_u64(0), |cp| {
        if cp.iteration == 500 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    assert_eq!(result, Err(scentree::Error::Cancelled { iteration: 500 }));
}
