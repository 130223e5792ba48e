//! Distances and fit-quality measures.
//!
//! Node values are held as an `(N, D)` array whose row `id - 1` is the value
//! of node `id`. A scenario is the path obtained by reading one column of the
//! nodal partition matrix through that array.
//!
//! | Measure | Meaning |
//! |---------|---------|
//! | [`scenario_distance`] | Euclidean distance between one scenario and one realization |
//! | [`quantization_error`] | Mean distance from each realization to its closest scenario |
//! | [`mean_absolute_deviation`] | Mean absolute difference between two node-value sets |

use ndarray::Array2;

use crate::data::Realizations;
use crate::error::{DataError, Result};
use crate::structure::TreeStructure;

/// Euclidean distance between scenario `s` and realization `k`.
///
/// ```text
/// d = sqrt( Σ_t Σ_c (value[node(t, s), c] - x[t, k, c])² )
/// ```
pub fn scenario_distance(
    structure: &TreeStructure,
    values: &Array2<f64>,
    realizations: &Realizations,
    s: usize,
    k: usize,
) -> f64 {
    let mut sum = 0.0;
    for t in 0..structure.n_stages() {
        let node = values.row(structure.index_at(t, s));
        let target = realizations.value(t, k);
        sum += node
            .iter()
            .zip(target.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>();
    }
    sum.sqrt()
}

/// Closest scenario to realization `k` and its distance.
///
/// Ties go to the lowest scenario index.
pub fn nearest_scenario(
    structure: &TreeStructure,
    values: &Array2<f64>,
    realizations: &Realizations,
    k: usize,
) -> (usize, f64) {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for s in 0..structure.n_scenarios() {
        let dist = scenario_distance(structure, values, realizations, s, k);
        if dist < best_dist {
            best_dist = dist;
            best = s;
        }
    }
    (best, best_dist)
}

/// Mean distance from every realization to its closest scenario.
///
/// Lower is better; permutation of scenarios does not change it.
pub fn quantization_error(
    structure: &TreeStructure,
    values: &Array2<f64>,
    realizations: &Realizations,
) -> f64 {
    let k_len = realizations.n_realizations();
    let total: f64 = (0..k_len)
        .map(|k| nearest_scenario(structure, values, realizations, k).1)
        .sum();
    total / k_len as f64
}

/// Mean absolute element-wise difference between two node-value arrays.
pub fn mean_absolute_deviation(a: &Array2<f64>, b: &Array2<f64>) -> Result<f64> {
    if a.dim() != b.dim() {
        return Err(DataError::ShapeMismatch {
            expected: format!("{:?}", a.dim()),
            actual: format!("{:?}", b.dim()),
        }
        .into());
    }
    if a.is_empty() {
        return Ok(0.0);
    }
    let total: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum();
    Ok(total / a.len() as f64)
}
