//! Scenario probabilities from nearest-scenario counts.

use ndarray::Array2;

use super::check_compatible;
use crate::data::Realizations;
use crate::error::{DataError, Result};
use crate::metrics::nearest_scenario;
use crate::structure::TreeStructure;

/// Assignment of realizations to scenarios.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Winning scenario for each realization.
    pub labels: Vec<usize>,
    /// Realizations won by each scenario.
    pub counts: Vec<usize>,
    /// `counts[s] / K` for each scenario.
    pub probabilities: Vec<f64>,
}

/// Assign every realization to its closest scenario and derive probabilities.
///
/// Ties go to the lowest scenario index. A scenario that wins no realization
/// gets probability 0. Probabilities are computed from integer counts, so
/// they sum to 1 up to a single rounding per entry.
pub fn assign_probabilities(
    structure: &TreeStructure,
    values: &Array2<f64>,
    realizations: &Realizations,
) -> Result<Assignment> {
    check_compatible(structure, realizations)?;
    let expected = (structure.n_nodes(), realizations.dim());
    if values.dim() != expected {
        return Err(DataError::ShapeMismatch {
            expected: format!("{expected:?} node values"),
            actual: format!("{:?}", values.dim()),
        }
        .into());
    }

    let k_len = realizations.n_realizations();
    let mut counts = vec![0usize; structure.n_scenarios()];
    let labels: Vec<usize> = (0..k_len)
        .map(|k| {
            let (s, _) = nearest_scenario(structure, values, realizations, k);
            counts[s] += 1;
            s
        })
        .collect();

    let probabilities = counts
        .iter()
        .map(|&c| c as f64 / k_len as f64)
        .collect();

    Ok(Assignment {
        labels,
        counts,
        probabilities,
    })
}
