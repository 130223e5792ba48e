//! Starting node values.

use ndarray::Array2;
use rand::seq::index;
use rand::Rng;
use tracing::warn;

use super::check_compatible;
use crate::data::Realizations;
use crate::error::Result;
use crate::structure::TreeStructure;

/// Seeds a tree from randomly chosen realizations.
///
/// Each scenario column is assigned one realization; every node then takes
/// the mean of its member scenarios' seeded values at the node's time step,
/// so scenarios sharing a node start out identical there.
#[derive(Debug, Clone, Copy)]
pub struct TreeInitializer<'a> {
    structure: &'a TreeStructure,
    realizations: &'a Realizations,
}

impl<'a> TreeInitializer<'a> {
    /// Create an initializer, checking that data and structure agree on `T`.
    pub fn new(structure: &'a TreeStructure, realizations: &'a Realizations) -> Result<Self> {
        check_compatible(structure, realizations)?;
        Ok(Self {
            structure,
            realizations,
        })
    }

    /// Realization index assigned to each scenario column.
    ///
    /// Draws without replacement when there are at least as many realizations
    /// as scenarios, with replacement otherwise.
    pub fn seed_columns<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<usize> {
        let k_len = self.realizations.n_realizations();
        let s_len = self.structure.n_scenarios();
        if k_len >= s_len {
            index::sample(rng, k_len, s_len).into_vec()
        } else {
            warn!(
                n_realizations = k_len,
                n_scenarios = s_len,
                "fewer realizations than scenarios; seeding with replacement"
            );
            (0..s_len).map(|_| rng.random_range(0..k_len)).collect()
        }
    }

    /// Initial `(N, D)` node values.
    pub fn initialize<R: Rng + ?Sized>(&self, rng: &mut R) -> Array2<f64> {
        let seeds = self.seed_columns(rng);
        self.values_from_seeds(&seeds)
    }

    /// Node values obtained by averaging the given per-scenario seeds.
    pub fn values_from_seeds(&self, seeds: &[usize]) -> Array2<f64> {
        let mut values = Array2::zeros((self.structure.n_nodes(), self.realizations.dim()));
        for (i, node) in self.structure.nodes().iter().enumerate() {
            let mut row = values.row_mut(i);
            for &s in &node.members {
                row += &self.realizations.value(node.stage, seeds[s]);
            }
            row /= node.members.len() as f64;
        }
        values
    }
}
