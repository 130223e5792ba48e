//! Neural-gas update loop.
//!
//! Neural gas (Martinetz & Schulten, 1991) is a vector quantizer in which
//! every prototype moves toward each sample, weighted by its closeness
//! *rank* rather than its raw distance. Here the prototypes are the `S`
//! scenarios of a tree whose branching is fixed, so the update acts on nodes:
//!
//! ```text
//! for j = 1..=j_max:
//!     draw realization k
//!     d_s    = ||scenario_s - x_k||               for every scenario s
//!     R_s    = rank of d_s (1 = closest)
//!     h_s    = exp(-R_s / lambda(j))
//!     node  += epsilon(j) * mean_{s ∈ node}(h_s) * (x_k[t(node)] - node)
//! ```
//!
//! Averaging `h` over a node's member scenarios keeps shared nodes shared:
//! the update never gives two scenarios different values where the structure
//! says they coincide.
//!
//! # Annealing
//!
//! Early on `lambda` is large, so every scenario is pulled toward every
//! sample and the tree contracts toward the data mean. As `lambda` decays
//! only the best-ranked scenarios keep moving and the branches separate.
//! `epsilon` decays alongside so late updates are fine adjustments.
//!
//! # Failure Modes
//!
//! - **Local optima**: a stochastic heuristic; different seeds give different trees
//! - **Short runs**: with small `j_max` the branches may not separate
//! - **Numeric blow-up**: a non-finite distance or node value aborts with the
//!   iteration and realization that produced it

use std::ops::ControlFlow;

use ndarray::Array2;
use rand::Rng;
use tracing::{debug, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::check_compatible;
use super::config::{AnnealingSchedule, NeuralGasConfig};
use crate::data::Realizations;
use crate::error::{DataError, Error, Result};
use crate::metrics::scenario_distance;
use crate::structure::TreeStructure;

/// Progress snapshot handed to the checkpoint observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkpoint {
    /// Iterations completed.
    pub iteration: usize,
    /// Total iterations.
    pub j_max: usize,
    /// Learning rate used in the last iteration.
    pub epsilon: f64,
    /// Neighborhood width used in the last iteration.
    pub lambda: f64,
}

/// Runs the annealed update loop over a fixed tree structure.
#[derive(Debug, Clone, Copy)]
pub struct NeuralGasFitter<'a> {
    structure: &'a TreeStructure,
    realizations: &'a Realizations,
    schedule: AnnealingSchedule,
    checkpoint_every: usize,
}

impl<'a> NeuralGasFitter<'a> {
    /// Create a fitter after checking the configuration and data shape.
    pub fn new(
        structure: &'a TreeStructure,
        realizations: &'a Realizations,
        config: &NeuralGasConfig,
    ) -> Result<Self> {
        config.validate()?;
        check_compatible(structure, realizations)?;
        Ok(Self {
            structure,
            realizations,
            schedule: config.schedule(),
            checkpoint_every: config.checkpoint_every,
        })
    }

    /// Run all iterations and return the final node values.
    pub fn run<R: Rng + ?Sized>(&self, values: Array2<f64>, rng: &mut R) -> Result<Array2<f64>> {
        self.run_with(values, rng, |_| ControlFlow::Continue(()))
    }

    /// Run all iterations, calling `observer` at every checkpoint.
    ///
    /// Returning `ControlFlow::Break` stops the fit with [`Error::Cancelled`].
    pub fn run_with<R, F>(
        &self,
        mut values: Array2<f64>,
        rng: &mut R,
        mut observer: F,
    ) -> Result<Array2<f64>>
    where
        R: Rng + ?Sized,
        F: FnMut(&Checkpoint) -> ControlFlow<()>,
    {
        let expected = (self.structure.n_nodes(), self.realizations.dim());
        if values.dim() != expected {
            return Err(DataError::ShapeMismatch {
                expected: format!("{expected:?} node values"),
                actual: format!("{:?}", values.dim()),
            }
            .into());
        }

        let n_scenarios = self.structure.n_scenarios();
        let n_realizations = self.realizations.n_realizations();
        let j_max = self.schedule.j_max();

        let mut distances = vec![0.0; n_scenarios];
        let mut order: Vec<usize> = (0..n_scenarios).collect();
        let mut weights = vec![0.0; n_scenarios];

        debug!(
            j_max,
            n_scenarios,
            n_nodes = self.structure.n_nodes(),
            n_realizations,
            "neural gas fit started"
        );

        for j in 1..=j_max {
            let k = rng.random_range(0..n_realizations);

            self.distances_to(&values, k, &mut distances);
            if distances.iter().any(|d| !d.is_finite()) {
                return Err(Error::NumericFailure {
                    iteration: j,
                    realization: k,
                });
            }

            // Stable order: equal distances rank by scenario index.
            order.sort_by(|&a, &b| distances[a].total_cmp(&distances[b]).then(a.cmp(&b)));

            let epsilon = self.schedule.epsilon(j);
            let lambda = self.schedule.lambda(j);
            for (rank, &s) in order.iter().enumerate() {
                weights[s] = (-((rank + 1) as f64) / lambda).exp();
            }

            // Each node reads only its own old value and the ranks above, so
            // updating in place equals a synchronous update.
            for (i, node) in self.structure.nodes().iter().enumerate() {
                let h = node.members.iter().map(|&s| weights[s]).sum::<f64>()
                    / node.members.len() as f64;
                let step = epsilon * h;
                let target = self.realizations.value(node.stage, k);
                values
                    .row_mut(i)
                    .zip_mut_with(&target, |v, &x| *v += step * (x - *v));
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(Error::NumericFailure {
                    iteration: j,
                    realization: k,
                });
            }

            if self.checkpoint_every > 0 && j % self.checkpoint_every == 0 {
                let checkpoint = Checkpoint {
                    iteration: j,
                    j_max,
                    epsilon,
                    lambda,
                };
                trace!(iteration = j, epsilon, lambda, "checkpoint");
                if observer(&checkpoint).is_break() {
                    debug!(iteration = j, "neural gas fit cancelled");
                    return Err(Error::Cancelled { iteration: j });
                }
            }
        }

        Ok(values)
    }

    #[cfg(feature = "parallel")]
    fn distances_to(&self, values: &Array2<f64>, k: usize, out: &mut [f64]) {
        out.par_iter_mut().enumerate().for_each(|(s, d)| {
            *d = scenario_distance(self.structure, values, self.realizations, s, k);
        });
    }

    #[cfg(not(feature = "parallel"))]
    fn distances_to(&self, values: &Array2<f64>, k: usize, out: &mut [f64]) {
        for (s, d) in out.iter_mut().enumerate() {
            *d = scenario_distance(self.structure, values, self.realizations, s, k);
        }
    }
}
