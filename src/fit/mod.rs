//! Fitting node values and probabilities to realizations.
//!
//! The pipeline has three stages, each usable on its own:
//!
//! 1. [`TreeInitializer`]: seed each scenario with a random realization and
//!    average the seeds over shared nodes.
//! 2. [`NeuralGasFitter`]: run `j_max` annealed neural-gas updates.
//! 3. [`assign_probabilities`]: give each scenario the share of realizations
//!    that lie closest to it.
//!
//! [`build_tree`] and [`NeuralGas`] run all three with a single random source.
//!
//! ## Usage
//!
//! ```rust
//! use ndarray::array;
//! use scentree::{NeuralGas, Realizations};
//!
//! let structure = array![[1, 1], [2, 3]];
//! let x = Realizations::from_paths(array![
//!     [0.0, 0.1, -0.1, 0.0],
//!     [-5.0, -5.2, 5.1, 4.9],
//! ])
//! .unwrap();
//!
//! let tree = NeuralGas::new()
//!     .with_j_max(2_000)
//!     .with_seed(7)
//!     .fit(&x, &structure)
//!     .unwrap();
//!
//! assert_eq!(tree.n_nodes(), 3);
//! assert!((tree.probabilities().iter().sum::<f64>() - 1.0).abs() < 1e-12);
//! ```

mod config;
mod init;
mod neural_gas;
mod probability;

pub use config::{AnnealingSchedule, NeuralGasConfig};
pub use init::TreeInitializer;
pub use neural_gas::{Checkpoint, NeuralGasFitter};
pub use probability::{assign_probabilities, Assignment};

use std::ops::ControlFlow;

use ndarray::Array2;
use rand::prelude::*;
use tracing::info;

use crate::data::Realizations;
use crate::error::{DataError, Result};
use crate::metrics::quantization_error;
use crate::structure::{check_tree, TreeStructure};
use crate::tree::ScenarioTree;

/// Realizations and structure must agree on the number of time steps.
pub(crate) fn check_compatible(structure: &TreeStructure, realizations: &Realizations) -> Result<()> {
    if structure.n_stages() != realizations.n_steps() {
        return Err(DataError::StepMismatch {
            structure_steps: structure.n_stages(),
            data_steps: realizations.n_steps(),
        }
        .into());
    }
    Ok(())
}

/// Validate `structure` leniently and fit a tree to `realizations`.
pub fn build_tree(
    realizations: &Realizations,
    structure: &Array2<usize>,
    config: &NeuralGasConfig,
) -> Result<ScenarioTree> {
    NeuralGas::from_config(config.clone()).fit(realizations, structure)
}

/// Neural-gas scenario tree builder.
#[derive(Debug, Clone, Default)]
pub struct NeuralGas {
    config: NeuralGasConfig,
}

impl NeuralGas {
    /// Builder with default hyperparameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with the given hyperparameters.
    pub fn from_config(config: NeuralGasConfig) -> Self {
        Self { config }
    }

    /// Set initial and final neighborhood width.
    pub fn with_lambda(mut self, lambda0: f64, lambdaf: f64) -> Self {
        self.config.lambda0 = lambda0;
        self.config.lambdaf = lambdaf;
        self
    }

    /// Set initial and final learning rate.
    pub fn with_epsilon(mut self, eps0: f64, epsf: f64) -> Self {
        self.config.eps0 = eps0;
        self.config.epsf = epsf;
        self
    }

    /// Set number of iterations.
    pub fn with_j_max(mut self, j_max: usize) -> Self {
        self.config.j_max = j_max;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Call the checkpoint observer every `every` iterations.
    pub fn with_checkpoint_every(mut self, every: usize) -> Self {
        self.config.checkpoint_every = every;
        self
    }

    /// Current hyperparameters.
    pub fn config(&self) -> &NeuralGasConfig {
        &self.config
    }

    /// Validate `structure` leniently and fit.
    pub fn fit(&self, realizations: &Realizations, structure: &Array2<usize>) -> Result<ScenarioTree> {
        let structure = check_tree(structure)?;
        self.fit_structure(realizations, &structure)
    }

    /// Fit an already validated structure, seeding from the configuration.
    pub fn fit_structure(
        &self,
        realizations: &Realizations,
        structure: &TreeStructure,
    ) -> Result<ScenarioTree> {
        let mut rng: Box<dyn RngCore> = match self.config.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        self.fit_with(realizations, structure, &mut *rng, |_| {
            ControlFlow::Continue(())
        })
    }

    /// Fit with a caller-supplied random source and checkpoint observer.
    ///
    /// The configured seed is ignored; all draws come from `rng`, in
    /// iteration order.
    pub fn fit_with<R, F>(
        &self,
        realizations: &Realizations,
        structure: &TreeStructure,
        rng: &mut R,
        observer: F,
    ) -> Result<ScenarioTree>
    where
        R: Rng + ?Sized,
        F: FnMut(&Checkpoint) -> ControlFlow<()>,
    {
        let fitter = NeuralGasFitter::new(structure, realizations, &self.config)?;
        let initial = TreeInitializer::new(structure, realizations)?.initialize(rng);
        let values = fitter.run_with(initial, rng, observer)?;
        let assignment = assign_probabilities(structure, &values, realizations)?;

        info!(
            j_max = self.config.j_max,
            n_nodes = structure.n_nodes(),
            quantization_error = quantization_error(structure, &values, realizations),
            "scenario tree fitted"
        );

        Ok(ScenarioTree::new(
            structure.matrix().clone(),
            values,
            assignment.probabilities,
            assignment.counts,
            assignment.labels,
        ))
    }
}
