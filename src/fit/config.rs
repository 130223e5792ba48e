//! Hyperparameters and the annealing schedule.

use tracing::warn;

use crate::error::{ConfigError, Result};

/// Hyperparameters of the neural-gas fit.
///
/// Defaults: `lambda0 = 10`, `lambdaf = 0.01`, `eps0 = 0.5`, `epsf = 0.05`,
/// `j_max = 40000`, no seed, no checkpoints.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct NeuralGasConfig {
    /// Initial neighborhood width.
    pub lambda0: f64,
    /// Final neighborhood width.
    pub lambdaf: f64,
    /// Initial learning rate.
    pub eps0: f64,
    /// Final learning rate.
    pub epsf: f64,
    /// Number of update steps.
    pub j_max: usize,
    /// Random seed; `None` draws from the thread-local generator.
    pub seed: Option<u64>,
    /// Call the checkpoint observer every this many iterations (0 = never).
    pub checkpoint_every: usize,
}

impl Default for NeuralGasConfig {
    fn default() -> Self {
        Self {
            lambda0: 10.0,
            lambdaf: 0.01,
            eps0: 0.5,
            epsf: 0.05,
            j_max: 40_000,
            seed: None,
            checkpoint_every: 0,
        }
    }
}

impl NeuralGasConfig {
    /// Check parameter ranges.
    ///
    /// A schedule that grows instead of decaying (`eps0 < epsf` or
    /// `lambda0 < lambdaf`) is well defined and only logged.
    pub fn validate(&self) -> Result<()> {
        if self.j_max == 0 {
            return Err(ConfigError::ZeroIterations.into());
        }
        for (name, value) in [
            ("lambda0", self.lambda0),
            ("lambdaf", self.lambdaf),
            ("eps0", self.eps0),
            ("epsf", self.epsf),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name }.into());
            }
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value }.into());
            }
        }
        if self.eps0 < self.epsf {
            warn!(
                eps0 = self.eps0,
                epsf = self.epsf,
                "learning rate increases over the run"
            );
        }
        if self.lambda0 < self.lambdaf {
            warn!(
                lambda0 = self.lambda0,
                lambdaf = self.lambdaf,
                "neighborhood width increases over the run"
            );
        }
        Ok(())
    }

    /// Schedule derived from these parameters.
    pub fn schedule(&self) -> AnnealingSchedule {
        AnnealingSchedule {
            lambda0: self.lambda0,
            lambdaf: self.lambdaf,
            eps0: self.eps0,
            epsf: self.epsf,
            j_max: self.j_max,
        }
    }
}

/// Exponential decay of learning rate and neighborhood width.
///
/// ```text
/// epsilon(j) = eps0    * (epsf    / eps0)^(j / j_max)
/// lambda(j)  = lambda0 * (lambdaf / lambda0)^(j / j_max)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealingSchedule {
    lambda0: f64,
    lambdaf: f64,
    eps0: f64,
    epsf: f64,
    j_max: usize,
}

impl AnnealingSchedule {
    fn progress(&self, j: usize) -> f64 {
        j as f64 / self.j_max as f64
    }

    /// Learning rate at iteration `j`.
    pub fn epsilon(&self, j: usize) -> f64 {
        self.eps0 * (self.epsf / self.eps0).powf(self.progress(j))
    }

    /// Neighborhood width at iteration `j`.
    pub fn lambda(&self, j: usize) -> f64 {
        self.lambda0 * (self.lambdaf / self.lambda0).powf(self.progress(j))
    }

    /// Number of iterations.
    pub fn j_max(&self) -> usize {
        self.j_max
    }
}
