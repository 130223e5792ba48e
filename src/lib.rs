//! # scentree
//!
//! Scenario-tree construction for multi-stage stochastic optimization.
//!
//! A large ensemble of sample paths (realizations) is reduced to a small tree
//! of scenarios whose branching is fixed in advance by a *nodal partition
//! matrix*. Node values are fitted with the neural-gas vector quantizer and
//! each scenario's probability is the share of realizations closest to it.
//!
//! - [`check_tree`]: validate a nodal partition matrix and decode its nodes.
//! - [`build_tree`] / [`NeuralGas`]: fit node values and probabilities.
//!
//! All randomness flows through an explicit generator (seeded from the
//! configuration, or supplied to [`NeuralGas::fit_with`]), so fits are
//! reproducible.
//!
//! ```rust
//! use ndarray::array;
//! use scentree::check_tree;
//!
//! let m = array![[1, 1, 1, 1], [2, 2, 5, 5], [3, 4, 6, 7]];
//! let tree = check_tree(&m).unwrap();
//! assert_eq!(tree.n_nodes(), 7);
//! assert_eq!(tree.children(1), vec![2, 5]);
//! ```

pub mod data;
/// Error types used across `scentree`.
pub mod error;
pub mod fit;
pub mod metrics;
pub mod structure;
pub mod tree;

pub use data::Realizations;
pub use error::{ConfigError, DataError, Error, Result, StructureError, StructureRule};
pub use fit::{
    assign_probabilities, build_tree, AnnealingSchedule, Assignment, Checkpoint, NeuralGas,
    NeuralGasConfig, NeuralGasFitter, TreeInitializer,
};
pub use metrics::{mean_absolute_deviation, quantization_error, scenario_distance};
pub use structure::{check_tree, NodeRecord, TreeStats, TreeStructure, ValidationMode};
pub use tree::ScenarioTree;
