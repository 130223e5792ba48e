//! Scenario tree structure.
//!
//! # Nodal Partition Matrix
//!
//! The branching structure of a scenario tree is given as a `T × S` integer
//! matrix. Column `s` is scenario `s`; entry `M[t, s]` names the node that
//! scenario passes through at time step `t`. Scenarios sharing a node at `t`
//! are indistinguishable up to `t`.
//!
//! ```text
//!  t │ s0 s1 s2 s3            ┌── 3
//! ───┼─────────────      ┌─ 2 ┤
//!  0 │  1  1  1  1       │    └── 4
//!  1 │  2  2  5  5    1 ─┤
//!  2 │  3  4  6  7       │    ┌── 6
//!                        └─ 5 ┤
//!                             └── 7
//! ```
//!
//! Ids are assigned column by column, raising the id by one for every node
//! not already defined. [`check_tree`] enforces this convention and decodes
//! the matrix into a [`TreeStructure`], an arena of [`NodeRecord`]s indexed
//! by id.
//!
//! # Strictness
//!
//! Whether every scenario must end in its own leaf is a matter of usage, so
//! it is opt-in through [`ValidationMode::Strict`]. Lenient mode accepts
//! degenerate trees such as a single unbranched path copied into `S`
//! columns.

mod node;
mod validate;

pub use node::NodeRecord;
pub use validate::{check_tree, TreeStats, TreeStructure, ValidationMode};
