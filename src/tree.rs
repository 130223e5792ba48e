//! Fitted scenario tree.

use core::fmt;

use ndarray::{Array2, Array3, ArrayView1, Axis};

/// Result of fitting: the structure, node values and scenario probabilities.
///
/// With the `serde` feature the tree can be serialized for downstream
/// consumers. There is no `Deserialize`: a tree only comes out of a fit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScenarioTree {
    structure: Array2<usize>,
    node_values: Array2<f64>,
    probabilities: Vec<f64>,
    counts: Vec<usize>,
    assignments: Vec<usize>,
}

impl ScenarioTree {
    pub(crate) fn new(
        structure: Array2<usize>,
        node_values: Array2<f64>,
        probabilities: Vec<f64>,
        counts: Vec<usize>,
        assignments: Vec<usize>,
    ) -> Self {
        Self {
            structure,
            node_values,
            probabilities,
            counts,
            assignments,
        }
    }

    /// The nodal partition matrix the tree was fitted with.
    pub fn structure(&self) -> &Array2<usize> {
        &self.structure
    }

    /// `(N, D)` node values; row `id - 1` belongs to node `id`.
    pub fn node_values(&self) -> &Array2<f64> {
        &self.node_values
    }

    /// Value of node `id`.
    pub fn node_value(&self, id: usize) -> Option<ArrayView1<'_, f64>> {
        let i = id.checked_sub(1)?;
        (i < self.n_nodes()).then(|| self.node_values.row(i))
    }

    /// `(id, value)` pairs in id order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = (usize, ArrayView1<'_, f64>)> + '_ {
        self.node_values
            .axis_iter(Axis(0))
            .enumerate()
            .map(|(i, v)| (i + 1, v))
    }

    /// Number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.node_values.nrows()
    }

    /// Number of scenarios.
    pub fn n_scenarios(&self) -> usize {
        self.structure.ncols()
    }

    /// Number of time steps.
    pub fn n_stages(&self) -> usize {
        self.structure.nrows()
    }

    /// Probability of each scenario, aligned with the matrix columns.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Realizations assigned to each scenario.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Scenario each realization was assigned to.
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    /// Path of scenario `s`, shape `(T, D)`.
    ///
    /// # Panics
    ///
    /// If `s >= n_scenarios()`.
    pub fn scenario(&self, s: usize) -> Array2<f64> {
        let ids: Vec<usize> = self.structure.column(s).iter().map(|&id| id - 1).collect();
        self.node_values.select(Axis(0), &ids)
    }

    /// All scenario paths, shape `(T, S, D)`.
    pub fn scenarios(&self) -> Array3<f64> {
        let (t_len, s_len) = self.structure.dim();
        let d = self.node_values.ncols();
        Array3::from_shape_fn((t_len, s_len, d), |(t, s, c)| {
            self.node_values[[self.structure[[t, s]] - 1, c]]
        })
    }
}

impl fmt::Display for ScenarioTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ScenarioTree: {} stages, {} scenarios, {} nodes",
            self.n_stages(),
            self.n_scenarios(),
            self.n_nodes()
        )?;
        for s in 0..self.n_scenarios() {
            let path = self.scenario(s);
            let steps: Vec<String> = path
                .axis_iter(Axis(0))
                .map(|v| match v.len() {
                    1 => format!("{:.3}", v[0]),
                    _ => format!("{:.3}", v),
                })
                .collect();
            writeln!(
                f,
                "  s{} p={:.3}: [{}]",
                s,
                self.probabilities[s],
                steps.join(", ")
            )?;
        }
        Ok(())
    }
}
