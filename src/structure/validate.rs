//! Nodal partition matrix validation.
//!
//! A matrix `M` with `T` rows (time steps) and `S` columns (scenarios) encodes
//! a scenario tree when:
//!
//! 1. row 0 holds a single id (the root),
//! 2. scanning column by column, top to bottom, the k-th new id met is `k`,
//! 3. an id never appears in two different rows,
//! 4. (strict mode) the last row holds `S` distinct ids,
//! 5. columns sharing an id at row `t` shared an id at row `t - 1`.
//!
//! Rule 5 is checked through parents: every occurrence of a node must follow
//! the same node one row above.

use core::fmt;

use ndarray::Array2;
use tracing::debug;

use super::node::NodeRecord;
use crate::error::{Result, StructureError, StructureRule};

/// How strictly the final row is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValidationMode {
    /// Rules 1, 2, 3 and 5. Scenarios may still share a node at the last step.
    #[default]
    Lenient,
    /// Additionally require every scenario to end in its own node.
    Strict,
}

/// A validated nodal partition matrix together with its decoded nodes.
///
/// Nodes are stored in an arena indexed by `id - 1`, so per-node member lists
/// and the node under any `(t, s)` cell are O(1) to reach.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeStructure {
    matrix: Array2<usize>,
    nodes: Vec<NodeRecord>,
    mode: ValidationMode,
}

/// Validate `matrix` in lenient mode and decode its nodes.
pub fn check_tree(matrix: &Array2<usize>) -> Result<TreeStructure> {
    TreeStructure::check_with(matrix, ValidationMode::Lenient)
}

impl TreeStructure {
    /// Validate in lenient mode.
    pub fn check(matrix: &Array2<usize>) -> Result<Self> {
        Self::check_with(matrix, ValidationMode::Lenient)
    }

    /// Validate with an explicit [`ValidationMode`].
    pub fn check_with(matrix: &Array2<usize>, mode: ValidationMode) -> Result<Self> {
        let (n_steps, n_scenarios) = matrix.dim();
        if n_steps == 0 || n_scenarios == 0 {
            return Err(StructureError::Empty.into());
        }

        let root = matrix[[0, 0]];
        for s in 0..n_scenarios {
            let id = matrix[[0, s]];
            if id == 0 {
                return Err(StructureError::ZeroId { row: 0, column: s }.into());
            }
            if id != root {
                return Err(StructureError::violation(
                    StructureRule::Root,
                    0,
                    s,
                    format!("found id {id}, column 0 starts at {root}"),
                )
                .into());
            }
        }

        let mut nodes: Vec<NodeRecord> = Vec::new();
        for s in 0..n_scenarios {
            for t in 0..n_steps {
                let id = matrix[[t, s]];
                if id == 0 {
                    return Err(StructureError::ZeroId { row: t, column: s }.into());
                }
                let parent = if t == 0 { None } else { Some(matrix[[t - 1, s]]) };

                if id > nodes.len() {
                    let expected = nodes.len() + 1;
                    if id != expected {
                        return Err(StructureError::violation(
                            StructureRule::FirstSeenOrder,
                            t,
                            s,
                            format!("new id {id} where {expected} was expected"),
                        )
                        .into());
                    }
                    nodes.push(NodeRecord::new(id, t, parent));
                }

                let node = &mut nodes[id - 1];
                if node.stage != t {
                    return Err(StructureError::violation(
                        StructureRule::SingleRow,
                        t,
                        s,
                        format!("id {id} was introduced at row {}", node.stage),
                    )
                    .into());
                }
                if node.parent != parent {
                    return Err(StructureError::violation(
                        StructureRule::Refinement,
                        t,
                        s,
                        format!(
                            "id {id} follows {} here but {} in column {}",
                            fmt_parent(parent),
                            fmt_parent(node.parent),
                            node.members[0]
                        ),
                    )
                    .into());
                }
                node.members.push(s);
            }
        }

        if mode == ValidationMode::Strict {
            let last = n_steps - 1;
            for s in 0..n_scenarios {
                let node = &nodes[matrix[[last, s]] - 1];
                if node.members[0] != s {
                    return Err(StructureError::violation(
                        StructureRule::FinalSeparation,
                        last,
                        s,
                        format!("shares node {} with column {}", node.id, node.members[0]),
                    )
                    .into());
                }
            }
        }

        debug!(
            n_nodes = nodes.len(),
            n_steps,
            n_scenarios,
            ?mode,
            "nodal partition matrix validated"
        );

        Ok(Self {
            matrix: matrix.clone(),
            nodes,
            mode,
        })
    }

    /// The validated matrix.
    pub fn matrix(&self) -> &Array2<usize> {
        &self.matrix
    }

    /// Mode the matrix was validated with.
    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Number of time steps `T`.
    pub fn n_stages(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of scenarios `S`.
    pub fn n_scenarios(&self) -> usize {
        self.matrix.ncols()
    }

    /// Number of nodes; equals the largest id in the matrix.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// All nodes, ordered by id.
    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    /// Node with the given (1-based) id.
    pub fn node(&self, id: usize) -> Option<&NodeRecord> {
        id.checked_sub(1).and_then(|i| self.nodes.get(i))
    }

    /// Id of the node scenario `s` passes through at step `t`.
    pub fn node_at(&self, t: usize, s: usize) -> usize {
        self.matrix[[t, s]]
    }

    /// Arena index (`id - 1`) of the node at `(t, s)`.
    pub(crate) fn index_at(&self, t: usize, s: usize) -> usize {
        self.matrix[[t, s]] - 1
    }

    /// Nodes belonging to step `t`.
    pub fn nodes_at_stage(&self, t: usize) -> impl Iterator<Item = &NodeRecord> + '_ {
        self.nodes.iter().filter(move |n| n.stage == t)
    }

    /// Ids of the nodes whose parent is `id`.
    pub fn children(&self, id: usize) -> Vec<usize> {
        self.nodes
            .iter()
            .filter(|n| n.parent == Some(id))
            .map(|n| n.id)
            .collect()
    }

    /// Parent id of `id` (`None` for the root or unknown ids).
    pub fn parent(&self, id: usize) -> Option<usize> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Summary statistics of the branching structure.
    pub fn stats(&self) -> TreeStats {
        let mut nodes_per_stage = vec![0usize; self.n_stages()];
        for node in &self.nodes {
            nodes_per_stage[node.stage] += 1;
        }
        let last = self.n_stages() - 1;
        let leaf_count = nodes_per_stage[last];
        let internal = self.n_nodes() - leaf_count;
        // Every non-root node has exactly one parent among the internal nodes.
        let avg_branching_factor = if internal == 0 {
            0.0
        } else {
            (self.n_nodes() - 1) as f64 / internal as f64
        };
        TreeStats {
            nodes_per_stage,
            leaf_count,
            avg_branching_factor,
        }
    }
}

fn fmt_parent(parent: Option<usize>) -> String {
    match parent {
        Some(p) => format!("node {p}"),
        None => "nothing".to_string(),
    }
}

/// Branching statistics of a [`TreeStructure`].
#[derive(Debug, Clone, PartialEq)]
pub struct TreeStats {
    /// Node count at each time step.
    pub nodes_per_stage: Vec<usize>,
    /// Nodes at the final time step.
    pub leaf_count: usize,
    /// Mean number of children over non-final nodes.
    pub avg_branching_factor: f64,
}

impl fmt::Display for TreeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scenario Tree Structure")?;
        writeln!(f, "=======================")?;
        writeln!(f, "Nodes per stage: {:?}", self.nodes_per_stage)?;
        writeln!(f, "Leaves: {}", self.leaf_count)?;
        write!(f, "Avg branching factor: {:.2}", self.avg_branching_factor)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, unused_results)]
mod tests {
    use super::*;
    use crate::Error;
    use ndarray::array;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn structure_err(result: Result<TreeStructure>) -> StructureError {
        match result {
            Err(Error::Structure(e)) => e,
            other => panic!("expected structure error, got {:?}", other),
        }
    }

    /// Random legal matrix: each cell refines its parent by one of 3 branch labels,
    /// ids handed out in column-major first-seen order.
    fn legal_matrix(steps: usize, scenarios: usize, splits: &[u8]) -> Array2<usize> {
        let mut m = Array2::zeros((steps, scenarios));
        let mut ids: HashMap<(usize, u8), usize> = HashMap::new();
        for s in 0..scenarios {
            for t in 0..steps {
                let parent = if t == 0 { 0 } else { m[[t - 1, s]] };
                let branch = if t == 0 {
                    0
                } else {
                    splits[(t * scenarios + s) % splits.len()] % 3
                };
                let next = ids.len() + 1;
                m[[t, s]] = *ids.entry((parent, branch)).or_insert(next);
            }
        }
        m
    }

    #[test]
    fn test_decodes_four_scenario_example() {
        let m = array![[1, 1, 1, 1], [2, 2, 5, 5], [3, 4, 6, 7]];
        let tree = check_tree(&m).unwrap();

        assert_eq!(tree.n_nodes(), 7);
        assert_eq!(tree.n_stages(), 3);
        assert_eq!(tree.n_scenarios(), 4);

        let expected: [(usize, usize, &[usize]); 7] = [
            (1, 0, &[0, 1, 2, 3]),
            (2, 1, &[0, 1]),
            (3, 2, &[0]),
            (4, 2, &[1]),
            (5, 1, &[2, 3]),
            (6, 2, &[2]),
            (7, 2, &[3]),
        ];
        for (id, stage, members) in expected {
            let node = tree.node(id).unwrap();
            assert_eq!(node.stage, stage, "stage of node {id}");
            assert_eq!(node.members, members, "members of node {id}");
        }

        assert!(tree.node(1).unwrap().is_root());
        assert_eq!(tree.children(1), vec![2, 5]);
        assert_eq!(tree.children(5), vec![6, 7]);
        assert_eq!(tree.parent(7), Some(5));
        assert_eq!(tree.node(0), None);
        assert_eq!(tree.node(8), None);
    }

    #[test]
    fn test_strict_mode_accepts_separated_leaves() {
        let m = array![[1, 1, 1, 1], [2, 2, 5, 5], [3, 4, 6, 7]];
        let tree = TreeStructure::check_with(&m, ValidationMode::Strict).unwrap();
        assert_eq!(tree.mode(), ValidationMode::Strict);
    }

    #[test]
    fn test_out_of_order_new_id_is_rejected() {
        let e = structure_err(check_tree(&array![[1, 1], [3, 2]]));
        assert_eq!(e.rule(), Some(StructureRule::FirstSeenOrder));
        assert_eq!(e.cell(), Some((1, 0)));
    }

    #[test]
    fn test_root_must_be_shared() {
        let e = structure_err(check_tree(&array![[1, 2], [3, 4]]));
        assert_eq!(e.rule(), Some(StructureRule::Root));
        assert_eq!(e.cell(), Some((0, 1)));
    }

    #[test]
    fn test_root_must_be_one() {
        let e = structure_err(check_tree(&array![[2, 2], [3, 4]]));
        assert_eq!(e.rule(), Some(StructureRule::FirstSeenOrder));
        assert_eq!(e.cell(), Some((0, 0)));
    }

    #[test]
    fn test_node_cannot_span_rows() {
        let e = structure_err(check_tree(&array![[1, 1], [2, 2], [2, 3]]));
        assert_eq!(e.rule(), Some(StructureRule::SingleRow));
        assert_eq!(e.cell(), Some((2, 0)));
    }

    #[test]
    fn test_split_nodes_cannot_rejoin() {
        let e = structure_err(check_tree(&array![[1, 1], [2, 4], [3, 3]]));
        assert_eq!(e.rule(), Some(StructureRule::Refinement));
        assert_eq!(e.cell(), Some((2, 1)));
    }

    #[test]
    fn test_zero_id_is_rejected() {
        let e = structure_err(check_tree(&array![[1, 1], [2, 0]]));
        assert_eq!(e, StructureError::ZeroId { row: 1, column: 1 });
    }

    #[test]
    fn test_empty_matrix_is_rejected() {
        let m: Array2<usize> = Array2::zeros((0, 3));
        assert_eq!(structure_err(check_tree(&m)), StructureError::Empty);
    }

    #[test]
    fn test_unbranched_tree_is_lenient_only() {
        let m = array![[1, 1, 1, 1], [2, 2, 2, 2], [3, 3, 3, 3]];
        let tree = check_tree(&m).unwrap();
        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.node(3).unwrap().multiplicity(), 4);

        let e = structure_err(TreeStructure::check_with(&m, ValidationMode::Strict));
        assert_eq!(e.rule(), Some(StructureRule::FinalSeparation));
        assert_eq!(e.cell(), Some((2, 1)));
    }

    #[test]
    fn test_stats_count_nodes_per_stage() {
        let m = array![[1, 1, 1, 1], [2, 2, 5, 5], [3, 4, 6, 7]];
        let stats = check_tree(&m).unwrap().stats();
        assert_eq!(stats.nodes_per_stage, vec![1, 2, 4]);
        assert_eq!(stats.leaf_count, 4);
        assert!((stats.avg_branching_factor - 2.0).abs() < 1e-12);
        assert!(stats.to_string().contains("Leaves: 4"));
    }

    proptest! {
        #[test]
        fn test_legal_matrices_validate(
            steps in 1usize..6,
            scenarios in 1usize..7,
            splits in proptest::collection::vec(any::<u8>(), 1..64),
        ) {
            let m = legal_matrix(steps, scenarios, &splits);
            let tree = check_tree(&m).unwrap();

            let max_id = m.iter().copied().max().unwrap();
            prop_assert_eq!(tree.n_nodes(), max_id);

            // Root row holds one distinct id.
            prop_assert!(m.row(0).iter().all(|&id| id == 1));

            // No id spans two rows.
            for t in 0..steps {
                for s in 0..scenarios {
                    prop_assert_eq!(tree.node(m[[t, s]]).unwrap().stage, t);
                }
            }

            // Member lists partition every row.
            for t in 0..steps {
                let covered: usize = tree.nodes_at_stage(t).map(|n| n.multiplicity()).sum();
                prop_assert_eq!(covered, scenarios);
            }
        }
    }
}
