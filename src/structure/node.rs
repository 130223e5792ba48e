//! Tree node record.

use core::fmt;

/// One node of a scenario tree, decoded from the nodal partition matrix.
///
/// A node lives at exactly one time step and is shared by the scenarios
/// (matrix columns) listed in `members`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NodeRecord {
    /// Node id as written in the matrix (1-based).
    pub id: usize,
    /// Time step (0-based row) the node belongs to.
    pub stage: usize,
    /// Scenario columns passing through this node, ascending.
    pub members: Vec<usize>,
    /// Id of the node one stage earlier (`None` for the root).
    pub parent: Option<usize>,
}

impl NodeRecord {
    pub(crate) fn new(id: usize, stage: usize, parent: Option<usize>) -> Self {
        Self {
            id,
            stage,
            members: Vec::new(),
            parent,
        }
    }

    /// Check if this is the root node.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Number of scenarios sharing the node.
    pub fn multiplicity(&self) -> usize {
        self.members.len()
    }
}

impl fmt::Display for NodeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node[{}] t{}: {:?}", self.id, self.stage, self.members)
    }
}
