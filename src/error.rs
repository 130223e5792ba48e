use core::fmt;

/// Result alias for `scentree`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by structure validation and tree fitting.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The nodal partition matrix does not encode a legal scenario tree.
    Structure(StructureError),

    /// Realization data is empty, non-finite, or does not match the structure.
    Data(DataError),

    /// Hyperparameters are outside their valid range.
    Config(ConfigError),

    /// A distance or node value became non-finite while fitting.
    NumericFailure {
        /// 1-based iteration at which the failure was observed.
        iteration: usize,
        /// Index of the realization drawn in that iteration.
        realization: usize,
    },

    /// The fit was stopped by its checkpoint observer.
    Cancelled {
        /// Last completed iteration.
        iteration: usize,
    },
}

/// Legality rules of a nodal partition matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StructureRule {
    /// All scenarios share one root node in the first row.
    Root,
    /// The k-th distinct id met in column-major order must equal k.
    FirstSeenOrder,
    /// A node id belongs to exactly one row.
    SingleRow,
    /// Every scenario owns a distinct node in the last row (strict mode only).
    FinalSeparation,
    /// Scenarios sharing a node also shared every ancestor.
    Refinement,
}

impl fmt::Display for StructureRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureRule::Root => write!(f, "single root"),
            StructureRule::FirstSeenOrder => write!(f, "first-seen order"),
            StructureRule::SingleRow => write!(f, "single row per node"),
            StructureRule::FinalSeparation => write!(f, "final separation"),
            StructureRule::Refinement => write!(f, "monotonic refinement"),
        }
    }
}

/// Reasons a nodal partition matrix is rejected.
///
/// Rows and columns are 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    /// Matrix has no rows or no columns.
    Empty,
    /// Node ids start at 1.
    ZeroId {
        /// Row of the offending cell.
        row: usize,
        /// Column of the offending cell.
        column: usize,
    },
    /// A legality rule is violated at a given cell.
    Violation {
        /// Rule that failed.
        rule: StructureRule,
        /// Row of the offending cell.
        row: usize,
        /// Column of the offending cell.
        column: usize,
        /// Description of what was found.
        detail: String,
    },
}

impl StructureError {
    pub(crate) fn violation(
        rule: StructureRule,
        row: usize,
        column: usize,
        detail: impl Into<String>,
    ) -> Self {
        StructureError::Violation {
            rule,
            row,
            column,
            detail: detail.into(),
        }
    }

    /// Rule that failed, if this is a rule violation.
    pub fn rule(&self) -> Option<StructureRule> {
        match self {
            StructureError::Violation { rule, .. } => Some(*rule),
            _ => None,
        }
    }

    /// Offending `(row, column)` cell, if any.
    pub fn cell(&self) -> Option<(usize, usize)> {
        match self {
            StructureError::Empty => None,
            StructureError::ZeroId { row, column }
            | StructureError::Violation { row, column, .. } => Some((*row, *column)),
        }
    }
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureError::Empty => write!(f, "nodal partition matrix is empty"),
            StructureError::ZeroId { row, column } => {
                write!(f, "node id 0 at row {row}, column {column}; ids start at 1")
            }
            StructureError::Violation {
                rule,
                row,
                column,
                detail,
            } => write!(f, "{rule} violated at row {row}, column {column}: {detail}"),
        }
    }
}

/// Problems with realization data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// No time steps, realizations, or components.
    Empty,
    /// A value is NaN or infinite.
    NonFinite {
        /// Time step (row).
        step: usize,
        /// Realization (column).
        realization: usize,
        /// Component within the step value.
        component: usize,
    },
    /// Realizations and structure disagree on the number of time steps.
    StepMismatch {
        /// Rows of the nodal partition matrix.
        structure_steps: usize,
        /// Time steps in the realizations.
        data_steps: usize,
    },
    /// Node values do not match the structure or realization shape.
    ShapeMismatch {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Empty => write!(f, "realization data is empty"),
            DataError::NonFinite {
                step,
                realization,
                component,
            } => write!(
                f,
                "non-finite value at step {step}, realization {realization}, component {component}"
            ),
            DataError::StepMismatch {
                structure_steps,
                data_steps,
            } => write!(
                f,
                "structure has {structure_steps} time steps but realizations have {data_steps}"
            ),
            DataError::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {expected}, actual {actual}")
            }
        }
    }
}

/// Invalid hyperparameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `j_max` must be at least 1.
    ZeroIterations,
    /// Parameter must be strictly positive.
    NonPositive {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Parameter is NaN or infinite.
    NonFinite {
        /// Parameter name.
        name: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroIterations => write!(f, "j_max must be at least 1"),
            ConfigError::NonPositive { name, value } => {
                write!(f, "invalid parameter '{name}': {value} is not positive")
            }
            ConfigError::NonFinite { name } => {
                write!(f, "invalid parameter '{name}': not finite")
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Structure(e) => write!(f, "structure error: {e}"),
            Error::Data(e) => write!(f, "data error: {e}"),
            Error::Config(e) => write!(f, "config error: {e}"),
            Error::NumericFailure {
                iteration,
                realization,
            } => write!(
                f,
                "non-finite distance at iteration {iteration} (realization {realization})"
            ),
            Error::Cancelled { iteration } => write!(f, "fit cancelled after iteration {iteration}"),
        }
    }
}

impl From<StructureError> for Error {
    fn from(e: StructureError) -> Self {
        Error::Structure(e)
    }
}

impl From<DataError> for Error {
    fn from(e: DataError) -> Self {
        Error::Data(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl std::error::Error for Error {}

impl std::error::Error for StructureError {}

impl std::error::Error for DataError {}

impl std::error::Error for ConfigError {}
