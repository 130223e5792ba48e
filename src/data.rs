//! Realization sets.
//!
//! A realization is one sample path of the uncertain process. The set is
//! stored as a `(T, K, D)` array: `T` time steps, `K` realizations, `D`
//! components per step (`D = 1` for a univariate process).

use crate::error::{DataError, Result};
use ndarray::{Array2, Array3, ArrayView1, ArrayView2, Axis};

/// Immutable, validated set of realizations.
#[derive(Debug, Clone, PartialEq)]
pub struct Realizations {
    data: Array3<f64>,
}

impl Realizations {
    /// Wrap a `(T, K, D)` array, rejecting empty or non-finite data.
    pub fn new(data: Array3<f64>) -> Result<Self> {
        let (t, k, d) = data.dim();
        if t == 0 || k == 0 || d == 0 {
            return Err(DataError::Empty.into());
        }
        if let Some(((step, realization, component), _)) =
            data.indexed_iter().find(|(_, v)| !v.is_finite())
        {
            return Err(DataError::NonFinite {
                step,
                realization,
                component,
            }
            .into());
        }
        Ok(Self { data })
    }

    /// Univariate realizations from a `(T, K)` table, one column per path.
    pub fn from_paths(paths: Array2<f64>) -> Result<Self> {
        Self::new(paths.insert_axis(Axis(2)))
    }

    /// Number of time steps `T`.
    pub fn n_steps(&self) -> usize {
        self.data.dim().0
    }

    /// Number of realizations `K`.
    pub fn n_realizations(&self) -> usize {
        self.data.dim().1
    }

    /// Components per time step `D`.
    pub fn dim(&self) -> usize {
        self.data.dim().2
    }

    /// Value of realization `k` at step `t`.
    pub fn value(&self, t: usize, k: usize) -> ArrayView1<'_, f64> {
        self.data.slice(ndarray::s![t, k, ..])
    }

    /// Whole path of realization `k`, shape `(T, D)`.
    pub fn path(&self, k: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(1), k)
    }

    /// Underlying `(T, K, D)` array.
    pub fn as_array(&self) -> &Array3<f64> {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use ndarray::array;

    #[test]
    fn test_univariate_paths_get_unit_dimension() {
        let x = Realizations::from_paths(array![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]).unwrap();
        assert_eq!(x.n_steps(), 2);
        assert_eq!(x.n_realizations(), 3);
        assert_eq!(x.dim(), 1);
        assert_eq!(x.value(1, 2)[0], 5.0);
        assert_eq!(x.path(1).column(0).to_vec(), vec![1.0, 4.0]);
    }

    #[test]
    fn test_rejects_non_finite() {
        let err = Realizations::from_paths(array![[0.0, f64::NAN], [1.0, 2.0]]).unwrap_err();
        assert_eq!(
            err,
            Error::Data(DataError::NonFinite {
                step: 0,
                realization: 1,
                component: 0
            })
        );
    }

    #[test]
    fn test_rejects_empty() {
        let err = Realizations::new(Array3::zeros((3, 0, 1))).unwrap_err();
        assert_eq!(err, Error::Data(DataError::Empty));
    }
}
