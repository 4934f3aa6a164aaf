//! Read-only views derived from a density buffer
//!
//! Every view is recomputed from the current buffer contents on each call;
//! nothing is cached, so a view can never go stale after an operator runs.

use crate::buffer::{expanded_shape, reshape, DensityStateBuffer};
use densim_core::{DensityError, Result};
use ndarray::{Array1, Array2, Array3, ArrayD, Axis};
use num_complex::Complex64;

impl DensityStateBuffer {
    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.batch_size() {
            Ok(())
        } else {
            Err(DensityError::BatchIndexOutOfRange {
                index,
                batch_size: self.batch_size(),
            })
        }
    }

    /// Batch element `index` as a 2^n × 2^n matrix
    pub fn as_2d_matrix(&self, index: usize) -> Result<Array2<Complex64>> {
        self.check_index(index)?;
        let dim = self.dimension();
        reshape(self.densities().index_axis(Axis(0), index), &[dim, dim])
    }

    /// The whole batch as `[bsz, 2^n, 2^n]`
    pub fn all_as_2d_matrices(&self) -> Result<Array3<Complex64>> {
        let dim = self.dimension();
        reshape(self.densities().view(), &[self.batch_size(), dim, dim])
    }

    /// Tr(ρ) of batch element `index`
    ///
    /// Equals 1 for a normalized state; the buffer does not enforce it.
    pub fn trace(&self, index: usize) -> Result<Complex64> {
        Ok(self.as_2d_matrix(index)?.diag().sum())
    }

    /// Tr(ρ) of every batch element
    pub fn traces(&self) -> Result<Array1<Complex64>> {
        let matrices = self.all_as_2d_matrices()?;
        Ok(matrices
            .outer_iter()
            .map(|rho| rho.diag().sum())
            .collect())
    }

    /// Measurement probability of each basis state, |ρᵢᵢ|
    pub fn probabilities(&self, index: usize) -> Result<Array1<f64>> {
        Ok(self.as_2d_matrix(index)?.diag().mapv(|z| z.norm()))
    }

    /// Probabilities for the whole batch as `[bsz, 2^n]`
    pub fn all_probabilities(&self) -> Result<Array2<f64>> {
        let matrices = self.all_as_2d_matrices()?;
        let dim = self.dimension();
        Ok(Array2::from_shape_fn((self.batch_size(), dim), |(b, i)| {
            matrices[[b, i, i]].norm()
        }))
    }

    /// The ground-state snapshot as a 2^n × 2^n matrix
    pub fn snapshot_2d(&self) -> Result<Array2<Complex64>> {
        let dim = self.dimension();
        reshape(self.density().view(), &[dim, dim])
    }

    /// Probabilities of the ground-state snapshot
    pub fn snapshot_probabilities(&self) -> Result<Array1<f64>> {
        Ok(self.snapshot_2d()?.diag().mapv(|z| z.norm()))
    }
}

/// 2^n, or `None` if it does not fit in `usize`
fn matrix_dimension(num_wires: usize) -> Option<usize> {
    u32::try_from(num_wires)
        .ok()
        .and_then(|bits| 1usize.checked_shl(bits))
}

/// Reshape `[bsz, 2^n, 2^n]` matrices back into expanded layout
///
/// Inverse of [`DensityStateBuffer::all_as_2d_matrices`].
pub fn from_2d_matrices(num_wires: usize, matrices: &Array3<Complex64>) -> Result<ArrayD<Complex64>> {
    let (batch_size, rows, cols) = matrices.dim();
    let dim = matrix_dimension(num_wires)
        .ok_or_else(|| DensityError::shape_mismatch(format!("[*, 2^{0}, 2^{0}]", num_wires), matrices.shape()))?;
    if rows != dim || cols != dim {
        return Err(DensityError::shape_mismatch(
            format!("[*, {}, {}]", dim, dim),
            matrices.shape(),
        ));
    }
    reshape(
        matrices.view().into_dyn(),
        &expanded_shape(num_wires, Some(batch_size)),
    )
}

/// Reshape one 2^n × 2^n matrix into unbatched expanded layout `[2; 2n]`
pub fn from_2d_matrix(num_wires: usize, matrix: &Array2<Complex64>) -> Result<ArrayD<Complex64>> {
    let dim = matrix_dimension(num_wires)
        .ok_or_else(|| DensityError::shape_mismatch(format!("[2^{0}, 2^{0}]", num_wires), matrix.shape()))?;
    if matrix.dim() != (dim, dim) {
        return Err(DensityError::shape_mismatch(
            format!("[{}, {}]", dim, dim),
            matrix.shape(),
        ));
    }
    reshape(matrix.view().into_dyn(), &expanded_shape(num_wires, None))
}
