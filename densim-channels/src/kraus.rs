//! Single-wire Kraus operators and their application to a density buffer
//!
//! A channel is described by Kraus operators {Kᵢ} satisfying Σ Kᵢ† Kᵢ = I and
//! acts as ρ → Σᵢ Kᵢ ρ Kᵢ†. On the expanded layout this is two contractions
//! per operator: Kᵢ against the row axis of the target wire and conj(Kᵢ)
//! against its column axis.

use densim_core::{DensityError, Result};
use densim_state::DensityStateBuffer;
use ndarray::{array, Array2, ArrayD, Axis};
use num_complex::Complex64;
use tracing::trace;

/// A 2×2 Kraus operator acting on one wire
#[derive(Debug, Clone, PartialEq)]
pub struct KrausOperator {
    matrix: Array2<Complex64>,
}

impl KrausOperator {
    /// Create a Kraus operator from a 2×2 matrix
    ///
    /// # Errors
    /// Returns error if the matrix is not 2×2
    pub fn new(matrix: Array2<Complex64>) -> Result<Self> {
        if matrix.dim() != (2, 2) {
            return Err(DensityError::shape_mismatch("[2, 2]", matrix.shape()));
        }
        Ok(Self { matrix })
    }

    /// Create from row-major entries
    pub fn from_rows(rows: [[Complex64; 2]; 2]) -> Self {
        Self {
            matrix: array![[rows[0][0], rows[0][1]], [rows[1][0], rows[1][1]]],
        }
    }

    pub fn identity() -> Self {
        Self::real([[1.0, 0.0], [0.0, 1.0]])
    }

    pub fn pauli_x() -> Self {
        Self::real([[0.0, 1.0], [1.0, 0.0]])
    }

    pub fn pauli_y() -> Self {
        Self::from_rows([
            [Complex64::new(0.0, 0.0), Complex64::new(0.0, -1.0)],
            [Complex64::new(0.0, 1.0), Complex64::new(0.0, 0.0)],
        ])
    }

    pub fn pauli_z() -> Self {
        Self::real([[1.0, 0.0], [0.0, -1.0]])
    }

    fn real(rows: [[f64; 2]; 2]) -> Self {
        Self {
            matrix: Array2::from_shape_fn((2, 2), |(i, j)| Complex64::new(rows[i][j], 0.0)),
        }
    }

    /// Multiply every entry by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            matrix: self.matrix.mapv(|z| z * factor),
        }
    }

    #[inline]
    pub fn matrix(&self) -> &Array2<Complex64> {
        &self.matrix
    }

    /// Conjugate transpose
    pub fn adjoint(&self) -> Self {
        Self {
            matrix: self.matrix.t().mapv(|z| z.conj()),
        }
    }
}

/// Check the completeness relation Σ Kᵢ† Kᵢ = I within `tolerance`
pub fn is_trace_preserving(operators: &[KrausOperator], tolerance: f64) -> bool {
    if operators.is_empty() {
        return false;
    }

    let mut sum = Array2::<Complex64>::zeros((2, 2));
    for kraus in operators {
        sum += &kraus.adjoint().matrix.dot(&kraus.matrix);
    }

    let identity = KrausOperator::identity();
    sum.iter()
        .zip(identity.matrix.iter())
        .all(|(a, b)| (a - b).norm() <= tolerance)
}

/// Contract `axis` of `tensor` with `m`: out[.., i, ..] = Σⱼ m[i, j] tensor[.., j, ..]
fn contract_axis(tensor: &ArrayD<Complex64>, axis: usize, m: &Array2<Complex64>) -> ArrayD<Complex64> {
    let mut out = ArrayD::zeros(tensor.raw_dim());
    for i in 0..2 {
        let mut out_i = out.index_axis_mut(Axis(axis), i);
        for j in 0..2 {
            out_i.scaled_add(m[[i, j]], &tensor.index_axis(Axis(axis), j));
        }
    }
    out
}

/// Apply ρ → Σᵢ Kᵢ ρ Kᵢ† on `wire` for every batch element
///
/// # Errors
/// [`DensityError::InvalidWire`] if `wire` is outside the register. The
/// buffer is unchanged on error.
pub fn apply_single_wire_kraus(
    buffer: &mut DensityStateBuffer,
    wire: usize,
    operators: &[KrausOperator],
) -> Result<()> {
    let num_wires = buffer.num_wires();
    if wire >= num_wires {
        return Err(DensityError::InvalidWire { wire, num_wires });
    }

    let rho = buffer.densities();
    let row_axis = 1 + wire;
    let col_axis = 1 + num_wires + wire;

    let mut result = ArrayD::<Complex64>::zeros(rho.raw_dim());
    for kraus in operators {
        let left = contract_axis(rho, row_axis, kraus.matrix());
        let conj = kraus.matrix().mapv(|z| z.conj());
        result += &contract_axis(&left, col_axis, &conj);
    }

    trace!(wire, operators = operators.len(), "applied kraus channel");
    buffer.replace_densities(result)
}
