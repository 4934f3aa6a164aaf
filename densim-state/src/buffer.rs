//! Batched density matrices in expanded per-qubit layout
//!
//! A density matrix ρ over n qubits is a 2^n × 2^n complex matrix. Instead of
//! storing it flat, the buffer keeps it as a rank-2n array with every axis of
//! size 2, so operators can contract a single qubit's axes without touching
//! the rest of the register.
//!
//! # Axis convention
//!
//! For a batch of `bsz` matrices the array has shape `[bsz] + [2; 2n]`:
//!
//! | axis        | meaning                           |
//! |-------------|-----------------------------------|
//! | `0`         | batch element                     |
//! | `1 + q`     | row-index bit of qubit `q`        |
//! | `1 + n + q` | column-index bit of qubit `q`     |
//!
//! Qubit 0 is the most significant bit of the flat 2^n index, so a row-major
//! reshape to `[bsz, 2^n, 2^n]` yields the conventional matrices and the
//! reverse reshape restores the expanded layout bit for bit.
//!
//! # Example
//!
//! ```
//! use densim_state::DensityStateBuffer;
//! use ndarray::array;
//! use num_complex::Complex64;
//!
//! let mut buffer = DensityStateBuffer::new(1, 1).unwrap();
//! assert_eq!(buffer.densities().shape(), &[1, 2, 2]);
//!
//! // Lift |1⟩ into |1⟩⟨1|
//! let excited = array![[Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)]].into_dyn();
//! buffer.clone_from_states(&excited).unwrap();
//! assert_eq!(buffer.probabilities(0).unwrap().to_vec(), vec![0.0, 1.0]);
//! ```

use densim_core::{DensityError, Result};
use ndarray::{Array, Array2, Array3, ArrayD, ArrayViewD, ArrayViewMutD, Axis, Dimension, IxDyn};
use num_complex::Complex64;
use std::fmt;
use tracing::{debug, trace};

/// Shape of `num_wires` qubits in expanded layout, with an optional leading batch axis
pub fn expanded_shape(num_wires: usize, batch_size: Option<usize>) -> Vec<usize> {
    let mut shape = Vec::with_capacity(1 + 2 * num_wires);
    shape.extend(batch_size);
    shape.extend(std::iter::repeat(2).take(2 * num_wires));
    shape
}

/// Copy `view` into a new array of `shape`, preserving row-major element order
pub(crate) fn reshape<A, D>(view: ArrayViewD<'_, A>, shape: &[usize]) -> Result<Array<A, D>>
where
    A: Clone,
    D: Dimension,
{
    let actual = view.shape().to_vec();
    ArrayD::from_shape_vec(IxDyn(shape), view.iter().cloned().collect())
        .and_then(|array| array.into_dimensionality::<D>())
        .map_err(|_| DensityError::shape_mismatch(format!("{:?}", shape), &actual))
}

/// One or many density matrices sharing a qubit count
///
/// Holds the batch buffer and a single-density snapshot of the ground state
/// that the batch is replicated from. The two never alias.
#[derive(Clone)]
pub struct DensityStateBuffer {
    /// Number of qubits
    num_wires: usize,

    /// Unbatched |0…0⟩⟨0…0| template, shape `[2; 2n]`
    density: ArrayD<Complex64>,

    /// Batch of density matrices, shape `[bsz] + [2; 2n]`
    densities: ArrayD<Complex64>,
}

impl DensityStateBuffer {
    /// Create a batch of `batch_size` ground states |0…0⟩⟨0…0|
    ///
    /// # Errors
    /// - [`DensityError::InvalidBatchSize`] if `batch_size` is 0
    /// - [`DensityError::StateTooLarge`] if the buffer cannot be addressed
    pub fn new(num_wires: usize, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(DensityError::InvalidBatchSize(batch_size));
        }

        // 4^n elements per matrix; the whole batch must fit in one allocation
        let elements = num_wires
            .checked_mul(2)
            .and_then(|bits| u32::try_from(bits).ok())
            .and_then(|bits| 1usize.checked_shl(bits))
            .filter(|&n| Self::fits_allocation(n, batch_size))
            .ok_or(DensityError::StateTooLarge { num_wires })?;

        let mut flat = vec![Complex64::new(0.0, 0.0); elements];
        // Only the all-zero index is populated
        flat[0] = Complex64::new(1.0, 0.0);
        let density = ArrayD::from_shape_vec(IxDyn(&expanded_shape(num_wires, None)), flat)
            .map_err(|_| DensityError::StateTooLarge { num_wires })?;

        let densities = Self::replicate(&density, num_wires, batch_size)?;

        debug!(num_wires, batch_size, "initialized density buffer");

        Ok(Self {
            num_wires,
            density,
            densities,
        })
    }

    /// Whether `batch_size` matrices of `elements` entries stay within `isize::MAX` bytes
    fn fits_allocation(elements: usize, batch_size: usize) -> bool {
        elements
            .checked_mul(batch_size)
            .and_then(|n| n.checked_mul(std::mem::size_of::<Complex64>()))
            .map_or(false, |bytes| bytes <= isize::MAX as usize)
    }

    /// Repeat `density` along a new leading batch axis
    fn replicate(
        density: &ArrayD<Complex64>,
        num_wires: usize,
        batch_size: usize,
    ) -> Result<ArrayD<Complex64>> {
        let shape = expanded_shape(num_wires, Some(batch_size));
        density
            .broadcast(IxDyn(&shape))
            .map(|view| view.to_owned())
            .ok_or_else(|| DensityError::shape_mismatch(format!("{:?}", shape), density.shape()))
    }

    /// Number of qubits
    #[inline]
    pub fn num_wires(&self) -> usize {
        self.num_wires
    }

    /// Number of density matrices in the batch
    #[inline]
    pub fn batch_size(&self) -> usize {
        self.densities.shape()[0]
    }

    /// Matrix dimension 2^n
    #[inline]
    pub fn dimension(&self) -> usize {
        1usize << self.num_wires
    }

    /// The batch, shape `[bsz] + [2; 2n]`
    #[inline]
    pub fn densities(&self) -> &ArrayD<Complex64> {
        &self.densities
    }

    /// Mutable view of the batch
    ///
    /// The view can rewrite elements but cannot change the shape; use
    /// [`replace_densities`](Self::replace_densities) to swap the array.
    #[inline]
    pub fn densities_mut(&mut self) -> ArrayViewMutD<'_, Complex64> {
        self.densities.view_mut()
    }

    /// The single-density ground-state snapshot, shape `[2; 2n]`
    #[inline]
    pub fn density(&self) -> &ArrayD<Complex64> {
        &self.density
    }

    /// Check that `shape` is `[b] + [2; 2n]` with `b >= 1`
    fn check_batch_layout(&self, shape: &[usize]) -> Result<()> {
        let matches = shape.len() == 1 + 2 * self.num_wires
            && shape[0] > 0
            && shape[1..].iter().all(|&d| d == 2);

        if matches {
            Ok(())
        } else {
            Err(DensityError::shape_mismatch(
                format!("[*, 2 x {}]", 2 * self.num_wires),
                shape,
            ))
        }
    }

    /// Replace the batch with a deep copy of `source`
    ///
    /// The batch size is adopted from `source`.
    ///
    /// # Errors
    /// [`DensityError::ShapeMismatch`] if `source` is not in expanded layout
    /// for this qubit count. The buffer is unchanged on error.
    pub fn clone_densities(&mut self, source: &ArrayD<Complex64>) -> Result<()> {
        self.check_batch_layout(source.shape())?;
        self.log_batch_change(source.shape()[0], "clone_densities");
        self.densities = source.to_owned();
        Ok(())
    }

    /// Replace the batch with operator output, taking ownership
    ///
    /// Same layout rules as [`clone_densities`](Self::clone_densities).
    pub fn replace_densities(&mut self, densities: ArrayD<Complex64>) -> Result<()> {
        self.check_batch_layout(densities.shape())?;
        self.log_batch_change(densities.shape()[0], "replace_densities");
        self.densities = densities;
        Ok(())
    }

    /// Lift a batch of pure states into density matrices ρ = |ψ⟩⟨ψ|
    ///
    /// `states` is either in expanded state layout `[b] + [2; n]` or flattened
    /// as `[b, 2^n]`. Each state is used as a column ket; its conjugate
    /// transpose is the bra. The batch size is adopted from `states`.
    ///
    /// # Errors
    /// [`DensityError::ShapeMismatch`] for any other shape, including an
    /// empty batch. The buffer is unchanged on error.
    pub fn clone_from_states(&mut self, states: &ArrayD<Complex64>) -> Result<()> {
        let shape = states.shape();
        let dim = self.dimension();

        let expanded = shape.len() == 1 + self.num_wires && shape[1..].iter().all(|&d| d == 2);
        let flattened = shape.len() == 2 && shape[1] == dim;
        if shape.is_empty() || shape[0] == 0 || !(expanded || flattened) {
            return Err(DensityError::shape_mismatch(
                format!("[*, {}] or [*, 2 x {}]", dim, self.num_wires),
                shape,
            ));
        }

        let batch_size = shape[0];
        let kets: Array2<Complex64> = reshape(states.view(), &[batch_size, dim])?;

        let mut lifted = Array3::<Complex64>::zeros((batch_size, dim, dim));
        for (mut rho, psi) in lifted.outer_iter_mut().zip(kets.outer_iter()) {
            let ket = psi.insert_axis(Axis(1));
            let bra = psi.mapv(|a| a.conj()).insert_axis(Axis(0));
            rho.assign(&ket.dot(&bra));
        }

        let densities: ArrayD<Complex64> = reshape(
            lifted.into_dyn().view(),
            &expanded_shape(self.num_wires, Some(batch_size)),
        )?;

        self.log_batch_change(batch_size, "clone_from_states");
        self.densities = densities;
        Ok(())
    }

    /// Restore every batch element to the ground-state snapshot
    pub fn reset(&mut self) -> Result<()> {
        self.densities = Self::replicate(&self.density, self.num_wires, self.batch_size())?;
        trace!(batch_size = self.batch_size(), "reset density buffer");
        Ok(())
    }

    fn log_batch_change(&self, new_batch: usize, op: &'static str) {
        if new_batch != self.batch_size() {
            debug!(op, from = self.batch_size(), to = new_batch, "batch size adopted from source");
        } else {
            trace!(op, batch_size = new_batch, "replaced density batch");
        }
    }
}

impl fmt::Debug for DensityStateBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DensityStateBuffer {{ wires: {}, batch: {}, shape: {:?} }}",
            self.num_wires,
            self.batch_size(),
            self.densities.shape()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn test_expanded_shape() {
        assert_eq!(expanded_shape(2, Some(3)), vec![3, 2, 2, 2, 2]);
        assert_eq!(expanded_shape(1, None), vec![2, 2]);
        assert_eq!(expanded_shape(0, Some(1)), vec![1]);
    }

    #[test]
    fn test_new_buffer_shape() {
        let buffer = DensityStateBuffer::new(3, 4).unwrap();
        assert_eq!(buffer.num_wires(), 3);
        assert_eq!(buffer.batch_size(), 4);
        assert_eq!(buffer.dimension(), 8);
        assert_eq!(buffer.densities().shape(), &[4, 2, 2, 2, 2, 2, 2]);
        assert_eq!(buffer.density().shape(), &[2, 2, 2, 2, 2, 2]);
    }

    #[test]
    fn test_new_buffer_is_ground_state() {
        let buffer = DensityStateBuffer::new(2, 2).unwrap();
        for element in buffer.densities().outer_iter() {
            for (i, value) in element.iter().enumerate() {
                let expected = if i == 0 { 1.0 } else { 0.0 };
                assert_eq!(*value, c(expected, 0.0));
            }
        }
    }

    #[test]
    fn test_zero_batch_rejected() {
        assert_eq!(
            DensityStateBuffer::new(2, 0).unwrap_err(),
            DensityError::InvalidBatchSize(0)
        );
    }

    #[test]
    fn test_too_many_wires_rejected() {
        for num_wires in [30, 31, 40, 64] {
            assert_eq!(
                DensityStateBuffer::new(num_wires, 1).unwrap_err(),
                DensityError::StateTooLarge { num_wires }
            );
        }
        assert_eq!(
            DensityStateBuffer::new(usize::MAX, 1).unwrap_err(),
            DensityError::StateTooLarge { num_wires: usize::MAX }
        );
    }

    #[test]
    fn test_batch_counts_toward_size_limit() {
        assert_eq!(
            DensityStateBuffer::new(20, usize::MAX / 8).unwrap_err(),
            DensityError::StateTooLarge { num_wires: 20 }
        );
    }

    #[test]
    fn test_zero_wires() {
        let buffer = DensityStateBuffer::new(0, 2).unwrap();
        assert_eq!(buffer.densities().shape(), &[2]);
        assert_eq!(buffer.trace(1).unwrap(), c(1.0, 0.0));
    }

    #[test]
    fn test_snapshot_is_independent_of_batch() {
        let mut buffer = DensityStateBuffer::new(1, 2).unwrap();
        buffer.densities_mut().fill(c(0.5, 0.0));
        assert_eq!(buffer.density()[[0, 0]], c(1.0, 0.0));
        assert_eq!(buffer.density()[[1, 1]], c(0.0, 0.0));
    }

    #[test]
    fn test_clone_densities_adopts_batch_size() {
        let mut buffer = DensityStateBuffer::new(1, 1).unwrap();
        let source = DensityStateBuffer::new(1, 3).unwrap();
        buffer.clone_densities(source.densities()).unwrap();
        assert_eq!(buffer.batch_size(), 3);
    }

    #[test]
    fn test_clone_densities_rejects_wrong_rank() {
        let mut buffer = DensityStateBuffer::new(2, 1).unwrap();
        let wrong = DensityStateBuffer::new(1, 1).unwrap();
        let err = buffer.clone_densities(wrong.densities()).unwrap_err();
        assert!(matches!(err, DensityError::ShapeMismatch { .. }));
        assert_eq!(buffer.densities().shape(), &[1, 2, 2, 2, 2]);
    }

    #[test]
    fn test_clone_densities_rejects_wrong_axis_size() {
        let mut buffer = DensityStateBuffer::new(1, 1).unwrap();
        let wrong = ArrayD::<Complex64>::zeros(IxDyn(&[1, 2, 3]));
        assert!(buffer.clone_densities(&wrong).is_err());
    }

    #[test]
    fn test_clone_from_excited_state() {
        let mut buffer = DensityStateBuffer::new(1, 1).unwrap();
        let states = array![[c(0.0, 0.0), c(1.0, 0.0)]].into_dyn();
        buffer.clone_from_states(&states).unwrap();

        assert_eq!(buffer.densities().shape(), &[1, 2, 2]);
        assert_eq!(buffer.densities()[[0, 1, 1]], c(1.0, 0.0));
        assert_eq!(buffer.densities()[[0, 0, 0]], c(0.0, 0.0));
    }

    #[test]
    fn test_clone_from_states_conjugates_bra() {
        // |ψ⟩ = (|0⟩ + i|1⟩)/√2, so ρ₀₁ = ψ₀ ψ₁* = -i/2
        let s = 1.0 / 2.0_f64.sqrt();
        let mut buffer = DensityStateBuffer::new(1, 1).unwrap();
        let states = array![[c(s, 0.0), c(0.0, s)]].into_dyn();
        buffer.clone_from_states(&states).unwrap();

        let rho = buffer.as_2d_matrix(0).unwrap();
        assert_relative_eq!(rho[[0, 1]].im, -0.5, epsilon = 1e-12);
        assert_relative_eq!(rho[[1, 0]].im, 0.5, epsilon = 1e-12);
        assert_relative_eq!(rho[[0, 1]].re, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clone_from_expanded_states() {
        // |10⟩ in [b, 2, 2] layout: qubit 0 set
        let mut states = ArrayD::<Complex64>::zeros(IxDyn(&[2, 2, 2]));
        states[[0, 1, 0]] = c(1.0, 0.0);
        states[[1, 0, 1]] = c(1.0, 0.0);

        let mut buffer = DensityStateBuffer::new(2, 1).unwrap();
        buffer.clone_from_states(&states).unwrap();

        assert_eq!(buffer.batch_size(), 2);
        assert_eq!(buffer.probabilities(0).unwrap().to_vec(), vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(buffer.probabilities(1).unwrap().to_vec(), vec![0.0, 1.0, 0.0, 0.0]);
        // Row bit and column bit of qubit 0 sit at axes 1 and 3
        assert_eq!(buffer.densities()[[0, 1, 0, 1, 0]], c(1.0, 0.0));
    }

    #[test]
    fn test_clone_from_states_rejects_density_input() {
        let mut buffer = DensityStateBuffer::new(2, 1).unwrap();
        let before = buffer.densities().clone();
        let density_tensor = DensityStateBuffer::new(2, 1).unwrap().densities().clone();

        let err = buffer.clone_from_states(&density_tensor).unwrap_err();
        assert!(matches!(err, DensityError::ShapeMismatch { .. }));
        assert_eq!(buffer.densities(), &before);
    }

    #[test]
    fn test_clone_from_states_rejects_empty_batch() {
        let mut buffer = DensityStateBuffer::new(1, 1).unwrap();
        let empty = ArrayD::<Complex64>::zeros(IxDyn(&[0, 2]));
        assert!(buffer.clone_from_states(&empty).is_err());
        assert_eq!(buffer.batch_size(), 1);
    }

    #[test]
    fn test_replace_densities_validates() {
        let mut buffer = DensityStateBuffer::new(1, 2).unwrap();
        assert!(buffer
            .replace_densities(ArrayD::zeros(IxDyn(&[2, 2])))
            .is_err());
        buffer
            .replace_densities(ArrayD::zeros(IxDyn(&[5, 2, 2])))
            .unwrap();
        assert_eq!(buffer.batch_size(), 5);
    }

    #[test]
    fn test_reset_restores_ground_state() {
        let mut buffer = DensityStateBuffer::new(1, 1).unwrap();
        let states = array![[c(0.0, 0.0), c(1.0, 0.0)], [c(1.0, 0.0), c(0.0, 0.0)]].into_dyn();
        buffer.clone_from_states(&states).unwrap();
        buffer.reset().unwrap();

        assert_eq!(buffer.batch_size(), 2);
        for i in 0..2 {
            assert_eq!(buffer.probabilities(i).unwrap().to_vec(), vec![1.0, 0.0]);
        }
    }

    #[test]
    fn test_debug_format() {
        let buffer = DensityStateBuffer::new(1, 2).unwrap();
        let text = format!("{:?}", buffer);
        assert!(text.contains("wires: 1"));
        assert!(text.contains("batch: 2"));
    }
}
