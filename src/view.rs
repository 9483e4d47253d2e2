//! The framework-agnostic tensor view abstraction.
//!
//! The engine never branches on where a tensor came from; it only consumes
//! the [`View`] capability interface. Framework adapters implement `View`
//! over their native tensor objects at save time, and the readers hand out
//! [`TensorView`]s borrowing the container's buffer at load time. The engine
//! never mutates the bytes behind a view.

use std::borrow::Cow;

use crate::dtype::Dtype;
use crate::error::{Result, TensorPackError};

/// Capability interface the serializer consumes.
///
/// Implementors must present a contiguous, row-major, CPU-addressable byte
/// range whose length equals `width(dtype) * product(shape)`; the serializer
/// re-checks that arithmetic when assigning offsets.
pub trait View {
    /// Element type.
    fn dtype(&self) -> Dtype;
    /// Dimensions, row-major. Empty for a scalar.
    fn shape(&self) -> &[usize];
    /// The backing bytes. Borrowed wherever possible; an adapter may return
    /// an owned copy if its framework cannot expose a stable slice.
    fn data(&self) -> Cow<'_, [u8]>;
    /// Length of [`View::data`] in bytes, without materializing it.
    fn data_len(&self) -> usize;
}

impl<V: View> View for &V {
    fn dtype(&self) -> Dtype {
        (**self).dtype()
    }
    fn shape(&self) -> &[usize] {
        (**self).shape()
    }
    fn data(&self) -> Cow<'_, [u8]> {
        (**self).data()
    }
    fn data_len(&self) -> usize {
        (**self).data_len()
    }
}

/// A borrowed tensor: dtype, shape, and a reference to contiguous bytes.
///
/// Never owns a copy of the data. Views produced by the readers borrow from
/// the container's buffer or memory mapping and cannot outlive it.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorView<'data> {
    dtype: Dtype,
    shape: Vec<usize>,
    data: &'data [u8],
}

impl<'data> TensorView<'data> {
    /// Creates a view, checking that the slice length matches the byte
    /// count the dtype and shape require.
    pub fn new(dtype: Dtype, shape: Vec<usize>, data: &'data [u8]) -> Result<Self> {
        let expected = shape
            .iter()
            .try_fold(dtype.size(), |acc, &dim| acc.checked_mul(dim))
            .ok_or_else(|| {
                TensorPackError::InvalidInput(format!(
                    "shape {shape:?} byte size overflows a usize"
                ))
            })?;
        if expected != data.len() {
            return Err(TensorPackError::InvalidInput(format!(
                "dtype {dtype} and shape {shape:?} require {expected} bytes but the slice holds {}",
                data.len()
            )));
        }
        Ok(Self { dtype, shape, data })
    }

    /// Builds a view over a slice already validated against its descriptor.
    pub(crate) fn from_validated(dtype: Dtype, shape: Vec<usize>, data: &'data [u8]) -> Self {
        Self { dtype, shape, data }
    }

    /// Element type.
    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Dimensions, row-major.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The backing bytes, for the lifetime of the underlying buffer.
    pub fn data(&self) -> &'data [u8] {
        self.data
    }
}

impl View for TensorView<'_> {
    fn dtype(&self) -> Dtype {
        self.dtype
    }
    fn shape(&self) -> &[usize] {
        &self.shape
    }
    fn data(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.data)
    }
    fn data_len(&self) -> usize {
        self.data.len()
    }
}
