//! Centralized error handling for tensorpack.
//!
//! Every failure in the engine is represented as a `Result` value; the
//! library contains no panics or unwraps (enforced by clippy lints at the
//! crate root). Errors are terminal at this layer: nothing is retried, and
//! every condition surfaces to the caller with enough context to name the
//! offending tensor key or the structural check that failed.
//!
//! ## Error Categories
//!
//! - **I/O** ([`TensorPackError::Io`]): low-level file system operations.
//! - **Caller input** ([`TensorPackError::InvalidInput`],
//!   [`TensorPackError::DuplicateTensorName`],
//!   [`TensorPackError::SharedStorage`]): problems with the tensors handed
//!   to the serializer, detected before any output exists.
//! - **Decode** ([`TensorPackError::MalformedHeader`],
//!   [`TensorPackError::UnknownDtype`]): the header bytes do not parse into
//!   a well-formed descriptor table.
//! - **Layout validation** ([`TensorPackError::ShapeMismatch`],
//!   [`TensorPackError::OverlappingTensors`],
//!   [`TensorPackError::SizeMismatch`]): the parsed header is internally
//!   inconsistent or does not match the data region actually present.
//! - **Lookup** ([`TensorPackError::KeyNotFound`]): a requested tensor name
//!   is absent from a validated container.
//! - **Host** ([`TensorPackError::UnsupportedEndianness`]): the process runs
//!   on a big-endian machine; the on-disk format is fixed little-endian.
//!
//! ## Usage
//!
//! ```rust
//! use tensorpack::{Dtype, TensorPackError, TensorView};
//!
//! // A view whose byte length disagrees with dtype * shape is rejected
//! // before it can reach the serializer.
//! let bytes = [0u8; 3];
//! match TensorView::new(Dtype::F32, vec![1], &bytes) {
//!     Err(TensorPackError::InvalidInput(msg)) => assert!(msg.contains("4 bytes")),
//!     other => panic!("expected InvalidInput, got {other:?}"),
//! }
//! ```

use std::fmt;
use std::io;
use std::sync::Arc;

/// A specialized `Result` type for tensorpack operations.
///
/// ```rust
/// use tensorpack::Result;
///
/// fn my_function() -> Result<i32> {
///     Ok(42)
/// }
/// ```
pub type Result<T> = std::result::Result<T, TensorPackError>;

/// The master error enum covering all failure domains in tensorpack.
///
/// The type is `Clone` so errors can be shared across threads or stored for
/// later analysis; I/O errors are wrapped in an `Arc` to keep cloning cheap.
#[derive(Debug, Clone)]
pub enum TensorPackError {
    /// Low-level I/O failure (file not found, permissions, disk full, etc.).
    Io(Arc<io::Error>),

    /// The caller-supplied structure is wrong before any bytes are touched:
    /// an empty tensor name, a view whose byte length disagrees with its
    /// dtype and shape, or a total size that overflows.
    InvalidInput(String),

    /// A dtype tag that is not in the registry. Carries the offending tag.
    UnknownDtype(String),

    /// The header block failed to decode: truncated length prefix, declared
    /// length past the end of the buffer, oversized header, invalid UTF-8,
    /// or text that does not parse into the expected descriptor table.
    MalformedHeader(String),

    /// A descriptor's `data_offsets` span disagrees with the byte length its
    /// dtype and shape require.
    ShapeMismatch {
        /// Name of the offending tensor.
        name: String,
        /// Bytes required by `width(dtype) * product(shape)`.
        expected: usize,
        /// Bytes actually spanned by `data_offsets`.
        found: usize,
    },

    /// Two descriptors declare byte ranges that overlap by at least one
    /// byte. Gaps between tensors are tolerated; overlap never is.
    OverlappingTensors {
        /// The earlier tensor (by start offset).
        first: String,
        /// The tensor whose range intrudes into `first`.
        second: String,
    },

    /// The maximum `end` offset across all descriptors does not equal the
    /// length of the data region actually present.
    SizeMismatch {
        /// Data-region length declared by the header.
        declared: usize,
        /// Data-region length actually present.
        actual: usize,
    },

    /// Two input tensors normalized to the same name.
    DuplicateTensorName(String),

    /// Two or more input tensors are backed by overlapping memory. Saving
    /// them would silently duplicate the aliased bytes on disk, so the save
    /// is rejected before any output is produced. Carries every conflicting
    /// group of names.
    SharedStorage(Vec<Vec<String>>),

    /// The requested tensor name is not present in the container.
    KeyNotFound(String),

    /// The host is big-endian. The format stores all multi-byte values
    /// little-endian and this build performs no byte swapping.
    UnsupportedEndianness,
}

impl fmt::Display for TensorPackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O Error: {e}"),
            Self::InvalidInput(s) => write!(f, "Invalid Input: {s}"),
            Self::UnknownDtype(tag) => write!(f, "Unknown dtype tag `{tag}`"),
            Self::MalformedHeader(s) => write!(f, "Error while deserializing header: {s}"),
            Self::ShapeMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "Shape mismatch for tensor `{name}`: dtype and shape require {expected} bytes \
                 but data_offsets span {found}"
            ),
            Self::OverlappingTensors { first, second } => write!(
                f,
                "Tensors `{first}` and `{second}` declare overlapping byte ranges"
            ),
            Self::SizeMismatch { declared, actual } => write!(
                f,
                "Size mismatch: header declares {declared} data bytes but the buffer holds {actual}"
            ),
            Self::DuplicateTensorName(name) => write!(f, "Duplicate tensor name `{name}`"),
            Self::SharedStorage(groups) => write!(
                f,
                "Some tensors share memory: {groups:?}. Saving them would duplicate the aliased \
                 bytes on disk and the copies would be independent after reload"
            ),
            Self::KeyNotFound(name) => write!(f, "File does not contain tensor `{name}`"),
            Self::UnsupportedEndianness => write!(
                f,
                "Big-endian hosts are not supported: the format is fixed little-endian"
            ),
        }
    }
}

impl std::error::Error for TensorPackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TensorPackError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}
