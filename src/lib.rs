//! # Tensorpack
//!
//! A safe binary container format for named multi-dimensional numeric
//! arrays, with zero-copy reads and lazy, memory-mapped access to files too
//! large to materialize.
//!
//! ## Overview
//!
//! Tensorpack is deliberately not a general object-serialization library.
//! A container is a flat name-to-tensor mapping plus one optional
//! string-to-string metadata block, and nothing else: no nested structures,
//! no compression, and no code execution of any kind during
//! deserialization. That restraint is what buys the defining property of
//! the format, safety: a reader can fully validate structure and bounds
//! from a small header before touching the bulk data, and the bulk data is
//! never interpreted as code.
//!
//! ### Key Features
//!
//! *   **Validated Up Front:** the header is decoded and checked once, at
//!     open time. Offsets, dtype and shape arithmetic, overlap, and coverage
//!     are all verified against the actual buffer before any tensor is
//!     handed out; malformed or adversarial input fails with a specific
//!     error naming the offending tensor.
//! *   **Zero-Copy Reads:** tensors are returned as views borrowing the
//!     input buffer or the memory mapping. Nothing is duplicated unless the
//!     caller materializes it.
//! *   **Lazy Loading:** [`PackReader::open`] memory-maps a file and reads
//!     only the header; tensor bytes are sliced out on demand, so a
//!     multi-gigabyte file costs a few kilobytes to open.
//! *   **Shared-Storage Guard:** tensors that alias overlapping backing
//!     memory are rejected at save time, before any output exists, instead
//!     of being silently duplicated on disk.
//! *   **Fixed Byte Order:** the on-disk format is little-endian,
//!     everywhere. Big-endian hosts fail fast rather than produce a wrong
//!     buffer.
//!
//! ## File Format
//!
//! ```text
//! [0..8)     u64, little-endian   length N of the encoded header
//! [8..8+N)   UTF-8 JSON           tensor descriptors + optional metadata
//! [8+N..)    raw bytes            data region, tensors back to back
//! ```
//!
//! Each descriptor carries `dtype`, `shape`, and `data_offsets` relative to
//! the end of the header; the reserved `__metadata__` key carries the user
//! metadata map. See [`header`] for the exact rules.
//!
//! ## Usage
//!
//! ```rust
//! use tensorpack::{serialize, Dtype, PackReader, TensorPack, TensorView};
//!
//! // Save: adapters wrap framework tensors as views over their bytes.
//! let weights: Vec<u8> = vec![0u8; 4 * 6];
//! let view = TensorView::new(Dtype::F32, vec![2, 3], &weights)?;
//! let bytes = serialize([("encoder.weight", view)], None)?;
//!
//! // Load (in memory, zero-copy):
//! let pack = TensorPack::deserialize(&bytes)?;
//! let tensor = pack.tensor("encoder.weight")?;
//! assert_eq!(tensor.dtype(), Dtype::F32);
//! assert_eq!(tensor.shape(), &[2, 3]);
//! # Ok::<(), tensorpack::TensorPackError>(())
//! ```
//!
//! Loading from disk goes through the lazy reader instead:
//!
//! ```rust,no_run
//! use tensorpack::PackReader;
//!
//! let reader = PackReader::open("model.tpk")?;
//! for name in reader.keys() {
//!     println!("{name}");
//! }
//! let tensor = reader.get_tensor("encoder.weight")?;
//! # Ok::<(), tensorpack::TensorPackError>(())
//! ```
//!
//! ## Concurrency
//!
//! The engine is synchronous and performs no locking because it needs none:
//! a [`PackReader`] is immutable after construction, so concurrent
//! `get_tensor` / `keys` / `metadata` calls from multiple threads are safe,
//! and independent handles may open the same file at once. Writing the same
//! destination from two serializer calls races at the file-system level and
//! is the caller's problem (use an atomic replace discipline).
//!
//! ### Safety and Error Handling
//!
//! * **Encapsulated Unsafe:** `unsafe` is used for exactly one thing, the
//!   mmap call in [`reader`], with the trade-off documented at the site.
//! * **No Panics:** no `unwrap()` or `panic!()` in the library (enforced by
//!   clippy lints).
//! * **Comprehensive Errors:** every failure is a [`TensorPackError`]
//!   carrying the tensor key or structural check involved.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod dtype;
pub mod error;
pub mod header;
pub mod inspector;
pub mod reader;
pub mod view;
pub mod writer;

mod aliasing;

pub use dtype::Dtype;
pub use error::{Result, TensorPackError};
pub use header::{Header, TensorInfo, MAX_HEADER_SIZE, METADATA_KEY};
pub use inspector::{PackInspector, PackReport};
pub use reader::{PackReader, TensorPack};
pub use view::{TensorView, View};
pub use writer::{serialize, serialize_to_file};
