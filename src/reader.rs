//! The read-side engine.
//!
//! Two entry points, both of which decode and validate the header once and
//! never copy tensor bytes:
//!
//! - [`TensorPack::deserialize`] borrows an in-memory buffer and hands out
//!   zero-copy [`TensorView`]s into it.
//! - [`PackReader::open`] memory-maps a file and owns the mapping; views
//!   borrow from the handle and cannot outlive it. Multiple handles may open
//!   the same file concurrently, and a single handle is safe to share across
//!   threads because nothing mutates after construction.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{Result, TensorPackError};
use crate::header::{Header, TensorInfo, PREFIX_SIZE};
use crate::view::TensorView;

/// A zero-copy view over a complete container held in memory.
///
/// ```rust
/// use tensorpack::{serialize, Dtype, TensorPack, TensorView};
///
/// let data = 1.0f32.to_le_bytes();
/// let view = TensorView::new(Dtype::F32, vec![], &data)?;
/// let bytes = serialize([("bias", view)], None)?;
///
/// let pack = TensorPack::deserialize(&bytes)?;
/// let bias = pack.tensor("bias")?;
/// assert_eq!(bias.shape(), &[] as &[usize]);
/// assert_eq!(bias.data(), &data);
/// # Ok::<(), tensorpack::TensorPackError>(())
/// ```
#[derive(Debug)]
pub struct TensorPack<'data> {
    header: Header,
    data: &'data [u8],
}

impl<'data> TensorPack<'data> {
    /// Decodes and validates the header, retaining a reference to the data
    /// region without copying it.
    pub fn deserialize(buffer: &'data [u8]) -> Result<Self> {
        let (n, header) = Header::from_bytes(buffer)?;
        let data = &buffer[PREFIX_SIZE + n..];
        Ok(Self { header, data })
    }

    /// Decodes and validates only the header of a container.
    ///
    /// Returns the encoded header length (the data region starts at that
    /// length plus the 8-byte prefix) and the header itself. Useful for
    /// index tooling that never touches tensor bytes.
    pub fn read_header(buffer: &[u8]) -> Result<(usize, Header)> {
        Header::from_bytes(buffer)
    }

    /// All tensors, paired with their names, in storage order.
    pub fn tensors(&self) -> Vec<(String, TensorView<'data>)> {
        self.header
            .tensors()
            .iter()
            .map(|(name, info)| (name.clone(), self.view_of(info)))
            .collect()
    }

    /// Iterates over `(name, view)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, TensorView<'data>)> {
        self.header
            .tensors()
            .iter()
            .map(|(name, info)| (name.as_str(), self.view_of(info)))
    }

    /// Returns the view for `name`, or `KeyNotFound`.
    pub fn tensor(&self, name: &str) -> Result<TensorView<'data>> {
        self.header
            .info(name)
            .map(|info| self.view_of(info))
            .ok_or_else(|| TensorPackError::KeyNotFound(name.to_string()))
    }

    /// Tensor names in storage order.
    pub fn names(&self) -> Vec<&str> {
        self.header.names().collect()
    }

    /// The user metadata map, if any was saved.
    pub fn metadata(&self) -> Option<&HashMap<String, String>> {
        self.header.metadata()
    }

    /// Number of tensors in the container.
    pub fn len(&self) -> usize {
        self.header.len()
    }

    /// True if the container holds no tensors.
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    fn view_of(&self, info: &TensorInfo) -> TensorView<'data> {
        let (start, end) = info.data_offsets;
        // Offsets were bounds-checked against the data region at decode.
        TensorView::from_validated(info.dtype, info.shape.clone(), &self.data[start..end])
    }
}

/// The lazy reader: a handle over a memory-mapped container file.
///
/// The header is parsed and validated eagerly at [`PackReader::open`];
/// tensor bytes are only touched when [`PackReader::get_tensor`] slices
/// them out of the mapping. The handle exclusively owns the mapping, and a
/// failed open leaves nothing live.
#[derive(Debug)]
pub struct PackReader {
    mmap: Mmap,
    header: Header,
    data_start: usize,
}

impl PackReader {
    /// Memory-maps a container file and validates its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;

        // Safety: Mmap is fundamentally unsafe as external processes could
        // modify the file underneath us. We assume exclusive access or
        // accept the risk for performance (standard practice).
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };

        let (n, header) = Header::from_bytes(&mmap)?;
        Ok(Self {
            mmap,
            header,
            data_start: PREFIX_SIZE + n,
        })
    }

    /// Iterates over tensor names. The iterator is finite and restartable;
    /// each call starts over from the beginning of the table.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.header.names()
    }

    /// Tensor names in storage order.
    pub fn names(&self) -> Vec<&str> {
        self.header.names().collect()
    }

    /// The user metadata map, if any was saved.
    pub fn metadata(&self) -> Option<&HashMap<String, String>> {
        self.header.metadata()
    }

    /// Returns a view borrowing the exact byte range for `name` out of the
    /// mapping, or `KeyNotFound`. No bytes are copied or interpreted.
    pub fn get_tensor(&self, name: &str) -> Result<TensorView<'_>> {
        let info = self
            .header
            .info(name)
            .ok_or_else(|| TensorPackError::KeyNotFound(name.to_string()))?;
        let (start, end) = info.data_offsets;
        let slice = &self.mmap[self.data_start + start..self.data_start + end];
        Ok(TensorView::from_validated(
            info.dtype,
            info.shape.clone(),
            slice,
        ))
    }

    /// Number of tensors in the container.
    pub fn len(&self) -> usize {
        self.header.len()
    }

    /// True if the container holds no tensors.
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    pub(crate) fn header(&self) -> &Header {
        &self.header
    }

    pub(crate) fn file_size(&self) -> u64 {
        self.mmap.len() as u64
    }

    pub(crate) fn header_size(&self) -> usize {
        self.data_start - PREFIX_SIZE
    }
}
