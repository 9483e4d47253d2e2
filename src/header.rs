//! Physical layout of a tensorpack container and the header codec.
//!
//! # Layout
//!
//! ```text
//! [0..8)     u64, little-endian   length N of the encoded header
//! [8..8+N)   UTF-8 text           header JSON object
//! [8+N..)    raw bytes            data region
//! ```
//!
//! The header JSON maps tensor names to descriptors (`dtype`, `shape`,
//! `data_offsets`) plus an optional reserved `__metadata__` entry holding a
//! flat string-to-string map. Offsets are relative to byte `8+N`. The
//! encoded text is padded with ASCII spaces so the data region starts on an
//! 8-byte boundary; the padding is invisible to the JSON parser.
//!
//! Decoding validates the whole layout once, up front: dtype resolution,
//! offset arithmetic, overlap and coverage. A [`Header`] that exists is a
//! header that passed validation, and it is immutable thereafter.

use std::collections::HashMap;

use serde::ser::{SerializeMap, SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::dtype::Dtype;
use crate::error::{Result, TensorPackError};

/// Size in bytes of the little-endian length prefix.
pub const PREFIX_SIZE: usize = 8;

/// Upper bound on the encoded header text (100 MB). A declared length above
/// this fails decode before any allocation is sized from it.
pub const MAX_HEADER_SIZE: usize = 100_000_000;

/// Reserved header key carrying the user metadata map. Never a legal tensor
/// name.
pub const METADATA_KEY: &str = "__metadata__";

/// Fails on big-endian hosts. The format stores every multi-byte value
/// little-endian and this build performs no byte swapping, so refusing early
/// beats emitting or consuming a silently wrong buffer.
pub(crate) fn ensure_little_endian() -> Result<()> {
    if cfg!(target_endian = "little") {
        Ok(())
    } else {
        Err(TensorPackError::UnsupportedEndianness)
    }
}

/// One descriptor in the header: element type, shape, and the `[start, end)`
/// byte range the tensor occupies in the data region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
    /// Element type.
    pub dtype: Dtype,
    /// Dimensions, row-major. Empty for a scalar.
    pub shape: Vec<usize>,
    /// Byte range in the data region, relative to the end of the header.
    pub data_offsets: (usize, usize),
}

impl TensorInfo {
    /// Bytes required by `width(dtype) * product(shape)`, or `None` on
    /// overflow. An empty shape is a scalar and counts as one element; any
    /// zero dimension makes the tensor zero-sized.
    pub fn nbytes(&self) -> Option<usize> {
        self.shape
            .iter()
            .try_fold(self.dtype.size(), |acc, &dim| acc.checked_mul(dim))
    }
}

impl Serialize for TensorInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("TensorInfo", 3)?;
        s.serialize_field("dtype", self.dtype.tag())?;
        s.serialize_field("shape", &self.shape)?;
        s.serialize_field("data_offsets", &[self.data_offsets.0, self.data_offsets.1])?;
        s.end()
    }
}

/// Raw, unvalidated form of a descriptor as it appears on disk. The dtype is
/// kept as a string here so an unregistered tag surfaces as `UnknownDtype`
/// rather than a generic parse failure.
#[derive(Debug, Deserialize)]
struct RawTensorInfo {
    dtype: String,
    shape: Vec<usize>,
    data_offsets: (usize, usize),
}

/// Raw, unvalidated form of the whole header object.
#[derive(Debug, Deserialize)]
struct RawHeader {
    #[serde(rename = "__metadata__")]
    metadata: Option<HashMap<String, String>>,
    #[serde(flatten)]
    tensors: HashMap<String, RawTensorInfo>,
}

/// A parsed and validated header: the descriptor table in ascending start
/// offset order, a name index, and the optional user metadata.
#[derive(Debug, Clone)]
pub struct Header {
    metadata: Option<HashMap<String, String>>,
    tensors: Vec<(String, TensorInfo)>,
    index: HashMap<String, usize>,
    data_len: usize,
}

impl Header {
    /// Builds a header from descriptors and validates it against the length
    /// of the data region actually present.
    ///
    /// Checks, in order per descriptor: `start <= end`, byte-length
    /// arithmetic (`ShapeMismatch`), overlap against the ranges already
    /// covered in start order (`OverlappingTensors`); then coverage, i.e.
    /// the maximum `end` must equal `data_len` (`SizeMismatch`). Gaps
    /// between ranges are tolerated, overlap is not.
    pub fn new(
        mut tensors: Vec<(String, TensorInfo)>,
        metadata: Option<HashMap<String, String>>,
        data_len: usize,
    ) -> Result<Self> {
        tensors.sort_by(|(a_name, a), (b_name, b)| {
            a.data_offsets
                .cmp(&b.data_offsets)
                .then_with(|| a_name.cmp(b_name))
        });

        let mut index = HashMap::with_capacity(tensors.len());
        // Running coverage: the furthest end seen so far and which tensor
        // put it there. Entries are start-sorted, so any range beginning
        // before `max_end` intrudes into that tensor.
        let mut max_end = 0usize;
        let mut max_owner = 0usize;

        for (i, (name, info)) in tensors.iter().enumerate() {
            let (start, end) = info.data_offsets;
            if start > end {
                return Err(TensorPackError::MalformedHeader(format!(
                    "tensor `{name}` declares a start offset past its end offset ({start} > {end})"
                )));
            }
            let expected = info.nbytes().ok_or_else(|| {
                TensorPackError::MalformedHeader(format!(
                    "tensor `{name}` declares a shape whose byte size overflows"
                ))
            })?;
            let found = end - start;
            if expected != found {
                return Err(TensorPackError::ShapeMismatch {
                    name: name.clone(),
                    expected,
                    found,
                });
            }
            // Zero-length ranges (end == start) cannot overlap by a byte.
            if start < max_end && end > start {
                return Err(TensorPackError::OverlappingTensors {
                    first: tensors[max_owner].0.clone(),
                    second: name.clone(),
                });
            }
            if end > max_end {
                max_end = end;
                max_owner = i;
            }
            if index.insert(name.clone(), i).is_some() {
                return Err(TensorPackError::DuplicateTensorName(name.clone()));
            }
        }

        if max_end != data_len {
            return Err(TensorPackError::SizeMismatch {
                declared: max_end,
                actual: data_len,
            });
        }

        Ok(Self {
            metadata,
            tensors,
            index,
            data_len: max_end,
        })
    }

    /// Decodes and validates a header from the front of `buffer`, where the
    /// remainder of the buffer after the header is the data region.
    ///
    /// Returns the encoded header length `N` (the data region starts at
    /// `PREFIX_SIZE + N`) and the validated header.
    pub fn from_bytes(buffer: &[u8]) -> Result<(usize, Self)> {
        ensure_little_endian()?;

        let prefix: [u8; PREFIX_SIZE] = buffer
            .get(..PREFIX_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| {
                TensorPackError::MalformedHeader(format!(
                    "buffer holds {} bytes, too small for the length prefix",
                    buffer.len()
                ))
            })?;
        let declared = u64::from_le_bytes(prefix);
        if declared > MAX_HEADER_SIZE as u64 {
            return Err(TensorPackError::MalformedHeader(format!(
                "declared header length {declared} exceeds the {MAX_HEADER_SIZE} byte limit"
            )));
        }
        let n = declared as usize;
        let stop = PREFIX_SIZE + n;
        if stop > buffer.len() {
            return Err(TensorPackError::MalformedHeader(format!(
                "declared header length {n} exceeds the remaining {} bytes",
                buffer.len() - PREFIX_SIZE
            )));
        }

        let raw: RawHeader = serde_json::from_slice(&buffer[PREFIX_SIZE..stop])
            .map_err(|e| TensorPackError::MalformedHeader(e.to_string()))?;

        let mut tensors = Vec::with_capacity(raw.tensors.len());
        for (name, info) in raw.tensors {
            if name.is_empty() {
                return Err(TensorPackError::MalformedHeader(
                    "tensor names cannot be empty".to_string(),
                ));
            }
            let dtype = Dtype::from_tag(&info.dtype)?;
            tensors.push((
                name,
                TensorInfo {
                    dtype,
                    shape: info.shape,
                    data_offsets: info.data_offsets,
                },
            ));
        }

        let header = Self::new(tensors, raw.metadata, buffer.len() - stop)?;
        Ok((n, header))
    }

    /// Encodes the canonical header text plus its length prefix.
    ///
    /// Entries are emitted with `__metadata__` first (if present), then the
    /// tensors in ascending start-offset order so sequential readers can
    /// prefetch in storage order. The text is padded with spaces to an
    /// 8-byte boundary.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut text = serde_json::to_string(self)
            .map_err(|e| TensorPackError::InvalidInput(e.to_string()))?;

        let pad = (PREFIX_SIZE - text.len() % PREFIX_SIZE) % PREFIX_SIZE;
        for _ in 0..pad {
            text.push(' ');
        }
        if text.len() > MAX_HEADER_SIZE {
            return Err(TensorPackError::InvalidInput(format!(
                "encoded header is {} bytes, over the {MAX_HEADER_SIZE} byte limit",
                text.len()
            )));
        }

        let mut out = Vec::with_capacity(PREFIX_SIZE + text.len());
        out.extend_from_slice(&(text.len() as u64).to_le_bytes());
        out.extend_from_slice(text.as_bytes());
        Ok(out)
    }

    /// The user metadata map, if any was saved.
    pub fn metadata(&self) -> Option<&HashMap<String, String>> {
        self.metadata.as_ref()
    }

    /// Descriptors in ascending start-offset order.
    pub fn tensors(&self) -> &[(String, TensorInfo)] {
        &self.tensors
    }

    /// Looks up the descriptor for `name`.
    pub fn info(&self, name: &str) -> Option<&TensorInfo> {
        self.index.get(name).map(|&i| &self.tensors[i].1)
    }

    /// Iterates over tensor names in storage order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.iter().map(|(name, _)| name.as_str())
    }

    /// Number of tensors described.
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// True if the header describes no tensors.
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Total length of the data region, i.e. the maximum `end` offset.
    pub fn data_len(&self) -> usize {
        self.data_len
    }
}

impl Serialize for Header {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let entries = self.tensors.len() + usize::from(self.metadata.is_some());
        let mut map = serializer.serialize_map(Some(entries))?;
        if let Some(metadata) = &self.metadata {
            map.serialize_entry(METADATA_KEY, metadata)?;
        }
        for (name, info) in &self.tensors {
            map.serialize_entry(name, info)?;
        }
        map.end()
    }
}
