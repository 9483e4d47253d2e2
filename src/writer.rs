//! The write-side engine: key normalization, offset assignment, header
//! encoding, and output to a buffer or file.
//!
//! Serialization is a single sequential pass. Entries are ordered with the
//! widest dtypes first (ties broken by name) so every tensor's start offset
//! stays aligned to its element width without explicit padding, then offsets
//! are assigned consecutively and the header is emitted in that same storage
//! order. The shared-storage guard runs before any output exists.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::aliasing::shared_groups;
use crate::error::{Result, TensorPackError};
use crate::header::{ensure_little_endian, Header, TensorInfo, METADATA_KEY};
use crate::view::View;

/// Header bytes plus the entries in storage order, ready to be written.
struct Prepared<V: View> {
    header_bytes: Vec<u8>,
    entries: Vec<(String, V)>,
    data_len: usize,
}

/// Normalizes keys, orders entries, assigns offsets, and encodes the header.
///
/// Fails with `InvalidInput` on an empty or reserved name,
/// `DuplicateTensorName` when two keys normalize to the same string,
/// `SharedStorage` when input views alias overlapping memory, and
/// `ShapeMismatch` when a view's byte length disagrees with its dtype and
/// shape.
fn prepare<K, V, I>(data: I, metadata: Option<HashMap<String, String>>) -> Result<Prepared<V>>
where
    K: ToString,
    V: View,
    I: IntoIterator<Item = (K, V)>,
{
    ensure_little_endian()?;

    let mut entries: Vec<(String, V)> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for (key, view) in data {
        let name = key.to_string();
        if name.is_empty() {
            return Err(TensorPackError::InvalidInput(
                "tensor names cannot be empty".to_string(),
            ));
        }
        // The header key for the metadata map; a tensor under it would
        // encode fine and then be undecodable.
        if name == METADATA_KEY {
            return Err(TensorPackError::InvalidInput(format!(
                "`{METADATA_KEY}` is reserved and cannot name a tensor"
            )));
        }
        if !seen.insert(name.clone()) {
            return Err(TensorPackError::DuplicateTensorName(name));
        }
        entries.push((name, view));
    }

    // Widest dtypes first keeps every start offset aligned to its element
    // width, since offsets only ever shrink in granularity down the list.
    entries.sort_by(|(a_name, a), (b_name, b)| {
        b.dtype().cmp(&a.dtype()).then_with(|| a_name.cmp(b_name))
    });

    {
        let probes: Vec<(&str, Cow<'_, [u8]>)> = entries
            .iter()
            .map(|(name, view)| (name.as_str(), view.data()))
            .collect();
        let groups = shared_groups(&probes);
        if !groups.is_empty() {
            return Err(TensorPackError::SharedStorage(groups));
        }
    }

    let mut tensors = Vec::with_capacity(entries.len());
    let mut offset = 0usize;
    for (name, view) in &entries {
        let n = view.data_len();
        let end = offset.checked_add(n).ok_or_else(|| {
            TensorPackError::InvalidInput("total data size overflows a usize".to_string())
        })?;
        tensors.push((
            name.clone(),
            TensorInfo {
                dtype: view.dtype(),
                shape: view.shape().to_vec(),
                data_offsets: (offset, end),
            },
        ));
        offset = end;
    }

    // Validation also catches views whose length lies about dtype * shape.
    let header = Header::new(tensors, metadata, offset)?;
    let header_bytes = header.to_bytes()?;

    Ok(Prepared {
        header_bytes,
        entries,
        data_len: offset,
    })
}

/// Serializes an ordered name-to-tensor mapping into a contiguous buffer.
///
/// Keys are normalized through `ToString`; anything with a canonical string
/// form is accepted and looked up under that string after reload. An empty
/// mapping is legal and produces a minimal container with no descriptors.
///
/// ```rust
/// use tensorpack::{serialize, Dtype, TensorView};
///
/// let data = [0u8; 8];
/// let view = TensorView::new(Dtype::I32, vec![2], &data)?;
/// let bytes = serialize([("step", view)], None)?;
/// assert_eq!(u64::from_le_bytes(bytes[..8].try_into().unwrap()) % 8, 0);
/// # Ok::<(), tensorpack::TensorPackError>(())
/// ```
pub fn serialize<K, V, I>(data: I, metadata: Option<HashMap<String, String>>) -> Result<Vec<u8>>
where
    K: ToString,
    V: View,
    I: IntoIterator<Item = (K, V)>,
{
    let prepared = prepare(data, metadata)?;
    let mut out = Vec::with_capacity(prepared.header_bytes.len() + prepared.data_len);
    out.extend_from_slice(&prepared.header_bytes);
    for (_, view) in &prepared.entries {
        out.extend_from_slice(&view.data());
    }
    Ok(out)
}

/// Serializes a name-to-tensor mapping straight to a file.
///
/// The header goes out first, then each tensor's bytes in offset order,
/// through a buffered writer. The write is all-or-nothing from the engine's
/// perspective: every failure path surfaces before or during the stream and
/// nothing is retried.
pub fn serialize_to_file<K, V, I, P>(
    data: I,
    path: P,
    metadata: Option<HashMap<String, String>>,
) -> Result<()>
where
    K: ToString,
    V: View,
    I: IntoIterator<Item = (K, V)>,
    P: AsRef<Path>,
{
    let prepared = prepare(data, metadata)?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&prepared.header_bytes)?;
    for (_, view) in &prepared.entries {
        writer.write_all(&view.data())?;
    }
    writer.flush()?;
    Ok(())
}
