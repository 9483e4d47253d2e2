//! Tools for inspecting the physical structure of container files.
//! Useful for debugging layouts and verifying what a file actually holds
//! without reading any tensor bytes.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::reader::PackReader;

/// A structural report of a container file.
#[derive(Debug, Serialize)]
pub struct PackReport {
    /// Total size of the file on disk.
    pub file_size: u64,
    /// Size of the encoded header text (without the 8-byte prefix).
    pub header_size: usize,
    /// Size of the data region.
    pub data_size: usize,
    /// Number of tensors described.
    pub tensor_count: usize,
    /// User metadata, if any was saved.
    pub metadata: Option<HashMap<String, String>>,
    /// One record per tensor, in storage order.
    pub tensors: Vec<TensorRecord>,
}

/// Layout facts for a single tensor.
#[derive(Debug, Serialize)]
pub struct TensorRecord {
    /// Tensor name.
    pub name: String,
    /// Canonical dtype tag.
    pub dtype: String,
    /// Dimensions, row-major.
    pub shape: Vec<usize>,
    /// Byte range in the data region.
    pub offsets: (usize, usize),
    /// Bytes occupied.
    pub nbytes: usize,
}

/// The tensorpack inspector tool.
#[derive(Debug)]
pub struct PackInspector;

impl PackInspector {
    /// Analyzes a file and returns a structural report. Only the header is
    /// read; tensor bytes stay untouched.
    pub fn inspect<P: AsRef<Path>>(path: P) -> Result<PackReport> {
        let reader = PackReader::open(path)?;
        let header = reader.header();

        let tensors = header
            .tensors()
            .iter()
            .map(|(name, info)| TensorRecord {
                name: name.clone(),
                dtype: info.dtype.tag().to_string(),
                shape: info.shape.clone(),
                offsets: info.data_offsets,
                nbytes: info.data_offsets.1 - info.data_offsets.0,
            })
            .collect();

        Ok(PackReport {
            file_size: reader.file_size(),
            header_size: reader.header_size(),
            data_size: header.data_len(),
            tensor_count: header.len(),
            metadata: header.metadata().cloned(),
            tensors,
        })
    }
}

impl fmt::Display for PackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== TENSORPACK REPORT ===")?;
        writeln!(f, "File size:   {} bytes", self.file_size)?;
        writeln!(f, "Header size: {} bytes", self.header_size)?;
        writeln!(f, "Data size:   {} bytes", self.data_size)?;
        writeln!(f, "Tensors:     {}", self.tensor_count)?;
        if let Some(metadata) = &self.metadata {
            writeln!(f, "Metadata:    {} entries", metadata.len())?;
        }
        writeln!(f, "\n[LAYOUT]")?;
        for (i, record) in self.tensors.iter().enumerate() {
            let connector = if i == self.tensors.len() - 1 {
                "└── "
            } else {
                "├── "
            };
            writeln!(
                f,
                "{}{} | {} | shape {:?} | {} bytes @ [{}, {})",
                connector,
                record.name,
                record.dtype,
                record.shape,
                record.nbytes,
                record.offsets.0,
                record.offsets.1
            )?;
        }
        Ok(())
    }
}
