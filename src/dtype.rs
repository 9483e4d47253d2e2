//! The dtype registry: the closed set of element types the format can carry.
//!
//! Pure lookup tables, no state. Variants are declared in ascending byte
//! width so that `Ord` on [`Dtype`] orders by element size; the serializer
//! relies on this to place wide types first in the data region.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TensorPackError};

/// Element type of a tensor.
///
/// The set is fixed and closed; a tag outside it fails lookup with
/// [`TensorPackError::UnknownDtype`]. The variant names double as the
/// canonical cross-framework tags written into the header.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dtype {
    /// Boolean, one byte per element.
    BOOL,
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// 8-bit float, 4-bit exponent and 3-bit mantissa.
    F8_E4M3,
    /// 8-bit float, 5-bit exponent and 2-bit mantissa.
    F8_E5M2,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 16-bit integer.
    U16,
    /// IEEE half-precision float.
    F16,
    /// Brain float, 8-bit exponent and 7-bit mantissa.
    BF16,
    /// Signed 32-bit integer.
    I32,
    /// Unsigned 32-bit integer.
    U32,
    /// IEEE single-precision float.
    F32,
    /// Signed 64-bit integer.
    I64,
    /// Unsigned 64-bit integer.
    U64,
    /// IEEE double-precision float.
    F64,
}

impl Dtype {
    /// Every registered dtype, in ascending byte-width order.
    pub const ALL: [Dtype; 15] = [
        Dtype::BOOL,
        Dtype::U8,
        Dtype::I8,
        Dtype::F8_E4M3,
        Dtype::F8_E5M2,
        Dtype::I16,
        Dtype::U16,
        Dtype::F16,
        Dtype::BF16,
        Dtype::I32,
        Dtype::U32,
        Dtype::F32,
        Dtype::I64,
        Dtype::U64,
        Dtype::F64,
    ];

    /// Byte width of a single element (1 to 8).
    pub fn size(&self) -> usize {
        match self {
            Dtype::BOOL | Dtype::U8 | Dtype::I8 | Dtype::F8_E4M3 | Dtype::F8_E5M2 => 1,
            Dtype::I16 | Dtype::U16 | Dtype::F16 | Dtype::BF16 => 2,
            Dtype::I32 | Dtype::U32 | Dtype::F32 => 4,
            Dtype::I64 | Dtype::U64 | Dtype::F64 => 8,
        }
    }

    /// Canonical string tag written into the header.
    pub fn tag(&self) -> &'static str {
        match self {
            Dtype::BOOL => "BOOL",
            Dtype::U8 => "U8",
            Dtype::I8 => "I8",
            Dtype::F8_E4M3 => "F8_E4M3",
            Dtype::F8_E5M2 => "F8_E5M2",
            Dtype::I16 => "I16",
            Dtype::U16 => "U16",
            Dtype::F16 => "F16",
            Dtype::BF16 => "BF16",
            Dtype::I32 => "I32",
            Dtype::U32 => "U32",
            Dtype::F32 => "F32",
            Dtype::I64 => "I64",
            Dtype::U64 => "U64",
            Dtype::F64 => "F64",
        }
    }

    /// Resolves a string tag to its dtype.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "BOOL" => Ok(Dtype::BOOL),
            "U8" => Ok(Dtype::U8),
            "I8" => Ok(Dtype::I8),
            "F8_E4M3" => Ok(Dtype::F8_E4M3),
            "F8_E5M2" => Ok(Dtype::F8_E5M2),
            "I16" => Ok(Dtype::I16),
            "U16" => Ok(Dtype::U16),
            "F16" => Ok(Dtype::F16),
            "BF16" => Ok(Dtype::BF16),
            "I32" => Ok(Dtype::I32),
            "U32" => Ok(Dtype::U32),
            "F32" => Ok(Dtype::F32),
            "I64" => Ok(Dtype::I64),
            "U64" => Ok(Dtype::U64),
            "F64" => Ok(Dtype::F64),
            other => Err(TensorPackError::UnknownDtype(other.to_string())),
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Dtype {
    type Err = TensorPackError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_tag(s)
    }
}
