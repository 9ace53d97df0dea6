//! Device and data type descriptors - fixed-layout POD payloads of `Any`
//!
//! Layout matches the DLPack `DLDevice` / `DLDataType` structs so they can be
//! handed across the C boundary unchanged. Equality and hashing are
//! structural over all fields.

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};

/// Compute device: kind code + ordinal
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Device {
    pub device_type: i32,
    pub device_id: i32,
}

/// Known device kind codes and their textual names
const DEVICE_NAMES: &[(i32, &str)] = &[
    (1, "cpu"),
    (2, "cuda"),
    (3, "cuda_host"),
    (4, "opencl"),
    (7, "vulkan"),
    (8, "mps"),
    (9, "vpi"),
    (10, "rocm"),
    (11, "rocm_host"),
    (12, "ext_dev"),
    (13, "cuda_managed"),
    (14, "oneapi"),
    (15, "webgpu"),
    (16, "hexagon"),
];

impl Device {
    pub const CPU: i32 = 1;
    pub const CUDA: i32 = 2;

    #[inline]
    pub const fn new(device_type: i32, device_id: i32) -> Self {
        Self { device_type, device_id }
    }

    #[inline]
    pub const fn cpu(device_id: i32) -> Self {
        Self::new(Self::CPU, device_id)
    }

    #[inline]
    pub const fn cuda(device_id: i32) -> Self {
        Self::new(Self::CUDA, device_id)
    }

    /// Textual name of the device kind, if known
    pub fn kind_name(&self) -> Option<&'static str> {
        DEVICE_NAMES
            .iter()
            .find(|(code, _)| *code == self.device_type)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind_name() {
            Some(name) => write!(f, "{}:{}", name, self.device_id),
            None => write!(f, "device({}):{}", self.device_type, self.device_id),
        }
    }
}

impl FromStr for Device {
    type Err = Error;

    /// Parse `"cpu"`, `"cuda:1"`; a missing ordinal means 0
    fn from_str(s: &str) -> Result<Self> {
        let (kind, id) = match s.split_once(':') {
            Some((kind, id)) => {
                let id = id
                    .parse::<i32>()
                    .map_err(|_| Error::Parse(format!("invalid device ordinal in `{}`", s)))?;
                (kind, id)
            }
            None => (s, 0),
        };

        DEVICE_NAMES
            .iter()
            .find(|(_, name)| *name == kind)
            .map(|(code, _)| Device::new(*code, id))
            .ok_or_else(|| Error::Parse(format!("unknown device kind `{}`", kind)))
    }
}

/// Element data type: type code, bit width, vector lanes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataType {
    pub code: u8,
    pub bits: u8,
    pub lanes: u16,
}

impl DataType {
    pub const INT: u8 = 0;
    pub const UINT: u8 = 1;
    pub const FLOAT: u8 = 2;
    pub const HANDLE: u8 = 3;
    pub const BFLOAT: u8 = 4;
    pub const COMPLEX: u8 = 5;
    pub const BOOL: u8 = 6;

    #[inline]
    pub const fn new(code: u8, bits: u8, lanes: u16) -> Self {
        Self { code, bits, lanes }
    }

    #[inline]
    pub const fn int(bits: u8) -> Self {
        Self::new(Self::INT, bits, 1)
    }

    #[inline]
    pub const fn uint(bits: u8) -> Self {
        Self::new(Self::UINT, bits, 1)
    }

    #[inline]
    pub const fn float(bits: u8) -> Self {
        Self::new(Self::FLOAT, bits, 1)
    }

    #[inline]
    pub const fn bool() -> Self {
        Self::new(Self::BOOL, 8, 1)
    }

    /// Opaque handle type with no storage (`void`)
    #[inline]
    pub const fn void() -> Self {
        Self::new(Self::HANDLE, 0, 0)
    }

    /// Same element type with `lanes` vector lanes
    #[inline]
    pub const fn with_lanes(self, lanes: u16) -> Self {
        Self::new(self.code, self.bits, lanes)
    }

    /// Storage size of one (vector) element, rounded up to whole bytes
    pub fn size_bytes(&self) -> usize {
        (self.bits as usize * self.lanes as usize + 7) / 8
    }

    fn code_name(code: u8) -> Option<&'static str> {
        match code {
            Self::INT => Some("int"),
            Self::UINT => Some("uint"),
            Self::FLOAT => Some("float"),
            Self::HANDLE => Some("handle"),
            Self::BFLOAT => Some("bfloat"),
            Self::COMPLEX => Some("complex"),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::void() {
            return f.write_str("void");
        }
        if self.code == Self::BOOL && self.bits == 8 {
            f.write_str("bool")?;
        } else {
            match Self::code_name(self.code) {
                Some(name) => write!(f, "{}{}", name, self.bits)?,
                None => write!(f, "dtype({}){}", self.code, self.bits)?,
            }
        }
        if self.lanes != 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}

impl FromStr for DataType {
    type Err = Error;

    /// Parse `"int32"`, `"float16x4"`, `"bool"`, `"void"`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Parse(format!("invalid data type `{}`", s));

        if s == "void" {
            return Ok(Self::void());
        }

        if s == "bool" {
            return Ok(Self::bool());
        }
        if let Some(lanes) = s.strip_prefix("boolx") {
            return Ok(Self::bool().with_lanes(lanes.parse().map_err(|_| invalid())?));
        }

        // Lanes suffix starts at the first `x` after the bit width ("complex" has one too)
        let digits_at = s.find(|c: char| c.is_ascii_digit()).unwrap_or(s.len());
        let (base, lanes) = match s[digits_at..].find('x') {
            Some(pos) => {
                let split = digits_at + pos;
                let lanes = s[split + 1..].parse::<u16>().map_err(|_| invalid())?;
                (&s[..split], lanes)
            }
            None => (s, 1),
        };

        // Longest prefixes first so "bfloat" is not read as "b" + "float"
        const PREFIXES: &[(&str, u8)] = &[
            ("complex", DataType::COMPLEX),
            ("handle", DataType::HANDLE),
            ("bfloat", DataType::BFLOAT),
            ("float", DataType::FLOAT),
            ("uint", DataType::UINT),
            ("int", DataType::INT),
        ];

        let (code, bits) = PREFIXES
            .iter()
            .find_map(|(prefix, code)| base.strip_prefix(prefix).map(|bits| (*code, bits)))
            .ok_or_else(invalid)?;
        let bits = bits.parse::<u8>().map_err(|_| invalid())?;

        Ok(Self::new(code, bits, lanes))
    }
}
