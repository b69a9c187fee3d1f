//! Minimal NumPy `.npy` codec for integer rasters.
//!
//! Layout (format versions 1.0 and 2.0):
//! - Bytes 0-5: magic `\x93NUMPY`
//! - Byte 6-7: major / minor version
//! - Bytes 8-9 (v1) or 8-11 (v2): little-endian header length
//! - Header: Python dict literal with `descr`, `fortran_order` and `shape`,
//!   space padded and newline terminated so the payload starts on a
//!   64-byte boundary
//! - Payload: raw elements
//!
//! Only integer dtypes are read; floats are rejected as invalid snow data.

use std::sync::OnceLock;

use regex::Regex;
use snowline_common::{SnowlineError, SnowlineResult};

/// Magic prefix of every `.npy` file.
pub const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

const HEADER_ALIGNMENT: usize = 64;

/// Integer element types accepted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpyDtype {
    I1,
    U1,
    I2 { big_endian: bool },
    I4 { big_endian: bool },
    I8 { big_endian: bool },
}

impl NpyDtype {
    /// Parse a NumPy `descr` string such as `|i1` or `<i8`.
    pub fn parse(descr: &str) -> SnowlineResult<Self> {
        let (order, kind) = match descr.chars().next() {
            Some(c @ ('<' | '>' | '|' | '=')) => (c, &descr[1..]),
            _ => ('=', descr),
        };
        let big_endian = order == '>';

        if kind.starts_with('f') || kind.starts_with('c') {
            return Err(SnowlineError::Validation(format!(
                "array dtype {} is not integral",
                descr
            )));
        }

        match kind {
            "i1" => Ok(NpyDtype::I1),
            "u1" => Ok(NpyDtype::U1),
            "i2" => Ok(NpyDtype::I2 { big_endian }),
            "i4" => Ok(NpyDtype::I4 { big_endian }),
            "i8" => Ok(NpyDtype::I8 { big_endian }),
            _ => Err(SnowlineError::structural(format!(
                "unsupported array dtype {}",
                descr
            ))),
        }
    }

    /// Bytes per element.
    pub fn item_size(&self) -> usize {
        match self {
            NpyDtype::I1 | NpyDtype::U1 => 1,
            NpyDtype::I2 { .. } => 2,
            NpyDtype::I4 { .. } => 4,
            NpyDtype::I8 { .. } => 8,
        }
    }

    fn decode(&self, chunk: &[u8]) -> i64 {
        match *self {
            NpyDtype::I1 => i64::from(chunk[0] as i8),
            NpyDtype::U1 => i64::from(chunk[0]),
            NpyDtype::I2 { big_endian } => {
                let bytes = [chunk[0], chunk[1]];
                i64::from(if big_endian {
                    i16::from_be_bytes(bytes)
                } else {
                    i16::from_le_bytes(bytes)
                })
            }
            NpyDtype::I4 { big_endian } => {
                let bytes = [chunk[0], chunk[1], chunk[2], chunk[3]];
                i64::from(if big_endian {
                    i32::from_be_bytes(bytes)
                } else {
                    i32::from_le_bytes(bytes)
                })
            }
            NpyDtype::I8 { big_endian } => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&chunk[..8]);
                if big_endian {
                    i64::from_be_bytes(bytes)
                } else {
                    i64::from_le_bytes(bytes)
                }
            }
        }
    }
}

/// A decoded array, always in C (row-major) order.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    pub dtype: NpyDtype,
    pub shape: Vec<usize>,
    pub values: Vec<i64>,
}

impl NpyArray {
    /// `(rows, cols)` of a 2-D array.
    pub fn shape_2d(&self) -> SnowlineResult<(usize, usize)> {
        match self.shape.as_slice() {
            [rows, cols] => Ok((*rows, *cols)),
            other => Err(SnowlineError::structural(format!(
                "expected a 2-D array, got shape {:?}",
                other
            ))),
        }
    }
}

/// Encode a row-major `i8` matrix as a version 1.0 `.npy` file.
pub fn write_i8(shape: (usize, usize), data: &[i8]) -> SnowlineResult<Vec<u8>> {
    if data.len() != shape.0 * shape.1 {
        return Err(SnowlineError::ShapeMismatch {
            expected: format!("{}x{}", shape.0, shape.1),
            actual: format!("{} cells", data.len()),
        });
    }

    let dict = format!(
        "{{'descr': '|i1', 'fortran_order': False, 'shape': ({}, {}), }}",
        shape.0, shape.1
    );
    // magic + version + u16 length + dict + trailing newline
    let unpadded = NPY_MAGIC.len() + 2 + 2 + dict.len() + 1;
    let padding = (HEADER_ALIGNMENT - unpadded % HEADER_ALIGNMENT) % HEADER_ALIGNMENT;
    let header_len = dict.len() + padding + 1;

    let mut out = Vec::with_capacity(unpadded + padding + data.len());
    out.extend_from_slice(NPY_MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header_len as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.extend(std::iter::repeat(b' ').take(padding));
    out.push(b'\n');
    out.extend(data.iter().map(|&v| v as u8));

    Ok(out)
}

fn header_patterns() -> &'static (Regex, Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Regex::new(r#"['"]descr['"]\s*:\s*['"]([^'"]+)['"]"#).expect("valid regex"),
            Regex::new(r#"['"]fortran_order['"]\s*:\s*(True|False)"#).expect("valid regex"),
            Regex::new(r#"['"]shape['"]\s*:\s*\(([^)]*)\)"#).expect("valid regex"),
        )
    })
}

/// Decode a `.npy` file holding an integer array.
pub fn read(bytes: &[u8]) -> SnowlineResult<NpyArray> {
    if bytes.len() < 10 || &bytes[..6] != NPY_MAGIC {
        return Err(SnowlineError::structural("array entry is not a .npy file"));
    }

    let major = bytes[6];
    let (header_len, header_start) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(SnowlineError::structural("truncated .npy header"));
            }
            (
                u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
                12,
            )
        }
        other => {
            return Err(SnowlineError::structural(format!(
                "unsupported .npy version {}",
                other
            )))
        }
    };

    let payload_start = header_start + header_len;
    if bytes.len() < payload_start {
        return Err(SnowlineError::structural("truncated .npy header"));
    }
    let header = std::str::from_utf8(&bytes[header_start..payload_start])
        .map_err(|_| SnowlineError::structural(".npy header is not text"))?;

    let (descr_re, fortran_re, shape_re) = header_patterns();

    let descr = descr_re
        .captures(header)
        .and_then(|c| c.get(1))
        .ok_or_else(|| SnowlineError::structural(".npy header has no descr"))?
        .as_str();
    let dtype = NpyDtype::parse(descr)?;

    let fortran_order = fortran_re
        .captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str() == "True")
        .ok_or_else(|| SnowlineError::structural(".npy header has no fortran_order"))?;

    let shape_text = shape_re
        .captures(header)
        .and_then(|c| c.get(1))
        .ok_or_else(|| SnowlineError::structural(".npy header has no shape"))?
        .as_str();
    let shape = shape_text
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.trim_end_matches('L')
                .parse::<usize>()
                .map_err(|_| SnowlineError::structural(format!("invalid .npy dimension {:?}", s)))
        })
        .collect::<SnowlineResult<Vec<_>>>()?;

    let expected_bytes = shape
        .iter()
        .try_fold(dtype.item_size(), |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| {
            SnowlineError::structural(format!(".npy shape {:?} overflows the address space", shape))
        })?;
    let payload = &bytes[payload_start..];
    if payload.len() != expected_bytes {
        return Err(SnowlineError::structural(format!(
            ".npy payload holds {} bytes, shape {:?} needs {}",
            payload.len(),
            shape,
            expected_bytes
        )));
    }

    let mut values: Vec<i64> = payload
        .chunks_exact(dtype.item_size())
        .map(|chunk| dtype.decode(chunk))
        .collect();

    if fortran_order && shape.len() > 1 {
        if shape.len() != 2 {
            return Err(SnowlineError::structural(
                "fortran-ordered arrays are only supported in 2-D",
            ));
        }
        let (rows, cols) = (shape[0], shape[1]);
        let mut c_order = vec![0i64; values.len()];
        for r in 0..rows {
            for c in 0..cols {
                c_order[r * cols + c] = values[c * rows + r];
            }
        }
        values = c_order;
    }

    Ok(NpyArray {
        dtype,
        shape,
        values,
    })
}
