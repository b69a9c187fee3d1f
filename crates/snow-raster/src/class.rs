//! The ternary per-cell snow state.

use serde::{Deserialize, Serialize};
use snowline_common::{SnowlineError, SnowlineResult};

/// Classification of a single raster cell.
///
/// The integer codes are the on-disk representation (signed 8-bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum SnowClass {
    /// Cell definitely shows no snow.
    NoSnow = -1,
    /// Cell could not be classified (cloud, invalid, outside coverage).
    Unknown = 0,
    /// Cell definitely shows snow.
    Snow = 1,
}

impl SnowClass {
    /// All states, in code order.
    pub const ALL: [SnowClass; 3] = [SnowClass::NoSnow, SnowClass::Unknown, SnowClass::Snow];

    /// The signed integer code of this state.
    pub fn code(self) -> i8 {
        self as i8
    }

    /// Decode an integer code.
    pub fn from_code(code: i64) -> SnowlineResult<Self> {
        match code {
            -1 => Ok(SnowClass::NoSnow),
            0 => Ok(SnowClass::Unknown),
            1 => Ok(SnowClass::Snow),
            other => Err(SnowlineError::Validation(format!(
                "cell value {} is not one of -1, 0, 1",
                other
            ))),
        }
    }
}

impl Default for SnowClass {
    fn default() -> Self {
        SnowClass::Unknown
    }
}

impl TryFrom<i8> for SnowClass {
    type Error = SnowlineError;

    fn try_from(code: i8) -> SnowlineResult<Self> {
        Self::from_code(i64::from(code))
    }
}

impl From<SnowClass> for i8 {
    fn from(class: SnowClass) -> Self {
        class.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        for class in SnowClass::ALL {
            assert_eq!(SnowClass::try_from(class.code()).unwrap(), class);
        }
        assert_eq!(SnowClass::Snow.code(), 1);
        assert_eq!(SnowClass::NoSnow.code(), -1);
        assert_eq!(SnowClass::default(), SnowClass::Unknown);
    }

    #[test]
    fn test_invalid_code() {
        assert!(matches!(
            SnowClass::try_from(2i8),
            Err(SnowlineError::Validation(_))
        ));
        assert!(SnowClass::from_code(-128).is_err());
    }
}
