//! Range-constrained integers and enumerated settings used by record setters

use serde::{Deserialize, Serialize};

use crate::{ProtectError, Result};

/// Integer percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct PercentInt(u8);

impl PercentInt {
    pub const MIN: i64 = 0;
    pub const MAX: i64 = 100;

    pub fn new(value: i64) -> Result<Self> {
        check_range("percent", value, Self::MIN, Self::MAX).map(|v| Self(v as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// Light LED brightness level in `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct LedLevel(u8);

impl LedLevel {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 6;

    pub fn new(value: i64) -> Result<Self> {
        check_range("led_level", value, Self::MIN, Self::MAX).map(|v| Self(v as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

macro_rules! constrained_conversions {
    ($ty:ident) => {
        impl TryFrom<i64> for $ty {
            type Error = ProtectError;

            fn try_from(value: i64) -> Result<Self> {
                $ty::new(value)
            }
        }

        impl From<$ty> for i64 {
            fn from(value: $ty) -> i64 {
                value.0 as i64
            }
        }
    };
}

constrained_conversions!(PercentInt);
constrained_conversions!(LedLevel);

/// Validate that `value` lies in `min..=max`, naming `field` on failure.
pub(crate) fn check_range(field: &str, value: i64, min: i64, max: i64) -> Result<i64> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ProtectError::validation(
            field,
            format!("{} is outside the allowed range {}..={}", value, min, max),
        ))
    }
}

/// Camera recording mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordingMode {
    Always,
    Never,
    Detections,
}

impl RecordingMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RecordingMode::Always => "always",
            RecordingMode::Never => "never",
            RecordingMode::Detections => "detections",
        }
    }
}

/// Camera video mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VideoMode {
    Default,
    HighFps,
}

impl VideoMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            VideoMode::Default => "default",
            VideoMode::HighFps => "highFps",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn percent_accepts_exactly_its_range(value in -1000i64..1000) {
            let result = PercentInt::new(value);
            prop_assert_eq!(result.is_ok(), (0..=100).contains(&value));
            if let Ok(p) = result {
                prop_assert_eq!(i64::from(p), value);
            }
        }

        #[test]
        fn led_level_accepts_exactly_its_range(value in -50i64..50) {
            prop_assert_eq!(LedLevel::new(value).is_ok(), (1..=6).contains(&value));
        }
    }

    #[test]
    fn validation_error_names_the_field() {
        let err = LedLevel::new(7).unwrap_err();
        assert!(matches!(err, ProtectError::Validation { ref field, .. } if field == "led_level"));
    }

    #[test]
    fn serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<PercentInt>("101").is_err());
        assert_eq!(serde_json::from_str::<PercentInt>("42").unwrap().get(), 42);
        assert_eq!(serde_json::to_string(&VideoMode::HighFps).unwrap(), "\"highFps\"");
    }
}
