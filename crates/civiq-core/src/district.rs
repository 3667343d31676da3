//! # District Codes
//!
//! Validated jurisdiction codes for congressional and state/local
//! districts. Only derived district codes pass through the pipeline —
//! the raw address they were derived from is never retained.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A congressional district code in `XX-NN` format: two uppercase state
/// letters, a hyphen, then a 1–2 digit district number or `AL` for
/// at-large states.
///
/// Examples: `CA-12`, `TX-7`, `AK-AL`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DistrictCode(String);

impl<'de> Deserialize<'de> for DistrictCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl DistrictCode {
    /// Create a district code, validating format.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    fn validate(s: &str) -> Result<(), ValidationError> {
        let invalid = || ValidationError::InvalidDistrictCode(s.to_string());

        let (state, district) = s.split_once('-').ok_or_else(invalid)?;
        if state.len() != 2 || !state.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(invalid());
        }

        if district == "AL" {
            return Ok(());
        }
        let ok = (1..=2).contains(&district.len())
            && district.chars().all(|c| c.is_ascii_digit())
            && !district.starts_with('0');
        if !ok {
            return Err(invalid());
        }
        Ok(())
    }

    /// Access the code string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The two-letter state prefix.
    pub fn state(&self) -> &str {
        &self.0[..2]
    }
}

impl std::fmt::Display for DistrictCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A state or local district code — free-form validated token, since
/// local jurisdiction formats vary (`CA-SD-11`, `springfield-ward-3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LocalDistrictCode(String);

impl<'de> Deserialize<'de> for LocalDistrictCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl LocalDistrictCode {
    /// Create a local district code, validating the character set.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let valid = !s.is_empty()
            && s.len() <= 64
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ValidationError::InvalidLocalDistrictCode(s));
        }
        Ok(Self(s))
    }

    /// Access the code string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LocalDistrictCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
