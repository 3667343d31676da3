//! # District Resolution
//!
//! The civic geocoding service behind a trait: consumed once,
//! synchronously, during residency issuance. Implementations must never
//! cache the raw address.

use civiq_core::DistrictCode;
use thiserror::Error;

/// Errors from district resolution.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// The service could not be reached.
    #[error("resolver unavailable: {0}")]
    Unavailable(String),

    /// The address does not resolve to a recognized district.
    #[error("address does not resolve to a district")]
    Unresolvable,
}

/// Resolves a postal address to a congressional district code.
///
/// The address parameter is borrowed for the duration of the call only;
/// implementations must not retain it.
pub trait DistrictResolver: Send + Sync {
    /// Resolve an address to its congressional district.
    fn resolve_district(&self, address: &str) -> Result<DistrictCode, ResolverError>;
}

/// Fixed-answer resolver for tests and development.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    district: DistrictCode,
}

impl StaticResolver {
    /// A resolver that answers every address with `district`.
    pub fn new(district: DistrictCode) -> Self {
        Self { district }
    }
}

impl DistrictResolver for StaticResolver {
    fn resolve_district(&self, _address: &str) -> Result<DistrictCode, ResolverError> {
        Ok(self.district.clone())
    }
}

/// ZIP-directory resolver: maps 5-digit ZIP codes to districts from a
/// preloaded table. The ZIP is taken as the last 5-digit token in the
/// address; nothing about the address is stored.
#[derive(Debug, Clone, Default)]
pub struct DirectoryResolver {
    by_zip: std::collections::HashMap<String, DistrictCode>,
}

impl DirectoryResolver {
    pub fn new(by_zip: std::collections::HashMap<String, DistrictCode>) -> Self {
        Self { by_zip }
    }

    /// Load a `{"94110": "CA-12", ...}` JSON table.
    pub fn from_json(json: &str) -> Result<Self, crate::error::CredentialError> {
        let raw: std::collections::HashMap<String, String> = serde_json::from_str(json)?;
        let mut by_zip = std::collections::HashMap::with_capacity(raw.len());
        for (zip, district) in raw {
            by_zip.insert(zip, DistrictCode::new(district)?);
        }
        Ok(Self { by_zip })
    }

    fn extract_zip(address: &str) -> Option<&str> {
        address
            .split(|c: char| !c.is_ascii_digit())
            .filter(|token| token.len() == 5)
            .last()
    }
}

impl DistrictResolver for DirectoryResolver {
    fn resolve_district(&self, address: &str) -> Result<DistrictCode, ResolverError> {
        let zip = Self::extract_zip(address).ok_or(ResolverError::Unresolvable)?;
        self.by_zip
            .get(zip)
            .cloned()
            .ok_or(ResolverError::Unresolvable)
    }
}
