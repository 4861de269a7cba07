//! Package identifiers and service group key names.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ModelError;

/// A package identifier in `origin/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct PackageIdent {
    origin: String,
    name: String,
}

impl PackageIdent {
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The package name; services keep their config under a directory of
    /// this name on the host.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for PackageIdent {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((origin, name))
                if !origin.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    origin: origin.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(ModelError::InvalidPackageIdent(s.to_string())),
        }
    }
}

impl fmt::Display for PackageIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.origin, self.name)
    }
}

impl From<PackageIdent> for String {
    fn from(ident: PackageIdent) -> Self {
        ident.to_string()
    }
}

/// Logical name of an armored service group key, read from its second line.
///
/// ```text
/// BOX-SEC-1
/// redis.default@example
///
/// <key material>
/// ```
///
/// # Errors
///
/// Returns [`ModelError::InvalidServiceKey`] when the second line is missing
/// or blank.
pub fn service_key_name(key: &str) -> Result<&str, ModelError> {
    key.lines()
        .nth(1)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(ModelError::InvalidServiceKey)
}
