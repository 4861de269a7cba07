//! Service binds: `alias:service.group`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A directed reference from one service to another service group's
/// exported configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bind {
    /// Name the consuming service refers to the bind by.
    pub alias: String,
    /// Service providing the configuration.
    pub service: String,
    /// Group of the providing service.
    pub group: String,
}

impl Bind {
    #[must_use]
    pub fn new(alias: &str, service: &str, group: &str) -> Self {
        Self {
            alias: alias.to_string(),
            service: service.to_string(),
            group: group.to_string(),
        }
    }

    /// Check that every part is non-empty and free of `:` and `.`, so the
    /// bind prints to a string that parses back to itself.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidBind`] naming the rendered bind.
    pub fn validate(&self) -> Result<(), ModelError> {
        let parts = [&self.alias, &self.service, &self.group];
        if parts
            .iter()
            .any(|p| p.is_empty() || p.contains([':', '.']))
        {
            return Err(ModelError::InvalidBind(self.to_string()));
        }
        Ok(())
    }
}

impl FromStr for Bind {
    type Err = ModelError;

    /// Parse `alias:service.group`. Exactly three non-empty components are
    /// required; neither separator may appear twice.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidBind(s.to_string());
        let (alias, target) = s.split_once(':').ok_or_else(invalid)?;
        let (service, group) = target.split_once('.').ok_or_else(invalid)?;

        let bind = Self::new(alias, service, group);
        bind.validate().map_err(|_| invalid())?;
        Ok(bind)
    }
}

impl fmt::Display for Bind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.alias, self.service, self.group)
    }
}
