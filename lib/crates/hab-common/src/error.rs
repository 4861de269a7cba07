use thiserror::Error;

/// Errors raised while parsing configuration model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("{value} is not a valid {kind}; expected one of: {expected}")]
    InvalidValue {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Invalid bind specification: {0} (expected alias:service.group)")]
    InvalidBind(String),

    #[error("Invalid package identifier: {0} (expected origin/name)")]
    InvalidPackageIdent(String),

    #[error("Invalid service group key: the key name is expected on its second line")]
    InvalidServiceKey,
}
