//! Enumerated configuration values.
//!
//! Every enum parses from and renders to the exact token the `hab` CLI and
//! the configuration file use, so `s.parse::<T>()?.to_string() == s`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

macro_rules! token_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $token:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            /// All accepted tokens, comma separated (for error messages).
            pub const EXPECTED: &'static str = concat!($($token, ", "),+);

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok(Self::$variant),)+
                    other => Err(ModelError::InvalidValue {
                        kind: $kind,
                        value: other.to_string(),
                        expected: Self::EXPECTED.trim_end_matches(", "),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

token_enum! {
    /// Operating system of the target host.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
    OsType, "os type" {
        Linux => "linux",
        Windows => "windows",
    }
}

token_enum! {
    /// Transport used to reach the target host.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
    ConnectionType, "connection type" {
        #[default]
        Ssh => "ssh",
        Winrm => "winrm",
    }
}

token_enum! {
    /// How the supervisor process is kept alive on Linux hosts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    ServiceManager, "service_type" {
        Unmanaged => "unmanaged",
        Systemd => "systemd",
    }
}

token_enum! {
    /// Clustering role model of a service group.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    Topology, "topology" {
        Leader => "leader",
        Standalone => "standalone",
    }
}

token_enum! {
    /// How a running service adopts new package releases.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    UpdateStrategy, "update strategy" {
        AtOnce => "at-once",
        Rolling => "rolling",
        None => "none",
    }
}

impl ConnectionType {
    /// Parse a connection type, treating an empty value as the `ssh` default.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidValue`] for anything other than `ssh`,
    /// `winrm`, or the empty string.
    pub fn parse_or_default(s: &str) -> Result<Self, ModelError> {
        if s.is_empty() {
            Ok(Self::default())
        } else {
            s.parse()
        }
    }

    /// The OS implied by this transport when none is configured explicitly.
    #[must_use]
    pub fn implied_os(self) -> OsType {
        match self {
            Self::Ssh => OsType::Linux,
            Self::Winrm => OsType::Windows,
        }
    }
}
