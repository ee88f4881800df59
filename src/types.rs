//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Literal a remote probe prints for an attribute it could not read
pub const ERROR_SENTINEL: &str = "ERROR";

/// Benchmark stream layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    FullMesh,
    InCast,
    P2P,
    LocalTest,
}

impl StreamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::FullMesh => "fullmesh",
            StreamType::InCast => "incast",
            StreamType::P2P => "p2p",
            StreamType::LocalTest => "localtest",
        }
    }

    /// Whether bandwidth is compared against a theoretical per-client share
    pub fn uses_theoretical_bandwidth(&self) -> bool {
        !matches!(self, StreamType::P2P)
    }
}

impl Default for StreamType {
    fn default() -> Self {
        StreamType::InCast
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fullmesh" => Ok(StreamType::FullMesh),
            "incast" => Ok(StreamType::InCast),
            "p2p" => Ok(StreamType::P2P),
            "localtest" => Ok(StreamType::LocalTest),
            other => Err(AppError::config(format!(
                "Invalid stream type '{}' (expected fullmesh, incast, p2p or localtest)",
                other
            ))),
        }
    }
}

/// Side of a benchmark stream a host/device participated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Server,
    /// Either end of a point-to-point stream
    Peer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Server => "server",
            Role::Peer => "peer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic tag attached to a displayed value
///
/// Renderers map the tag to their own vocabulary (ANSI colors in the
/// terminal, CSS classes on the web); the tag itself never changes per
/// renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorClass {
    #[default]
    Normal,
    Success,
    Warning,
    Error,
}

impl ColorClass {
    /// CSS class used by the web dashboard
    pub fn css_class(&self) -> &'static str {
        match self {
            ColorClass::Success => "text-success",
            ColorClass::Warning => "text-warning",
            ColorClass::Error => "text-danger",
            ColorClass::Normal => "",
        }
    }
}
