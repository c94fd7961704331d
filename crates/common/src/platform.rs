//! Target platforms that bindings can be generated for.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A binding target. Each platform has exactly one emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Native implementation side written in Rust
    Rust,
    /// React Native C++ TurboModule glue
    Cxx,
    /// JavaScript-facing TypeScript module
    Typescript,
}

impl Platform {
    /// All platforms in their canonical order.
    pub const ALL: [Platform; 3] = [Platform::Rust, Platform::Cxx, Platform::Typescript];

    /// Stable lowercase identifier used in config files and the manifest.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Rust => "rust",
            Platform::Cxx => "cxx",
            Platform::Typescript => "typescript",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rust" => Ok(Platform::Rust),
            "cxx" => Ok(Platform::Cxx),
            "typescript" => Ok(Platform::Typescript),
            other => Err(format!("Unknown platform `{other}`")),
        }
    }
}
