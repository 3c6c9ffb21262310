use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be between {min} and {max} words, got {actual}")]
    WordCountOutOfRange {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },
    #[error("{field} must contain between {min} and {max} items, got {actual}")]
    LengthOutOfRange {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },
}

/// `Asset` or `Entity` identified in the architecture diagram.
///
/// See `spec.md` §3: `{type, name, description}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Asset {
    #[serde(rename = "type")]
    pub kind: AssetKind,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AssetKind {
    Asset,
    Entity,
}

impl Asset {
    pub fn new(
        kind: AssetKind,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let description = description.into();
        if name.trim().is_empty() {
            return Err(SchemaError::Empty { field: "name" });
        }
        if description.trim().is_empty() {
            return Err(SchemaError::Empty { field: "description" });
        }
        Ok(Self {
            kind,
            name,
            description,
        })
    }

    /// Re-checks the invariants [`Self::new`] enforces, for values that
    /// arrived via `Deserialize` instead (model tool-call output).
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::Empty { field: "name" });
        }
        if self.description.trim().is_empty() {
            return Err(SchemaError::Empty { field: "description" });
        }
        Ok(())
    }
}

/// Ordered sequence of `Asset`, unique by `name` once merged (see [`crate::schemas::Merge`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetsList {
    pub assets: Vec<Asset>,
}

impl AssetsList {
    pub fn new(assets: Vec<Asset>) -> Self {
        Self { assets }
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        self.assets.iter().try_for_each(Asset::validate)
    }
}
