use serde::{Deserialize, Serialize};

use super::SchemaError;

/// Decision returned by the `gap_analysis` stage/tool: `{stop, gap}`.
///
/// `gap` is required iff `stop == false` (`spec.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GapDecision {
    pub stop: bool,
    #[serde(default)]
    pub gap: Option<String>,
}

impl GapDecision {
    pub fn stop() -> Self {
        Self {
            stop: true,
            gap: None,
        }
    }

    pub fn continue_with(gap: impl Into<String>) -> Result<Self, SchemaError> {
        let gap = gap.into();
        if gap.trim().is_empty() {
            return Err(SchemaError::Empty { field: "gap" });
        }
        Ok(Self {
            stop: false,
            gap: Some(gap),
        })
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if !self.stop && self.gap.as_deref().unwrap_or("").trim().is_empty() {
            return Err(SchemaError::Empty { field: "gap" });
        }
        Ok(())
    }
}
