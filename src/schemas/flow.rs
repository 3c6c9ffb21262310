use serde::{Deserialize, Serialize};

use super::SchemaError;

/// A single edge in the system's data-flow graph.
///
/// See `spec.md` §3: `{purpose/flow_description, source_entity, target_entity}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataFlow {
    pub flow_description: String,
    pub source_entity: String,
    pub target_entity: String,
}

impl DataFlow {
    pub fn new(
        flow_description: impl Into<String>,
        source_entity: impl Into<String>,
        target_entity: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        let flow_description = flow_description.into();
        if flow_description.trim().is_empty() {
            return Err(SchemaError::Empty {
                field: "flow_description",
            });
        }
        let source_entity = source_entity.into();
        if source_entity.trim().is_empty() {
            return Err(SchemaError::Empty {
                field: "source_entity",
            });
        }
        let target_entity = target_entity.into();
        if target_entity.trim().is_empty() {
            return Err(SchemaError::Empty {
                field: "target_entity",
            });
        }
        Ok(Self {
            flow_description,
            source_entity,
            target_entity,
        })
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.flow_description.trim().is_empty() {
            return Err(SchemaError::Empty {
                field: "flow_description",
            });
        }
        if self.source_entity.trim().is_empty() {
            return Err(SchemaError::Empty {
                field: "source_entity",
            });
        }
        if self.target_entity.trim().is_empty() {
            return Err(SchemaError::Empty {
                field: "target_entity",
            });
        }
        Ok(())
    }
}

/// A boundary the diagram crosses (e.g. network zone, trust tier).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrustBoundary {
    pub purpose: String,
    pub source_entity: String,
    pub target_entity: String,
}

impl TrustBoundary {
    pub fn new(
        purpose: impl Into<String>,
        source_entity: impl Into<String>,
        target_entity: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        let purpose = purpose.into();
        if purpose.trim().is_empty() {
            return Err(SchemaError::Empty { field: "purpose" });
        }
        Ok(Self {
            purpose,
            source_entity: source_entity.into(),
            target_entity: target_entity.into(),
        })
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.purpose.trim().is_empty() {
            return Err(SchemaError::Empty { field: "purpose" });
        }
        Ok(())
    }
}

/// A category of actor capable of originating threats against the system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThreatSource {
    pub category: String,
    pub description: String,
    pub example: String,
}

impl ThreatSource {
    pub fn new(
        category: impl Into<String>,
        description: impl Into<String>,
        example: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        let category = category.into();
        if category.trim().is_empty() {
            return Err(SchemaError::Empty { field: "category" });
        }
        Ok(Self {
            category,
            description: description.into(),
            example: example.into(),
        })
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.category.trim().is_empty() {
            return Err(SchemaError::Empty { field: "category" });
        }
        Ok(())
    }
}

/// Output of the `define_flows` stage: `{data_flows, trust_boundaries, threat_sources}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowsList {
    pub data_flows: Vec<DataFlow>,
    pub trust_boundaries: Vec<TrustBoundary>,
    pub threat_sources: Vec<ThreatSource>,
}

impl FlowsList {
    pub fn new(
        data_flows: Vec<DataFlow>,
        trust_boundaries: Vec<TrustBoundary>,
        threat_sources: Vec<ThreatSource>,
    ) -> Self {
        Self {
            data_flows,
            trust_boundaries,
            threat_sources,
        }
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        self.data_flows.iter().try_for_each(DataFlow::validate)?;
        self.trust_boundaries.iter().try_for_each(TrustBoundary::validate)?;
        self.threat_sources.iter().try_for_each(ThreatSource::validate)?;
        Ok(())
    }
}
