use serde_json::json;

use crate::credentials::ToolSchema;

/// Hand-declared JSON-schema tool bindings for each generative stage's
/// structured output (`spec.md` §4.1 step 5, design note §9 "thin schema
/// tool abstraction"). Kept separate from the Rust-side validating
/// constructors in `schemas::` — this is the wire contract shown to the
/// model, not the in-process invariant check.
pub fn summary_tool() -> ToolSchema {
    ToolSchema::new(
        "record_summary",
        "Record a concise summary of the submitted architecture.",
        json!({
            "type": "object",
            "properties": {"summary": {"type": "string"}},
            "required": ["summary"]
        }),
    )
}

pub fn assets_tool() -> ToolSchema {
    ToolSchema::new(
        "record_assets",
        "Record the identified assets and entities.",
        json!({
            "type": "object",
            "properties": {
                "assets": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "type": {"type": "string", "enum": ["Asset", "Entity"]},
                            "name": {"type": "string"},
                            "description": {"type": "string"}
                        },
                        "required": ["type", "name", "description"]
                    }
                }
            },
            "required": ["assets"]
        }),
    )
}

pub fn flows_tool() -> ToolSchema {
    ToolSchema::new(
        "record_flows",
        "Record data flows, trust boundaries, and threat sources.",
        json!({
            "type": "object",
            "properties": {
                "data_flows": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "flow_description": {"type": "string"},
                            "source_entity": {"type": "string"},
                            "target_entity": {"type": "string"}
                        },
                        "required": ["flow_description", "source_entity", "target_entity"]
                    }
                },
                "trust_boundaries": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "purpose": {"type": "string"},
                            "source_entity": {"type": "string"},
                            "target_entity": {"type": "string"}
                        },
                        "required": ["purpose", "source_entity", "target_entity"]
                    }
                },
                "threat_sources": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "category": {"type": "string"},
                            "description": {"type": "string"},
                            "example": {"type": "string"}
                        },
                        "required": ["category", "description", "example"]
                    }
                }
            },
            "required": ["data_flows", "trust_boundaries", "threat_sources"]
        }),
    )
}

fn threat_item_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "stride_category": {
                "type": "string",
                "enum": ["Spoofing", "Tampering", "Repudiation", "InformationDisclosure", "DenialOfService", "ElevationOfPrivilege"]
            },
            "description": {"type": "string"},
            "target": {"type": "string"},
            "impact": {"type": "string"},
            "likelihood": {"type": "string", "enum": ["Low", "Medium", "High"]},
            "mitigations": {"type": "array", "items": {"type": "string"}, "minItems": 2, "maxItems": 5},
            "source": {"type": "string"},
            "prerequisites": {"type": "array", "items": {"type": "string"}},
            "vector": {"type": "string"}
        },
        "required": ["name", "stride_category", "description", "target", "impact", "likelihood", "mitigations", "source", "vector"]
    })
}

pub fn threats_tool() -> ToolSchema {
    ToolSchema::new(
        "record_threats",
        "Record the STRIDE threat catalog.",
        json!({
            "type": "object",
            "properties": {"threats": {"type": "array", "items": threat_item_schema()}},
            "required": ["threats"]
        }),
    )
}

pub fn gap_tool() -> ToolSchema {
    ToolSchema::new(
        "record_gap_decision",
        "Decide whether STRIDE coverage is complete or identify the next gap.",
        json!({
            "type": "object",
            "properties": {
                "stop": {"type": "boolean"},
                "gap": {"type": "string"}
            },
            "required": ["stop"]
        }),
    )
}

pub fn add_threats_tool() -> ToolSchema {
    ToolSchema::new(
        "add_threats",
        "Add one or more STRIDE threats to the catalog.",
        json!({
            "type": "object",
            "properties": {"threats": {"type": "array", "items": threat_item_schema()}},
            "required": ["threats"]
        }),
    )
}

pub fn remove_threat_tool() -> ToolSchema {
    ToolSchema::new(
        "remove_threat",
        "Remove one or more threats from the catalog by name.",
        json!({
            "type": "object",
            "properties": {"threats": {"type": "array", "items": {"type": "string"}}},
            "required": ["threats"]
        }),
    )
}

pub fn read_threat_catalog_tool() -> ToolSchema {
    ToolSchema::new(
        "read_threat_catalog",
        "Read the current threat catalog, optionally with full detail.",
        json!({
            "type": "object",
            "properties": {"verbose": {"type": "boolean"}},
            "required": []
        }),
    )
}

pub fn gap_analysis_tool() -> ToolSchema {
    ToolSchema::new(
        "gap_analysis",
        "Check the current catalog for STRIDE coverage gaps.",
        json!({"type": "object", "properties": {}, "required": []}),
    )
}
