use crate::schemas::{AssetsList, FlowsList, ThreatsList};

use super::{render_assets, render_flows, render_starred_threats, render_threats};

/// The six generative stages plus the two sub-graph-only calls that need
/// their own prompt shape (`spec.md` §4.1, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Summary,
    Assets,
    Flows,
    ThreatsInitial,
    ThreatsImprove,
    GapAnalysis,
    AgentSystem,
}

/// A stage's payload tags plus its trailing directive text (`spec.md` §4.6
/// step 4, "Identify Assets", "Identify system flows", etc.).
#[derive(Debug, Clone)]
pub struct StagePrompt {
    pub payload_tags: Vec<(&'static str, String)>,
    pub directive: String,
}

impl StagePrompt {
    pub fn summary() -> Self {
        Self {
            payload_tags: vec![],
            directive: "Summarize the submitted architecture in two or three sentences.".into(),
        }
    }

    pub fn assets() -> Self {
        Self {
            payload_tags: vec![],
            directive: "Identify Assets".into(),
        }
    }

    pub fn flows(assets: &AssetsList) -> Self {
        Self {
            payload_tags: vec![("identified_assets_and_entities", render_assets(assets))],
            directive: "Identify system flows".into(),
        }
    }

    /// `threats_initial` per `spec.md` §4.1: used when `(retry == 0) ∧
    /// (threats empty)`. Resolves the open question on whether the initial
    /// pass should reuse the improvement prompt by never doing so — the
    /// initial and improvement directives are kept as two distinct prompts
    /// (see `DESIGN.md` "threats_improve_prompt").
    pub fn threats_initial(assets: &AssetsList, flows: &FlowsList) -> Self {
        Self {
            payload_tags: vec![
                ("identified_assets_and_entities", render_assets(assets)),
                ("data_flow", render_flows(flows)),
            ],
            directive: "Identify threats using STRIDE against every asset, entity, and flow above.".into(),
        }
    }

    pub fn threats_improve(
        assets: &AssetsList,
        flows: &FlowsList,
        existing: &ThreatsList,
        gap: Option<&str>,
    ) -> Self {
        let mut payload_tags = vec![
            ("identified_assets_and_entities", render_assets(assets)),
            ("data_flow", render_flows(flows)),
            ("threats", render_threats(existing)),
        ];
        if let Some(gap) = gap {
            payload_tags.push(("gap", gap.to_string()));
        }
        Self {
            payload_tags,
            directive: "Improve the threat catalog above, addressing the noted gap where present.".into(),
        }
    }

    pub fn gap_analysis(threats: &ThreatsList) -> Self {
        Self {
            payload_tags: vec![("threats", render_threats(threats))],
            directive: "Identify one gap in STRIDE coverage, or confirm the catalog is complete.".into(),
        }
    }

    /// Seeds the agent sub-graph's system message (`spec.md` §4.2): current
    /// assumptions/assets/flows plus starred threats that must be preserved.
    pub fn agent_system(
        assets: &AssetsList,
        flows: &FlowsList,
        starred: &ThreatsList,
        instructions: Option<&str>,
    ) -> Self {
        let mut payload_tags = vec![
            ("identified_assets_and_entities", render_assets(assets)),
            ("data_flow", render_flows(flows)),
            ("starred_threats", render_starred_threats(starred)),
        ];
        if let Some(instructions) = instructions {
            payload_tags.push(("valid_values_for_threats", instructions.to_string()));
        }
        Self {
            payload_tags,
            directive: "Use add_threats, remove_threat, read_threat_catalog, and gap_analysis \
                        to build a complete STRIDE threat catalog. Preserve every starred threat."
                .into(),
        }
    }
}
