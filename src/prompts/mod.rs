//! Multimodal prompt composition (C4, `spec.md` §4.6). Generalizes teacher's
//! `template::message_template`/`prompt_template` (plain-text placeholder
//! substitution) into the fixed, tag-wrapped payload ordering this system's
//! stages need: diagram, description, assumptions, stage-specific context,
//! stage directive.

mod sanitize;
mod stage;

pub use sanitize::sanitize_user_text;
pub use stage::{Stage, StagePrompt};

use crate::schemas::{AssetsList, FlowsList, Message, ThreatsList};

/// Context common to every generative stage call (`spec.md` §4.6).
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    pub diagram_base64: Option<String>,
    pub description: Option<String>,
    pub assumptions: Vec<String>,
}

/// Marker the provider-caching insertion point sits at, between the
/// context block and the high-entropy stage payload (`spec.md` §4.6).
/// Bedrock-class providers honor `cache_control`; this crate emits the
/// marker as an inert tag when the provider doesn't support caching so the
/// message text stays identical either way.
const CACHE_MARKER: &str = "<!-- cache-boundary -->";

pub struct MessageBuilder {
    supports_prompt_caching: bool,
}

impl MessageBuilder {
    pub fn new(supports_prompt_caching: bool) -> Self {
        Self {
            supports_prompt_caching,
        }
    }

    /// Builds the canonical human message for a stage (`spec.md` §4.6):
    /// diagram wrapper, optional description/assumptions, stage payload
    /// tags, then the stage directive text.
    pub fn build(&self, context: &PromptContext, stage: &StagePrompt) -> Message {
        let mut body = String::new();
        body.push_str("<architecture_diagram>\n");
        body.push_str(if context.diagram_base64.is_some() {
            "[diagram attached as image content]"
        } else {
            "[no diagram available]"
        });
        body.push_str("\n</architecture_diagram>\n");

        if let Some(description) = &context.description {
            body.push_str(&tag("description", &sanitize_user_text(description)));
        }
        if !context.assumptions.is_empty() {
            let joined = context.assumptions.join("\n");
            body.push_str(&tag("assumptions", &sanitize_user_text(&joined)));
        }

        if self.supports_prompt_caching {
            body.push('\n');
            body.push_str(CACHE_MARKER);
            body.push('\n');
        }

        for (tag_name, content) in &stage.payload_tags {
            body.push_str(&tag(tag_name, content));
        }

        body.push('\n');
        body.push_str(&stage.directive);

        let message = Message::new_human_message(body);
        match &context.diagram_base64 {
            Some(data) => message.with_images(vec![format!("data:image/png;base64,{data}")]),
            None => message,
        }
    }
}

fn tag(name: &str, content: &str) -> String {
    format!("<{name}>\n{content}\n</{name}>\n")
}

/// Renders `AssetsList` as the `<identified_assets_and_entities>` payload tag.
pub fn render_assets(assets: &AssetsList) -> String {
    assets
        .assets
        .iter()
        .map(|a| format!("- [{:?}] {}: {}", a.kind, a.name, a.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders `FlowsList` as the `<data_flow>` payload tag.
pub fn render_flows(flows: &FlowsList) -> String {
    let mut out = String::new();
    for f in &flows.data_flows {
        out.push_str(&format!(
            "- {} -> {}: {}\n",
            f.source_entity, f.target_entity, f.flow_description
        ));
    }
    for b in &flows.trust_boundaries {
        out.push_str(&format!(
            "- boundary {} -> {}: {}\n",
            b.source_entity, b.target_entity, b.purpose
        ));
    }
    for s in &flows.threat_sources {
        out.push_str(&format!("- source [{}]: {} (e.g. {})\n", s.category, s.description, s.example));
    }
    out
}

/// Renders `ThreatsList` as the `<threats>` payload tag.
pub fn render_threats(threats: &ThreatsList) -> String {
    threats
        .threats
        .iter()
        .map(|t| format!("- {} ({:?}): {}", t.name, t.stride_category, t.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders only starred threats as the `<starred_threats>` payload tag
/// (`spec.md` §4.2: "starred threats are enumerated and MUST be preserved").
pub fn render_starred_threats(threats: &ThreatsList) -> String {
    render_threats(&threats.starred_only())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_includes_cache_marker_only_when_supported() {
        let builder = MessageBuilder::new(true);
        let context = PromptContext {
            diagram_base64: Some("abc".into()),
            description: Some("a service".into()),
            assumptions: vec!["TLS enforced".into()],
        };
        let stage = StagePrompt {
            payload_tags: vec![],
            directive: "Identify Assets".into(),
        };
        let message = builder.build(&context, &stage);
        assert!(message.content.contains(CACHE_MARKER));
        assert!(message.images.is_some());
    }

    #[test]
    fn build_omits_cache_marker_when_unsupported() {
        let builder = MessageBuilder::new(false);
        let context = PromptContext::default();
        let stage = StagePrompt {
            payload_tags: vec![],
            directive: "Identify Assets".into(),
        };
        let message = builder.build(&context, &stage);
        assert!(!message.content.contains(CACHE_MARKER));
        assert!(message.images.is_none());
    }

    #[test]
    fn sanitizes_control_bytes_in_description() {
        let builder = MessageBuilder::new(false);
        let context = PromptContext {
            diagram_base64: None,
            description: Some("bad\u{0}\u{1}text".into()),
            assumptions: vec![],
        };
        let stage = StagePrompt {
            payload_tags: vec![],
            directive: "Identify Assets".into(),
        };
        let message = builder.build(&context, &stage);
        assert!(!message.content.contains('\u{0}'));
    }
}
