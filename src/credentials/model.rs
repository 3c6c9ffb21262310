use async_trait::async_trait;
use serde_json::Value;

use crate::schemas::{Message, TokenUsage};

use super::error::ModelError;
use super::tool_choice::ToolChoice;

/// A declared schema exposed as a callable tool — the "thin schema tool
/// abstraction" design note calls for (`spec.md` §9), generalized from
/// teacher's `Tool::parameters()`/`try_into_opeai_tool()`
/// (`src/tools/tool.rs`).
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A model's single structured tool call: `response.tool_calls[0].args`
/// (`spec.md` §4.1 step 6).
#[derive(Debug, Clone)]
pub struct StructuredCall {
    pub tool_name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone)]
pub struct ModelInvocation {
    pub structured: StructuredCall,
    /// Extracted per the provider-agnostic rule in `spec.md` §4.1.
    pub reasoning_text: Option<String>,
    pub usage: Option<TokenUsage>,
}

/// One turn of the agent sub-graph's ReAct loop (`spec.md` §4.2): the model
/// is bound to all four tools with `tool_choice=auto` and may answer with
/// plain text, a single tool call, or both.
#[derive(Debug, Clone)]
pub struct AgentTurn {
    pub assistant_text: String,
    pub tool_call: Option<StructuredCall>,
    pub reasoning_text: Option<String>,
    pub usage: Option<TokenUsage>,
}

/// Provider-agnostic structured-output contract (C3/C4.1 design note,
/// `spec.md` §9): "bind one tool schema, extract first tool-call arguments".
#[async_trait]
pub trait StructuredModel: Send + Sync {
    fn model_id(&self) -> &str;

    async fn invoke(
        &self,
        messages: Vec<Message>,
        tool: &ToolSchema,
        choice: ToolChoice,
    ) -> Result<ModelInvocation, ModelError>;

    /// Multi-tool, `tool_choice=auto` variant used by the agent sub-graph's
    /// `agent` node (`spec.md` §4.2), which must let the model choose among
    /// `add_threats`/`remove_threat`/`read_threat_catalog`/`gap_analysis` or
    /// answer in plain text.
    async fn invoke_agent_turn(
        &self,
        messages: Vec<Message>,
        tools: &[ToolSchema],
    ) -> Result<AgentTurn, ModelError>;
}

/// Provider-agnostic reasoning/thinking extraction (`spec.md` §4.1):
/// first non-empty of `content[0].reasoning_content.text` (structured-parts
/// shape) or `additional_kwargs.reasoning_content` (string or `{text}`).
pub fn extract_reasoning(raw: &Value) -> Option<String> {
    if let Some(text) = raw
        .pointer("/content/0/reasoning_content/text")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        return Some(text.to_string());
    }
    if let Some(kwargs) = raw.pointer("/additional_kwargs/reasoning_content") {
        if let Some(text) = kwargs.as_str().filter(|s| !s.is_empty()) {
            return Some(text.to_string());
        }
        if let Some(text) = kwargs
            .pointer("/text")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            return Some(text.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_structured_parts_reasoning() {
        let raw = json!({"content": [{"reasoning_content": {"text": "because X"}}]});
        assert_eq!(extract_reasoning(&raw), Some("because X".to_string()));
    }

    #[test]
    fn extracts_additional_kwargs_string() {
        let raw = json!({"additional_kwargs": {"reasoning_content": "because Y"}});
        assert_eq!(extract_reasoning(&raw), Some("because Y".to_string()));
    }

    #[test]
    fn extracts_additional_kwargs_object() {
        let raw = json!({"additional_kwargs": {"reasoning_content": {"text": "because Z"}}});
        assert_eq!(extract_reasoning(&raw), Some("because Z".to_string()));
    }

    #[test]
    fn returns_none_when_absent() {
        let raw = json!({"content": [{"text": "plain"}]});
        assert_eq!(extract_reasoning(&raw), None);
    }
}
