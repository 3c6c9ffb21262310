//! Bedrock-class model client (`spec.md` §4.5), generalized from teacher's
//! hand-rolled Anthropic HTTP client (`src/llm/claude/client.rs`): manual
//! `reqwest` request, manual status-code-to-typed-error mapping. No AWS
//! Bedrock Rust SDK is a teacher/pack dependency, so this keeps the same
//! shape teacher already uses for exactly this kind of provider instead of
//! inventing a vendored SDK stub.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::schemas::{Message, MessageType, TokenUsage};

use super::error::ModelError;
use super::model::{
    extract_reasoning, AgentTurn, ModelInvocation, StructuredCall, StructuredModel, ToolSchema,
};
use super::provider::{BedrockCredentials, ReasoningLevel, StageReasoningConfig};
use super::tool_choice::ToolChoice;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const THINKING_BETA_HEADER: &str = "extended-thinking-2025-05-14";

pub struct BedrockModel {
    client: Client,
    credentials: BedrockCredentials,
    model_id: String,
    max_tokens: u32,
    reasoning: StageReasoningConfig,
    reasoning_level: ReasoningLevel,
    default_temperature: f32,
}

impl BedrockModel {
    pub fn new(
        credentials: BedrockCredentials,
        model_id: impl Into<String>,
        max_tokens: u32,
        reasoning: StageReasoningConfig,
        reasoning_level: ReasoningLevel,
        default_temperature: f32,
    ) -> Self {
        Self {
            client: Client::new(),
            credentials,
            model_id: model_id.into(),
            max_tokens,
            reasoning,
            reasoning_level,
            default_temperature,
        }
    }

    fn thinking_budget(&self) -> Option<u32> {
        match &self.reasoning {
            StageReasoningConfig::Bedrock(budget) => {
                if super::config::bedrock_model_supports_thinking(&self.model_id) {
                    budget.for_level(self.reasoning_level)
                } else {
                    None
                }
            }
            StageReasoningConfig::OpenAi { .. } => None,
        }
    }
}

#[derive(Serialize)]
struct BedrockPayload {
    anthropic_version: &'static str,
    max_tokens: u32,
    system: Option<String>,
    messages: Vec<BedrockMessage>,
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking: Option<Value>,
}

#[derive(Serialize)]
struct BedrockMessage {
    role: String,
    content: Value,
}

impl BedrockMessage {
    fn from_message(message: &Message) -> Self {
        let role = match message.message_type {
            MessageType::Ai | MessageType::Tool => "assistant",
            _ => "user",
        };
        let content = match &message.images {
            Some(images) if !images.is_empty() => {
                let mut parts = vec![json!({"type": "text", "text": message.content})];
                for image in images {
                    parts.push(json!({
                        "type": "image",
                        "source": {"type": "base64", "media_type": "image/png", "data": image.image_url}
                    }));
                }
                Value::Array(parts)
            }
            _ => Value::String(message.content.clone()),
        };
        Self {
            role: role.to_string(),
            content,
        }
    }
}

#[derive(Deserialize)]
struct BedrockApiResponse {
    content: Vec<BedrockContentBlock>,
    usage: BedrockUsage,
}

#[derive(Deserialize)]
struct BedrockContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<Value>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct BedrockUsage {
    input_tokens: u32,
    output_tokens: u32,
}

fn map_status_to_error(status: u16, body: &str) -> ModelError {
    match status {
        401 => ModelError::Auth(body.to_string()),
        403 => ModelError::Permission(body.to_string()),
        429 => ModelError::RateLimit(body.to_string()),
        503 => ModelError::Overloaded(body.to_string()),
        400 if body.contains("content") => ModelError::Policy(body.to_string()),
        _ => ModelError::Other(format!("HTTP {status}: {body}")),
    }
}

impl BedrockModel {
    async fn send(
        &self,
        messages: Vec<Message>,
        tools: Vec<Value>,
        tool_choice: Option<Value>,
    ) -> Result<(Value, BedrockApiResponse), ModelError> {
        let (system_messages, other_messages): (Vec<_>, Vec<_>) = messages
            .iter()
            .partition(|m| m.message_type == MessageType::System);

        let thinking_budget = self.thinking_budget();
        let payload = BedrockPayload {
            anthropic_version: ANTHROPIC_VERSION,
            max_tokens: self.max_tokens,
            system: system_messages.first().map(|m| m.content.clone()),
            messages: other_messages
                .into_iter()
                .map(BedrockMessage::from_message)
                .collect(),
            tools,
            tool_choice,
            // Thinking and temperature are mutually exclusive (spec.md §4.5).
            temperature: if thinking_budget.is_some() {
                None
            } else {
                Some(self.default_temperature)
            },
            thinking: thinking_budget
                .map(|budget_tokens| json!({"type": "enabled", "budget_tokens": budget_tokens})),
        };

        let mut request = self
            .client
            .post("https://bedrock-runtime.invalid/model/invoke")
            .header("x-api-key", &self.credentials.access_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json");
        if thinking_budget.is_some() {
            request = request.header("anthropic-beta", THINKING_BETA_HEADER);
        }

        let response = request.json(&payload).send().await?;
        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_to_error(status, &body));
        }
        let raw: Value = response.json().await?;
        let parsed: BedrockApiResponse = serde_json::from_value(raw.clone())?;
        Ok((raw, parsed))
    }
}

#[async_trait]
impl StructuredModel for BedrockModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn invoke(
        &self,
        messages: Vec<Message>,
        tool: &ToolSchema,
        choice: ToolChoice,
    ) -> Result<ModelInvocation, ModelError> {
        let tool_choice = match choice {
            ToolChoice::Named => Some(json!({"type": "tool", "name": tool.name})),
            ToolChoice::Any => Some(json!({"type": "any"})),
            ToolChoice::Unforced => None,
        };
        let tools = vec![json!({
            "name": tool.name,
            "description": tool.description,
            "input_schema": tool.parameters,
        })];

        let (raw, parsed) = self.send(messages, tools, tool_choice).await?;

        let tool_use = parsed
            .content
            .iter()
            .find(|block| block.kind == "tool_use")
            .ok_or(ModelError::EmptyToolCall)?;
        let structured = StructuredCall {
            tool_name: tool_use.name.clone().unwrap_or_default(),
            arguments: tool_use.input.clone().unwrap_or(Value::Null),
        };

        let usage = Some(TokenUsage::new(
            parsed.usage.input_tokens,
            parsed.usage.output_tokens,
        ));

        Ok(ModelInvocation {
            structured,
            reasoning_text: extract_reasoning(&raw),
            usage,
        })
    }

    async fn invoke_agent_turn(
        &self,
        messages: Vec<Message>,
        tools: &[ToolSchema],
    ) -> Result<AgentTurn, ModelError> {
        let tool_specs = tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "input_schema": t.parameters,
                })
            })
            .collect();

        // `tool_choice=auto` (spec.md §4.2: "Bind all four tools with
        // tool_choice=auto") is this provider's default when omitted.
        let (raw, parsed) = self.send(messages, tool_specs, None).await?;

        let tool_call = parsed
            .content
            .iter()
            .find(|block| block.kind == "tool_use")
            .map(|block| StructuredCall {
                tool_name: block.name.clone().unwrap_or_default(),
                arguments: block.input.clone().unwrap_or(Value::Null),
            });
        let assistant_text = parsed
            .content
            .iter()
            .filter_map(|block| block.text.clone())
            .collect::<Vec<_>>()
            .join("\n");

        let usage = Some(TokenUsage::new(
            parsed.usage.input_tokens,
            parsed.usage.output_tokens,
        ));

        Ok(AgentTurn {
            assistant_text,
            tool_call,
            reasoning_text: extract_reasoning(&raw),
            usage,
        })
    }
}
