//! OpenAI-class model client (`spec.md` §4.5), generalized from teacher's
//! `async-openai`-backed client (`src/llm/openai/client.rs`,
//! `src/llm/openai/request.rs`): same bring-your-own-types (`byot` feature)
//! request shape teacher defines itself rather than binding to
//! `async-openai`'s built-in request struct, which lets this crate add the
//! `reasoning` field the Responses-style reasoning models expect without
//! fighting the upstream type.

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionTool, ChatCompletionToolArgs,
    ChatCompletionToolChoiceOption, ChatCompletionToolType, CreateChatCompletionResponse,
    FunctionObjectArgs,
};
use async_openai::Client as OpenAiClient;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::schemas::Message;

use super::error::ModelError;
use super::model::{
    extract_reasoning, AgentTurn, ModelInvocation, StructuredCall, StructuredModel, ToolSchema,
};
use super::provider::{OpenAiCredentials, ReasoningEffort, ReasoningLevel, StageReasoningConfig};
use super::tool_choice::ToolChoice;

pub struct OpenAiModel {
    client: OpenAiClient<OpenAIConfig>,
    model_id: String,
    max_tokens: u32,
    reasoning: StageReasoningConfig,
    reasoning_level: ReasoningLevel,
}

impl OpenAiModel {
    pub fn new(
        credentials: OpenAiCredentials,
        model_id: impl Into<String>,
        max_tokens: u32,
        reasoning: StageReasoningConfig,
        reasoning_level: ReasoningLevel,
    ) -> Self {
        let config = OpenAIConfig::new().with_api_key(credentials.api_key);
        Self {
            client: OpenAiClient::with_config(config),
            model_id: model_id.into(),
            max_tokens,
            reasoning,
            reasoning_level,
        }
    }

    fn effort(&self) -> Option<ReasoningEffort> {
        match &self.reasoning {
            StageReasoningConfig::OpenAi {
                level_1,
                level_2,
                level_3,
            } => match self.reasoning_level {
                1 => Some(*level_1),
                2 => Some(*level_2),
                3 => Some(*level_3),
                _ => None,
            },
            StageReasoningConfig::Bedrock(_) => None,
        }
    }
}

fn effort_str(effort: ReasoningEffort) -> &'static str {
    match effort {
        ReasoningEffort::Minimal => "minimal",
        ReasoningEffort::Low => "low",
        ReasoningEffort::Medium => "medium",
        ReasoningEffort::High => "high",
    }
}

#[derive(Serialize, Debug)]
struct ReasoningOption {
    effort: &'static str,
    summary: &'static str,
}

/// Request payload, mirroring `OpenAIRequest` in `src/llm/openai/request.rs`
/// but scoped to what the structured-output tool-call contract needs.
#[derive(Serialize, Debug)]
struct OpenAiStructuredRequest {
    model: String,
    messages: Vec<ChatCompletionRequestMessage>,
    max_tokens: u32,
    tools: Vec<ChatCompletionTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ChatCompletionToolChoiceOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<ReasoningOption>,
}

fn map_openai_error(error: async_openai::error::OpenAIError) -> ModelError {
    let message = error.to_string();
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("rate limit") || lowered.contains("429") {
        ModelError::RateLimit(message)
    } else if lowered.contains("unauthorized") || lowered.contains("401") || lowered.contains("invalid api key") {
        ModelError::Auth(message)
    } else if lowered.contains("timed out") || lowered.contains("timeout") {
        ModelError::Timeout
    } else if lowered.contains("content_policy") || lowered.contains("policy") {
        ModelError::Policy(message)
    } else {
        ModelError::OpenAi(error)
    }
}

#[async_trait]
impl StructuredModel for OpenAiModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn invoke(
        &self,
        messages: Vec<Message>,
        tool: &ToolSchema,
        choice: ToolChoice,
    ) -> Result<ModelInvocation, ModelError> {
        let chat_messages: Vec<ChatCompletionRequestMessage> = messages
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<_, _>>()
            .map_err(ModelError::OpenAi)?;

        let function = FunctionObjectArgs::default()
            .name(tool.name.clone())
            .description(tool.description.clone())
            .parameters(tool.parameters.clone())
            .build()
            .map_err(ModelError::OpenAi)?;
        let chat_tool = ChatCompletionToolArgs::default()
            .r#type(ChatCompletionToolType::Function)
            .function(function)
            .build()
            .map_err(ModelError::OpenAi)?;

        let tool_choice = match choice {
            ToolChoice::Named => Some(ChatCompletionToolChoiceOption::Named(
                async_openai::types::ChatCompletionNamedToolChoice {
                    r#type: ChatCompletionToolType::Function,
                    function: async_openai::types::FunctionName {
                        name: tool.name.clone(),
                    },
                },
            )),
            ToolChoice::Any => Some(ChatCompletionToolChoiceOption::Required),
            ToolChoice::Unforced => None,
        };

        let request = OpenAiStructuredRequest {
            model: self.model_id.clone(),
            messages: chat_messages,
            max_tokens: self.max_tokens,
            tools: vec![chat_tool],
            tool_choice,
            reasoning: self.effort().map(|effort| ReasoningOption {
                effort: effort_str(effort),
                summary: "detailed",
            }),
        };

        let response = self
            .client
            .chat()
            .create_byot::<_, CreateChatCompletionResponse>(request)
            .await
            .map_err(map_openai_error)?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(ModelError::EmptyToolCall)?;
        let tool_call = choice
            .message
            .tool_calls
            .clone()
            .and_then(|calls| calls.into_iter().next())
            .ok_or(ModelError::EmptyToolCall)?;

        let arguments: Value = serde_json::from_str(&tool_call.function.arguments)?;
        let structured = StructuredCall {
            tool_name: tool_call.function.name,
            arguments,
        };

        let raw = serde_json::to_value(&choice.message).unwrap_or(Value::Null);
        let usage = response.usage.map(Into::into);

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
        let chat_messages: Vec<ChatCompletionRequestMessage> = messages
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<_, _>>()
            .map_err(ModelError::OpenAi)?;

        let chat_tools = tools
            .iter()
            .map(|tool| {
                let function = FunctionObjectArgs::default()
                    .name(tool.name.clone())
                    .description(tool.description.clone())
                    .parameters(tool.parameters.clone())
                    .build()
                    .map_err(ModelError::OpenAi)?;
                ChatCompletionToolArgs::default()
                    .r#type(ChatCompletionToolType::Function)
                    .function(function)
                    .build()
                    .map_err(ModelError::OpenAi)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let request = OpenAiStructuredRequest {
            model: self.model_id.clone(),
            messages: chat_messages,
            max_tokens: self.max_tokens,
            tools: chat_tools,
            // spec.md §4.2: "Bind all four tools with tool_choice=auto".
            tool_choice: Some(ChatCompletionToolChoiceOption::Auto),
            reasoning: self.effort().map(|effort| ReasoningOption {
                effort: effort_str(effort),
                summary: "detailed",
            }),
        };

        let response = self
            .client
            .chat()
            .create_byot::<_, CreateChatCompletionResponse>(request)
            .await
            .map_err(map_openai_error)?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(ModelError::EmptyToolCall)?;

        let tool_call = choice
            .message
            .tool_calls
            .clone()
            .and_then(|calls| calls.into_iter().next())
            .map(|call| -> Result<StructuredCall, ModelError> {
                Ok(StructuredCall {
                    tool_name: call.function.name,
                    arguments: serde_json::from_str(&call.function.arguments)?,
                })
            })
            .transpose()?;

        let raw = serde_json::to_value(&choice.message).unwrap_or(Value::Null);
        let usage = response.usage.map(Into::into);

        Ok(AgentTurn {
            assistant_text: choice.message.content.clone().unwrap_or_default(),
            tool_call,
            reasoning_text: extract_reasoning(&raw),
            usage,
        })
    }
}
