//! Credentials, provider configuration, and the model factory (`spec.md` §4.5,
//! C3). Generalizes teacher's `src/llm/` provider clients and
//! `src/llm/error.rs` into a provider-agnostic [`model::StructuredModel`]
//! trait with two concrete implementations.

pub mod bedrock;
pub mod config;
pub mod error;
pub mod factory;
pub mod model;
pub mod openai;
pub mod provider;
pub mod tool_choice;

pub use bedrock::BedrockModel;
pub use config::RuntimeConfig;
pub use error::{CredentialsError, ModelError};
pub use factory::{ConfigModelProvider, ModelFactory, ModelProvider};
pub use model::{AgentTurn, ModelInvocation, StructuredCall, StructuredModel, ToolSchema};
pub use openai::OpenAiModel;
pub use provider::{
    BedrockCredentials, Credentials, OpenAiCredentials, Provider, ReasoningBudget,
    ReasoningEffort, ReasoningLevel, StageId, StageModelConfig, StageReasoningConfig,
};
pub use tool_choice::{select_tool_choice, ToolChoice};
