use std::collections::HashMap;

use super::error::CredentialsError;
use super::provider::{
    Provider, StageId, StageModelConfig, StageReasoningConfig, OPENAI_MAX_TOKENS_LIMIT,
};

/// Model families that accept `tool_choice` forcing by explicit name. The
/// "reasoning-effort provider" from `spec.md` §4.1/§4.5's tool-binding rules.
pub const OPENAI_REASONING_MODEL_PREFIXES: [&str; 2] = ["o1", "o3"];

/// The deep-thinking flagship family from `spec.md` §4.1 ("`sonnet`-class").
pub const BEDROCK_FLAGSHIP_MODEL_SUBSTRING: &str = "sonnet";

/// Bedrock model ids allowed to carry a `thinking` block (`spec.md` §4.5).
pub const BEDROCK_REASONING_ENABLED_SUBSTRINGS: [&str; 1] = ["sonnet"];

/// Validated runtime configuration: the provider, its credentials-shape, and
/// one [`StageModelConfig`] per [`StageId`] (`spec.md` §4.5).
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub provider: Provider,
    pub stages: HashMap<StageId, StageModelConfig>,
    pub default_temperature: f32,
}

impl RuntimeConfig {
    pub fn new(provider: Provider, stages: HashMap<StageId, StageModelConfig>) -> Self {
        Self {
            provider,
            stages,
            default_temperature: 0.0,
        }
    }

    pub fn stage(&self, stage: StageId) -> Result<&StageModelConfig, CredentialsError> {
        self.stages
            .get(&stage)
            .ok_or(CredentialsError::MissingStageConfig(stage.config_key()))
    }

    /// Eager validation run at construction time (ambient-stack addition,
    /// `SPEC_FULL.md` "Config validation surface"), generalizing teacher's
    /// builder-validation pattern (`src/llm/openai/builder.rs`).
    pub fn validate(&self) -> Result<(), CredentialsError> {
        for stage in StageId::ALL {
            let config = self.stage(stage)?;
            match (self.provider, &config.reasoning) {
                (Provider::Bedrock, StageReasoningConfig::OpenAi { .. }) => {
                    return Err(CredentialsError::EffortOnBudgetProvider(stage.config_key()))
                }
                (Provider::OpenAi, StageReasoningConfig::Bedrock(_)) => {
                    return Err(CredentialsError::BudgetOnEffortProvider(stage.config_key()))
                }
                _ => {}
            }
            if self.provider == Provider::OpenAi {
                if config.max_tokens > OPENAI_MAX_TOKENS_LIMIT {
                    return Err(CredentialsError::MaxTokensExceeded(
                        config.max_tokens,
                        OPENAI_MAX_TOKENS_LIMIT,
                    ));
                }
                if !is_supported_openai_model(&config.model_id) {
                    return Err(CredentialsError::UnsupportedModel(config.model_id.clone()));
                }
            }
        }
        Ok(())
    }
}

fn is_supported_openai_model(model_id: &str) -> bool {
    const SUPPORTED_PREFIXES: [&str; 4] = ["gpt-4", "gpt-5", "o1", "o3"];
    SUPPORTED_PREFIXES.iter().any(|p| model_id.starts_with(p))
}

/// `spec.md` §4.1 tool-forcing rule #1: models in the reasoning-effort family
/// force the structured-output tool by explicit name.
pub fn is_reasoning_effort_model(model_id: &str) -> bool {
    OPENAI_REASONING_MODEL_PREFIXES
        .iter()
        .any(|prefix| model_id.starts_with(prefix))
}

/// `spec.md` §4.1 tool-forcing rule #2: the deep-thinking flagship family.
pub fn is_flagship_thinking_model(model_id: &str) -> bool {
    model_id.contains(BEDROCK_FLAGSHIP_MODEL_SUBSTRING)
}

/// `spec.md` §4.5: Bedrock models allowed to carry a `thinking` config block.
pub fn bedrock_model_supports_thinking(model_id: &str) -> bool {
    BEDROCK_REASONING_ENABLED_SUBSTRINGS
        .iter()
        .any(|s| model_id.contains(s))
}
