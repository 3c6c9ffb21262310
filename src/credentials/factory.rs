//! Model factory (`spec.md` §4.5): given a runtime config, a stage, and live
//! credentials, produce a boxed [`StructuredModel`]. Generalizes teacher's
//! per-provider client constructors (`Claude::new`, `OpenAI::new`) into one
//! switchboard keyed on [`Provider`] so callers never match on provider
//! themselves.

use super::bedrock::BedrockModel;
use super::config::RuntimeConfig;
use super::error::CredentialsError;
use super::model::StructuredModel;
use super::openai::OpenAiModel;
use super::provider::{Credentials, Provider, ReasoningLevel, StageId};

/// Indirection seam between a workflow node and the concrete model client it
/// invokes (`spec.md` §9 design note: "the store interface is the exact seam
/// to swap" generalized from persistence to model provisioning). Production
/// code goes through [`ConfigModelProvider`]; tests substitute a stub that
/// returns canned [`StructuredModel`] responses without a network call,
/// mirroring how teacher's `Chain` takes any `Box<dyn LLM>` rather than
/// constructing a concrete client itself.
pub trait ModelProvider: Send + Sync {
    fn model_for(
        &self,
        stage: StageId,
        reasoning_level: ReasoningLevel,
    ) -> Result<Box<dyn StructuredModel>, CredentialsError>;
}

/// The production [`ModelProvider`]: builds a fresh client per call from a
/// validated [`RuntimeConfig`] and live [`Credentials`] via [`ModelFactory`].
pub struct ConfigModelProvider {
    config: RuntimeConfig,
    credentials: Credentials,
}

impl ConfigModelProvider {
    pub fn new(config: RuntimeConfig, credentials: Credentials) -> Self {
        Self { config, credentials }
    }
}

impl ModelProvider for ConfigModelProvider {
    fn model_for(
        &self,
        stage: StageId,
        reasoning_level: ReasoningLevel,
    ) -> Result<Box<dyn StructuredModel>, CredentialsError> {
        // Enforce the 4-hour TTL before every model client is built, not just
        // at load time, so a job that runs past it fails here instead of
        // silently reusing stale credentials (`spec.md` §4.5).
        let credentials = self.credentials.retrieve(chrono::Utc::now())?;
        ModelFactory::build(&self.config, stage, credentials, reasoning_level)
    }
}

pub struct ModelFactory;

impl ModelFactory {
    /// Builds the model client for one stage. `credentials` must already
    /// match `config.provider` (`spec.md` §4.5 binds one provider per job).
    pub fn build(
        config: &RuntimeConfig,
        stage: StageId,
        credentials: &Credentials,
        reasoning_level: ReasoningLevel,
    ) -> Result<Box<dyn StructuredModel>, CredentialsError> {
        let stage_config = config.stage(stage)?;
        match (config.provider, credentials) {
            (Provider::Bedrock, Credentials::Bedrock(creds)) => Ok(Box::new(BedrockModel::new(
                creds.clone(),
                stage_config.model_id.clone(),
                stage_config.max_tokens,
                stage_config.reasoning.clone(),
                reasoning_level,
                config.default_temperature,
            ))),
            (Provider::OpenAi, Credentials::OpenAi(creds)) => Ok(Box::new(OpenAiModel::new(
                creds.clone(),
                stage_config.model_id.clone(),
                stage_config.max_tokens,
                stage_config.reasoning.clone(),
                reasoning_level,
            ))),
            _ => Err(CredentialsError::UnknownProvider(format!(
                "credentials provider does not match configured provider {:?}",
                config.provider
            ))),
        }
    }
}
