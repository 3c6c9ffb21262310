//! Error taxonomy and provider mapping (C8, `spec.md` §7). Generalizes
//! teacher's per-module `thiserror` enums (`src/llm/error.rs::LLMError`,
//! `src/tools/error.rs::ToolError`) composed at this one crate-facing
//! boundary rather than a single god-error, per `SPEC_FULL.md`'s posture.

use thiserror::Error;

use crate::credentials::{CredentialsError, ModelError};
use crate::store::StoreError;

/// The ten wire categories from `spec.md` §6 "Error taxonomy".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    Credentials,
    OpenAiAuth,
    NotFound,
    Model,
    ModelProvider,
    OpenAiRateLimit,
    Cancelled,
    Internal,
}

impl ErrorKind {
    /// The wire category label used in the `{error, message, job_id?}` envelope.
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Credentials => "CREDENTIALS_ERROR",
            ErrorKind::OpenAiAuth => "OPENAI_AUTH_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Model => "MODEL_ERROR",
            ErrorKind::ModelProvider => "MODEL_PROVIDER_ERROR",
            ErrorKind::OpenAiRateLimit => "OPENAI_RATE_LIMIT_ERROR",
            ErrorKind::Cancelled => "INTERNAL_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Credentials => 401,
            ErrorKind::OpenAiAuth => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Model => 422,
            ErrorKind::ModelProvider => 422,
            ErrorKind::OpenAiRateLimit => 429,
            ErrorKind::Cancelled => 500,
            ErrorKind::Internal => 500,
        }
    }
}

/// Top-level orchestration error, raised by workflow nodes, the agent
/// sub-graph, and the executor. Cancellation is represented explicitly so
/// callers can distinguish "the job was interrupted" (no status mutation,
/// `interrupt` already wrote it) from genuine failures (`spec.md` §7).
#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error("job {0} was cancelled")]
    Cancelled(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("schema error: {0}")]
    Schema(#[from] crate::schemas::SchemaError),
    #[error("job {0} not found")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl OrchestrationError {
    /// Maps a failure to the wire taxonomy at the executor boundary, where
    /// the active provider is known (`spec.md` §7 "Provider mapping is
    /// applied at the executor boundary").
    pub fn kind(&self, provider_is_openai: bool) -> ErrorKind {
        match self {
            OrchestrationError::Cancelled(_) => ErrorKind::Cancelled,
            OrchestrationError::Validation(_) => ErrorKind::Validation,
            OrchestrationError::Credentials(CredentialsError::Expired) => ErrorKind::Credentials,
            OrchestrationError::Credentials(_) => ErrorKind::Credentials,
            OrchestrationError::NotFound(_) => ErrorKind::NotFound,
            OrchestrationError::Model(model_error) => map_model_error(model_error, provider_is_openai),
            OrchestrationError::Store(_) => ErrorKind::Internal,
            OrchestrationError::Schema(_) => ErrorKind::Validation,
            OrchestrationError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, OrchestrationError::Cancelled(_))
    }

    /// `error_type` persisted onto `JobResults` on failure (`spec.md` §4.4, §7).
    pub fn error_type(&self) -> &'static str {
        match self {
            OrchestrationError::Cancelled(_) => "cancelled",
            OrchestrationError::Validation(_) => "validation",
            OrchestrationError::Credentials(_) => "credentials",
            OrchestrationError::Model(_) => "model",
            OrchestrationError::Store(_) => "store",
            OrchestrationError::Schema(_) => "schema",
            OrchestrationError::NotFound(_) => "not_found",
            OrchestrationError::Internal(_) => "internal",
        }
    }
}

fn map_model_error(error: &ModelError, provider_is_openai: bool) -> ErrorKind {
    match error {
        ModelError::Auth(_) => {
            if provider_is_openai {
                ErrorKind::OpenAiAuth
            } else {
                ErrorKind::ModelProvider
            }
        }
        ModelError::RateLimit(_) => {
            if provider_is_openai {
                ErrorKind::OpenAiRateLimit
            } else {
                ErrorKind::ModelProvider
            }
        }
        ModelError::Timeout | ModelError::Overloaded(_) | ModelError::Policy(_) | ModelError::Permission(_) => {
            ErrorKind::ModelProvider
        }
        ModelError::Request(_) | ModelError::OpenAi(_) | ModelError::Json(_) | ModelError::EmptyToolCall
        | ModelError::Other(_) => ErrorKind::Model,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_maps_to_openai_category_only_for_openai_provider() {
        let error = OrchestrationError::Model(ModelError::RateLimit("slow down".into()));
        assert_eq!(error.kind(true), ErrorKind::OpenAiRateLimit);
        assert_eq!(error.kind(false), ErrorKind::ModelProvider);
    }

    #[test]
    fn cancellation_never_becomes_a_failure_category() {
        let error = OrchestrationError::Cancelled("job-1".into());
        assert!(error.is_cancellation());
        assert_eq!(error.error_type(), "cancelled");
    }
}
