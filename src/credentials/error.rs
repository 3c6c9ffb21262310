use thiserror::Error;

/// Mirrors teacher's per-module error enum shape (`src/llm/error.rs::LLMError`,
/// `src/tools/error.rs::ToolError`): one `thiserror` enum per concern, composed
/// at the C8 boundary rather than through one crate-wide error.
#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("missing required stage config: {0}")]
    MissingStageConfig(&'static str),
    #[error("reasoning_budget set on an effort-based provider stage {0}")]
    BudgetOnEffortProvider(&'static str),
    #[error("reasoning_effort set on a budget-based provider stage {0}")]
    EffortOnBudgetProvider(&'static str),
    #[error("max_tokens {0} exceeds provider limit {1}")]
    MaxTokensExceeded(u32, u32),
    #[error("model id {0} is not in the supported family for this provider")]
    UnsupportedModel(String),
    #[error("credentials expired")]
    Expired,
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("network request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("openai error: {0}")]
    OpenAi(#[from] async_openai::error::OpenAIError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("permission denied: {0}")]
    Permission(String),
    #[error("rate limit exceeded: {0}")]
    RateLimit(String),
    #[error("request timed out")]
    Timeout,
    #[error("provider overloaded: {0}")]
    Overloaded(String),
    #[error("content policy violation: {0}")]
    Policy(String),
    #[error("model returned no tool call")]
    EmptyToolCall,
    #[error("provider error: {0}")]
    Other(String),
}
