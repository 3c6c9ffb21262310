use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::CredentialsError;

/// Each generative stage in the main graph and the two agent-internal calls
/// that need their own model configuration (`spec.md` §4.5: `model_summary`,
/// `_assets`, `_flows`, `_threats`, `_threats_agent`, `_gaps`), plus `Struct`:
/// a seventh configured model not bound to a graph node, required by
/// `spec.md` §4.5's validation rule set (`assets, flows, threats,
/// threats_agent, gaps, summary, struct`). No workflow stage dispatches
/// through it directly; it is the model a caller outside the six fixed
/// stages binds when it needs the same "one tool schema in, one structured
/// response out" contract (`spec.md` §9) for an ad hoc extraction — e.g. the
/// API adapter re-deriving structured data from a user-edited `update_tm`
/// patch. Kept as a required, validated config slot even though this crate's
/// own workflow never calls `model_for(StageId::Struct, _)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageId {
    Summary,
    Assets,
    Flows,
    Threats,
    ThreatsAgent,
    Gaps,
    Struct,
}

impl StageId {
    pub const ALL: [StageId; 7] = [
        StageId::Summary,
        StageId::Assets,
        StageId::Flows,
        StageId::Threats,
        StageId::ThreatsAgent,
        StageId::Gaps,
        StageId::Struct,
    ];

    pub fn config_key(self) -> &'static str {
        match self {
            StageId::Summary => "summary",
            StageId::Assets => "assets",
            StageId::Flows => "flows",
            StageId::Threats => "threats",
            StageId::ThreatsAgent => "threats_agent",
            StageId::Gaps => "gaps",
            StageId::Struct => "struct",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.config_key())
    }
}

/// Reasoning/thinking level, 0 (off) through 3 (highest budget/effort),
/// selected at job-start time (`spec.md` §6 "Start job": `reasoning: integer 0..3`).
pub type ReasoningLevel = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Bedrock-class: `{access_key, secret_key, session_token?, region}`,
    /// reasoning expressed as a token budget (`spec.md` §4.5).
    Bedrock,
    /// OpenAI-class: `{api_key}`, reasoning expressed as an effort level.
    OpenAi,
}

impl Provider {
    pub fn from_str_loose(s: &str) -> Result<Self, CredentialsError> {
        match s.to_ascii_lowercase().as_str() {
            "bedrock" => Ok(Provider::Bedrock),
            "openai" => Ok(Provider::OpenAi),
            other => Err(CredentialsError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BedrockCredentials {
    pub access_key: String,
    pub secret_key: String,
    pub session_token: Option<String>,
    pub region: String,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OpenAiCredentials {
    pub api_key: String,
    pub loaded_at: DateTime<Utc>,
}

/// Credentials expire 4 hours after load and are cleared on retrieval
/// (`spec.md` §4.5).
pub const CREDENTIALS_TTL_HOURS: i64 = 4;

#[derive(Debug, Clone)]
pub enum Credentials {
    Bedrock(BedrockCredentials),
    OpenAi(OpenAiCredentials),
}

impl Credentials {
    fn loaded_at(&self) -> DateTime<Utc> {
        match self {
            Credentials::Bedrock(c) => c.loaded_at,
            Credentials::OpenAi(c) => c.loaded_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.loaded_at() > Duration::hours(CREDENTIALS_TTL_HOURS)
    }

    pub fn provider(&self) -> Provider {
        match self {
            Credentials::Bedrock(_) => Provider::Bedrock,
            Credentials::OpenAi(_) => Provider::OpenAi,
        }
    }

    /// Returns the credentials iff unexpired, per the 4-hour TTL (`spec.md` §4.5).
    /// Callers are expected to clear the stored copy immediately after this
    /// succeeds ("cleared on retrieval").
    pub fn retrieve(&self, now: DateTime<Utc>) -> Result<&Credentials, CredentialsError> {
        if self.is_expired(now) {
            return Err(CredentialsError::Expired);
        }
        Ok(self)
    }
}

/// Reasoning budget in tokens per level, Bedrock-class (`spec.md` §4.5: "positive integer").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReasoningBudget {
    pub level_1: u32,
    pub level_2: u32,
    pub level_3: u32,
}

impl ReasoningBudget {
    pub fn for_level(&self, level: ReasoningLevel) -> Option<u32> {
        match level {
            1 => Some(self.level_1),
            2 => Some(self.level_2),
            3 => Some(self.level_3),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReasoningEffort {
    Minimal,
    Low,
    Medium,
    High,
}

/// Per-stage model configuration. Bedrock-class stages carry a token budget;
/// OpenAI-class stages carry an effort level (`spec.md` §4.5).
#[derive(Debug, Clone)]
pub struct StageModelConfig {
    pub model_id: String,
    pub max_tokens: u32,
    pub reasoning: StageReasoningConfig,
}

#[derive(Debug, Clone)]
pub enum StageReasoningConfig {
    Bedrock(ReasoningBudget),
    OpenAi {
        level_1: ReasoningEffort,
        level_2: ReasoningEffort,
        level_3: ReasoningEffort,
    },
}

impl StageReasoningConfig {
    pub fn is_bedrock(&self) -> bool {
        matches!(self, StageReasoningConfig::Bedrock(_))
    }
}

pub const OPENAI_MAX_TOKENS_LIMIT: u32 = 128_000;
