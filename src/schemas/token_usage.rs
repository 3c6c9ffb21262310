use async_openai::types::CompletionUsage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Folds an optional usage delta into an accumulator, the way the main graph
    /// accumulates token usage across stage calls.
    pub fn merge_options(values: [&Option<TokenUsage>; 2]) -> Option<TokenUsage> {
        match values {
            [None, None] => None,
            [Some(a), None] => Some(a.clone()),
            [None, Some(b)] => Some(b.clone()),
            [Some(a), Some(b)] => Some(TokenUsage::new(
                a.prompt_tokens + b.prompt_tokens,
                a.completion_tokens + b.completion_tokens,
            )),
        }
    }
}

impl From<CompletionUsage> for TokenUsage {
    fn from(usage: CompletionUsage) -> Self {
        TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

impl From<TokenUsage> for CompletionUsage {
    fn from(usage: TokenUsage) -> Self {
        CompletionUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            prompt_tokens_details: None,
            completion_tokens_details: None,
        }
    }
}
