use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::credentials::{select_tool_choice, AgentTurn, ModelProvider, ReasoningLevel, StageId, ToolSchema};
use crate::errors::OrchestrationError;
use crate::prompts::MessageBuilder;
use crate::schemas::{JobResults, JobState, JobStatus, Message, TokenUsage};
use crate::store::{JobStore, TrailUpdate};

/// Everything a node needs to do its work: persistence handles, the model
/// provisioning seam, and the cancellation signal (`spec.md` §4.1, §5).
pub struct JobContext {
    pub job_id: String,
    pub model_provider: Arc<dyn ModelProvider>,
    pub store: Arc<dyn JobStore>,
    pub message_builder: MessageBuilder,
    pub cancel: CancellationToken,
    pub reasoning_level: ReasoningLevel,
    pub iteration: u32,
    pub max_retry: u32,
    pub instructions: Option<String>,
    /// Base64 diagram content loaded from the upload store at job start, if
    /// any (`spec.md` §3 "Uploaded file", §4.4). `None` both when no upload
    /// was attached and when the stored blob carried a null-data sentinel.
    pub diagram_base64: Option<String>,
}

impl JobContext {
    /// Checks both cancellation signals before and after suspension points
    /// (`spec.md` §4.1 step 1, §5 "Cancellation semantics").
    pub async fn check_cancellation(&self) -> Result<(), OrchestrationError> {
        if self.cancel.is_cancelled() {
            return Err(OrchestrationError::Cancelled(self.job_id.clone()));
        }
        if let Some(status) = self.store.get_status(&self.job_id).await? {
            if status.state == JobState::Cancelled {
                return Err(OrchestrationError::Cancelled(self.job_id.clone()));
            }
        }
        Ok(())
    }

    pub async fn set_status(&self, state: JobState, retry: u32, detail: Option<String>) -> Result<(), OrchestrationError> {
        let now = chrono::Utc::now();
        let mut status = self
            .store
            .get_status(&self.job_id)
            .await?
            .unwrap_or_else(|| JobStatus::new(&self.job_id, state, now));
        status.transition(state, now);
        status.retry = retry;
        status.detail = detail;
        self.store.put_status(status).await?;
        Ok(())
    }

    pub async fn results(&self) -> Result<JobResults, OrchestrationError> {
        self.store
            .get_results(&self.job_id)
            .await?
            .ok_or_else(|| OrchestrationError::NotFound(self.job_id.clone()))
    }

    pub async fn save_results(&self, results: JobResults) -> Result<(), OrchestrationError> {
        self.store.put_results(results).await?;
        Ok(())
    }

    pub async fn append_trail(&self, update: TrailUpdate) -> Result<(), OrchestrationError> {
        self.store.update_trail(&self.job_id, update).await?;
        Ok(())
    }

    /// Binds the stage's structured-output tool, invokes the model, and
    /// returns the raw tool-call arguments plus extracted reasoning text
    /// (`spec.md` §4.1 steps 4-7).
    pub async fn invoke_stage(
        &self,
        stage: StageId,
        messages: Vec<Message>,
        tool: &ToolSchema,
    ) -> Result<(Value, Option<String>, Option<TokenUsage>), OrchestrationError> {
        self.check_cancellation().await?;
        let model = self.model_provider.model_for(stage, self.reasoning_level)?;
        let choice = select_tool_choice(model.model_id(), self.reasoning_level);
        let invocation = model.invoke(messages, tool, choice).await?;
        self.check_cancellation().await?;
        Ok((
            invocation.structured.arguments,
            invocation.reasoning_text,
            invocation.usage,
        ))
    }

    /// Multi-tool, `tool_choice=auto` call used by the agent sub-graph's
    /// `agent` node (`spec.md` §4.2), bound to `StageId::ThreatsAgent`.
    pub async fn invoke_agent_turn(
        &self,
        messages: Vec<Message>,
        tools: &[ToolSchema],
    ) -> Result<AgentTurn, OrchestrationError> {
        self.check_cancellation().await?;
        let model = self
            .model_provider
            .model_for(StageId::ThreatsAgent, self.reasoning_level)?;
        let turn = model.invoke_agent_turn(messages, tools).await?;
        self.check_cancellation().await?;
        Ok(turn)
    }
}
