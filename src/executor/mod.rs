//! Job executor and active-job registry (C7, `spec.md` §4.4). Generalizes
//! teacher's single-shot `chain.call(...).await` invocation model into a
//! background-task-plus-cancellation-token scheme, since unlike a chain call
//! this system's jobs outlive the request that started them and must be
//! interruptible mid-flight.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::credentials::{ModelProvider, ReasoningLevel};
use crate::errors::OrchestrationError;
use crate::prompts::MessageBuilder;
use crate::schemas::{JobResults, JobState, JobStatus};
use crate::store::JobStore;
use crate::workflow::{run_graph, JobContext, NodeId};

/// Default `wait_for_completion` deadline (`spec.md` §5 "Timeouts").
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

const POLL_INTERVAL: Duration = Duration::from_secs(1);

struct RegistryEntry {
    cancel: CancellationToken,
    #[allow(dead_code)]
    start_time: chrono::DateTime<Utc>,
}

/// Parameters for `execute`, mirroring the "Start job" request shape
/// (`spec.md` §6).
#[derive(Debug, Clone)]
pub struct ExecuteParams {
    pub id: Option<String>,
    pub s3_location: Option<String>,
    pub upload_key: Option<String>,
    pub iteration: u32,
    pub reasoning: ReasoningLevel,
    pub title: Option<String>,
    pub description: Option<String>,
    pub assumptions: Vec<String>,
    pub replay: bool,
    pub instructions: Option<String>,
}

/// Owns the active-job registry and the single `JobStore` handle jobs
/// persist through (`spec.md` §4.4, §5 "Shared-resource policy": the
/// registry and state store are the only shared mutable surfaces).
pub struct JobExecutor {
    store: Arc<dyn JobStore>,
    registry: Arc<RwLock<HashMap<String, RegistryEntry>>>,
    max_retry: u32,
}

impl JobExecutor {
    pub fn new(store: Arc<dyn JobStore>, max_retry: u32) -> Self {
        Self {
            store,
            registry: Arc::new(RwLock::new(HashMap::new())),
            max_retry,
        }
    }

    /// `execute(params) -> {id}` (`spec.md` §4.4). Initializes a new job or a
    /// replay state, then schedules the workflow in a background task.
    ///
    /// `model_provider` is the seam described at [`ModelProvider`]: production
    /// callers pass a [`crate::credentials::ConfigModelProvider`] built from a
    /// validated [`crate::credentials::RuntimeConfig`] and live
    /// [`crate::credentials::Credentials`]; tests pass a stub. `is_bedrock`
    /// selects the message builder's cache-marker policy (`spec.md` §4.6);
    /// `provider_label` is persisted onto `JobResults.provider` verbatim.
    pub async fn execute(
        &self,
        params: ExecuteParams,
        model_provider: Arc<dyn ModelProvider>,
        is_bedrock: bool,
        provider_label: &str,
    ) -> Result<String, OrchestrationError> {
        let (id, replay) = if params.replay {
            let id = params
                .id
                .clone()
                .ok_or_else(|| OrchestrationError::Validation("id is required for replay".into()))?;
            let mut results = self
                .store
                .get_results(&id)
                .await?
                .ok_or_else(|| OrchestrationError::NotFound(id.clone()))?;

            // Backup must snapshot the catalog as it stood *before* the
            // starred-only filter below, or `restore_tm` could never bring
            // back the unstarred threats a replay discards (`spec.md` §3
            // "backup", §8 scenario 5: "backup now contains the original 5").
            results.capture_backup_if_absent();
            if let Some(threats) = results.threat_list.take() {
                results.threat_list = Some(threats.starred_only());
            }
            self.store.put_results(results).await?;
            (id, true)
        } else {
            let title = params
                .title
                .clone()
                .ok_or_else(|| OrchestrationError::Validation("title is required".into()))?;
            let description = params
                .description
                .clone()
                .ok_or_else(|| OrchestrationError::Validation("description is required".into()))?;
            let id = params.id.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

            let mut results = JobResults::new(&id, title, description, params.assumptions.clone());
            results.s3_location = params.s3_location.clone();
            results.provider = Some(provider_label.to_string());
            self.store.put_results(results).await?;
            self.store.add_to_job_index(&id).await?;
            (id, false)
        };

        self.store
            .put_status(JobStatus::new(&id, JobState::Start, Utc::now()))
            .await?;

        // `spec.md` §3 "Uploaded file": when storage quota was exceeded the
        // blob may carry `{data: None, error}` instead of base64 content;
        // stages proceed without the diagram in that case rather than failing
        // the job (`spec.md` §8 "Image storage").
        let diagram_base64 = match &params.upload_key {
            Some(key) => match self.store.get_upload(key).await? {
                Some(file) if file.is_available() => file.data,
                Some(file) => {
                    log::warn!(
                        "upload '{key}' for job {id} has no data ({}); proceeding without the diagram",
                        file.error.as_deref().unwrap_or("unknown error")
                    );
                    None
                }
                None => {
                    log::warn!("upload '{key}' for job {id} was not found; proceeding without the diagram");
                    None
                }
            },
            None => None,
        };

        self.spawn(
            id.clone(),
            replay,
            model_provider,
            is_bedrock,
            params.iteration,
            params.reasoning,
            params.instructions,
            diagram_base64,
        )
        .await;
        Ok(id)
    }

    /// Registers the registry entry before the background task can possibly
    /// reach `finish` and remove it, so `is_executing`/`interrupt` never race
    /// against a job that has already completed but isn't tracked yet.
    async fn spawn(
        &self,
        job_id: String,
        replay: bool,
        model_provider: Arc<dyn ModelProvider>,
        is_bedrock: bool,
        iteration: u32,
        reasoning_level: ReasoningLevel,
        instructions: Option<String>,
        diagram_base64: Option<String>,
    ) {
        let cancel = CancellationToken::new();
        self.registry.write().await.insert(
            job_id.clone(),
            RegistryEntry {
                cancel: cancel.clone(),
                start_time: Utc::now(),
            },
        );

        let ctx = JobContext {
            job_id: job_id.clone(),
            message_builder: MessageBuilder::new(is_bedrock),
            model_provider,
            store: self.store.clone(),
            cancel,
            reasoning_level,
            iteration,
            max_retry: self.max_retry,
            instructions,
            diagram_base64,
        };

        let store = ctx.store.clone();
        let registry = self.registry.clone();
        let task_id = job_id;
        tokio::spawn(async move {
            let outcome = run_graph(&ctx, NodeId::GenerateSummary, replay).await;
            Self::finish(&store, &registry, &task_id, outcome).await;
        });
    }

    /// Runs on background-task completion (`spec.md` §4.4 registry exit rules).
    /// Cancellation is a no-op here: `interrupt` already wrote the CANCELLED
    /// status and cancellation metadata before firing the token.
    async fn finish(
        store: &Arc<dyn JobStore>,
        registry: &Arc<RwLock<HashMap<String, RegistryEntry>>>,
        id: &str,
        outcome: Result<(), OrchestrationError>,
    ) {
        if let Err(error) = outcome {
            if !error.is_cancellation() {
                if let Ok(Some(mut results)) = store.get_results(id).await {
                    results.error = Some(error.to_string());
                    results.error_type = Some(error.error_type().to_string());
                    results.failed_at = Some(Utc::now());
                    let _ = store.put_results(results).await;
                }
                if let Ok(Some(mut status)) = store.get_status(id).await {
                    status.transition(JobState::Failed, Utc::now());
                    let _ = store.put_status(status).await;
                }
            }
        }
        registry.write().await.remove(id);
    }

    /// `is_executing(id)` (`spec.md` §4.4): true iff persisted state is
    /// non-terminal.
    pub async fn is_executing(&self, id: &str) -> Result<bool, OrchestrationError> {
        Ok(self
            .store
            .get_status(id)
            .await?
            .map(|status| status.state.is_executing())
            .unwrap_or(false))
    }

    /// `interrupt(id)` (`spec.md` §4.4). Idempotent: returns `false` once the
    /// job is no longer tracked and already terminal.
    pub async fn interrupt(&self, id: &str) -> Result<bool, OrchestrationError> {
        let entry = self.registry.write().await.remove(id);
        if let Some(entry) = entry {
            entry.cancel.cancel();
            self.mark_cancelled(id, "interrupted by request").await?;
            return Ok(true);
        }

        if let Some(status) = self.store.get_status(id).await? {
            if status.state.is_executing() {
                self.mark_cancelled(id, "interrupted orphaned job").await?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn mark_cancelled(&self, id: &str, reason: &str) -> Result<(), OrchestrationError> {
        let now = Utc::now();
        if let Some(mut results) = self.store.get_results(id).await? {
            results.cancelled_at = Some(now);
            results.cancellation_reason = Some(reason.to_string());
            self.store.put_results(results).await?;
        }
        match self.store.get_status(id).await? {
            Some(mut status) => {
                status.transition(JobState::Cancelled, now);
                status.detail = Some("Cancelled".into());
                self.store.put_status(status).await?;
            }
            None => {
                self.store
                    .put_status(JobStatus::new(id, JobState::Cancelled, now).with_detail("Cancelled"))
                    .await?;
            }
        }
        Ok(())
    }

    /// `wait_for_completion(id, timeout)` (`spec.md` §4.4): polls at 1s
    /// interval; resolves on COMPLETE, raises on FAILED/CANCELLED, times out
    /// after `timeout` (caller-supplied; `DEFAULT_WAIT_TIMEOUT` if unsure).
    pub async fn wait_for_completion(&self, id: &str, timeout: Duration) -> Result<(), OrchestrationError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let status = self
                .store
                .get_status(id)
                .await?
                .ok_or_else(|| OrchestrationError::NotFound(id.to_string()))?;
            match status.state {
                JobState::Complete => return Ok(()),
                JobState::Failed => {
                    return Err(OrchestrationError::Internal(format!("job {id} failed")))
                }
                JobState::Cancelled => return Err(OrchestrationError::Cancelled(id.to_string())),
                _ => {}
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(OrchestrationError::Internal(format!(
                    "timed out waiting for job {id} to complete"
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryJobStore;

    #[tokio::test]
    async fn interrupt_on_unknown_job_is_a_no_op() {
        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let executor = JobExecutor::new(store, 3);
        assert!(!executor.interrupt("missing-job").await.unwrap());
    }

    #[tokio::test]
    async fn interrupt_marks_orphaned_non_terminal_job_cancelled() {
        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        store
            .put_status(JobStatus::new("job-1", JobState::Assets, Utc::now()))
            .await
            .unwrap();
        let executor = JobExecutor::new(store.clone(), 3);

        assert!(executor.interrupt("job-1").await.unwrap());
        let status = store.get_status("job-1").await.unwrap().unwrap();
        assert_eq!(status.state, JobState::Cancelled);
        assert!(!executor.is_executing("job-1").await.unwrap());
    }

    #[tokio::test]
    async fn is_executing_false_for_unknown_job() {
        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let executor = JobExecutor::new(store, 3);
        assert!(!executor.is_executing("missing-job").await.unwrap());
    }
}
