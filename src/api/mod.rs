//! Thin RPC surface (C9, `spec.md` §4.7, §6). Generalizes teacher's pattern of
//! a single façade type wrapping a chain/agent (e.g. `ConversationalChain`)
//! behind a handful of public methods; here the façade wraps the executor and
//! the state store instead of a single model call.

mod dto;

pub use dto::{
    ErrorResponse, ResultsResponse, ResultsState, StartRequest, StatusResponse, TrailResponse,
    UpdatePatch, UploadUrlResponse,
};

use std::sync::Arc;

use uuid::Uuid;

use crate::credentials::{ConfigModelProvider, Credentials, ModelProvider, Provider, ReasoningLevel, RuntimeConfig};
use crate::errors::OrchestrationError;
use crate::executor::{ExecuteParams, JobExecutor};
use crate::schemas::{JobResults, JobState, JobStatus, JobTrail, UploadedFile};
use crate::store::JobStore;

/// Façade the transport layer (HTTP handler, RPC dispatcher, ...) sits behind.
/// Holds the same store handle the executor persists through, so reads never
/// have to go through the executor (`spec.md` §5 "shared-resource policy").
pub struct ThreatModelingApi {
    executor: JobExecutor,
    store: Arc<dyn JobStore>,
}

impl ThreatModelingApi {
    pub fn new(store: Arc<dyn JobStore>, max_retry: u32) -> Self {
        Self {
            executor: JobExecutor::new(store.clone(), max_retry),
            store,
        }
    }

    pub fn builder() -> ThreatModelingApiBuilder {
        ThreatModelingApiBuilder::default()
    }

    /// `start_threat_modeling` (`spec.md` §4.7, §6 "Start job"). Validation of
    /// the required fields per `replay` happens inside [`JobExecutor::execute`].
    /// Maps any failure to the wire envelope with the provider family this
    /// call itself selected, the way a transport adapter would.
    pub async fn start_threat_modeling(
        &self,
        request: StartRequest,
        config: RuntimeConfig,
        credentials: Credentials,
    ) -> Result<String, ErrorResponse> {
        let reasoning: ReasoningLevel = request.reasoning;
        let params = ExecuteParams {
            id: request.id,
            s3_location: request.s3_location,
            upload_key: request.upload_key,
            iteration: request.iteration,
            reasoning,
            title: request.title,
            description: request.description,
            assumptions: request.assumptions,
            replay: request.replay,
            instructions: request.instructions,
        };
        let is_bedrock = matches!(config.provider, Provider::Bedrock);
        let provider_label = if is_bedrock { "bedrock" } else { "openai" };
        let model_provider: Arc<dyn ModelProvider> = Arc::new(ConfigModelProvider::new(config, credentials));
        self.executor
            .execute(params, model_provider, is_bedrock, provider_label)
            .await
            .map_err(|e| ErrorResponse::from_error(&e, !is_bedrock, None))
    }

    /// `get_status(id)` (`spec.md` §6 "Status response").
    pub async fn get_status(&self, id: &str) -> Result<StatusResponse, ErrorResponse> {
        let status = self
            .store
            .get_status(id)
            .await
            .map_err(|e| ErrorResponse::from_error(&e.into(), false, Some(id.to_string())))?
            .ok_or_else(|| ErrorResponse::from_error(&OrchestrationError::NotFound(id.to_string()), false, Some(id.to_string())))?;
        Ok(StatusResponse::from(status))
    }

    /// `get_trail(id)` (`spec.md` §6 "Trail response").
    pub async fn get_trail(&self, id: &str) -> Result<TrailResponse, ErrorResponse> {
        let trail = self
            .store
            .get_trail(id)
            .await
            .map_err(|e| ErrorResponse::from_error(&e.into(), false, Some(id.to_string())))?
            .unwrap_or_else(|| JobTrail::new(id));
        Ok(TrailResponse::from(trail))
    }

    /// `get_results(id)` (`spec.md` §6 "Results response"). Absence is not an
    /// error here: the response itself carries the Found/Not Found state.
    pub async fn get_results(&self, id: &str) -> Result<ResultsResponse, ErrorResponse> {
        let item = self
            .store
            .get_results(id)
            .await
            .map_err(|e| ErrorResponse::from_error(&e.into(), false, Some(id.to_string())))?;
        Ok(ResultsResponse::new(id, item))
    }

    /// `get_all_results()` (`spec.md` §4.7).
    pub async fn get_all_results(&self) -> Result<Vec<JobResults>, ErrorResponse> {
        self.store
            .get_all_results()
            .await
            .map_err(|e| ErrorResponse::from_error(&e.into(), false, None))
    }

    /// `update_tm(id, patch)` (`spec.md` §4.7, §6 "Update", §8 round-trip law).
    /// Rejects attempts to change `{owner, s3_location, job_id}` outright
    /// rather than silently ignoring them, so callers learn of the mistake.
    pub async fn update_tm(&self, id: &str, patch: UpdatePatch) -> Result<JobResults, ErrorResponse> {
        if patch.owner.is_some() || patch.s3_location.is_some() || patch.job_id.is_some() {
            let err = OrchestrationError::Validation("owner, s3_location, and job_id are locked fields".into());
            return Err(ErrorResponse::from_error(&err, false, Some(id.to_string())));
        }
        let mut results = self
            .store
            .get_results(id)
            .await
            .map_err(|e| ErrorResponse::from_error(&e.into(), false, Some(id.to_string())))?
            .ok_or_else(|| ErrorResponse::from_error(&OrchestrationError::NotFound(id.to_string()), false, Some(id.to_string())))?;

        results.capture_backup_if_absent();
        patch.apply(&mut results);
        self.store
            .put_results(results.clone())
            .await
            .map_err(|e| ErrorResponse::from_error(&e.into(), false, Some(id.to_string())))?;
        Ok(results)
    }

    /// `restore_tm(id)` (`spec.md` §4.7, §6 "Restore", §8 round-trip law).
    pub async fn restore_tm(&self, id: &str) -> Result<JobResults, ErrorResponse> {
        let mut results = self
            .store
            .get_results(id)
            .await
            .map_err(|e| ErrorResponse::from_error(&e.into(), false, Some(id.to_string())))?
            .ok_or_else(|| ErrorResponse::from_error(&OrchestrationError::NotFound(id.to_string()), false, Some(id.to_string())))?;

        if !results.restore_from_backup() {
            let err = OrchestrationError::Validation(format!("job {id} has no backup to restore from"));
            return Err(ErrorResponse::from_error(&err, false, Some(id.to_string())));
        }
        self.store
            .put_results(results.clone())
            .await
            .map_err(|e| ErrorResponse::from_error(&e.into(), false, Some(id.to_string())))?;

        let now = chrono::Utc::now();
        match self
            .store
            .get_status(id)
            .await
            .map_err(|e| ErrorResponse::from_error(&e.into(), false, Some(id.to_string())))?
        {
            Some(mut status) => {
                status.transition(JobState::Complete, now);
                self.store
                    .put_status(status)
                    .await
                    .map_err(|e| ErrorResponse::from_error(&e.into(), false, Some(id.to_string())))?;
            }
            None => {
                self.store
                    .put_status(JobStatus::new(id, JobState::Complete, now))
                    .await
                    .map_err(|e| ErrorResponse::from_error(&e.into(), false, Some(id.to_string())))?;
            }
        }
        Ok(results)
    }

    /// `delete_tm(id)` (`spec.md` §4.7).
    pub async fn delete_tm(&self, id: &str) -> Result<(), ErrorResponse> {
        self.store
            .delete_results(id)
            .await
            .map_err(|e| ErrorResponse::from_error(&e.into(), false, Some(id.to_string())))?;
        self.store
            .remove_from_job_index(id)
            .await
            .map_err(|e| ErrorResponse::from_error(&e.into(), false, Some(id.to_string())))?;
        Ok(())
    }

    /// `generate_upload_url(mime_type)` (`spec.md` §6 "Upload"). There is no
    /// object-storage backend behind this crate's in-memory store, so the
    /// "presigned" URI is an opaque local token the caller round-trips back
    /// through [`Self::get_download_blob`]; a durable port would replace this
    /// with a real object-store presign call (`spec.md` §9 design note on
    /// swappable ports).
    pub async fn generate_upload_url(&self, mime_type: &str) -> Result<UploadUrlResponse, ErrorResponse> {
        let name = Uuid::new_v4().to_string();
        let placeholder = UploadedFile::errored(mime_type, chrono::Utc::now(), "not yet uploaded");
        self.store
            .put_upload(&name, placeholder)
            .await
            .map_err(|e| ErrorResponse::from_error(&e.into(), false, None))?;
        Ok(UploadUrlResponse {
            presigned: format!("local-upload://{name}"),
            name,
        })
    }

    /// Completes an upload started by [`Self::generate_upload_url`]. Stands in
    /// for the "client stores the blob in the keyed upload store" step of
    /// `spec.md` §6 "Upload", which in a durable port happens out of band
    /// (the client PUTs directly to the presigned URI).
    pub async fn complete_upload(
        &self,
        name: &str,
        data: String,
        mime_type: &str,
    ) -> Result<(), ErrorResponse> {
        let file = UploadedFile::new(data, mime_type, chrono::Utc::now());
        self.store
            .put_upload(name, file)
            .await
            .map_err(|e| ErrorResponse::from_error(&e.into(), false, None))
    }

    /// `get_download_blob(name)` (`spec.md` §6 "Upload").
    pub async fn get_download_blob(&self, name: &str) -> Result<UploadedFile, ErrorResponse> {
        self.store
            .get_upload(name)
            .await
            .map_err(|e| ErrorResponse::from_error(&e.into(), false, Some(name.to_string())))?
            .ok_or_else(|| ErrorResponse::from_error(&OrchestrationError::NotFound(name.to_string()), false, Some(name.to_string())))
    }
}

/// Builder for [`ThreatModelingApi`], mirroring teacher's `OpenAIBuilder`
/// (`src/llm/openai/builder.rs`): a default-constructible config object with
/// `with_*` setters and a terminal `build()`.
pub struct ThreatModelingApiBuilder {
    store: Option<Arc<dyn JobStore>>,
    max_retry: u32,
}

impl Default for ThreatModelingApiBuilder {
    fn default() -> Self {
        Self {
            store: None,
            max_retry: 3,
        }
    }
}

impl ThreatModelingApiBuilder {
    pub fn with_store(mut self, store: Arc<dyn JobStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry;
        self
    }

    /// Falls back to a fresh [`crate::store::InMemoryJobStore`] if none was
    /// supplied, since that is the only store port this crate ships.
    pub fn build(self) -> ThreatModelingApi {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(crate::store::InMemoryJobStore::new()));
        ThreatModelingApi::new(store, self.max_retry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryJobStore;

    fn store() -> Arc<dyn JobStore> {
        Arc::new(InMemoryJobStore::new())
    }

    #[tokio::test]
    async fn update_tm_rejects_locked_fields() {
        let api = ThreatModelingApi::new(store(), 3);
        let mut patch = UpdatePatch::default();
        patch.owner = Some(Some("someone".into()));
        let err = api.update_tm("job-1", patch).await.unwrap_err();
        assert_eq!(err.error, "VALIDATION_ERROR");
        assert_eq!(err.http_status, 400);
    }

    #[tokio::test]
    async fn update_tm_captures_backup_only_once() {
        let s = store();
        s.put_results(JobResults::new("job-1", "t", "d", vec![])).await.unwrap();
        let api = ThreatModelingApi::new(s.clone(), 3);

        let mut patch = UpdatePatch::default();
        patch.title = Some("new title".into());
        let after_first = api.update_tm("job-1", patch).await.unwrap();
        assert!(after_first.backup.is_some());

        let mut patch2 = UpdatePatch::default();
        patch2.title = Some("second title".into());
        let after_second = api.update_tm("job-1", patch2).await.unwrap();
        assert_eq!(after_second.title, "second title");
        // Backup was captured before the first update ever touched the title.
        assert_eq!(after_second.backup.unwrap().assets, None);
    }

    #[tokio::test]
    async fn restore_tm_requires_backup() {
        let s = store();
        s.put_results(JobResults::new("job-1", "t", "d", vec![])).await.unwrap();
        let api = ThreatModelingApi::new(s, 3);
        let err = api.restore_tm("job-1").await.unwrap_err();
        assert_eq!(err.error, "VALIDATION_ERROR");
        assert_eq!(err.job_id.as_deref(), Some("job-1"));
    }

    #[tokio::test]
    async fn restore_tm_transitions_to_complete() {
        use crate::schemas::AssetsList;

        let s = store();
        let mut results = JobResults::new("job-1", "t", "d", vec![]);
        results.assets = Some(AssetsList::default());
        results.capture_backup_if_absent();
        results.assets = None;
        s.put_results(results).await.unwrap();
        s.put_status(JobStatus::new("job-1", JobState::Threat, chrono::Utc::now()))
            .await
            .unwrap();

        let api = ThreatModelingApi::new(s.clone(), 3);
        let restored = api.restore_tm("job-1").await.unwrap();
        assert!(restored.assets.is_some());
        let status = s.get_status("job-1").await.unwrap().unwrap();
        assert_eq!(status.state, JobState::Complete);
    }

    #[tokio::test]
    async fn upload_round_trip() {
        let api = ThreatModelingApi::new(store(), 3);
        let created = api.generate_upload_url("image/png").await.unwrap();
        assert!(!created.name.is_empty());

        api.complete_upload(&created.name, "base64data".into(), "image/png")
            .await
            .unwrap();
        let blob = api.get_download_blob(&created.name).await.unwrap();
        assert!(blob.is_available());
        assert_eq!(blob.data.as_deref(), Some("base64data"));
    }

    #[tokio::test]
    async fn get_status_maps_missing_job_to_not_found_wire_category() {
        let api = ThreatModelingApi::new(store(), 3);
        let err = api.get_status("missing").await.unwrap_err();
        assert_eq!(err.error, "NOT_FOUND");
        assert_eq!(err.http_status, 404);
        assert_eq!(err.job_id.as_deref(), Some("missing"));
    }

    #[tokio::test]
    async fn get_results_reports_not_found_without_erroring() {
        let api = ThreatModelingApi::new(store(), 3);
        let response = api.get_results("missing").await.unwrap();
        assert_eq!(response.state, ResultsState::NotFound);
        assert!(response.item.is_none());
    }
}
