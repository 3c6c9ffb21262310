//! Wire DTOs for the API adapter (`spec.md` §6). Kept separate from the
//! façade methods so the request/response shapes can be serialized directly
//! by whatever transport the caller wires up (HTTP, RPC, in-process tests).

use serde::{Deserialize, Serialize};

use crate::credentials::ReasoningLevel;
use crate::errors::OrchestrationError;
use crate::schemas::{AssetsList, FlowsList, JobResults, JobStatus, JobTrail, ThreatsList};

/// Wire error envelope (`spec.md` §6 "Error taxonomy"): the transport
/// boundary's view of an [`OrchestrationError`], built from
/// [`OrchestrationError::kind`]'s `label()`/`http_status()` pair rather than
/// leaking the internal error enum to callers.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    pub http_status: u16,
    pub job_id: Option<String>,
}

impl ErrorResponse {
    pub fn from_error(err: &OrchestrationError, provider_is_openai: bool, job_id: Option<String>) -> Self {
        let kind = err.kind(provider_is_openai);
        Self {
            error: kind.label(),
            message: err.to_string(),
            http_status: kind.http_status(),
            job_id,
        }
    }
}

impl From<OrchestrationError> for ErrorResponse {
    /// Default conversion for call sites with no provider context to offer.
    /// Only `OrchestrationError::Model` varies its category on
    /// `provider_is_openai`, and none of the non-generative façade methods
    /// (status/trail/results/update/restore/delete/upload) ever produce one;
    /// call sites that can produce a `Model` error use
    /// [`ErrorResponse::from_error`] directly with the known provider instead.
    fn from(err: OrchestrationError) -> Self {
        ErrorResponse::from_error(&err, false, None)
    }
}

/// `spec.md` §6 "Start job" request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartRequest {
    pub id: Option<String>,
    pub s3_location: Option<String>,
    /// Key returned by a prior `generate_upload_url` call (`spec.md` §6
    /// "Upload"); looked up in the upload store so the diagram can be
    /// attached to every generative stage's prompt.
    pub upload_key: Option<String>,
    #[serde(default)]
    pub iteration: u32,
    #[serde(default)]
    pub reasoning: ReasoningLevel,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub replay: bool,
    pub instructions: Option<String>,
}

/// `spec.md` §6 "Status response": `{id, state, retry, detail|null}`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub id: String,
    pub state: crate::schemas::JobState,
    pub retry: u32,
    pub detail: Option<String>,
}

impl From<JobStatus> for StatusResponse {
    fn from(status: JobStatus) -> Self {
        Self {
            id: status.id,
            state: status.state,
            retry: status.retry,
            detail: status.detail,
        }
    }
}

/// `spec.md` §6 "Trail response": `{id, assets, flows, gaps, threats}`.
#[derive(Debug, Clone, Serialize)]
pub struct TrailResponse {
    pub id: String,
    pub assets: String,
    pub flows: String,
    pub gaps: Vec<String>,
    pub threats: Vec<String>,
}

impl From<JobTrail> for TrailResponse {
    fn from(trail: JobTrail) -> Self {
        Self {
            id: trail.id,
            assets: trail.assets,
            flows: trail.flows,
            gaps: trail.gaps,
            threats: trail.threats,
        }
    }
}

/// `spec.md` §6 "Results response": `{job_id, state ∈ {Found, Not Found}, item}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum ResultsState {
    Found,
    NotFound,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultsResponse {
    pub job_id: String,
    pub state: ResultsState,
    pub item: Option<JobResults>,
}

impl ResultsResponse {
    pub fn new(job_id: &str, item: Option<JobResults>) -> Self {
        let state = if item.is_some() { ResultsState::Found } else { ResultsState::NotFound };
        Self {
            job_id: job_id.to_string(),
            state,
            item,
        }
    }
}

/// `spec.md` §6 "Upload" response: `{presigned, name}`.
#[derive(Debug, Clone, Serialize)]
pub struct UploadUrlResponse {
    pub presigned: String,
    pub name: String,
}

/// Partial update for `update_tm` (`spec.md` §4.7, §6 "Update"). `owner`,
/// `s3_location`, and `job_id` are present only so the façade can detect and
/// reject an attempt to set them — they are never applied.
///
/// Every other field is `Option<Option<T>>`-or-plain-`Option<T>` depending on
/// whether the underlying field is itself optional: the outer `Option`
/// distinguishes "not present in the patch" from "present", and for fields
/// that are `Option<T>` on `JobResults` the inner `Option` carries the new
/// value (including an explicit clear via `Some(None)`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePatch {
    pub owner: Option<Option<String>>,
    pub s3_location: Option<Option<String>>,
    pub job_id: Option<String>,

    pub title: Option<String>,
    pub description: Option<String>,
    pub summary: Option<Option<String>>,
    pub assumptions: Option<Vec<String>>,
    pub assets: Option<Option<AssetsList>>,
    pub system_architecture: Option<Option<FlowsList>>,
    pub threat_list: Option<Option<ThreatsList>>,
}

impl UpdatePatch {
    /// Applies every present field onto `results` (last-writer-wins per field;
    /// `spec.md` §6 "Update"). Caller has already rejected locked fields.
    pub fn apply(self, results: &mut JobResults) {
        if let Some(title) = self.title {
            results.title = title;
        }
        if let Some(description) = self.description {
            results.description = description;
        }
        if let Some(summary) = self.summary {
            results.summary = summary;
        }
        if let Some(assumptions) = self.assumptions {
            results.assumptions = assumptions;
        }
        if let Some(assets) = self.assets {
            results.assets = assets;
        }
        if let Some(system_architecture) = self.system_architecture {
            results.system_architecture = system_architecture;
        }
        if let Some(threat_list) = self.threat_list {
            results.threat_list = threat_list;
        }
    }
}
