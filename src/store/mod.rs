//! Session-scoped key/value persistence (C2, `spec.md` §4.3).
//!
//! Generalizes teacher's `Memory` trait (a message list behind
//! `Arc<RwLock<dyn Memory>>`) to the job status/results/trail/index/upload
//! records this crate persists. Per the design note in `spec.md` §9, this
//! trait is the exact seam a durable port (file, sqlite, external kv) would
//! replace; the in-memory implementation is the only one this crate ships.

mod error;
mod memory_store;

pub use error::StoreError;
pub use memory_store::InMemoryJobStore;

use async_trait::async_trait;

use crate::schemas::{JobResults, JobStatus, JobTrail, UploadedFile};

/// Appends (rather than replaces) the array-valued trail fields; all other
/// trail fields and scalar records are last-writer-wins (`spec.md` §3, §4.3).
#[derive(Debug, Clone, Default)]
pub struct TrailUpdate {
    pub assets: Option<String>,
    pub flows: Option<String>,
    pub gaps: Vec<String>,
    pub threats: Vec<String>,
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn put_status(&self, status: JobStatus) -> Result<(), StoreError>;
    async fn get_status(&self, id: &str) -> Result<Option<JobStatus>, StoreError>;

    async fn put_results(&self, results: JobResults) -> Result<(), StoreError>;
    async fn get_results(&self, id: &str) -> Result<Option<JobResults>, StoreError>;
    async fn get_all_results(&self) -> Result<Vec<JobResults>, StoreError>;
    async fn delete_results(&self, id: &str) -> Result<(), StoreError>;

    async fn get_trail(&self, id: &str) -> Result<Option<JobTrail>, StoreError>;
    /// Merges `update` into the persisted trail per the reducer rules in
    /// `spec.md` §4.3 (`assets`/`flows` overwrite, `gaps`/`threats` append).
    async fn update_trail(&self, id: &str, update: TrailUpdate) -> Result<JobTrail, StoreError>;
    /// Clears `gaps`/`threats` on replay re-entry (`spec.md` §4.1), leaving
    /// `assets`/`flows` narrative intact.
    async fn reset_trail_threats_and_gaps(&self, id: &str) -> Result<(), StoreError>;

    async fn add_to_job_index(&self, id: &str) -> Result<(), StoreError>;
    async fn job_index(&self) -> Result<Vec<String>, StoreError>;
    async fn remove_from_job_index(&self, id: &str) -> Result<(), StoreError>;

    async fn put_upload(&self, key: &str, file: UploadedFile) -> Result<(), StoreError>;
    async fn get_upload(&self, key: &str) -> Result<Option<UploadedFile>, StoreError>;

    /// Deletes every key except credentials (`spec.md` §4.3 `clear_all_data`).
    async fn clear_all_data(&self) -> Result<(), StoreError>;
}
