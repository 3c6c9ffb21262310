use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::schemas::{JobResults, JobStatus, JobTrail, UploadedFile};

use super::{JobStore, StoreError, TrailUpdate};

/// Default (and only) `JobStore` backend. Key prefixes mirror `spec.md` §4.3
/// (`tm_job_status_*`, `tm_job_results_*`, `tm_job_trail_*`, `tm_all_jobs`,
/// `tm_uploaded_files_*`) even though each is its own `HashMap` here rather
/// than a single flat namespace — the prefixes are preserved as doc
/// references for anyone porting this to a real flat kv store.
#[derive(Default)]
pub struct InMemoryJobStore {
    status: Arc<RwLock<HashMap<String, JobStatus>>>,
    results: Arc<RwLock<HashMap<String, JobResults>>>,
    trail: Arc<RwLock<HashMap<String, JobTrail>>>,
    job_index: Arc<RwLock<Vec<String>>>,
    uploads: Arc<RwLock<HashMap<String, UploadedFile>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl From<InMemoryJobStore> for Arc<dyn JobStore> {
    fn from(store: InMemoryJobStore) -> Self {
        Arc::new(store)
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn put_status(&self, status: JobStatus) -> Result<(), StoreError> {
        self.status.write().await.insert(status.id.clone(), status);
        Ok(())
    }

    async fn get_status(&self, id: &str) -> Result<Option<JobStatus>, StoreError> {
        Ok(self.status.read().await.get(id).cloned())
    }

    async fn put_results(&self, results: JobResults) -> Result<(), StoreError> {
        self.results
            .write()
            .await
            .insert(results.job_id.clone(), results);
        Ok(())
    }

    async fn get_results(&self, id: &str) -> Result<Option<JobResults>, StoreError> {
        Ok(self.results.read().await.get(id).cloned())
    }

    async fn get_all_results(&self) -> Result<Vec<JobResults>, StoreError> {
        Ok(self.results.read().await.values().cloned().collect())
    }

    async fn delete_results(&self, id: &str) -> Result<(), StoreError> {
        self.results.write().await.remove(id);
        self.status.write().await.remove(id);
        self.trail.write().await.remove(id);
        self.job_index.write().await.retain(|existing| existing != id);
        Ok(())
    }

    async fn get_trail(&self, id: &str) -> Result<Option<JobTrail>, StoreError> {
        Ok(self.trail.read().await.get(id).cloned())
    }

    async fn update_trail(&self, id: &str, update: TrailUpdate) -> Result<JobTrail, StoreError> {
        let mut guard = self.trail.write().await;
        let trail = guard
            .entry(id.to_string())
            .or_insert_with(|| JobTrail::new(id));
        if let Some(assets) = update.assets {
            trail.assets = assets;
        }
        if let Some(flows) = update.flows {
            trail.flows = flows;
        }
        crate::schemas::append_trail(&mut trail.gaps, update.gaps);
        crate::schemas::append_trail(&mut trail.threats, update.threats);
        Ok(trail.clone())
    }

    async fn reset_trail_threats_and_gaps(&self, id: &str) -> Result<(), StoreError> {
        let mut guard = self.trail.write().await;
        let trail = guard.entry(id.to_string()).or_insert_with(|| JobTrail::new(id));
        trail.reset_threats_and_gaps();
        Ok(())
    }

    async fn add_to_job_index(&self, id: &str) -> Result<(), StoreError> {
        let mut index = self.job_index.write().await;
        if !index.iter().any(|existing| existing == id) {
            index.push(id.to_string());
        }
        Ok(())
    }

    async fn job_index(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.job_index.read().await.clone())
    }

    async fn remove_from_job_index(&self, id: &str) -> Result<(), StoreError> {
        self.job_index.write().await.retain(|existing| existing != id);
        Ok(())
    }

    async fn put_upload(&self, key: &str, file: UploadedFile) -> Result<(), StoreError> {
        self.uploads.write().await.insert(key.to_string(), file);
        Ok(())
    }

    async fn get_upload(&self, key: &str) -> Result<Option<UploadedFile>, StoreError> {
        Ok(self.uploads.read().await.get(key).cloned())
    }

    async fn clear_all_data(&self) -> Result<(), StoreError> {
        self.status.write().await.clear();
        self.results.write().await.clear();
        self.trail.write().await.clear();
        self.job_index.write().await.clear();
        self.uploads.write().await.clear();
        Ok(())
    }
}
