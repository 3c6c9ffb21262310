//! Interrupt during an in-flight model call (`spec.md` §8 scenario 4):
//! cancelling while `define_flows` is blocked inside its model invocation
//! must still mark the job CANCELLED immediately, record
//! `cancelled_at`/`cancellation_reason`, drop the registry entry, and leave
//! `is_executing` false — all before the blocked call itself ever returns.

mod support;

use std::sync::Arc;
use std::time::Duration;

use threat_modeling_core::credentials::{ModelProvider, StageId};
use threat_modeling_core::executor::{ExecuteParams, JobExecutor};
use threat_modeling_core::schemas::JobState;
use threat_modeling_core::store::{InMemoryJobStore, JobStore};

use support::{empty_assets_response, empty_flows_response, summary_response, GatedProvider};

#[tokio::test]
async fn interrupt_during_model_call_cancels_immediately() {
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let executor = JobExecutor::new(store.clone(), 3);

    let gated = GatedProvider::new(StageId::Flows, empty_flows_response());
    let entered = gated.entered.clone();
    let proceed = gated.proceed.clone();
    gated.inner.push_stage(StageId::Summary, summary_response("A logistics platform."));
    gated.inner.push_stage(StageId::Assets, empty_assets_response());
    let model_provider: Arc<dyn ModelProvider> = Arc::new(gated);

    let params = ExecuteParams {
        id: None,
        s3_location: None,
        upload_key: None,
        iteration: 2,
        reasoning: 1,
        title: Some("Logistics".into()),
        description: Some("A logistics platform.".into()),
        assumptions: vec![],
        replay: false,
        instructions: None,
    };

    let id = executor
        .execute(params, model_provider, false, "openai")
        .await
        .unwrap();

    // Wait until define_flows has entered its model call.
    tokio::time::timeout(Duration::from_secs(5), entered.notified())
        .await
        .expect("define_flows should have entered its model call");

    let interrupted = executor.interrupt(&id).await.unwrap();
    assert!(interrupted);

    let status = store.get_status(&id).await.unwrap().unwrap();
    assert_eq!(status.state, JobState::Cancelled);

    let results = store.get_results(&id).await.unwrap().unwrap();
    assert!(results.cancelled_at.is_some());
    assert_eq!(results.cancellation_reason.as_deref(), Some("interrupted by request"));
    assert!(!executor.is_executing(&id).await.unwrap());

    // Unblock the stuck background task so it can observe the cancellation
    // and exit cleanly rather than leaking for the rest of the test binary.
    proceed.notify_one();
    tokio::time::sleep(Duration::from_millis(100)).await;
}
