//! Image storage scenario (`spec.md` §8 "Image storage"): when the stored
//! upload blob carries `{data: null, error}`, stages still run to completion
//! with the diagram omitted from the prompt. Also covers the happy path
//! where a real base64 blob is attached.

mod support;

use std::sync::Arc;
use std::time::Duration;

use threat_modeling_core::credentials::StageId;
use threat_modeling_core::executor::{ExecuteParams, JobExecutor};
use threat_modeling_core::schemas::{JobState, UploadedFile};
use threat_modeling_core::store::{InMemoryJobStore, JobStore};

use support::{empty_assets_response, empty_flows_response, summary_response, threat_json, threats_response, ScriptedProvider};

fn base_params(upload_key: Option<String>) -> ExecuteParams {
    ExecuteParams {
        id: None,
        s3_location: None,
        upload_key,
        iteration: 1,
        reasoning: 0,
        title: Some("System with diagram".into()),
        description: Some("A service with an uploaded architecture diagram.".into()),
        assumptions: vec![],
        replay: false,
        instructions: None,
    }
}

fn scripted_provider() -> Arc<ScriptedProvider> {
    let provider = ScriptedProvider::new();
    provider.push_stage(StageId::Summary, summary_response("A service."));
    provider.push_stage(StageId::Assets, empty_assets_response());
    provider.push_stage(StageId::Flows, empty_flows_response());
    provider.push_stage(
        StageId::Threats,
        threats_response(vec![threat_json("Session hijack", "Spoofing")]),
    );
    Arc::new(provider)
}

#[tokio::test]
async fn job_completes_when_upload_blob_has_no_data() {
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let executor = JobExecutor::new(store.clone(), 5);

    store
        .put_upload(
            "diagram-1",
            UploadedFile::errored("image/png", chrono::Utc::now(), "storage quota exceeded"),
        )
        .await
        .unwrap();

    let provider = scripted_provider();
    let id = executor
        .execute(base_params(Some("diagram-1".into())), provider.clone(), false, "openai")
        .await
        .unwrap();

    executor
        .wait_for_completion(&id, Duration::from_secs(10))
        .await
        .unwrap();

    let status = store.get_status(&id).await.unwrap().unwrap();
    assert_eq!(status.state, JobState::Complete);

    // No usable blob: the diagram must be omitted from every stage's prompt,
    // while the rest of the stage payload (description/assumptions/directive
    // text) still makes it through (`spec.md` §4.6, §8 "Image storage").
    let summary_messages = provider.captured_messages(StageId::Summary).unwrap();
    assert!(summary_messages.iter().all(|m| m.images.is_none()));
    let human = summary_messages
        .iter()
        .find(|m| m.content.contains("<description>"))
        .expect("description tag should still reach the prompt without a diagram");
    assert!(human.content.contains("no diagram available"));
}

#[tokio::test]
async fn job_completes_when_upload_key_is_unknown() {
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let executor = JobExecutor::new(store.clone(), 5);

    let provider = scripted_provider();
    let id = executor
        .execute(base_params(Some("missing-key".into())), provider.clone(), false, "openai")
        .await
        .unwrap();

    executor
        .wait_for_completion(&id, Duration::from_secs(10))
        .await
        .unwrap();

    let status = store.get_status(&id).await.unwrap().unwrap();
    assert_eq!(status.state, JobState::Complete);

    let summary_messages = provider.captured_messages(StageId::Summary).unwrap();
    assert!(summary_messages.iter().all(|m| m.images.is_none()));
}

#[tokio::test]
async fn job_completes_with_a_real_diagram_attached() {
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let executor = JobExecutor::new(store.clone(), 5);

    store
        .put_upload(
            "diagram-2",
            UploadedFile::new("aGVsbG8=".into(), "image/png", chrono::Utc::now()),
        )
        .await
        .unwrap();

    let provider = scripted_provider();
    let id = executor
        .execute(base_params(Some("diagram-2".into())), provider.clone(), false, "openai")
        .await
        .unwrap();

    executor
        .wait_for_completion(&id, Duration::from_secs(10))
        .await
        .unwrap();

    let status = store.get_status(&id).await.unwrap().unwrap();
    assert_eq!(status.state, JobState::Complete);

    // A real blob: every generative stage's human message must carry both
    // the image and the surrounding text payload (`spec.md` §4.6).
    let summary_messages = provider.captured_messages(StageId::Summary).unwrap();
    let human = summary_messages
        .iter()
        .find(|m| m.images.is_some())
        .expect("diagram should be attached to a human message");
    assert!(!human.content.is_empty(), "text payload must survive alongside the image");
    assert_eq!(human.images.as_ref().unwrap().len(), 1);
}
