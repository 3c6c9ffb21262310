//! Rate limit on `gap_analysis` (`spec.md` §8 scenario 6, §7). A rate-limit
//! failure from the model provider during the agent sub-graph's
//! `gap_analysis` tool call must surface as an ordinary tool-result string
//! the agent can read and retry from, not propagate as a fatal job error.

mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use threat_modeling_core::credentials::{ModelError, ModelProvider, StageId};
use threat_modeling_core::executor::{ExecuteParams, JobExecutor};
use threat_modeling_core::schemas::JobState;
use threat_modeling_core::store::{InMemoryJobStore, JobStore};

use support::{
    empty_assets_response, empty_flows_response, gap_stop_response, summary_response, threat_json,
    threats_response, ScriptedProvider, ScriptedTurn,
};

const ALL_STRIDE: [&str; 6] = [
    "Spoofing",
    "Tampering",
    "Repudiation",
    "InformationDisclosure",
    "DenialOfService",
    "ElevationOfPrivilege",
];

#[tokio::test]
async fn rate_limited_gap_analysis_is_recoverable() {
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let executor = JobExecutor::new(store.clone(), 3);

    let provider = ScriptedProvider::new();
    provider.push_stage(StageId::Summary, summary_response("A checkout service."));
    provider.push_stage(StageId::Assets, empty_assets_response());
    provider.push_stage(StageId::Flows, empty_flows_response());
    provider.push_stage_error(
        StageId::Gaps,
        ModelError::RateLimit("too many requests, try again shortly".into()),
    );
    provider.push_stage(StageId::Gaps, gap_stop_response());

    let six_threats: Vec<_> = ALL_STRIDE
        .iter()
        .enumerate()
        .map(|(i, cat)| threat_json(&format!("threat-{i}"), cat))
        .collect();
    provider.push_agent_turn(ScriptedTurn::Tool {
        name: "add_threats",
        args: threats_response(six_threats),
    });
    // First gap_analysis attempt is rate-limited; the agent must be able to
    // read that as a tool result and simply call gap_analysis again.
    provider.push_agent_turn(ScriptedTurn::Tool {
        name: "gap_analysis",
        args: json!({}),
    });
    provider.push_agent_turn(ScriptedTurn::Tool {
        name: "gap_analysis",
        args: json!({}),
    });
    provider.push_agent_turn(ScriptedTurn::Finish("The catalog is complete."));

    let model_provider: Arc<dyn ModelProvider> = Arc::new(provider);

    let params = ExecuteParams {
        id: None,
        s3_location: None,
        upload_key: None,
        iteration: 0,
        reasoning: 1,
        title: Some("Checkout".into()),
        description: Some("A checkout service.".into()),
        assumptions: vec![],
        replay: false,
        instructions: None,
    };

    let id = executor
        .execute(params, model_provider, false, "openai")
        .await
        .unwrap();
    executor
        .wait_for_completion(&id, Duration::from_secs(10))
        .await
        .unwrap();

    let status = store.get_status(&id).await.unwrap().unwrap();
    assert_eq!(status.state, JobState::Complete, "a recoverable provider error must not fail the job");

    let results = store.get_results(&id).await.unwrap().unwrap();
    assert!(results.error.is_none());
    let threats = results.threat_list.unwrap();
    assert_eq!(threats.threats.len(), 6);
}
