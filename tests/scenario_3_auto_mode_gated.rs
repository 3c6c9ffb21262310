//! Auto mode, STRIDE-coverage gating (`spec.md` §8 scenario 3): the model
//! tries to finish after covering only Spoofing/Tampering. The `continue`
//! gate rejects the attempt with feedback naming the four missing
//! categories and sends the agent back around the loop instead of
//! finalizing; only after a second `add_threats` call rounds out coverage
//! and `gap_analysis` runs does the job actually finish.

mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use threat_modeling_core::credentials::{ModelProvider, StageId};
use threat_modeling_core::executor::{ExecuteParams, JobExecutor};
use threat_modeling_core::schemas::JobState;
use threat_modeling_core::store::{InMemoryJobStore, JobStore};

use support::{
    empty_assets_response, empty_flows_response, gap_stop_response, summary_response, threat_json,
    threats_response, ScriptedProvider, ScriptedTurn,
};

#[tokio::test]
async fn incomplete_coverage_is_rejected_before_finalize() {
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let executor = JobExecutor::new(store.clone(), 3);

    let provider = ScriptedProvider::new();
    provider.push_stage(StageId::Summary, summary_response("An internal admin tool."));
    provider.push_stage(StageId::Assets, empty_assets_response());
    provider.push_stage(StageId::Flows, empty_flows_response());
    provider.push_stage(StageId::Gaps, gap_stop_response());

    provider.push_agent_turn(ScriptedTurn::Tool {
        name: "add_threats",
        args: threats_response(vec![
            threat_json("spoofed-login", "Spoofing"),
            threat_json("config-tamper", "Tampering"),
        ]),
    });
    // The model tries to stop here; continue_gate must reject this and loop back.
    provider.push_agent_turn(ScriptedTurn::Finish("I believe the catalog is complete."));
    provider.push_agent_turn(ScriptedTurn::Tool {
        name: "add_threats",
        args: threats_response(vec![
            threat_json("log-denial", "Repudiation"),
            threat_json("data-leak", "InformationDisclosure"),
            threat_json("flood-api", "DenialOfService"),
            threat_json("priv-escalation", "ElevationOfPrivilege"),
        ]),
    });
    provider.push_agent_turn(ScriptedTurn::Tool {
        name: "gap_analysis",
        args: json!({}),
    });
    provider.push_agent_turn(ScriptedTurn::Finish("Now the catalog is complete."));

    let model_provider: Arc<dyn ModelProvider> = Arc::new(provider);

    let params = ExecuteParams {
        id: None,
        s3_location: None,
        upload_key: None,
        iteration: 0,
        reasoning: 1,
        title: Some("Admin tool".into()),
        description: Some("An internal admin tool.".into()),
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
    assert_eq!(status.state, JobState::Complete);

    let results = store.get_results(&id).await.unwrap().unwrap();
    let threats = results.threat_list.unwrap();
    assert_eq!(threats.threats.len(), 6);
}
