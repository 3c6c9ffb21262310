//! Replay preserves starred threats (`spec.md` §8 scenario 5). A job with 5
//! prior threats (2 starred) is replayed at `iteration=0`. The executor must
//! snapshot the original 5 into `backup` before narrowing `threat_list` to
//! the 2 starred threats, and `generate_summary`'s replay branch must not
//! silently restore the full catalog over that filter. The trail's
//! `threats`/`gaps` narratives reset on replay re-entry.

mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use threat_modeling_core::credentials::{ModelProvider, StageId};
use threat_modeling_core::executor::{ExecuteParams, JobExecutor};
use threat_modeling_core::schemas::{
    AssetsList, FlowsList, JobResults, JobState, JobStatus, JobTrail, Likelihood, StrideCategory,
    Threat, ThreatsList,
};
use threat_modeling_core::store::{InMemoryJobStore, JobStore};

use support::{gap_stop_response, threat_json, threats_response, ScriptedProvider, ScriptedTurn};

const DESCRIPTION: &str = "An attacker could exploit a weak session token to impersonate a \
    legitimate user and gain unauthorized access to sensitive account operations without \
    detection, allowing them to modify financial records, exfiltrate confidential customer \
    data, and disrupt normal service operations for an extended period.";

fn threat(name: &str, category: StrideCategory, starred: bool) -> Threat {
    Threat::new(
        name,
        category,
        DESCRIPTION,
        "auth service",
        "account takeover",
        Likelihood::Medium,
        vec!["Enforce short-lived tokens".into(), "Rotate secrets".into()],
        "automated analysis",
        vec![],
        "network",
    )
    .unwrap()
    .starred(starred)
}

#[tokio::test]
async fn replay_filters_to_starred_but_backs_up_the_full_catalog() {
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let job_id = "job-replay-1";

    let original_threats = ThreatsList::new(vec![
        threat("starred-spoof", StrideCategory::Spoofing, true),
        threat("starred-tamper", StrideCategory::Tampering, true),
        threat("unstarred-repudiation", StrideCategory::Repudiation, false),
        threat("unstarred-disclosure", StrideCategory::InformationDisclosure, false),
        threat("unstarred-dos", StrideCategory::DenialOfService, false),
    ]);

    let mut results = JobResults::new(job_id, "System", "A description.", vec![]);
    results.assets = Some(AssetsList::default());
    results.system_architecture = Some(FlowsList::default());
    results.threat_list = Some(original_threats);
    results.retry = 1;
    store.put_results(results).await.unwrap();
    store
        .put_status(JobStatus::new(job_id, JobState::Complete, chrono::Utc::now()))
        .await
        .unwrap();
    store
        .update_trail(
            job_id,
            threat_modeling_core::store::TrailUpdate {
                assets: Some("asset narrative".into()),
                flows: Some("flow narrative".into()),
                gaps: vec!["earlier gap note".into()],
                threats: vec!["earlier threat note".into()],
            },
        )
        .await
        .unwrap();

    let executor = JobExecutor::new(store.clone(), 3);

    let provider = ScriptedProvider::new();
    provider.push_stage(StageId::Gaps, gap_stop_response());
    provider.push_agent_turn(ScriptedTurn::Tool {
        name: "add_threats",
        args: threats_response(vec![
            threat_json("new-repudiation", "Repudiation"),
            threat_json("new-disclosure", "InformationDisclosure"),
            threat_json("new-dos", "DenialOfService"),
            threat_json("new-elevation", "ElevationOfPrivilege"),
        ]),
    });
    provider.push_agent_turn(ScriptedTurn::Tool {
        name: "gap_analysis",
        args: json!({}),
    });
    provider.push_agent_turn(ScriptedTurn::Finish("The catalog is complete."));
    let model_provider: Arc<dyn ModelProvider> = Arc::new(provider);

    let params = ExecuteParams {
        id: Some(job_id.to_string()),
        s3_location: None,
        upload_key: None,
        iteration: 0,
        reasoning: 1,
        title: None,
        description: None,
        assumptions: vec![],
        replay: true,
        instructions: None,
    };

    executor
        .execute(params, model_provider, false, "openai")
        .await
        .unwrap();

    // Backup and the starred-only filter are applied synchronously inside
    // execute(), before the background task ever begins.
    let just_replayed = store.get_results(job_id).await.unwrap().unwrap();
    let backup = just_replayed.backup.as_ref().expect("replay must capture a backup");
    assert_eq!(backup.threat_list.as_ref().unwrap().threats.len(), 5, "backup keeps the original 5");
    assert_eq!(
        just_replayed.threat_list.as_ref().unwrap().threats.len(),
        2,
        "the live catalog is narrowed to the 2 starred threats before the graph runs"
    );

    executor
        .wait_for_completion(job_id, Duration::from_secs(10))
        .await
        .unwrap();

    let final_results = store.get_results(job_id).await.unwrap().unwrap();
    let final_threats = final_results.threat_list.unwrap();
    assert_eq!(final_threats.threats.len(), 6, "2 starred + 4 newly added");
    assert!(final_threats.threats.iter().any(|t| t.name == "starred-spoof"));
    assert!(final_threats.threats.iter().any(|t| t.name == "starred-tamper"));
    assert!(!final_threats.threats.iter().any(|t| t.name == "unstarred-repudiation"));

    let backup_after = final_results.backup.unwrap();
    assert_eq!(backup_after.threat_list.unwrap().threats.len(), 5, "backup still holds the original 5");

    let trail = store.get_trail(job_id).await.unwrap().unwrap_or_else(|| JobTrail::new(job_id));
    assert!(trail.threats.is_empty(), "replay must clear the threats narrative");
    assert!(trail.gaps.is_empty(), "replay must clear the gaps narrative");
    assert_eq!(trail.assets, "asset narrative", "assets narrative survives replay");
}
