use serde::Deserialize;

use crate::credentials::StageId;
use crate::errors::OrchestrationError;
use crate::prompts::{MessageBuilder, PromptContext, StagePrompt};
use crate::schemas::{
    AssetsList, FlowsList, GapDecision, JobState, Merge, Threat, ThreatsList,
};
use crate::store::TrailUpdate;

use super::graph::NodeId;
use super::state::JobContext;
use super::tool_schemas;

#[derive(Deserialize)]
struct SummaryOutput {
    summary: String,
}

fn prompt_context(ctx: &JobContext, results: &crate::schemas::JobResults) -> PromptContext {
    PromptContext {
        diagram_base64: ctx.diagram_base64.clone(),
        description: Some(results.description.clone()),
        assumptions: results.assumptions.clone(),
    }
}

/// `spec.md` §4.1: entry node. Handles the replay branch (clear trail, restore
/// backup) before routing, or runs the summary generation call for a fresh job.
pub async fn generate_summary(ctx: &JobContext, replay: bool) -> Result<NodeId, OrchestrationError> {
    ctx.check_cancellation().await?;

    if replay {
        let mut results = ctx.results().await?;
        ctx.store.reset_trail_threats_and_gaps(&ctx.job_id).await?;

        // Restore assets/flows from backup so regeneration uses the
        // pre-edit context, but leave `threat_list` alone: the executor has
        // already narrowed it to starred-only threats before scheduling this
        // graph run, and restoring it here would undo that filter
        // (`spec.md` §8 scenario 5).
        if let Some(backup) = results.backup.clone() {
            results.assets = backup.assets;
            results.system_architecture = backup.system_architecture;
        }
        ctx.save_results(results).await?;
        return Ok(NodeId::ThreatsRouter);
    }

    ctx.set_status(JobState::Start, 0, None).await?;
    let results = ctx.results().await?;
    let context = prompt_context(ctx, &results);
    let stage_prompt = StagePrompt::summary();
    let human = ctx.message_builder.build(&context, &stage_prompt);
    let system = crate::schemas::Message::new_system_message(
        "You are a precise application security engineer producing a STRIDE threat model.",
    );

    let (args, reasoning, _usage) = ctx
        .invoke_stage(StageId::Summary, vec![system, human], &tool_schemas::summary_tool())
        .await?;
    let output: SummaryOutput = serde_json::from_value(args).map_err(|e| OrchestrationError::Internal(e.to_string()))?;

    let mut results = ctx.results().await?;
    results.summary = Some(output.summary);
    ctx.save_results(results).await?;
    let _ = reasoning;

    Ok(NodeId::DefineAssets)
}

pub async fn define_assets(ctx: &JobContext) -> Result<NodeId, OrchestrationError> {
    ctx.check_cancellation().await?;
    ctx.set_status(JobState::Assets, 0, None).await?;

    let results = ctx.results().await?;
    let context = prompt_context(ctx, &results);
    let stage_prompt = StagePrompt::assets();
    let human = ctx.message_builder.build(&context, &stage_prompt);
    let system = crate::schemas::Message::new_system_message(
        "You are a precise application security engineer. Identify every asset and entity.",
    );

    let (args, reasoning, _usage) = ctx
        .invoke_stage(StageId::Assets, vec![system, human], &tool_schemas::assets_tool())
        .await?;
    let assets: AssetsList = serde_json::from_value(args).map_err(|e| OrchestrationError::Internal(e.to_string()))?;
    assets.validate()?;

    let mut results = ctx.results().await?;
    results.assets = Some(assets);
    ctx.save_results(results).await?;
    if let Some(text) = reasoning {
        ctx.append_trail(TrailUpdate {
            assets: Some(text),
            ..Default::default()
        })
        .await?;
    }

    Ok(NodeId::DefineFlows)
}

pub async fn define_flows(ctx: &JobContext) -> Result<NodeId, OrchestrationError> {
    ctx.check_cancellation().await?;
    ctx.set_status(JobState::Flow, 0, None).await?;

    let results = ctx.results().await?;
    let assets = results.assets.clone().unwrap_or_default();
    let context = prompt_context(ctx, &results);
    let stage_prompt = StagePrompt::flows(&assets);
    let human = ctx.message_builder.build(&context, &stage_prompt);
    let system = crate::schemas::Message::new_system_message(
        "You are a precise application security engineer. Map data flows, trust boundaries, and threat sources.",
    );

    let (args, reasoning, _usage) = ctx
        .invoke_stage(StageId::Flows, vec![system, human], &tool_schemas::flows_tool())
        .await?;
    let flows: FlowsList = serde_json::from_value(args).map_err(|e| OrchestrationError::Internal(e.to_string()))?;
    flows.validate()?;

    let mut results = ctx.results().await?;
    results.system_architecture = Some(flows);
    ctx.save_results(results).await?;
    if let Some(text) = reasoning {
        ctx.append_trail(TrailUpdate {
            flows: Some(text),
            ..Default::default()
        })
        .await?;
    }

    Ok(NodeId::ThreatsRouter)
}

/// `spec.md` §4.1: `iteration == 0` dispatches to the agent sub-graph;
/// `iteration > 0` uses the traditional fixed-iteration path.
pub async fn threats_router(ctx: &JobContext) -> Result<NodeId, OrchestrationError> {
    if ctx.iteration == 0 {
        Ok(NodeId::ThreatsSubgraph)
    } else {
        Ok(NodeId::DefineThreats)
    }
}

/// `spec.md` §4.1 "Iteration policy for define_threats".
pub async fn define_threats(ctx: &JobContext, pending_gap: &mut Option<String>) -> Result<NodeId, OrchestrationError> {
    ctx.check_cancellation().await?;

    let status = ctx
        .store
        .get_status(&ctx.job_id)
        .await?
        .ok_or_else(|| OrchestrationError::NotFound(ctx.job_id.clone()))?;
    let retry = status.retry;

    let max_retries_reached = retry >= ctx.max_retry;
    let iteration_limit_reached = ctx.iteration != 0 && retry >= ctx.iteration;
    if max_retries_reached || iteration_limit_reached {
        return Ok(NodeId::Finalize);
    }

    ctx.set_status(JobState::Threat, retry, None).await?;

    let results = ctx.results().await?;
    let assets = results.assets.clone().unwrap_or_default();
    let flows = results.system_architecture.clone().unwrap_or_default();
    let existing = results.threat_list.clone().unwrap_or_default();

    let use_initial_prompt = retry == 0 && existing.threats.is_empty();
    let stage_prompt = if use_initial_prompt {
        StagePrompt::threats_initial(&assets, &flows)
    } else {
        StagePrompt::threats_improve(&assets, &flows, &existing, pending_gap.as_deref())
    };
    let context = prompt_context(ctx, &results);
    let human = ctx.message_builder.build(&context, &stage_prompt);
    let system = crate::schemas::Message::new_system_message(
        "You are a precise application security engineer building a STRIDE threat catalog.",
    );

    let (args, reasoning, _usage) = ctx
        .invoke_stage(StageId::Threats, vec![system, human], &tool_schemas::threats_tool())
        .await?;
    let generated: ThreatsList = serde_json::from_value(args).map_err(|e| OrchestrationError::Internal(e.to_string()))?;
    generated.validate()?;
    let merged = existing.merge(generated, false);

    let mut results = ctx.results().await?;
    results.threat_list = Some(merged);
    ctx.save_results(results).await?;
    if let Some(text) = reasoning {
        ctx.append_trail(TrailUpdate {
            threats: vec![text],
            ..Default::default()
        })
        .await?;
    }
    *pending_gap = None;

    let next_retry = retry + 1;
    ctx.set_status(JobState::Threat, next_retry, None).await?;

    if ctx.iteration == 0 {
        Ok(NodeId::GapAnalysis)
    } else {
        Ok(NodeId::DefineThreats)
    }
}

/// `spec.md` §4.1 "Gap analysis routing" (fixed-iteration path; the agent
/// sub-graph has its own `gap_analysis` tool with the same model contract).
pub async fn gap_analysis(ctx: &JobContext, pending_gap: &mut Option<String>) -> Result<NodeId, OrchestrationError> {
    ctx.check_cancellation().await?;
    ctx.set_status(JobState::ThreatRetry, ctx.current_retry().await?, None).await?;

    let results = ctx.results().await?;
    let threats = results.threat_list.clone().unwrap_or_default();
    let stage_prompt = StagePrompt::gap_analysis(&threats);
    let context = prompt_context(ctx, &results);
    let human = ctx.message_builder.build(&context, &stage_prompt);
    let system = crate::schemas::Message::new_system_message(
        "You are a precise application security engineer checking STRIDE coverage for gaps.",
    );

    let (args, reasoning, _usage) = ctx
        .invoke_stage(StageId::Gaps, vec![system, human], &tool_schemas::gap_tool())
        .await?;
    let decision: GapDecision = serde_json::from_value(args).map_err(|e| OrchestrationError::Internal(e.to_string()))?;
    decision.validate()?;

    if let Some(text) = reasoning {
        ctx.append_trail(TrailUpdate {
            gaps: vec![text],
            ..Default::default()
        })
        .await?;
    }

    if decision.stop {
        Ok(NodeId::Finalize)
    } else {
        *pending_gap = decision.gap;
        Ok(NodeId::DefineThreats)
    }
}

/// `spec.md` §4.1 "Finalize node".
pub async fn finalize(ctx: &JobContext) -> Result<(), OrchestrationError> {
    let retry = ctx.current_retry().await?;
    ctx.set_status(JobState::Finalize, retry, None).await?;

    let mut results = ctx.results().await?;
    results.retry = retry;
    ctx.save_results(results.clone()).await?;

    // Synthetic delay mirroring the source's finalize pause, re-checked for
    // cancellation on resume (`spec.md` §4.1, §5).
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    if ctx.check_cancellation().await.is_err() {
        let now = chrono::Utc::now();
        results.cancelled_at = Some(now);
        results.cancellation_reason = Some("cancelled during finalize".to_string());
        ctx.save_results(results).await?;
        ctx.set_status(JobState::Cancelled, retry, Some("Cancelled".into())).await?;
        return Err(OrchestrationError::Cancelled(ctx.job_id.clone()));
    }

    results.completed_at = Some(chrono::Utc::now());
    ctx.save_results(results).await?;
    ctx.set_status(JobState::Complete, retry, None).await?;
    Ok(())
}

impl JobContext {
    async fn current_retry(&self) -> Result<u32, OrchestrationError> {
        Ok(self
            .store
            .get_status(&self.job_id)
            .await?
            .map(|s| s.retry)
            .unwrap_or(0))
    }
}

/// Applies the agent sub-graph's final `{threat_list, __overwrite: true}`
/// handoff (`spec.md` §4.1 "threats_subgraph ... emits a PARENT-graph Command").
pub async fn apply_subgraph_handoff(ctx: &JobContext, threats: ThreatsList) -> Result<(), OrchestrationError> {
    let mut results = ctx.results().await?;
    let existing = results.threat_list.clone().unwrap_or_default();
    results.threat_list = Some(existing.merge(threats, true));
    ctx.save_results(results).await?;
    Ok(())
}

#[allow(dead_code)]
fn _assert_threat_shape(_: &Threat) {}
