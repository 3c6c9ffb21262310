//! Agent sub-graph (C6, Auto mode), `spec.md` §4.2. A ReAct loop over four
//! quota-enforced tools, dispatched from `threats_router` whenever
//! `iteration == 0` and handing control back to the parent graph's
//! `finalize` node once the `continue` gate is satisfied.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::credentials::ModelError;
use crate::errors::OrchestrationError;
use crate::prompts::{PromptContext, StagePrompt};
use crate::schemas::{
    JobState, Merge, Message, StrideCategory, ThreatsList,
};
use crate::store::TrailUpdate;

use super::state::JobContext;
use super::tool_schemas;

/// `spec.md` §3 "AgentSubState invariants".
pub const MAX_ADD_THREATS_USES: u32 = 3;
pub const MAX_GAP_ANALYSIS_USES: u32 = 3;

/// `spec.md` §3: theoretical maximum threats added per Auto-mode job.
pub const MAX_AUTO_MODE_THREATS: u32 = MAX_ADD_THREATS_USES * (MAX_GAP_ANALYSIS_USES + 1);

/// `AgentSubState` per `spec.md` §3. `messages` carries the running ReAct
/// transcript seeded by the agent node on first entry.
#[derive(Debug, Clone, Default)]
pub struct AgentSubState {
    pub messages: Vec<Message>,
    pub threat_list: ThreatsList,
    pub tool_use: u32,
    pub gap_tool_use: u32,
}

fn prompt_context(ctx: &JobContext, results: &crate::schemas::JobResults) -> PromptContext {
    PromptContext {
        diagram_base64: ctx.diagram_base64.clone(),
        description: Some(results.description.clone()),
        assumptions: results.assumptions.clone(),
    }
}

/// Runs the sub-graph to completion and returns the final catalog, which the
/// caller applies to the parent graph's state with the `{__overwrite: true}`
/// handoff (`spec.md` §4.1 "threats_subgraph ... emits a PARENT-graph Command").
pub async fn run_threats_subgraph(ctx: &JobContext) -> Result<ThreatsList, OrchestrationError> {
    ctx.check_cancellation().await?;

    let results = ctx.results().await?;
    let assets = results.assets.clone().unwrap_or_default();
    let flows = results.system_architecture.clone().unwrap_or_default();
    // Only starred threats survive into the sub-graph's seed state; the rest
    // of the prior catalog is superseded by the `{__overwrite: true}` handoff
    // once the sub-graph finishes (`spec.md` §4.2, §4.4).
    let starred = results.threat_list.clone().unwrap_or_default().starred_only();

    let stage_prompt = StagePrompt::agent_system(&assets, &flows, &starred, ctx.instructions.as_deref());
    let context = prompt_context(ctx, &results);
    let system = Message::new_system_message(
        "You are a precise application security engineer building a complete STRIDE threat \
         catalog using the available tools.",
    );
    let human = ctx.message_builder.build(&context, &stage_prompt);

    let mut state = AgentSubState {
        messages: vec![system, human],
        threat_list: starred,
        tool_use: 0,
        gap_tool_use: 0,
    };

    loop {
        ctx.check_cancellation().await?;
        ctx.set_status(JobState::Threat, 0, None).await?;

        let tools = [
            tool_schemas::add_threats_tool(),
            tool_schemas::remove_threat_tool(),
            tool_schemas::read_threat_catalog_tool(),
            tool_schemas::gap_analysis_tool(),
        ];
        let turn = ctx.invoke_agent_turn(state.messages.clone(), &tools).await?;

        match turn.tool_call {
            Some(call) => {
                let call_id = uuid::Uuid::new_v4().to_string();
                state.messages.push(
                    Message::new_ai_message(turn.assistant_text.clone()).with_tool_calls(vec![
                        crate::schemas::ToolCall::new(call_id.clone(), call.tool_name.clone(), call.arguments.clone()),
                    ]),
                );
                let result_text = dispatch_tool(ctx, &mut state, &call.tool_name, call.arguments).await?;
                state
                    .messages
                    .push(Message::new_tool_message(Some(call_id), result_text));
                // tools -> agent: loop back without consulting the gate.
            }
            None => {
                state.messages.push(Message::new_ai_message(turn.assistant_text));
                match continue_gate(&state) {
                    ContinueDecision::Finalize => return Ok(state.threat_list),
                    ContinueDecision::RetryWithFeedback(feedback) => {
                        state.messages.push(Message::new_human_message(feedback));
                    }
                }
            }
        }
    }
}

enum ContinueDecision {
    Finalize,
    RetryWithFeedback(String),
}

/// `continue` node per `spec.md` §4.2: validation gate reached only when the
/// model answers without a tool call.
fn continue_gate(state: &AgentSubState) -> ContinueDecision {
    if state.threat_list.threats.is_empty() {
        return ContinueDecision::RetryWithFeedback(
            "The threat catalog is empty. Use add_threats to record STRIDE threats before finishing.".into(),
        );
    }
    let missing = StrideCategory::missing_from(&state.threat_list.threats);
    if !missing.is_empty() {
        let list = missing
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return ContinueDecision::RetryWithFeedback(format!(
            "The catalog is missing STRIDE coverage for: {list}. Use add_threats to cover them."
        ));
    }
    if state.gap_tool_use == 0 {
        return ContinueDecision::RetryWithFeedback(
            "Run gap_analysis at least once before finishing.".into(),
        );
    }
    ContinueDecision::Finalize
}

async fn dispatch_tool(
    ctx: &JobContext,
    state: &mut AgentSubState,
    name: &str,
    arguments: Value,
) -> Result<String, OrchestrationError> {
    match name {
        "add_threats" => add_threats(ctx, state, arguments).await,
        "remove_threat" => remove_threat(ctx, state, arguments).await,
        "read_threat_catalog" => read_threat_catalog(ctx, state, arguments).await,
        "gap_analysis" => gap_analysis(ctx, state).await,
        other => Ok(format!("Unknown tool '{other}'; ignored.")),
    }
}

/// Every tool checks cancellation before and after its synthetic delay and
/// sets a stage-specific status detail (`spec.md` §4.2 "Every tool").
async fn mark_working(ctx: &JobContext, detail: &str) -> Result<(), OrchestrationError> {
    ctx.check_cancellation().await?;
    ctx.set_status(JobState::Threat, 0, Some(detail.to_string())).await?;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    ctx.check_cancellation().await?;
    Ok(())
}

#[derive(Deserialize)]
struct AddThreatsArgs {
    threats: Vec<crate::schemas::Threat>,
}

async fn add_threats(
    ctx: &JobContext,
    state: &mut AgentSubState,
    arguments: Value,
) -> Result<String, OrchestrationError> {
    mark_working(ctx, "Adding threats").await?;

    if state.tool_use >= MAX_ADD_THREATS_USES {
        if state.gap_tool_use < MAX_GAP_ANALYSIS_USES {
            return Ok(
                "add_threats quota reached for this cycle. Call gap_analysis before adding more threats.".into(),
            );
        }
        return Ok("All add_threats and gap_analysis quotas are exhausted. Finish the catalog now.".into());
    }

    let mut parsed: AddThreatsArgs =
        serde_json::from_value(arguments).map_err(|e| OrchestrationError::Internal(e.to_string()))?;
    for threat in &parsed.threats {
        threat.validate()?;
    }
    for threat in &mut parsed.threats {
        // spec.md §4.2 add_threats: "Normalizes starred=false on each added threat".
        threat.starred = false;
    }
    let added = parsed.threats.len();
    let incoming = ThreatsList::new(parsed.threats);
    state.threat_list = std::mem::take(&mut state.threat_list).merge(incoming, false);
    state.tool_use += 1;

    Ok(format!(
        "Added {added} threat(s). Catalog now has {} threat(s).",
        state.threat_list.threats.len()
    ))
}

#[derive(Deserialize)]
struct RemoveThreatArgs {
    threats: Vec<String>,
}

async fn remove_threat(
    ctx: &JobContext,
    state: &mut AgentSubState,
    arguments: Value,
) -> Result<String, OrchestrationError> {
    mark_working(ctx, "Deleting threats").await?;

    let parsed: RemoveThreatArgs =
        serde_json::from_value(arguments).map_err(|e| OrchestrationError::Internal(e.to_string()))?;
    let to_remove: HashSet<String> = parsed.threats.into_iter().collect();
    let before = state.threat_list.threats.len();
    // spec.md §4.2 remove_threat: "Replaces threat_list with {__overwrite:
    // true}. Does not increment tool_use."
    state.threat_list = ThreatsList::new(
        state
            .threat_list
            .threats
            .iter()
            .cloned()
            .filter(|t| !to_remove.contains(&t.name))
            .collect(),
    );
    let removed = before - state.threat_list.threats.len();

    Ok(format!("Removed {removed} threat(s) from the catalog."))
}

#[derive(Deserialize, Default)]
struct ReadCatalogArgs {
    #[serde(default)]
    verbose: bool,
}

async fn read_threat_catalog(
    ctx: &JobContext,
    state: &mut AgentSubState,
    arguments: Value,
) -> Result<String, OrchestrationError> {
    mark_working(ctx, "Reviewing catalog").await?;

    let args: ReadCatalogArgs = if arguments.is_null() {
        ReadCatalogArgs::default()
    } else {
        serde_json::from_value(arguments).map_err(|e| OrchestrationError::Internal(e.to_string()))?
    };

    if state.threat_list.threats.is_empty() {
        return Ok("The threat catalog is currently empty.".into());
    }

    if args.verbose {
        Ok(crate::prompts::render_threats(&state.threat_list))
    } else {
        Ok(state.threat_list.names().join(", "))
    }
}

/// `spec.md` §4.2 gap_analysis tool: shares the provider-aware binding rules
/// from §4.1 step 5 via [`JobContext::invoke_stage`]. Recoverable provider
/// failures (rate/auth/timeout/policy) surface as a tool result string
/// without resetting counters (`spec.md` §7, §8 scenario 6); other failures
/// propagate.
async fn gap_analysis(ctx: &JobContext, state: &mut AgentSubState) -> Result<String, OrchestrationError> {
    mark_working(ctx, "Reviewing for gaps").await?;

    if state.gap_tool_use >= MAX_GAP_ANALYSIS_USES {
        return Ok("gap_analysis quota is exhausted. Finish the catalog with what has been reviewed.".into());
    }

    let stage_prompt = StagePrompt::gap_analysis(&state.threat_list);
    let results = ctx.results().await?;
    let context = prompt_context(ctx, &results);
    let human = ctx.message_builder.build(&context, &stage_prompt);
    let system = Message::new_system_message(
        "You are a precise application security engineer checking STRIDE coverage for gaps.",
    );

    let invocation = ctx
        .invoke_stage(
            crate::credentials::StageId::Gaps,
            vec![system, human],
            &tool_schemas::gap_tool(),
        )
        .await;

    let (args, reasoning, _usage) = match invocation {
        Ok(v) => v,
        Err(err) => return recover_or_propagate(err),
    };

    let decision: crate::schemas::GapDecision =
        serde_json::from_value(args).map_err(|e| OrchestrationError::Internal(e.to_string()))?;
    decision
        .validate()
        .map_err(|e| OrchestrationError::Internal(e.to_string()))?;

    if let Some(text) = reasoning {
        ctx.append_trail(TrailUpdate {
            gaps: vec![text],
            ..Default::default()
        })
        .await?;
    }

    // Successful gap_analysis resets tool_use and increments gap_tool_use
    // (`spec.md` §3 AgentSubState invariants).
    state.gap_tool_use += 1;
    state.tool_use = 0;

    if decision.stop {
        Ok("Gap analysis found no further gaps. The catalog is ready to finalize.".into())
    } else {
        let gap = decision.gap.unwrap_or_default();
        Ok(format!("Gap analysis found a gap: {gap}. Use add_threats to address it."))
    }
}

fn recover_or_propagate(err: OrchestrationError) -> Result<String, OrchestrationError> {
    match err {
        OrchestrationError::Model(ModelError::Auth(msg)) => {
            Ok(format!("Authentication with the model provider failed: {msg}. You may retry."))
        }
        OrchestrationError::Model(ModelError::RateLimit(msg)) => {
            Ok(format!("The model provider is rate-limiting requests: {msg}. You may retry."))
        }
        OrchestrationError::Model(ModelError::Timeout) => {
            Ok("The gap analysis request timed out. You may retry.".into())
        }
        OrchestrationError::Model(ModelError::Policy(msg)) => Ok(format!(
            "The model provider declined the request on policy grounds: {msg}. You may retry."
        )),
        OrchestrationError::Model(ModelError::Overloaded(msg)) => {
            Ok(format!("The model provider is overloaded: {msg}. You may retry."))
        }
        other => Err(other),
    }
}
