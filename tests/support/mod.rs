//! Test doubles for the `ModelProvider`/`StructuredModel` seam (`spec.md`
//! §4.1 step 4, design note §9). Every integration test in this crate drives
//! the real workflow engine, executor, and store end to end; only the LLM
//! call itself is replaced, by a scripted sequence of tool-call arguments per
//! stage plus a scripted sequence of agent-turn responses for Auto mode.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use threat_modeling_core::credentials::{
    AgentTurn, CredentialsError, ModelError, ModelInvocation, ModelProvider, ReasoningLevel,
    StageId, StructuredCall, StructuredModel, ToolChoice, ToolSchema,
};
use threat_modeling_core::schemas::Message;

/// One scripted response to an `invoke_agent_turn` call: either a tool call
/// the agent node should dispatch, a plain-text finish (no tool call), or a
/// modelled provider failure the `gap_analysis` tool must surface as a
/// recoverable tool result (`spec.md` §8 scenario 6).
pub enum ScriptedTurn {
    Tool { name: &'static str, args: Value },
    Finish(&'static str),
    Err(ModelError),
}

type StageQueues = Mutex<HashMap<StageId, VecDeque<Value>>>;
type StageErrorQueues = Mutex<HashMap<StageId, VecDeque<ModelError>>>;
type AgentQueue = Mutex<VecDeque<ScriptedTurn>>;
type CapturedMessages = Mutex<HashMap<StageId, Vec<Message>>>;

/// A `ModelProvider` backed entirely by canned responses, queued per stage
/// for the fixed-iteration nodes and as one shared FIFO for the agent
/// sub-graph's `invoke_agent_turn` calls. Every `model_for` call hands out a
/// fresh `ScriptedModel` that shares these queues by `Arc`, matching how the
/// production `ConfigModelProvider` builds a fresh client per stage call.
#[derive(Default)]
pub struct ScriptedProvider {
    stage_responses: Arc<StageQueues>,
    stage_errors: Arc<StageErrorQueues>,
    agent_turns: Arc<AgentQueue>,
    captured_messages: Arc<CapturedMessages>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// The messages passed to the most recent `invoke` call for `stage`, if
    /// any — lets tests inspect what actually reached the model (e.g. whether
    /// a diagram image made it into the prompt).
    pub fn captured_messages(&self, stage: StageId) -> Option<Vec<Message>> {
        self.captured_messages.lock().unwrap().get(&stage).cloned()
    }

    /// Queues the next `structured_response` the stage named by `stage` will
    /// return on its next `invoke` call.
    pub fn push_stage(&self, stage: StageId, response: Value) -> &Self {
        self.stage_responses
            .lock()
            .unwrap()
            .entry(stage)
            .or_default()
            .push_back(response);
        self
    }

    /// Queues a failure the stage named by `stage` will return on its next
    /// `invoke` call, ahead of any success response queued for that stage
    /// (`spec.md` §8 scenario 6: a rate-limited `gap_analysis` call).
    pub fn push_stage_error(&self, stage: StageId, error: ModelError) -> &Self {
        self.stage_errors
            .lock()
            .unwrap()
            .entry(stage)
            .or_default()
            .push_back(error);
        self
    }

    pub fn push_agent_turn(&self, turn: ScriptedTurn) -> &Self {
        self.agent_turns.lock().unwrap().push_back(turn);
        self
    }
}

impl ModelProvider for ScriptedProvider {
    fn model_for(
        &self,
        stage: StageId,
        _reasoning_level: ReasoningLevel,
    ) -> Result<Box<dyn StructuredModel>, CredentialsError> {
        Ok(Box::new(ScriptedModel {
            stage,
            stage_responses: self.stage_responses.clone(),
            stage_errors: self.stage_errors.clone(),
            agent_turns: self.agent_turns.clone(),
            captured_messages: self.captured_messages.clone(),
        }))
    }
}

struct ScriptedModel {
    stage: StageId,
    stage_responses: Arc<StageQueues>,
    stage_errors: Arc<StageErrorQueues>,
    agent_turns: Arc<AgentQueue>,
    captured_messages: Arc<CapturedMessages>,
}

#[async_trait]
impl StructuredModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "stub-model"
    }

    async fn invoke(
        &self,
        messages: Vec<Message>,
        tool: &ToolSchema,
        _choice: ToolChoice,
    ) -> Result<ModelInvocation, ModelError> {
        self.captured_messages.lock().unwrap().insert(self.stage, messages);

        if let Some(err) = self
            .stage_errors
            .lock()
            .unwrap()
            .get_mut(&self.stage)
            .and_then(|queue| queue.pop_front())
        {
            return Err(err);
        }

        let args = self
            .stage_responses
            .lock()
            .unwrap()
            .get_mut(&self.stage)
            .and_then(|queue| queue.pop_front())
            .ok_or_else(|| ModelError::Other(format!("no scripted response queued for stage {:?}", self.stage)))?;
        Ok(ModelInvocation {
            structured: StructuredCall {
                tool_name: tool.name.clone(),
                arguments: args,
            },
            reasoning_text: None,
            usage: None,
        })
    }

    async fn invoke_agent_turn(
        &self,
        _messages: Vec<Message>,
        _tools: &[ToolSchema],
    ) -> Result<AgentTurn, ModelError> {
        let turn = self
            .agent_turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ModelError::Other("no scripted agent turn queued".to_string()))?;
        match turn {
            ScriptedTurn::Tool { name, args } => Ok(AgentTurn {
                assistant_text: String::new(),
                tool_call: Some(StructuredCall {
                    tool_name: name.to_string(),
                    arguments: args,
                }),
                reasoning_text: None,
                usage: None,
            }),
            ScriptedTurn::Finish(text) => Ok(AgentTurn {
                assistant_text: text.to_string(),
                tool_call: None,
                reasoning_text: None,
                usage: None,
            }),
            ScriptedTurn::Err(err) => Err(err),
        }
    }
}

/// A `ModelProvider` whose `Flows` stage blocks until the test signals it to
/// proceed, used to exercise cancellation mid-model-call (`spec.md` §8
/// scenario 4). Other stages resolve immediately from a `ScriptedProvider`.
pub struct GatedProvider {
    pub inner: ScriptedProvider,
    pub gated_stage: StageId,
    pub entered: Arc<tokio::sync::Notify>,
    pub proceed: Arc<tokio::sync::Notify>,
    pub gated_response: Value,
}

impl GatedProvider {
    pub fn new(gated_stage: StageId, gated_response: Value) -> Self {
        Self {
            inner: ScriptedProvider::new(),
            gated_stage,
            entered: Arc::new(tokio::sync::Notify::new()),
            proceed: Arc::new(tokio::sync::Notify::new()),
            gated_response,
        }
    }
}

impl ModelProvider for GatedProvider {
    fn model_for(
        &self,
        stage: StageId,
        reasoning_level: ReasoningLevel,
    ) -> Result<Box<dyn StructuredModel>, CredentialsError> {
        if stage == self.gated_stage {
            Ok(Box::new(GatedModel {
                entered: self.entered.clone(),
                proceed: self.proceed.clone(),
                response: self.gated_response.clone(),
            }))
        } else {
            self.inner.model_for(stage, reasoning_level)
        }
    }
}

struct GatedModel {
    entered: Arc<tokio::sync::Notify>,
    proceed: Arc<tokio::sync::Notify>,
    response: Value,
}

#[async_trait]
impl StructuredModel for GatedModel {
    fn model_id(&self) -> &str {
        "gated-stub-model"
    }

    async fn invoke(
        &self,
        _messages: Vec<Message>,
        tool: &ToolSchema,
        _choice: ToolChoice,
    ) -> Result<ModelInvocation, ModelError> {
        self.entered.notify_one();
        self.proceed.notified().await;
        Ok(ModelInvocation {
            structured: StructuredCall {
                tool_name: tool.name.clone(),
                arguments: self.response.clone(),
            },
            reasoning_text: None,
            usage: None,
        })
    }

    async fn invoke_agent_turn(
        &self,
        _messages: Vec<Message>,
        _tools: &[ToolSchema],
    ) -> Result<AgentTurn, ModelError> {
        unreachable!("GatedModel is only used for single-tool stage calls in these tests")
    }
}

/// `record_summary` tool-call argument fixtures.
pub fn summary_response(text: &str) -> Value {
    json!({"summary": text})
}

/// Empty `record_assets` response — sufficient when a scenario doesn't care
/// about asset content.
pub fn empty_assets_response() -> Value {
    json!({"assets": []})
}

/// Empty `record_flows` response.
pub fn empty_flows_response() -> Value {
    json!({"data_flows": [], "trust_boundaries": [], "threat_sources": []})
}

/// A single threat item matching `tool_schemas::threat_item_schema`'s shape,
/// with a description in the 35-50 word range the Rust-side constructor
/// enforces (deserialization itself does not validate, but keeping fixtures
/// realistic avoids masking bugs that only show up on well-formed input).
pub fn threat_json(name: &str, category: &str) -> Value {
    json!({
        "name": name,
        "stride_category": category,
        "description": "An attacker could exploit a weak session token to impersonate a \
            legitimate user and gain unauthorized access to sensitive account operations \
            without detection, allowing them to modify records, exfiltrate confidential \
            data, and disrupt normal service operations for an extended period of time.",
        "target": "auth service",
        "impact": "account takeover",
        "likelihood": "Medium",
        "mitigations": ["Enforce short-lived tokens", "Rotate secrets regularly"],
        "source": "automated analysis",
        "prerequisites": [],
        "vector": "network"
    })
}

pub fn threats_response(items: Vec<Value>) -> Value {
    json!({"threats": items})
}

pub fn gap_stop_response() -> Value {
    json!({"stop": true})
}
