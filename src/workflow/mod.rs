//! Workflow engine (C5/C6, `spec.md` §4.1, §4.2): the traditional
//! fixed-iteration graph in `nodes.rs`, the Auto-mode agent sub-graph in
//! `agent.rs`, and the `JobContext` both share in `state.rs`. `run_graph`
//! plays the part teacher's `chain::Chain::call` loop plays for its own
//! (much simpler) single-pass chains: drive nodes to a terminal state,
//! threading only the local state (`pending_gap`) each node actually needs.

pub mod agent;
pub mod graph;
pub mod nodes;
pub mod state;
pub mod tool_schemas;

pub use graph::NodeId;
pub use state::JobContext;

use crate::errors::OrchestrationError;

/// Drives the graph from `start` to `Finalize`, which is the only node that
/// returns `()` instead of the next `NodeId` (`spec.md` §4.1). `replay` is
/// only consulted when `start == NodeId::GenerateSummary`, since no other
/// edge in the graph re-enters that node.
pub async fn run_graph(ctx: &JobContext, start: NodeId, replay: bool) -> Result<(), OrchestrationError> {
    let mut node = start;
    let mut pending_gap: Option<String> = None;

    loop {
        node = match node {
            NodeId::GenerateSummary => nodes::generate_summary(ctx, replay).await?,
            NodeId::DefineAssets => nodes::define_assets(ctx).await?,
            NodeId::DefineFlows => nodes::define_flows(ctx).await?,
            NodeId::ThreatsRouter => nodes::threats_router(ctx).await?,
            NodeId::DefineThreats => nodes::define_threats(ctx, &mut pending_gap).await?,
            NodeId::GapAnalysis => nodes::gap_analysis(ctx, &mut pending_gap).await?,
            NodeId::ThreatsSubgraph => {
                let threats = agent::run_threats_subgraph(ctx).await?;
                nodes::apply_subgraph_handoff(ctx, threats).await?;
                NodeId::Finalize
            }
            NodeId::Finalize => return nodes::finalize(ctx).await,
        };
    }
}
