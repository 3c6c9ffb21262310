/// Identifies a node in the main workflow graph (`spec.md` §4.1). Modeled as
/// a plain enum rather than a trait-object graph: nodes are free async
/// functions that return the next `NodeId` (or terminate), which is the
/// `Step::Goto` idiom from the design note (§9) collapsed onto Rust's own
/// control flow — state mutation happens through `JobContext`, routing
/// happens through the return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeId {
    GenerateSummary,
    DefineAssets,
    DefineFlows,
    ThreatsRouter,
    DefineThreats,
    GapAnalysis,
    ThreatsSubgraph,
    Finalize,
}
