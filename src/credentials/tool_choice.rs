use super::config::{is_flagship_thinking_model, is_reasoning_effort_model};
use super::provider::ReasoningLevel;

/// How to bind the single structured-output tool for a model call.
///
/// Unifies both provider families behind "bind one tool schema, extract
/// first tool-call arguments" (design note, `spec.md` §9), while preserving
/// the thinking-mode-vs-forced-tool-choice interface constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    /// Force the named tool explicitly (reasoning-effort family).
    Named,
    /// Force "any" tool call, no specific name (flagship family, reasoning off).
    Any,
    /// Don't force a tool choice at all (small models, or flagship + thinking on).
    Unforced,
}

/// Implements the binding rules from `spec.md` §4.1 step 5, reused verbatim
/// by the agent sub-graph's `gap_analysis` tool (`spec.md` §4.2).
pub fn select_tool_choice(model_id: &str, reasoning_level: ReasoningLevel) -> ToolChoice {
    if is_reasoning_effort_model(model_id) {
        return ToolChoice::Named;
    }
    if is_flagship_thinking_model(model_id) {
        return if reasoning_level == 0 {
            ToolChoice::Any
        } else {
            // Forcing a tool disables thinking on this family; omit forcing
            // so reasoning content can still be produced (spec.md §4.1, §9).
            ToolChoice::Unforced
        };
    }
    ToolChoice::Unforced
}
