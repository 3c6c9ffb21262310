use std::collections::HashMap;

use super::ThreatsList;

/// State-reducer contract for the two containers the graph merges in place
/// (`spec.md` §3 "Merge rules", design note §9: "do not rely on identity of
/// containers"). `overwrite=true` is the `{__overwrite: true}` sentinel used
/// by both the traditional threats node and the agent sub-graph's
/// `remove_threat`/finalize-handoff paths.
pub trait Merge: Sized {
    fn merge(self, other: Self, overwrite: bool) -> Self;
}

impl Merge for ThreatsList {
    fn merge(self, other: Self, overwrite: bool) -> Self {
        if overwrite {
            return other;
        }
        let mut order: Vec<String> = Vec::new();
        let mut by_name: HashMap<String, super::Threat> = HashMap::new();
        for threat in self.threats.into_iter().chain(other.threats) {
            if !by_name.contains_key(&threat.name) {
                order.push(threat.name.clone());
            }
            by_name.insert(threat.name.clone(), threat);
        }
        ThreatsList {
            threats: order.into_iter().filter_map(|n| by_name.remove(&n)).collect(),
        }
    }
}

/// Appends new entries to a trail's array field (`gaps`/`threats`), preserving
/// production order (`spec.md` §3, §5 ordering guarantee).
pub fn append_trail(existing: &mut Vec<String>, new_entries: impl IntoIterator<Item = String>) {
    existing.extend(new_entries);
}
