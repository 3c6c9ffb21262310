use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::SchemaError;

/// The six-category STRIDE taxonomy (see GLOSSARY in `spec.md`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StrideCategory {
    Spoofing,
    Tampering,
    Repudiation,
    InformationDisclosure,
    DenialOfService,
    ElevationOfPrivilege,
}

impl StrideCategory {
    pub const ALL: [StrideCategory; 6] = [
        StrideCategory::Spoofing,
        StrideCategory::Tampering,
        StrideCategory::Repudiation,
        StrideCategory::InformationDisclosure,
        StrideCategory::DenialOfService,
        StrideCategory::ElevationOfPrivilege,
    ];

    /// The categories present in `catalog` that are absent from the full STRIDE set —
    /// used by the agent sub-graph's `continue` gate (`spec.md` §4.2, §8).
    pub fn missing_from(catalog: &[Threat]) -> BTreeSet<StrideCategory> {
        let present: BTreeSet<StrideCategory> =
            catalog.iter().map(|t| t.stride_category).collect();
        Self::ALL.into_iter().filter(|c| !present.contains(c)).collect()
    }
}

impl fmt::Display for StrideCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StrideCategory::Spoofing => "Spoofing",
            StrideCategory::Tampering => "Tampering",
            StrideCategory::Repudiation => "Repudiation",
            StrideCategory::InformationDisclosure => "Information Disclosure",
            StrideCategory::DenialOfService => "Denial of Service",
            StrideCategory::ElevationOfPrivilege => "Elevation of Privilege",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Likelihood {
    Low,
    Medium,
    High,
}

/// A single identified threat. See `spec.md` §3 for the field contract, including
/// the 35-50 word bound on `description` and the 2-5 item bound on `mitigations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Threat {
    pub name: String,
    pub stride_category: StrideCategory,
    pub description: String,
    pub target: String,
    pub impact: String,
    pub likelihood: Likelihood,
    pub mitigations: Vec<String>,
    pub source: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    pub vector: String,
    #[serde(default)]
    pub starred: bool,
}

pub const THREAT_DESCRIPTION_MIN_WORDS: usize = 35;
pub const THREAT_DESCRIPTION_MAX_WORDS: usize = 50;
pub const THREAT_MITIGATIONS_MIN: usize = 2;
pub const THREAT_MITIGATIONS_MAX: usize = 5;

impl Threat {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        stride_category: StrideCategory,
        description: impl Into<String>,
        target: impl Into<String>,
        impact: impl Into<String>,
        likelihood: Likelihood,
        mitigations: Vec<String>,
        source: impl Into<String>,
        prerequisites: Vec<String>,
        vector: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SchemaError::Empty { field: "name" });
        }
        let description = description.into();
        let word_count = description.split_whitespace().count();
        if !(THREAT_DESCRIPTION_MIN_WORDS..=THREAT_DESCRIPTION_MAX_WORDS).contains(&word_count) {
            return Err(SchemaError::WordCountOutOfRange {
                field: "description",
                min: THREAT_DESCRIPTION_MIN_WORDS,
                max: THREAT_DESCRIPTION_MAX_WORDS,
                actual: word_count,
            });
        }
        if !(THREAT_MITIGATIONS_MIN..=THREAT_MITIGATIONS_MAX).contains(&mitigations.len()) {
            return Err(SchemaError::LengthOutOfRange {
                field: "mitigations",
                min: THREAT_MITIGATIONS_MIN,
                max: THREAT_MITIGATIONS_MAX,
                actual: mitigations.len(),
            });
        }
        Ok(Self {
            name,
            stride_category,
            description,
            target: target.into(),
            impact: impact.into(),
            likelihood,
            mitigations,
            source: source.into(),
            prerequisites,
            vector: vector.into(),
            starred: false,
        })
    }

    pub fn starred(mut self, starred: bool) -> Self {
        self.starred = starred;
        self
    }

    /// Re-checks the bounds [`Self::new`] enforces, for values that arrived
    /// via `Deserialize` instead (model tool-call output).
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::Empty { field: "name" });
        }
        let word_count = self.description.split_whitespace().count();
        if !(THREAT_DESCRIPTION_MIN_WORDS..=THREAT_DESCRIPTION_MAX_WORDS).contains(&word_count) {
            return Err(SchemaError::WordCountOutOfRange {
                field: "description",
                min: THREAT_DESCRIPTION_MIN_WORDS,
                max: THREAT_DESCRIPTION_MAX_WORDS,
                actual: word_count,
            });
        }
        if !(THREAT_MITIGATIONS_MIN..=THREAT_MITIGATIONS_MAX).contains(&self.mitigations.len()) {
            return Err(SchemaError::LengthOutOfRange {
                field: "mitigations",
                min: THREAT_MITIGATIONS_MIN,
                max: THREAT_MITIGATIONS_MAX,
                actual: self.mitigations.len(),
            });
        }
        Ok(())
    }
}

/// Ordered sequence of `Threat`. Union-by-`name` is implemented via
/// [`crate::schemas::Merge`], never by container identity (design note, `spec.md` §9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreatsList {
    pub threats: Vec<Threat>,
}

impl ThreatsList {
    pub fn new(threats: Vec<Threat>) -> Self {
        Self { threats }
    }

    pub fn starred_only(&self) -> Self {
        Self {
            threats: self.threats.iter().filter(|t| t.starred).cloned().collect(),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.threats.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        self.threats.iter().try_for_each(Threat::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, cat: StrideCategory) -> Threat {
        Threat::new(
            name,
            cat,
            "An attacker could exploit a weak session token to impersonate a legitimate \
             user and gain unauthorized access to sensitive account operations without \
             detection, allowing them to modify financial records, exfiltrate confidential \
             customer data, and disrupt normal service operations for an extended period."
                .to_string(),
            "auth service",
            "account takeover",
            Likelihood::High,
            vec!["Enforce short-lived tokens".into(), "Rotate secrets".into()],
            "automated analysis",
            vec![],
            "network",
        )
        .unwrap()
    }

    #[test]
    fn rejects_short_description() {
        let err = Threat::new(
            "x",
            StrideCategory::Spoofing,
            "too short",
            "t",
            "i",
            Likelihood::Low,
            vec!["a".into(), "b".into()],
            "s",
            vec![],
            "v",
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::WordCountOutOfRange { .. }));
    }

    #[test]
    fn missing_from_reports_absent_categories() {
        let catalog = vec![
            sample("t1", StrideCategory::Spoofing),
            sample("t2", StrideCategory::Tampering),
        ];
        let missing = StrideCategory::missing_from(&catalog);
        assert_eq!(missing.len(), 4);
        assert!(missing.contains(&StrideCategory::DenialOfService));
    }
}
