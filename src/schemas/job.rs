use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AssetsList, FlowsList, ThreatsList};

/// The job state machine from `spec.md` §3:
/// `START -> ASSETS -> FLOW -> THREAT[/RETRY] -> FINALIZE -> COMPLETE/FAILED/CANCELLED`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobState {
    Start,
    Assets,
    Flow,
    Threat,
    ThreatRetry,
    Finalize,
    Complete,
    Failed,
    Cancelled,
}

impl JobState {
    /// `is_executing` per `spec.md` §4.4: true iff persisted state is non-terminal.
    pub fn is_executing(self) -> bool {
        !matches!(self, JobState::Complete | JobState::Failed | JobState::Cancelled)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_executing()
    }
}

/// `JobStatus` per `spec.md` §3. `retry` is 0-indexed: the count of completed
/// threat iterations. Display layers add 1 when showing the active iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub id: String,
    pub state: JobState,
    pub retry: u32,
    pub updated_at: DateTime<Utc>,
    pub detail: Option<String>,
}

impl JobStatus {
    pub fn new(id: impl Into<String>, state: JobState, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            state,
            retry: 0,
            updated_at: now,
            detail: None,
        }
    }

    pub fn transition(&mut self, state: JobState, now: DateTime<Utc>) {
        self.state = state;
        self.updated_at = now;
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// A point-in-time snapshot of the mutable threat-modeling artifacts, taken
/// before a replay mutates them. Used by `restore_tm` (`spec.md` §4.7, §8).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultsBackup {
    pub assets: Option<AssetsList>,
    pub system_architecture: Option<FlowsList>,
    pub threat_list: Option<ThreatsList>,
}

/// `JobResults` per `spec.md` §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResults {
    pub job_id: String,
    pub s3_location: Option<String>,
    pub owner: Option<String>,
    pub title: String,
    pub description: String,
    pub summary: Option<String>,
    pub assumptions: Vec<String>,
    pub assets: Option<AssetsList>,
    pub system_architecture: Option<FlowsList>,
    pub threat_list: Option<ThreatsList>,
    pub retry: u32,
    pub backup: Option<ResultsBackup>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub error: Option<String>,
    pub error_type: Option<String>,
    pub provider: Option<String>,
}

impl JobResults {
    pub fn new(
        job_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        assumptions: Vec<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            s3_location: None,
            owner: None,
            title: title.into(),
            description: description.into(),
            summary: None,
            assumptions,
            assets: None,
            system_architecture: None,
            threat_list: None,
            retry: 0,
            backup: None,
            completed_at: None,
            failed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            error: None,
            error_type: None,
            provider: None,
        }
    }

    /// Captures a backup snapshot iff one isn't already present — used both by
    /// replay (`spec.md` §4.1) and by `update_tm`'s first-write capture (`spec.md` §4.7).
    pub fn capture_backup_if_absent(&mut self) {
        if self.backup.is_none() {
            self.backup = Some(ResultsBackup {
                assets: self.assets.clone(),
                system_architecture: self.system_architecture.clone(),
                threat_list: self.threat_list.clone(),
            });
        }
    }

    /// Restores `{assets, system_architecture, threat_list}` from `backup`, per
    /// `restore_tm` (`spec.md` §4.7, §8). Returns `false` if no backup exists.
    pub fn restore_from_backup(&mut self) -> bool {
        let Some(backup) = self.backup.clone() else {
            return false;
        };
        self.assets = backup.assets;
        self.system_architecture = backup.system_architecture;
        self.threat_list = backup.threat_list;
        true
    }
}

/// `JobTrail` per `spec.md` §3: append-only reasoning narrative, surfaced to the UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobTrail {
    pub id: String,
    pub assets: String,
    pub flows: String,
    pub gaps: Vec<String>,
    pub threats: Vec<String>,
}

impl JobTrail {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Clears `threats`/`gaps` on replay re-entry (`spec.md` §4.1).
    pub fn reset_threats_and_gaps(&mut self) {
        self.threats.clear();
        self.gaps.clear();
    }
}
