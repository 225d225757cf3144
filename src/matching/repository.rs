use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{MatchOutcome, PatientProfile};

/// Identifier wrapper for stored matching submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record the persistence collaborator stores per matching request: content
/// hash of the profile, locale tag, timestamp, and the full partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub submission_id: SubmissionId,
    pub profile_hash: String,
    pub locale: String,
    pub submitted_at: DateTime<Utc>,
    pub profile: PatientProfile,
    pub outcome: MatchOutcome,
    pub status: SubmissionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Complete,
}

impl SubmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionStatus::Complete => "complete",
        }
    }
}

impl SubmissionRecord {
    /// Sanitized representation for API responses; no raw answers leak out.
    pub fn status_view(&self) -> SubmissionStatusView {
        SubmissionStatusView {
            submission_id: self.submission_id.clone(),
            status: self.status.label(),
            matched: self.outcome.matches.len(),
            excluded: self.outcome.exclusions.len(),
            submitted_at: self.submitted_at,
        }
    }
}

/// Exposed view of a stored submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionStatusView {
    pub submission_id: SubmissionId,
    pub status: &'static str,
    pub matched: usize,
    pub excluded: usize,
    pub submitted_at: DateTime<Utc>,
}

/// Storage abstraction so the service can be exercised without a database.
pub trait SubmissionRepository: Send + Sync {
    fn insert(&self, record: SubmissionRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &SubmissionId) -> Result<Option<SubmissionRecord>, RepositoryError>;
    fn recent(&self, limit: usize) -> Result<Vec<SubmissionRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("submission already exists")]
    Conflict,
    #[error("submission not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// In-process store backing the default service wiring. Durable persistence
/// belongs to an external collaborator behind the same trait.
#[derive(Debug, Default)]
pub struct InMemorySubmissionRepository {
    records: Mutex<Vec<SubmissionRecord>>,
}

impl InMemorySubmissionRepository {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<SubmissionRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }
}

impl SubmissionRepository for InMemorySubmissionRepository {
    fn insert(&self, record: SubmissionRecord) -> Result<(), RepositoryError> {
        let mut records = self.lock()?;
        if records
            .iter()
            .any(|existing| existing.submission_id == record.submission_id)
        {
            return Err(RepositoryError::Conflict);
        }
        records.push(record);
        Ok(())
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<SubmissionRecord>, RepositoryError> {
        let records = self.lock()?;
        Ok(records
            .iter()
            .find(|record| &record.submission_id == id)
            .cloned())
    }

    fn recent(&self, limit: usize) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        let records = self.lock()?;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}
