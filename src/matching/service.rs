use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::info;

use super::catalog::TrialCatalog;
use super::domain::{CountryCode, PatientProfile};
use super::engine::{MatchingEngine, ValidationError};
use super::repository::{
    RepositoryError, SubmissionId, SubmissionRecord, SubmissionRepository, SubmissionStatus,
};

/// Incoming matching request: a locale tag plus the self-reported answers.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
    pub locale: String,
    pub profile: PatientProfile,
}

/// Service composing the read-only catalog, the scoring engine, and the
/// submission store.
pub struct MatchService<R> {
    catalog: Arc<TrialCatalog>,
    engine: Arc<MatchingEngine>,
    repository: Arc<R>,
}

static SUBMISSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_submission_id() -> SubmissionId {
    let id = SUBMISSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SubmissionId(format!("sub-{id:06}"))
}

const PROFILE_HASH_LEN: usize = 12;

impl<R> MatchService<R>
where
    R: SubmissionRepository + 'static,
{
    pub fn new(catalog: Arc<TrialCatalog>, engine: MatchingEngine, repository: Arc<R>) -> Self {
        Self {
            catalog,
            engine: Arc::new(engine),
            repository,
        }
    }

    /// Run the engine for one request and persist the resulting record.
    pub fn submit(&self, request: MatchRequest) -> Result<SubmissionRecord, MatchServiceError> {
        let country = country_from_locale(&request.locale)?;
        let outcome = self
            .engine
            .match_patient(&self.catalog, &request.profile, &country)?;

        let record = SubmissionRecord {
            submission_id: next_submission_id(),
            profile_hash: profile_hash(&request.profile)?,
            locale: request.locale,
            submitted_at: Utc::now(),
            profile: request.profile,
            outcome,
            status: SubmissionStatus::Complete,
        };

        self.repository.insert(record.clone())?;

        info!(
            submission_id = %record.submission_id,
            %country,
            matched = record.outcome.matches.len(),
            excluded = record.outcome.exclusions.len(),
            "stored matching submission"
        );

        Ok(record)
    }

    pub fn get(&self, id: &SubmissionId) -> Result<SubmissionRecord, MatchServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

/// Resolve the patient's country from the trailing subtag of a locale tag
/// (`fr-FR` -> `FR`).
pub fn country_from_locale(locale: &str) -> Result<CountryCode, MatchServiceError> {
    let subtag = locale.rsplit(['-', '_']).next().unwrap_or(locale);
    CountryCode::new(subtag).map_err(|_| MatchServiceError::InvalidLocale {
        locale: locale.to_string(),
    })
}

/// Content hash keying stored submissions: first 12 hex characters of the
/// SHA-256 over the canonical JSON encoding of the answers.
fn profile_hash(profile: &PatientProfile) -> Result<String, MatchServiceError> {
    let encoded = serde_json::to_vec(&profile.answers)?;
    let digest = Sha256::digest(&encoded);
    let mut hash = hex::encode(digest);
    hash.truncate(PROFILE_HASH_LEN);
    Ok(hash)
}

/// Error raised by the matching service.
#[derive(Debug, thiserror::Error)]
pub enum MatchServiceError {
    #[error("locale '{locale}' does not carry a two-letter country subtag")]
    InvalidLocale { locale: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("failed to encode profile for hashing: {0}")]
    Encoding(#[from] serde_json::Error),
}
