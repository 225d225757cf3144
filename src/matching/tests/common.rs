use std::collections::BTreeSet;
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::matching::catalog::TrialCatalog;
use crate::matching::domain::{
    AnswerValue, ComparisonRule, CountryCode, CountryEligibility, Criterion, CriterionField,
    ImportanceClass, PatientProfile, Trial, TrialId,
};
use crate::matching::engine::{MatchingEngine, ScoringWeights};
use crate::matching::repository::{
    InMemorySubmissionRepository, RepositoryError, SubmissionId, SubmissionRecord,
    SubmissionRepository,
};
use crate::matching::router::matching_router;
use crate::matching::service::{MatchRequest, MatchService};

pub(super) const APPLY_BASE_URL: &str = "https://apply.example";

pub(super) fn engine() -> MatchingEngine {
    MatchingEngine::new(ScoringWeights::default(), APPLY_BASE_URL)
}

pub(super) fn catalog() -> TrialCatalog {
    TrialCatalog::builtin().expect("builtin catalog is valid")
}

pub(super) fn country(code: &str) -> CountryCode {
    CountryCode::new(code).expect("valid country code")
}

pub(super) fn countries(codes: &[&str]) -> CountryEligibility {
    CountryEligibility::Countries(codes.iter().map(|code| country(code)).collect::<BTreeSet<_>>())
}

/// US and CA sites, adults without diabetes.
pub(super) fn us_trial() -> Trial {
    Trial {
        trial_id: TrialId("NCT02592421".to_string()),
        countries: countries(&["US", "CA"]),
        criteria: vec![
            Criterion {
                field: CriterionField::Age,
                rule: ComparisonRule::Threshold { minimum: 18 },
                importance: ImportanceClass::MandatoryInclusion,
            },
            Criterion {
                field: CriterionField::Diabetic,
                rule: ComparisonRule::Equality { expected: false },
                importance: ImportanceClass::ImportantInclusion,
            },
        ],
    }
}

pub(super) fn global_trial() -> Trial {
    Trial {
        trial_id: TrialId("NCT99999999".to_string()),
        countries: CountryEligibility::Global,
        criteria: vec![Criterion {
            field: CriterionField::Age,
            rule: ComparisonRule::Threshold { minimum: 21 },
            importance: ImportanceClass::MandatoryInclusion,
        }],
    }
}

pub(super) fn french_trial() -> Trial {
    Trial {
        trial_id: TrialId("NCT01007279".to_string()),
        countries: countries(&["FR", "BE", "DE"]),
        criteria: Vec::new(),
    }
}

pub(super) fn profile(age: i64, diabetic: bool) -> PatientProfile {
    PatientProfile::default()
        .with_answer("age", AnswerValue::Number(age))
        .with_answer("diabetic", AnswerValue::Flag(diabetic))
}

pub(super) fn full_profile() -> PatientProfile {
    profile(60, false)
        .with_answer("cardiac_history", AnswerValue::Flag(true))
        .with_answer("name", AnswerValue::Text("Alice".to_string()))
}

pub(super) fn request(locale: &str) -> MatchRequest {
    MatchRequest {
        locale: locale.to_string(),
        profile: full_profile(),
    }
}

pub(super) fn build_service() -> (
    MatchService<InMemorySubmissionRepository>,
    Arc<InMemorySubmissionRepository>,
) {
    let repository = Arc::new(InMemorySubmissionRepository::default());
    let service = MatchService::new(Arc::new(catalog()), engine(), repository.clone());
    (service, repository)
}

pub(super) fn router_with_service(
    service: MatchService<InMemorySubmissionRepository>,
) -> axum::Router {
    matching_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 16)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Repository stub whose every operation fails, for exercising 500 paths.
pub(super) struct UnavailableRepository;

impl SubmissionRepository for UnavailableRepository {
    fn insert(&self, _record: SubmissionRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn fetch(&self, _id: &SubmissionId) -> Result<Option<SubmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn recent(&self, _limit: usize) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }
}
