//! Patient-to-trial matching: catalog, scoring engine, service facade, and
//! HTTP boundary.
//!
//! The engine is a stateless transform from (catalog, profile, country) to a
//! full partition of the catalog into matches and exclusions. Everything with
//! side effects sits behind the repository trait or the router.

pub mod catalog;
pub mod domain;
pub mod engine;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogError, TrialCatalog, TrialDefinition};
pub use domain::{
    AnswerValue, ComparisonRule, CountryCode, CountryCodeError, CountryEligibility, Criterion,
    CriterionField, ExclusionReason, ImportanceClass, MatchOutcome, MatchResult, MatchStatus,
    PatientProfile, Trial, TrialId,
};
pub use engine::{
    MatchingEngine, ScoreComponent, ScoringWeights, TrialEvaluation, ValidationError,
    WeightTableError,
};
pub use repository::{
    InMemorySubmissionRepository, RepositoryError, SubmissionId, SubmissionRecord,
    SubmissionRepository, SubmissionStatus, SubmissionStatusView,
};
pub use router::{matching_router, MatchResponse};
pub use service::{country_from_locale, MatchRequest, MatchService, MatchServiceError};
