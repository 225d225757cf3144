mod rules;
mod weights;

pub use weights::{ScoringWeights, WeightTableError};

use serde::Serialize;
use tracing::debug;

use crate::matching::catalog::TrialCatalog;
use crate::matching::domain::{
    CountryCode, ExclusionReason, MatchOutcome, MatchResult, MatchStatus, PatientProfile, Trial,
    TrialId,
};

/// Stateless evaluator applying the weight table to patient profiles. Owns no
/// request state; safe to share across threads behind an `Arc`.
pub struct MatchingEngine {
    weights: ScoringWeights,
    apply_base_url: String,
}

impl MatchingEngine {
    pub fn new(weights: ScoringWeights, apply_base_url: impl Into<String>) -> Self {
        let apply_base_url = apply_base_url.into().trim_end_matches('/').to_string();
        Self {
            weights,
            apply_base_url,
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// The geo gate on its own, exposed for callers that only need the
    /// pass/fail answer.
    pub fn geo_eligible(&self, trial: &Trial, country: &CountryCode) -> bool {
        rules::geo_eligible(trial, country)
    }

    /// Score one trial for the profile. The geo gate short-circuits scoring
    /// entirely; otherwise satisfied criteria accumulate their class weights,
    /// the geo bonus is added unconditionally, and the total is normalized by
    /// the fixed engine-wide maximum. The percentage is never clamped: a
    /// triggered mandatory-exclusion weight is allowed to sink it far below
    /// zero.
    pub fn score_trial(
        &self,
        trial: &Trial,
        profile: &PatientProfile,
        country: &CountryCode,
    ) -> Result<TrialEvaluation, ValidationError> {
        if !rules::geo_eligible(trial, country) {
            return Ok(TrialEvaluation {
                trial_id: trial.trial_id.clone(),
                match_percentage: 0,
                status: MatchStatus::Ineligible,
                components: Vec::new(),
                exclusion: Some(rules::GEO_EXCLUSION_REASON.to_string()),
            });
        }

        let (mut components, mut score) = rules::evaluate_criteria(trial, profile, &self.weights)?;

        score += self.weights.geo_match_bonus();
        components.push(ScoreComponent {
            criterion: "geo_match",
            weight: self.weights.geo_match_bonus(),
            notes: format!("study sites available in {country}"),
        });

        let match_percentage = (score * 100).div_euclid(self.weights.max_possible_score());
        let status = if match_percentage > 0 {
            MatchStatus::Eligible
        } else {
            MatchStatus::Ineligible
        };
        let exclusion = match status {
            MatchStatus::Eligible => None,
            MatchStatus::Ineligible => Some(MatchStatus::Ineligible.label().to_string()),
        };

        debug!(trial_id = %trial.trial_id, %country, score, match_percentage, "scored trial");

        Ok(TrialEvaluation {
            trial_id: trial.trial_id.clone(),
            match_percentage,
            status,
            components,
            exclusion,
        })
    }

    /// Evaluate the whole catalog in one pass and partition it into matches
    /// (positive percentage) and exclusions. Every trial lands in exactly one
    /// of the two lists.
    pub fn match_patient(
        &self,
        catalog: &TrialCatalog,
        profile: &PatientProfile,
        country: &CountryCode,
    ) -> Result<MatchOutcome, ValidationError> {
        let mut outcome = MatchOutcome::default();

        for trial in catalog.iter() {
            let evaluation = self.score_trial(trial, profile, country)?;
            match evaluation.exclusion {
                None => outcome.matches.push(MatchResult {
                    trial_id: evaluation.trial_id,
                    country_site: country.clone(),
                    match_percentage: evaluation.match_percentage,
                    status: evaluation.status,
                    next_steps: self.application_link(&trial.trial_id, country),
                }),
                Some(reason) => outcome.exclusions.push(ExclusionReason {
                    trial_id: evaluation.trial_id,
                    reason,
                }),
            }
        }

        Ok(outcome)
    }

    fn application_link(&self, trial_id: &TrialId, country: &CountryCode) -> String {
        format!(
            "{}/{}_{}",
            self.apply_base_url,
            trial_id.suffix(),
            country.as_str().to_ascii_lowercase()
        )
    }
}

/// Discrete contribution to a trial score, kept for audit and "why did this
/// match" explanations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreComponent {
    pub criterion: &'static str,
    pub weight: i32,
    pub notes: String,
}

/// Outcome of scoring a single trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialEvaluation {
    pub trial_id: TrialId,
    pub match_percentage: i32,
    pub status: MatchStatus,
    pub components: Vec<ScoreComponent>,
    /// Reason the trial was dropped; `None` exactly when the trial matched.
    pub exclusion: Option<String>,
}

/// A profile answer's type is incompatible with its criterion's comparison.
/// Raised before any score is produced for the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("profile answer '{field}' must be a {expected} for comparison, found {found}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}
