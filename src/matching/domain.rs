use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for catalog trials (registry-style ids such as `NCT01007279`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrialId(pub String);

impl TrialId {
    /// Last three characters of the id, used when synthesizing application links.
    pub fn suffix(&self) -> &str {
        match self.0.char_indices().rev().nth(2) {
            Some((idx, _)) => &self.0[idx..],
            None => &self.0,
        }
    }
}

impl fmt::Display for TrialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated ISO-3166 alpha-2 country code, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not an ISO-3166 alpha-2 country code")]
pub struct CountryCodeError(pub String);

impl CountryCode {
    pub fn new(raw: &str) -> Result<Self, CountryCodeError> {
        let trimmed = raw.trim();
        if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(CountryCodeError(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CountryCode {
    type Error = CountryCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CountryCode> for String {
    fn from(value: CountryCode) -> Self {
        value.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Geographic eligibility for a trial: either open everywhere or limited to
/// an explicit set of country sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountryEligibility {
    Global,
    Countries(BTreeSet<CountryCode>),
}

impl CountryEligibility {
    pub fn allows(&self, country: &CountryCode) -> bool {
        match self {
            CountryEligibility::Global => true,
            CountryEligibility::Countries(codes) => codes.contains(country),
        }
    }
}

/// Importance class attached to every criterion. Weights are constants of the
/// engine configuration, never per-trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportanceClass {
    MandatoryInclusion,
    MandatoryExclusion,
    ImportantInclusion,
    SoftInclusion,
}

/// Profile field a criterion reads. The vocabulary is closed so unknown
/// catalog keys are rejected at load time rather than ignored while scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionField {
    Age,
    Diabetic,
    CardiacHistory,
}

impl CriterionField {
    /// Key under which the patient profile stores the corresponding answer.
    pub const fn key(self) -> &'static str {
        match self {
            CriterionField::Age => "age",
            CriterionField::Diabetic => "diabetic",
            CriterionField::CardiacHistory => "cardiac_history",
        }
    }
}

/// Comparison semantics for a criterion, enforced at the type level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonRule {
    /// Satisfied when the numeric answer is >= the minimum.
    Threshold { minimum: i64 },
    /// Satisfied when the boolean answer equals the expected value.
    Equality { expected: bool },
}

/// A single named eligibility rule with its comparison and importance weight class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub field: CriterionField,
    pub rule: ComparisonRule,
    pub importance: ImportanceClass,
}

/// An immutable catalog trial: identifier, geographic eligibility, and criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    pub trial_id: TrialId,
    pub countries: CountryEligibility,
    pub criteria: Vec<Criterion>,
}

/// A single self-reported answer. Contact fields ride along as text; the
/// engine only reads the keys its criteria name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl AnswerValue {
    pub const fn type_name(&self) -> &'static str {
        match self {
            AnswerValue::Flag(_) => "boolean",
            AnswerValue::Number(_) => "number",
            AnswerValue::Text(_) => "text",
        }
    }
}

/// Patient-supplied answers keyed by field name. Never mutated by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientProfile {
    pub answers: BTreeMap<String, AnswerValue>,
}

impl PatientProfile {
    pub fn answer(&self, key: &str) -> Option<&AnswerValue> {
        self.answers.get(key)
    }

    pub fn with_answer(mut self, key: &str, value: AnswerValue) -> Self {
        self.answers.insert(key.to_string(), value);
        self
    }
}

/// Categorical eligibility outcome, derived solely from the sign of the
/// match percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Eligible,
    Ineligible,
}

impl MatchStatus {
    pub const fn label(self) -> &'static str {
        match self {
            MatchStatus::Eligible => "eligible",
            MatchStatus::Ineligible => "ineligible",
        }
    }
}

/// A trial the patient scored positively against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub trial_id: TrialId,
    pub country_site: CountryCode,
    pub match_percentage: i32,
    pub status: MatchStatus,
    pub next_steps: String,
}

/// A trial dropped from the match list, with the reason produced at the gate
/// that zeroed the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionReason {
    pub trial_id: TrialId,
    pub reason: String,
}

/// Full partition of the catalog for one matching request. The union of
/// matches and exclusions always equals the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub matches: Vec<MatchResult>,
    pub exclusions: Vec<ExclusionReason>,
}
