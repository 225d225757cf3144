use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_json::{json, Value};

use super::domain::{
    ComparisonRule, CountryCode, CountryEligibility, Criterion, CriterionField, ImportanceClass,
    Trial, TrialId,
};

/// Raw trial shape as it appears in catalog data: a registry id, a country
/// list (or the `"global"` sentinel), and loosely typed criteria entries.
#[derive(Debug, Clone, Deserialize)]
pub struct TrialDefinition {
    pub trial_id: String,
    pub country_list: CountryListSpec,
    #[serde(default)]
    pub criteria: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CountryListSpec {
    Sentinel(String),
    Codes(Vec<String>),
}

const GLOBAL_SENTINEL: &str = "global";

/// Catalog-integrity defects. All of these are fatal at load time; a request
/// never sees a half-validated catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("trial '{trial_id}' references unknown criterion '{key}'")]
    UnknownCriterion { trial_id: String, key: String },
    #[error("trial '{trial_id}' criterion '{key}' expects a {expected} value")]
    InvalidCriterionValue {
        trial_id: String,
        key: String,
        expected: &'static str,
    },
    #[error("trial '{trial_id}' country marker '{value}' is neither 'global' nor a country list")]
    UnknownCountrySentinel { trial_id: String, value: String },
    #[error("trial '{trial_id}' lists invalid country code '{code}'")]
    InvalidCountryCode { trial_id: String, code: String },
    #[error("trial '{trial_id}' lists no countries")]
    EmptyCountryList { trial_id: String },
    #[error("duplicate trial id '{trial_id}'")]
    DuplicateTrial { trial_id: String },
}

/// Ordered, immutable collection of validated trials. Loaded once at startup;
/// read-only shared data afterwards.
#[derive(Debug, Clone)]
pub struct TrialCatalog {
    trials: Vec<Trial>,
}

impl TrialCatalog {
    /// Validate raw definitions into a catalog, failing fast on the first
    /// integrity defect.
    pub fn from_definitions(definitions: Vec<TrialDefinition>) -> Result<Self, CatalogError> {
        let mut trials = Vec::with_capacity(definitions.len());
        let mut seen_ids = BTreeSet::new();

        for definition in definitions {
            if !seen_ids.insert(definition.trial_id.clone()) {
                return Err(CatalogError::DuplicateTrial {
                    trial_id: definition.trial_id,
                });
            }

            let countries = resolve_countries(&definition.trial_id, &definition.country_list)?;

            let mut criteria = Vec::with_capacity(definition.criteria.len());
            for (key, value) in &definition.criteria {
                criteria.push(criterion_from_entry(&definition.trial_id, key, value)?);
            }

            trials.push(Trial {
                trial_id: TrialId(definition.trial_id),
                countries,
                criteria,
            });
        }

        Ok(Self { trials })
    }

    /// The seed catalog shipped with the service.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_definitions(builtin_definitions())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trial> {
        self.trials.iter()
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

fn resolve_countries(
    trial_id: &str,
    spec: &CountryListSpec,
) -> Result<CountryEligibility, CatalogError> {
    match spec {
        CountryListSpec::Sentinel(value) if value == GLOBAL_SENTINEL => {
            Ok(CountryEligibility::Global)
        }
        CountryListSpec::Sentinel(value) => Err(CatalogError::UnknownCountrySentinel {
            trial_id: trial_id.to_string(),
            value: value.clone(),
        }),
        CountryListSpec::Codes(raw_codes) => {
            if raw_codes.is_empty() {
                return Err(CatalogError::EmptyCountryList {
                    trial_id: trial_id.to_string(),
                });
            }
            let mut codes = BTreeSet::new();
            for raw in raw_codes {
                let code =
                    CountryCode::new(raw).map_err(|_| CatalogError::InvalidCountryCode {
                        trial_id: trial_id.to_string(),
                        code: raw.clone(),
                    })?;
                codes.insert(code);
            }
            Ok(CountryEligibility::Countries(codes))
        }
    }
}

/// The fixed criterion vocabulary: every known key maps to one comparison rule
/// and one importance class. Anything else is a catalog defect.
fn criterion_from_entry(trial_id: &str, key: &str, value: &Value) -> Result<Criterion, CatalogError> {
    match key {
        "age_min" => {
            let minimum = value
                .as_i64()
                .ok_or_else(|| CatalogError::InvalidCriterionValue {
                    trial_id: trial_id.to_string(),
                    key: key.to_string(),
                    expected: "numeric",
                })?;
            Ok(Criterion {
                field: CriterionField::Age,
                rule: ComparisonRule::Threshold { minimum },
                importance: ImportanceClass::MandatoryInclusion,
            })
        }
        "diabetic" => {
            let expected = value
                .as_bool()
                .ok_or_else(|| CatalogError::InvalidCriterionValue {
                    trial_id: trial_id.to_string(),
                    key: key.to_string(),
                    expected: "boolean",
                })?;
            Ok(Criterion {
                field: CriterionField::Diabetic,
                rule: ComparisonRule::Equality { expected },
                importance: ImportanceClass::ImportantInclusion,
            })
        }
        "cardiac_history" => {
            let expected = value
                .as_bool()
                .ok_or_else(|| CatalogError::InvalidCriterionValue {
                    trial_id: trial_id.to_string(),
                    key: key.to_string(),
                    expected: "boolean",
                })?;
            Ok(Criterion {
                field: CriterionField::CardiacHistory,
                rule: ComparisonRule::Equality { expected },
                importance: ImportanceClass::SoftInclusion,
            })
        }
        _ => Err(CatalogError::UnknownCriterion {
            trial_id: trial_id.to_string(),
            key: key.to_string(),
        }),
    }
}

fn builtin_definitions() -> Vec<TrialDefinition> {
    vec![
        TrialDefinition {
            trial_id: "NCT01007279".to_string(),
            country_list: CountryListSpec::Codes(vec![
                "FR".to_string(),
                "BE".to_string(),
                "DE".to_string(),
            ]),
            criteria: BTreeMap::from([
                ("age_min".to_string(), json!(50)),
                ("diabetic".to_string(), json!(false)),
                ("cardiac_history".to_string(), json!(true)),
            ]),
        },
        TrialDefinition {
            trial_id: "NCT02592421".to_string(),
            country_list: CountryListSpec::Codes(vec!["US".to_string(), "CA".to_string()]),
            criteria: BTreeMap::from([
                ("age_min".to_string(), json!(18)),
                ("diabetic".to_string(), json!(false)),
            ]),
        },
        TrialDefinition {
            trial_id: "NCT99999999".to_string(),
            country_list: CountryListSpec::Sentinel(GLOBAL_SENTINEL.to_string()),
            criteria: BTreeMap::from([("age_min".to_string(), json!(21))]),
        },
    ]
}
