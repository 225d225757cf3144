use std::collections::BTreeMap;

use serde_json::json;

use crate::matching::catalog::{CatalogError, CountryListSpec, TrialCatalog, TrialDefinition};
use crate::matching::domain::{
    ComparisonRule, CountryEligibility, CriterionField, ImportanceClass, TrialId,
};

fn definition(trial_id: &str, criteria: BTreeMap<String, serde_json::Value>) -> TrialDefinition {
    TrialDefinition {
        trial_id: trial_id.to_string(),
        country_list: CountryListSpec::Codes(vec!["US".to_string()]),
        criteria,
    }
}

#[test]
fn builtin_catalog_loads_three_ordered_trials() {
    let catalog = TrialCatalog::builtin().expect("builtin catalog is valid");

    let ids: Vec<&TrialId> = catalog.iter().map(|trial| &trial.trial_id).collect();
    assert_eq!(catalog.len(), 3);
    assert!(!catalog.is_empty());
    assert_eq!(ids[0].0, "NCT01007279");
    assert_eq!(ids[1].0, "NCT02592421");
    assert_eq!(ids[2].0, "NCT99999999");
}

#[test]
fn vocabulary_maps_keys_to_rules_and_importance() {
    let catalog = TrialCatalog::builtin().expect("builtin catalog is valid");
    let french = catalog
        .iter()
        .find(|trial| trial.trial_id.0 == "NCT01007279")
        .expect("seed trial present");

    let age = french
        .criteria
        .iter()
        .find(|criterion| criterion.field == CriterionField::Age)
        .expect("age criterion");
    assert_eq!(age.rule, ComparisonRule::Threshold { minimum: 50 });
    assert_eq!(age.importance, ImportanceClass::MandatoryInclusion);

    let diabetic = french
        .criteria
        .iter()
        .find(|criterion| criterion.field == CriterionField::Diabetic)
        .expect("diabetic criterion");
    assert_eq!(diabetic.rule, ComparisonRule::Equality { expected: false });
    assert_eq!(diabetic.importance, ImportanceClass::ImportantInclusion);

    let cardiac = french
        .criteria
        .iter()
        .find(|criterion| criterion.field == CriterionField::CardiacHistory)
        .expect("cardiac criterion");
    assert_eq!(cardiac.rule, ComparisonRule::Equality { expected: true });
    assert_eq!(cardiac.importance, ImportanceClass::SoftInclusion);
}

#[test]
fn unknown_criterion_key_is_fatal_at_load() {
    let defs = vec![definition(
        "NCT00000001",
        BTreeMap::from([("smoker".to_string(), json!(false))]),
    )];

    let error = TrialCatalog::from_definitions(defs).expect_err("unknown key rejected");
    assert_eq!(
        error,
        CatalogError::UnknownCriterion {
            trial_id: "NCT00000001".to_string(),
            key: "smoker".to_string(),
        }
    );
}

#[test]
fn mistyped_criterion_value_is_fatal_at_load() {
    let defs = vec![definition(
        "NCT00000001",
        BTreeMap::from([("age_min".to_string(), json!("fifty"))]),
    )];

    let error = TrialCatalog::from_definitions(defs).expect_err("mistyped value rejected");
    assert!(matches!(
        error,
        CatalogError::InvalidCriterionValue { expected: "numeric", .. }
    ));
}

#[test]
fn unrecognized_country_sentinel_is_rejected() {
    let defs = vec![TrialDefinition {
        trial_id: "NCT00000001".to_string(),
        country_list: CountryListSpec::Sentinel("worldwide".to_string()),
        criteria: BTreeMap::new(),
    }];

    let error = TrialCatalog::from_definitions(defs).expect_err("sentinel rejected");
    assert!(matches!(error, CatalogError::UnknownCountrySentinel { .. }));
}

#[test]
fn invalid_country_code_is_rejected() {
    let defs = vec![TrialDefinition {
        trial_id: "NCT00000001".to_string(),
        country_list: CountryListSpec::Codes(vec!["FRA".to_string()]),
        criteria: BTreeMap::new(),
    }];

    let error = TrialCatalog::from_definitions(defs).expect_err("alpha-3 rejected");
    assert!(matches!(error, CatalogError::InvalidCountryCode { .. }));
}

#[test]
fn empty_country_list_is_rejected() {
    let defs = vec![TrialDefinition {
        trial_id: "NCT00000001".to_string(),
        country_list: CountryListSpec::Codes(Vec::new()),
        criteria: BTreeMap::new(),
    }];

    let error = TrialCatalog::from_definitions(defs).expect_err("empty list rejected");
    assert!(matches!(error, CatalogError::EmptyCountryList { .. }));
}

#[test]
fn duplicate_trial_ids_are_rejected() {
    let defs = vec![
        definition("NCT00000001", BTreeMap::new()),
        definition("NCT00000001", BTreeMap::new()),
    ];

    let error = TrialCatalog::from_definitions(defs).expect_err("duplicate rejected");
    assert_eq!(
        error,
        CatalogError::DuplicateTrial {
            trial_id: "NCT00000001".to_string(),
        }
    );
}

#[test]
fn definitions_deserialize_from_original_data_shape() {
    let raw = json!([
        {
            "trial_id": "NCT99999999",
            "country_list": "global",
            "criteria": { "age_min": 21 }
        },
        {
            "trial_id": "NCT02592421",
            "country_list": ["US", "CA"],
            "criteria": { "age_min": 18, "diabetic": false }
        }
    ]);

    let defs: Vec<TrialDefinition> =
        serde_json::from_value(raw).expect("definitions deserialize");
    let catalog = TrialCatalog::from_definitions(defs).expect("catalog validates");

    let global = catalog
        .iter()
        .find(|trial| trial.trial_id.0 == "NCT99999999")
        .expect("global trial present");
    assert_eq!(global.countries, CountryEligibility::Global);
}
