use crate::matching::domain::{
    AnswerValue, ComparisonRule, CountryCode, Criterion, PatientProfile, Trial,
};

use super::weights::ScoringWeights;
use super::{ScoreComponent, ValidationError};

pub(crate) const GEO_EXCLUSION_REASON: &str = "no study sites in your country";

/// Hard gate: a trial is reachable iff it recruits globally or lists the
/// patient's country among its sites.
pub(crate) fn geo_eligible(trial: &Trial, country: &CountryCode) -> bool {
    trial.countries.allows(country)
}

/// Evaluate every criterion on the trial against the profile, accumulating
/// weight for each satisfied one. Absent answers are "not evaluated" and
/// contribute nothing; a present answer of the wrong type is a validation
/// failure, never a silent coercion.
pub(crate) fn evaluate_criteria(
    trial: &Trial,
    profile: &PatientProfile,
    weights: &ScoringWeights,
) -> Result<(Vec<ScoreComponent>, i32), ValidationError> {
    let mut components = Vec::with_capacity(trial.criteria.len() + 1);
    let mut total: i32 = 0;

    for criterion in &trial.criteria {
        let key = criterion.field.key();
        let Some(answer) = profile.answer(key) else {
            components.push(ScoreComponent {
                criterion: key,
                weight: 0,
                notes: "no answer provided, not evaluated".to_string(),
            });
            continue;
        };

        if criterion_satisfied(criterion, answer)? {
            let weight = weights.weight_for(criterion.importance);
            total += weight;
            components.push(ScoreComponent {
                criterion: key,
                weight,
                notes: satisfied_note(criterion, answer),
            });
        } else {
            components.push(ScoreComponent {
                criterion: key,
                weight: 0,
                notes: unmet_note(criterion, answer),
            });
        }
    }

    Ok((components, total))
}

fn criterion_satisfied(
    criterion: &Criterion,
    answer: &AnswerValue,
) -> Result<bool, ValidationError> {
    match (criterion.rule, answer) {
        (ComparisonRule::Threshold { minimum }, AnswerValue::Number(value)) => {
            Ok(*value >= minimum)
        }
        (ComparisonRule::Equality { expected }, AnswerValue::Flag(value)) => {
            Ok(*value == expected)
        }
        (ComparisonRule::Threshold { .. }, other) => Err(ValidationError::TypeMismatch {
            field: criterion.field.key(),
            expected: "number",
            found: other.type_name(),
        }),
        (ComparisonRule::Equality { .. }, other) => Err(ValidationError::TypeMismatch {
            field: criterion.field.key(),
            expected: "boolean",
            found: other.type_name(),
        }),
    }
}

fn satisfied_note(criterion: &Criterion, answer: &AnswerValue) -> String {
    match (criterion.rule, answer) {
        (ComparisonRule::Threshold { minimum }, AnswerValue::Number(value)) => {
            format!("{value} meets minimum {minimum}")
        }
        (ComparisonRule::Equality { expected }, _) => {
            format!("answer matches required value {expected}")
        }
        _ => "criterion satisfied".to_string(),
    }
}

fn unmet_note(criterion: &Criterion, answer: &AnswerValue) -> String {
    match (criterion.rule, answer) {
        (ComparisonRule::Threshold { minimum }, AnswerValue::Number(value)) => {
            format!("{value} below minimum {minimum}, not counted")
        }
        (ComparisonRule::Equality { expected }, _) => {
            format!("answer differs from required value {expected}, not counted")
        }
        _ => "criterion not met".to_string(),
    }
}
