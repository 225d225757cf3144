use serde::Serialize;

use crate::matching::domain::ImportanceClass;

/// Weight table for the scoring engine. Immutable configuration handed to the
/// engine at construction; the defaults are the system constants. Custom
/// tables go through [`ScoringWeights::new`], so the normalizer is always
/// positive and the exclusion weight always negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoringWeights {
    mandatory_inclusion: i32,
    mandatory_exclusion: i32,
    important_inclusion: i32,
    soft_inclusion: i32,
    geo_match_bonus: i32,
}

/// Rejected weight tables. Both defects would corrupt every score the engine
/// produces, so they are refused up front.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeightTableError {
    #[error("inclusion weights and geo bonus must sum to a positive normalizer, got {normalizer}")]
    NonPositiveNormalizer { normalizer: i32 },
    #[error("the mandatory exclusion weight must be negative, got {weight}")]
    NonNegativeExclusion { weight: i32 },
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            mandatory_inclusion: 5,
            mandatory_exclusion: -999,
            important_inclusion: 3,
            soft_inclusion: 1,
            geo_match_bonus: 2,
        }
    }
}

impl ScoringWeights {
    pub fn new(
        mandatory_inclusion: i32,
        mandatory_exclusion: i32,
        important_inclusion: i32,
        soft_inclusion: i32,
        geo_match_bonus: i32,
    ) -> Result<Self, WeightTableError> {
        let table = Self {
            mandatory_inclusion,
            mandatory_exclusion,
            important_inclusion,
            soft_inclusion,
            geo_match_bonus,
        };

        let normalizer = table.max_possible_score();
        if normalizer <= 0 {
            return Err(WeightTableError::NonPositiveNormalizer { normalizer });
        }
        if mandatory_exclusion >= 0 {
            return Err(WeightTableError::NonNegativeExclusion {
                weight: mandatory_exclusion,
            });
        }

        Ok(table)
    }

    pub const fn weight_for(&self, class: ImportanceClass) -> i32 {
        match class {
            ImportanceClass::MandatoryInclusion => self.mandatory_inclusion,
            ImportanceClass::MandatoryExclusion => self.mandatory_exclusion,
            ImportanceClass::ImportantInclusion => self.important_inclusion,
            ImportanceClass::SoftInclusion => self.soft_inclusion,
        }
    }

    pub const fn geo_match_bonus(&self) -> i32 {
        self.geo_match_bonus
    }

    /// Engine-wide normalizer: the sum of every positive weight class plus the
    /// geo bonus. A fixed constant of the weight table, never recomputed from
    /// a trial's criteria count, so percentages stay comparable across trials.
    pub const fn max_possible_score(&self) -> i32 {
        self.mandatory_inclusion + self.important_inclusion + self.soft_inclusion
            + self.geo_match_bonus
    }
}
