//! Declared numeric fields of a sample table.
//!
//! Which optional score columns a table carries is a property of the table,
//! stated once when it is read or produced, rather than something engines
//! discover by looking at individual records.

use crate::error::{Result, TsrError};
use crate::interval::{Feature, GenomicInterval};
use serde::{Deserialize, Serialize};

/// A numeric field that is summed when intervals are aggregated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreField {
    Score,
    NormalizedScore,
}

impl ScoreField {
    pub fn name(&self) -> &'static str {
        match self {
            ScoreField::Score => "score",
            ScoreField::NormalizedScore => "normalized_score",
        }
    }

    pub fn get(&self, interval: &GenomicInterval) -> Option<f64> {
        match self {
            ScoreField::Score => Some(interval.score),
            ScoreField::NormalizedScore => interval.normalized_score,
        }
    }

    pub fn set(&self, interval: &mut GenomicInterval, value: f64) {
        match self {
            ScoreField::Score => interval.score = value,
            ScoreField::NormalizedScore => interval.normalized_score = Some(value),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSchema {
    fields: Vec<ScoreField>,
}

impl Default for ScoreSchema {
    fn default() -> Self {
        Self::raw()
    }
}

impl ScoreSchema {
    /// Raw counts only.
    pub fn raw() -> Self {
        Self {
            fields: vec![ScoreField::Score],
        }
    }

    /// Raw counts plus a normalized score on every record.
    pub fn normalized() -> Self {
        Self {
            fields: vec![ScoreField::Score, ScoreField::NormalizedScore],
        }
    }

    pub fn fields(&self) -> &[ScoreField] {
        &self.fields
    }

    pub fn has(&self, field: ScoreField) -> bool {
        self.fields.contains(&field)
    }

    /// Ensure every record of a sample carries every declared field.
    pub fn check<T: Feature>(&self, sample: &str, records: &[T]) -> Result<()> {
        for record in records {
            let interval = record.interval();
            for field in &self.fields {
                if field.get(interval).is_none() {
                    return Err(TsrError::MissingField {
                        sample: sample.to_string(),
                        field: field.name(),
                        fhash: interval.fhash(),
                    });
                }
            }
        }
        Ok(())
    }
}
