//! Dominant TSS of each TSR.

use crate::error::{Result, TsrError};
use crate::interval::{GenomicInterval, Strand};
use crate::record::Tss;
use crate::sample::SampleCollection;
use crate::schema::{ScoreField, ScoreSchema};
use log::debug;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

/// Configuration parameters for [`mark_dominant`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DominantConfig {
    /// TSSs scoring below this never become dominant.
    pub threshold: Option<f64>,
    /// Rank by `normalized_score` instead of `score`.
    pub use_normalized: bool,
}

impl DominantConfig {
    fn field(&self) -> ScoreField {
        if self.use_normalized {
            ScoreField::NormalizedScore
        } else {
            ScoreField::Score
        }
    }
}

/// Flag, within every TSR of every associated sample, the TSS with the
/// highest score. Ties go to the most upstream TSS: the smallest start on the
/// forward strand, the largest end on the reverse strand. TSSs without a TSR
/// are never dominant.
pub fn mark_dominant(
    tss_samples: &SampleCollection<Tss>,
    schema: &ScoreSchema,
    config: &DominantConfig,
) -> Result<SampleCollection<Tss>> {
    if config.use_normalized && !schema.has(ScoreField::NormalizedScore) {
        return Err(TsrError::invalid_parameter(
            "use_normalized",
            "the TSS samples carry no normalized_score",
        ));
    }
    if config.threshold.is_some_and(|t| !t.is_finite() || t < 0.0) {
        return Err(TsrError::invalid_parameter(
            "threshold",
            "must be a non-negative number",
        ));
    }
    for (sample, records) in tss_samples {
        schema.check(sample, records)?;
    }

    let field = config.field();
    let marked = tss_samples
        .par_iter()
        .map(|(sample, records)| {
            let mut records = records.clone();
            let mut best: FxHashMap<String, usize> = FxHashMap::default();

            for (idx, tss) in records.iter().enumerate() {
                let Some(fhash) = tss.tsr_fhash() else {
                    continue;
                };
                let value = field.get(&tss.interval).unwrap_or(0.0);
                if config.threshold.is_some_and(|t| value < t) {
                    continue;
                }
                match best.get_mut(fhash) {
                    Some(current) => {
                        if outranks(&tss.interval, &records[*current].interval, field) {
                            *current = idx;
                        }
                    }
                    None => {
                        best.insert(fhash.to_string(), idx);
                    }
                }
            }

            for tss in records.iter_mut() {
                if let Some(association) = tss.association.as_mut() {
                    association.dominant = false;
                }
            }
            for &idx in best.values() {
                if let Some(association) = records[idx].association.as_mut() {
                    association.dominant = true;
                }
            }

            debug!("Sample '{}': {} dominant TSSs", sample, best.len());
            (sample.clone(), records)
        })
        .collect();

    Ok(marked)
}

fn outranks(candidate: &GenomicInterval, current: &GenomicInterval, field: ScoreField) -> bool {
    let a = field.get(candidate).unwrap_or(0.0);
    let b = field.get(current).unwrap_or(0.0);
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => true,
        Some(Ordering::Equal) => match candidate.strand {
            Strand::Reverse => candidate.end > current.end,
            _ => candidate.start < current.start,
        },
        _ => false,
    }
}
