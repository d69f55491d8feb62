//! Library-size scaling of scores.

use crate::error::Result;
use crate::interval::FeatureMut;
use crate::sample::SampleCollection;
use crate::schema::ScoreSchema;
use log::{debug, warn};
use rayon::prelude::*;

/// Counts-per-million: `normalized_score = score / total score of the sample
/// * 1e6`. Returns a new collection together with the schema it now satisfies.
/// Every sample is scaled independently; a sample with a zero total gets a
/// normalized score of zero throughout.
pub fn cpm<T>(samples: &SampleCollection<T>) -> Result<(SampleCollection<T>, ScoreSchema)>
where
    T: FeatureMut + Clone + Send + Sync,
{
    for (sample, records) in samples {
        for record in records {
            record.interval().validate(sample)?;
        }
    }

    let normalized = samples
        .par_iter()
        .map(|(sample, records)| {
            let total: f64 = records.iter().map(|record| record.interval().score).sum();
            if total <= 0.0 && !records.is_empty() {
                warn!("Sample '{}' has a total score of zero", sample);
            }
            let factor = if total > 0.0 { 1e6 / total } else { 0.0 };
            debug!("Sample '{}': CPM scaling factor {}", sample, factor);

            let scaled: Vec<T> = records
                .iter()
                .cloned()
                .map(|mut record| {
                    let interval = record.interval_mut();
                    interval.normalized_score = Some(interval.score * factor);
                    record
                })
                .collect();
            (sample.clone(), scaled)
        })
        .collect();

    Ok((normalized, ScoreSchema::normalized()))
}
