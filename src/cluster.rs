//! Clustering of TSSs into TSRs.

use crate::aggregate::aggregate;
use crate::error::{Result, TsrError};
use crate::interval::{cmp_position, validate_sample, Feature, FeatureKey, GenomicInterval};
use crate::interval_index::stretch_merge;
use crate::record::Tsr;
use crate::sample::SampleCollection;
use crate::schema::{ScoreField, ScoreSchema};
use log::{debug, info, warn};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

/// Configuration parameters for [`cluster`]
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterConfig {
    /// Keep only TSSs whose score is at least this value.
    pub threshold: Option<f64>,
    /// Keep a position only if it passes `threshold` in at least this many
    /// samples.
    pub n_samples: Option<usize>,
    /// TSSs this far apart or closer end up in the same TSR.
    pub max_distance: i32,
    /// Drop TSRs wider than this.
    pub max_width: Option<i32>,
    /// Compare `threshold` against `normalized_score` instead of `score`.
    pub use_normalized: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            threshold: None,
            n_samples: None,
            max_distance: 25,
            max_width: None,
            use_normalized: false,
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self, schema: &ScoreSchema) -> Result<()> {
        if self.max_distance < 0 {
            return Err(TsrError::invalid_parameter(
                "max_distance",
                format!("must be zero or positive, got {}", self.max_distance),
            ));
        }
        if let Some(threshold) = self.threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(TsrError::invalid_parameter(
                    "threshold",
                    format!("must be a non-negative number, got {threshold}"),
                ));
            }
        }
        if self.n_samples == Some(0) {
            return Err(TsrError::invalid_parameter("n_samples", "must be at least 1"));
        }
        if let Some(max_width) = self.max_width {
            if max_width < 1 {
                return Err(TsrError::invalid_parameter(
                    "max_width",
                    format!("must be at least 1, got {max_width}"),
                ));
            }
        }
        if self.use_normalized && !schema.has(ScoreField::NormalizedScore) {
            return Err(TsrError::invalid_parameter(
                "use_normalized",
                "the TSS samples carry no normalized_score",
            ));
        }
        Ok(())
    }

    fn filter_field(&self) -> ScoreField {
        if self.use_normalized {
            ScoreField::NormalizedScore
        } else {
            ScoreField::Score
        }
    }

    fn passes(&self, interval: &GenomicInterval) -> bool {
        match self.threshold {
            Some(threshold) => self
                .filter_field()
                .get(interval)
                .is_some_and(|value| value >= threshold),
            None => true,
        }
    }
}

/// Cluster every TSS sample into a TSR sample of the same name.
///
/// Input samples are validated up front; any configuration error aborts the
/// whole call. Samples with no TSS left after filtering yield an empty TSR
/// set.
pub fn cluster<T>(
    tss_samples: &SampleCollection<T>,
    schema: &ScoreSchema,
    config: &ClusterConfig,
) -> Result<SampleCollection<Tsr>>
where
    T: Feature + Sync,
{
    config.validate(schema)?;
    for (sample, records) in tss_samples {
        schema.check(sample, records)?;
        validate_sample(sample, records)?;
    }

    let filtered = prefilter(tss_samples, config);

    let tsr_samples = filtered
        .par_iter()
        .map(|(sample, tss)| {
            let tsrs = cluster_sample(sample, tss, schema, config)?;
            debug!(
                "Sample '{}': {} TSSs clustered into {} TSRs",
                sample,
                tss.len(),
                tsrs.len()
            );
            Ok((sample.clone(), tsrs))
        })
        .collect::<Result<SampleCollection<Tsr>>>()?;

    info!(
        "Clustered {} samples into {} TSRs (max_distance {})",
        tsr_samples.len(),
        tsr_samples.values().map(Vec::len).sum::<usize>(),
        config.max_distance
    );

    Ok(tsr_samples)
}

/// Apply the score threshold and, if requested, the cross-sample presence
/// gate. The gate counts, for every feature key, the samples in which it
/// passes the threshold; a sample then keeps its own passing records of keys
/// seen in at least `n_samples` samples.
fn prefilter<'a, T: Feature>(
    tss_samples: &'a SampleCollection<T>,
    config: &ClusterConfig,
) -> SampleCollection<&'a GenomicInterval> {
    let passing: SampleCollection<&GenomicInterval> = tss_samples
        .iter()
        .map(|(sample, records)| {
            let kept: Vec<&GenomicInterval> = records
                .iter()
                .map(Feature::interval)
                .filter(|interval| config.passes(interval))
                .collect();
            (sample.clone(), kept)
        })
        .collect();

    let Some(n_samples) = config.n_samples else {
        return passing;
    };

    if n_samples > tss_samples.len() {
        warn!(
            "n_samples ({}) exceeds the number of samples ({}); no TSS can pass",
            n_samples,
            tss_samples.len()
        );
    }

    let mut presence: FxHashMap<FeatureKey, usize> = FxHashMap::default();
    for records in passing.values() {
        let keys: FxHashSet<FeatureKey> = records.iter().map(|interval| interval.key()).collect();
        for key in keys {
            *presence.entry(key).or_insert(0) += 1;
        }
    }

    passing
        .into_iter()
        .map(|(sample, records)| {
            let before = records.len();
            let kept: Vec<&GenomicInterval> = records
                .into_iter()
                .filter(|interval| {
                    presence
                        .get(&interval.key())
                        .is_some_and(|&count| count >= n_samples)
                })
                .collect();
            debug!(
                "Sample '{}': presence gate kept {} of {} TSSs",
                sample,
                kept.len(),
                before
            );
            (sample, kept)
        })
        .collect()
}

fn cluster_sample(
    sample: &str,
    tss: &[&GenomicInterval],
    schema: &ScoreSchema,
    config: &ClusterConfig,
) -> Result<Vec<Tsr>> {
    let groups = stretch_merge(sample, tss, config.max_distance)?;

    let mut tsrs = Vec::with_capacity(groups.len());
    for group in groups {
        let tsr = aggregate(sample, schema, group.iter().map(|&idx| tss[idx]))?;
        if config.max_width.is_some_and(|max_width| tsr.width() > max_width) {
            continue;
        }
        tsrs.push(tsr);
    }

    tsrs.sort_by(|a, b| cmp_position(&a.interval, &b.interval));
    Ok(tsrs)
}
