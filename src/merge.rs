//! Consensus building across samples.

use crate::aggregate::aggregate;
use crate::error::{Result, TsrError};
use crate::interval::{cmp_position, validate_sample, Feature, GenomicInterval};
use crate::interval_index::stretch_merge;
use crate::record::Tsr;
use crate::sample::SampleCollection;
use crate::schema::ScoreSchema;
use log::{debug, info};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

/// Configuration parameters for [`merge`]
#[derive(Clone, Debug, PartialEq)]
pub struct MergeConfig {
    /// Sample name -> merge group name. Every input sample must be assigned.
    pub group_by: FxHashMap<String, String>,
    /// Intervals this far apart or closer are merged; 0 merges only
    /// overlapping or adjacent intervals.
    pub max_distance: i32,
}

impl MergeConfig {
    pub fn new(group_by: FxHashMap<String, String>) -> Self {
        Self {
            group_by,
            max_distance: 0,
        }
    }

    fn validate<T>(&self, samples: &SampleCollection<T>) -> Result<()> {
        if self.max_distance < 0 {
            return Err(TsrError::invalid_parameter(
                "max_distance",
                format!("must be zero or positive, got {}", self.max_distance),
            ));
        }
        for sample in self.group_by.keys() {
            if !samples.contains_key(sample) {
                return Err(TsrError::UnknownSample {
                    role: "group_by",
                    sample: sample.clone(),
                });
            }
        }
        for sample in samples.keys() {
            if !self.group_by.contains_key(sample) {
                return Err(TsrError::invalid_parameter(
                    "group_by",
                    format!("sample '{sample}' is not assigned to a merge group"),
                ));
            }
        }
        Ok(())
    }
}

/// Union the intervals of every group's member samples and reduce them to
/// one consensus interval set per group.
///
/// Works on TSS or TSR samples alike. `n_unique` of a merged interval counts
/// the input intervals it absorbed; groups of one sample still collapse any
/// overlaps within that sample.
pub fn merge<T>(
    samples: &SampleCollection<T>,
    schema: &ScoreSchema,
    config: &MergeConfig,
) -> Result<SampleCollection<Tsr>>
where
    T: Feature + Sync,
{
    config.validate(samples)?;
    for (sample, records) in samples {
        schema.check(sample, records)?;
        validate_sample(sample, records)?;
    }

    let mut groups: FxHashMap<&str, Vec<&GenomicInterval>> = FxHashMap::default();
    for (sample, group) in &config.group_by {
        groups
            .entry(group.as_str())
            .or_default()
            .extend(samples[sample].iter().map(Feature::interval));
    }

    let merged = groups
        .par_iter()
        .map(|(&group, members)| {
            let merge_groups = stretch_merge(group, members, config.max_distance)?;
            let mut consensus = merge_groups
                .iter()
                .map(|idxs| aggregate(group, schema, idxs.iter().map(|&idx| members[idx])))
                .collect::<Result<Vec<Tsr>>>()?;
            consensus.sort_by(|a, b| cmp_position(&a.interval, &b.interval));

            debug!(
                "Group '{}': {} intervals merged into {}",
                group,
                members.len(),
                consensus.len()
            );
            Ok((group.to_string(), consensus))
        })
        .collect::<Result<SampleCollection<Tsr>>>()?;

    info!(
        "Merged {} samples into {} groups",
        samples.len(),
        merged.len()
    );

    Ok(merged)
}
