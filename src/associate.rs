//! Re-linking TSSs to the TSRs that contain them.
//!
//! Matching is a directed overlap-left join: every TSS is kept, and a TSS
//! overlapping several TSRs is emitted once per TSR. Clustering output never
//! overlaps itself, but externally supplied TSR sets may, so callers that
//! need one TSR per TSS should merge such sets first.

use crate::error::{Result, TsrError};
use crate::interval_index::OverlapIndex;
use crate::record::{Association, Tsr, TsrSummary, Tss};
use crate::sample::SampleCollection;
use log::{debug, info, warn};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

/// Configuration parameters for [`associate`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssociateConfig {
    /// TSR sample name -> TSS sample names to match against it. When absent,
    /// every TSS sample is matched against the TSR sample of the same name.
    pub sample_mapping: Option<FxHashMap<String, Vec<String>>>,
}

impl AssociateConfig {
    /// Resolve the (TSS sample, TSR sample) pairs to process, rejecting
    /// unknown names and TSS samples mapped twice.
    fn pairs(
        &self,
        tss_samples: &SampleCollection<Tss>,
        tsr_samples: &SampleCollection<Tsr>,
    ) -> Result<Vec<(String, String)>> {
        let Some(mapping) = &self.sample_mapping else {
            return tss_samples
                .keys()
                .map(|tss_sample| {
                    if tsr_samples.contains_key(tss_sample) {
                        Ok((tss_sample.clone(), tss_sample.clone()))
                    } else {
                        Err(TsrError::MissingSamplePair {
                            sample: tss_sample.clone(),
                        })
                    }
                })
                .collect();
        };

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut pairs = Vec::new();
        for (tsr_sample, tss_names) in mapping {
            if !tsr_samples.contains_key(tsr_sample) {
                return Err(TsrError::UnknownSample {
                    role: "TSR",
                    sample: tsr_sample.clone(),
                });
            }
            for tss_sample in tss_names {
                if !tss_samples.contains_key(tss_sample) {
                    return Err(TsrError::UnknownSample {
                        role: "TSS",
                        sample: tss_sample.clone(),
                    });
                }
                if !seen.insert(tss_sample.as_str()) {
                    return Err(TsrError::DuplicateMapping {
                        sample: tss_sample.clone(),
                    });
                }
                pairs.push((tss_sample.clone(), tsr_sample.clone()));
            }
        }
        Ok(pairs)
    }
}

/// Match TSS samples against TSR samples and copy TSR fields onto each TSS.
///
/// Returns the full TSS collection: associated samples are replaced, all
/// other samples are returned unchanged. Any association already present on
/// a replaced sample is discarded.
pub fn associate(
    tss_samples: &SampleCollection<Tss>,
    tsr_samples: &SampleCollection<Tsr>,
    config: &AssociateConfig,
) -> Result<SampleCollection<Tss>> {
    let pairs = config.pairs(tss_samples, tsr_samples)?;

    for (tss_sample, _) in &pairs {
        for tss in &tss_samples[tss_sample] {
            tss.interval.validate(tss_sample)?;
        }
    }

    let used_tsr_samples: FxHashSet<&str> = pairs.iter().map(|(_, tsr)| tsr.as_str()).collect();
    let indexes: FxHashMap<&str, OverlapIndex> = used_tsr_samples
        .into_par_iter()
        .map(|tsr_sample| {
            OverlapIndex::new(tsr_sample, &tsr_samples[tsr_sample]).map(|index| (tsr_sample, index))
        })
        .collect::<Result<_>>()?;

    let associated: Vec<(String, Vec<Tss>)> = pairs
        .par_iter()
        .map(|(tss_sample, tsr_sample)| {
            let records = associate_sample(
                tss_sample,
                &tss_samples[tss_sample],
                tsr_sample,
                &tsr_samples[tsr_sample],
                &indexes[tsr_sample.as_str()],
            );
            (tss_sample.clone(), records)
        })
        .collect();

    let mut result = tss_samples.clone();
    let replaced = associated.len();
    for (tss_sample, records) in associated {
        result.insert(tss_sample, records);
    }

    info!(
        "Associated {} TSS samples with TSRs; {} samples left untouched",
        replaced,
        result.len() - replaced
    );

    Ok(result)
}

fn associate_sample(
    tss_sample: &str,
    tss: &[Tss],
    tsr_sample: &str,
    tsrs: &[Tsr],
    index: &OverlapIndex,
) -> Vec<Tss> {
    let mut records = Vec::with_capacity(tss.len());
    let mut unmatched = 0usize;
    let mut ambiguous = 0usize;

    for site in tss {
        let hits = index.overlaps(&site.interval);
        if hits.len() > 1 {
            ambiguous += 1;
        }
        if hits.is_empty() {
            unmatched += 1;
            records.push(Tss {
                interval: site.interval.clone(),
                association: Some(Association {
                    tsr_sample: tsr_sample.to_string(),
                    tsr: None,
                    dominant: false,
                }),
            });
            continue;
        }
        for hit in hits {
            records.push(Tss {
                interval: site.interval.clone(),
                association: Some(Association {
                    tsr_sample: tsr_sample.to_string(),
                    tsr: Some(TsrSummary::from_tsr(&tsrs[hit])),
                    dominant: false,
                }),
            });
        }
    }

    if ambiguous > 0 {
        warn!(
            "{} TSSs of sample '{}' overlap more than one TSR of '{}'; each match is reported",
            ambiguous, tss_sample, tsr_sample
        );
    }
    debug!(
        "Sample '{}' vs TSRs of '{}': {} TSSs, {} unmatched, {} rows",
        tss_sample,
        tsr_sample,
        tss.len(),
        unmatched,
        records.len()
    );

    records
}
