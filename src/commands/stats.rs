use crate::error::Result;
use crate::interval::Feature;
use crate::sample::{sample_names, DataType, RecordKind, SampleCollection};
use crate::store::ExperimentStore;
use std::io::Write;

/// Summary of one sample of one slot.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleStats {
    pub data_type: DataType,
    pub sample: String,
    pub records: usize,
    pub total_score: f64,
    /// TSR slots only.
    pub median_width: Option<f64>,
}

fn median(values: &mut [i32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] as f64 + values[mid] as f64) / 2.0
    } else {
        values[mid] as f64
    })
}

fn slot_stats<T: Feature>(data_type: DataType, samples: &SampleCollection<T>) -> Vec<SampleStats> {
    sample_names(samples)
        .into_iter()
        .map(|sample| {
            let records = &samples[sample];
            let median_width = match data_type.record_kind() {
                RecordKind::Tsr => {
                    let mut widths: Vec<i32> = records.iter().map(|r| r.interval().width()).collect();
                    median(&mut widths)
                }
                RecordKind::Tss => None,
            };
            SampleStats {
                data_type,
                sample: sample.to_string(),
                records: records.len(),
                total_score: records.iter().map(|r| r.interval().score).sum(),
                median_width,
            }
        })
        .collect()
}

pub fn collect_stats(store: &ExperimentStore) -> Result<Vec<SampleStats>> {
    let mut stats = Vec::new();
    for info in store.slots() {
        match info.kind {
            RecordKind::Tss => stats.extend(slot_stats(info.data_type, store.tss(info.data_type)?.0)),
            RecordKind::Tsr => stats.extend(slot_stats(info.data_type, store.tsr(info.data_type)?.0)),
        }
    }
    Ok(stats)
}

pub fn run_stats<W: Write>(store: &ExperimentStore, mut out: W) -> Result<()> {
    writeln!(out, "slot\tsample\trecords\ttotal_score\tmedian_width")?;
    for row in collect_stats(store)? {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            row.data_type,
            row.sample,
            row.records,
            row.total_score,
            row.median_width.map_or_else(|| "NA".to_string(), |w| w.to_string())
        )?;
    }
    out.flush()?;
    Ok(())
}
