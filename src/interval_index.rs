//! Strand-aware interval grouping and overlap queries.
//!
//! All queries here are directed: intervals on opposite strands never merge
//! and never overlap, which is the same as working on each
//! (seqname, strand) partition independently.

use crate::error::{Result, TsrError};
use crate::interval::{Feature, GenomicInterval, Strand};
use crate::seqidx::SequenceIndex;
use coitrees::{BasicCOITree, Interval, IntervalTree};
use log::debug;
use rustc_hash::FxHashMap;

/// Group features that touch once every interval is stretched by
/// `max_distance` bases on both sides.
///
/// Each group lists indices into `features`. Groups come out ordered by
/// natural seqname order, then strand, then start. The stretch is only used
/// to decide connectivity; callers measure the group from the members'
/// original coordinates.
pub fn stretch_merge<T: Feature>(
    sample: &str,
    features: &[T],
    max_distance: i32,
) -> Result<Vec<Vec<usize>>> {
    if max_distance < 0 {
        return Err(TsrError::invalid_parameter(
            "max_distance",
            format!("must be zero or positive, got {max_distance}"),
        ));
    }

    let mut seq_index = SequenceIndex::new();
    let mut order = Vec::with_capacity(features.len());
    for (idx, feature) in features.iter().enumerate() {
        let interval = feature.interval();
        interval.validate(sample)?;
        let seq_id = seq_index.get_or_insert_id(&interval.seqname);
        order.push((seq_id, interval.strand, interval.start, interval.end, idx));
    }

    // Rank partitions by natural seqname order so groups come out sorted.
    let mut rank = vec![0u32; seq_index.len()];
    for (position, seq_id) in seq_index.natural_order().into_iter().enumerate() {
        rank[seq_id as usize] = position as u32;
    }
    order.sort_unstable_by_key(|&(seq_id, strand, start, end, idx)| {
        (rank[seq_id as usize], strand, start, end, idx)
    });

    let slack = max_distance as i64;
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut current: Option<((u32, Strand), i64)> = None;

    for (seq_id, strand, start, end, idx) in order {
        let stretched_start = start as i64 - slack;
        let stretched_end = end as i64 + slack;

        // Adjacent stretched intervals merge as well as overlapping ones
        let extends = matches!(
            current,
            Some((partition, group_end))
                if partition == (seq_id, strand) && stretched_start <= group_end + 1
        );

        if extends {
            if let Some(group) = groups.last_mut() {
                group.push(idx);
            }
            if let Some((_, group_end)) = current.as_mut() {
                *group_end = (*group_end).max(stretched_end);
            }
        } else {
            current = Some(((seq_id, strand), stretched_end));
            groups.push(vec![idx]);
        }
    }

    debug!(
        "Sample '{}': {} intervals form {} groups at max_distance {}",
        sample,
        features.len(),
        groups.len(),
        max_distance
    );

    Ok(groups)
}

type TreeMap = FxHashMap<(u32, Strand), BasicCOITree<usize, u32>>;

/// Per-(seqname, strand) interval trees over a set of features, answering
/// directed overlap queries with the indices of the stored features.
pub struct OverlapIndex {
    seq_index: SequenceIndex,
    trees: TreeMap,
    len: usize,
}

impl OverlapIndex {
    pub fn new<T: Feature>(sample: &str, features: &[T]) -> Result<Self> {
        let mut seq_index = SequenceIndex::new();
        let mut partitions: FxHashMap<(u32, Strand), Vec<Interval<usize>>> = FxHashMap::default();

        for (idx, feature) in features.iter().enumerate() {
            let interval = feature.interval();
            interval.validate(sample)?;
            let seq_id = seq_index.get_or_insert_id(&interval.seqname);
            partitions
                .entry((seq_id, interval.strand))
                .or_default()
                .push(Interval::new(interval.start, interval.end, idx));
        }

        let trees: TreeMap = partitions
            .into_iter()
            .map(|(partition, intervals)| (partition, BasicCOITree::new(intervals.as_slice())))
            .collect();

        Ok(Self {
            seq_index,
            trees,
            len: features.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Visit the index of every stored feature on the same seqname and strand
    /// as `interval` that overlaps it.
    pub fn query_directed<F>(&self, interval: &GenomicInterval, mut visit: F)
    where
        F: FnMut(usize),
    {
        let Some(seq_id) = self.seq_index.get_id(&interval.seqname) else {
            return;
        };
        if let Some(tree) = self.trees.get(&(seq_id, interval.strand)) {
            tree.query(interval.start, interval.end, |node| visit(node.metadata));
        }
    }

    /// Indices of overlapping features, in ascending order.
    pub fn overlaps(&self, interval: &GenomicInterval) -> Vec<usize> {
        let mut hits = Vec::new();
        self.query_directed(interval, |idx| hits.push(idx));
        hits.sort_unstable();
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tss(seqname: &str, pos: i32, strand: Strand) -> GenomicInterval {
        GenomicInterval::position(seqname, pos, strand, 1.0)
    }

    #[test]
    fn test_stretch_merge_connects_within_distance() {
        let features = vec![tss("chr1", 100, Strand::Forward), tss("chr1", 130, Strand::Forward)];
        assert_eq!(stretch_merge("s", &features, 25).unwrap(), vec![vec![0, 1]]);
        assert_eq!(stretch_merge("s", &features, 10).unwrap(), vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_stretch_merge_zero_distance_merges_adjacent_only() {
        let features = vec![
            tss("chr1", 101, Strand::Forward),
            tss("chr1", 100, Strand::Forward),
            tss("chr1", 103, Strand::Forward),
        ];
        assert_eq!(stretch_merge("s", &features, 0).unwrap(), vec![vec![1, 0], vec![2]]);
    }

    #[test]
    fn test_stretch_merge_is_directed_and_partitioned() {
        let features = vec![
            tss("chr10", 5, Strand::Forward),
            tss("chr2", 100, Strand::Reverse),
            tss("chr2", 100, Strand::Forward),
            tss("chr2", 101, Strand::Forward),
        ];
        let groups = stretch_merge("s", &features, 1000).unwrap();
        assert_eq!(groups, vec![vec![2, 3], vec![1], vec![0]]);
    }

    #[test]
    fn test_stretch_merge_rejects_bad_input() {
        let features = vec![tss("chr1", 1, Strand::Forward)];
        assert!(matches!(
            stretch_merge("s", &features, -1),
            Err(TsrError::InvalidParameter { name: "max_distance", .. })
        ));

        let unstranded = vec![tss("chr1", 1, Strand::Forward), tss("chr1", 5, Strand::Unstranded)];
        assert!(matches!(
            stretch_merge("s", &unstranded, 0),
            Err(TsrError::Unstranded { .. })
        ));
    }

    #[test]
    fn test_stretch_merge_empty() {
        let features: Vec<GenomicInterval> = Vec::new();
        assert!(stretch_merge("s", &features, 25).unwrap().is_empty());
    }

    #[test]
    fn test_overlap_index_directed_queries() {
        let regions = vec![
            GenomicInterval::new("chr1", 100, 110, Strand::Forward, 10.0),
            GenomicInterval::new("chr1", 105, 120, Strand::Forward, 2.0),
            GenomicInterval::new("chr1", 100, 110, Strand::Reverse, 4.0),
        ];
        let index = OverlapIndex::new("tsr", &regions).unwrap();
        assert_eq!(index.len(), 3);

        assert_eq!(index.overlaps(&tss("chr1", 100, Strand::Forward)), vec![0]);
        assert_eq!(index.overlaps(&tss("chr1", 107, Strand::Forward)), vec![0, 1]);
        assert_eq!(index.overlaps(&tss("chr1", 110, Strand::Reverse)), vec![2]);
        assert!(index.overlaps(&tss("chr1", 121, Strand::Forward)).is_empty());
        assert!(index.overlaps(&tss("chr2", 100, Strand::Forward)).is_empty());
    }
}
