//! Strand-aware genomic intervals and feature hashes.
//!
//! Coordinates are 1-based and closed: a single-base TSS at position 100 is
//! `start = end = 100` and has width 1.

use crate::error::{Result, TsrError};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Strand orientation of an interval
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum Strand {
    Forward,
    Reverse,
    /// Carried through from external tables so it can be rejected with context.
    Unstranded,
}

impl Strand {
    pub fn as_char(&self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
            Strand::Unstranded => '*',
        }
    }

    pub fn is_stranded(&self) -> bool {
        *self != Strand::Unstranded
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Strand {
    type Err = TsrError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            "*" | "." => Ok(Strand::Unstranded),
            other => Err(TsrError::invalid_parameter(
                "strand",
                format!("expected '+', '-' or '*', got '{other}'"),
            )),
        }
    }
}

/// The (seqname, start, end, strand) tuple that identifies a feature within a
/// sample. Its string form is the feature hash `seqname:start:end:strand`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureKey {
    pub seqname: String,
    pub start: i32,
    pub end: i32,
    pub strand: Strand,
}

impl FeatureKey {
    /// Parse a feature hash back into its key. Sequence names may themselves
    /// contain ':', so the hash is split from the right.
    pub fn parse_fhash(fhash: &str) -> Result<Self> {
        let parts: Vec<&str> = fhash.rsplitn(4, ':').collect();
        if parts.len() != 4 || parts[3].is_empty() {
            return Err(TsrError::invalid_parameter(
                "fhash",
                format!("'{fhash}' is not of the form `seqname:start:end:strand`"),
            ));
        }

        let parse_coord = |value: &str| {
            value.parse::<i32>().map_err(|_| {
                TsrError::invalid_parameter("fhash", format!("invalid coordinate '{value}' in '{fhash}'"))
            })
        };

        Ok(FeatureKey {
            seqname: parts[3].to_string(),
            start: parse_coord(parts[2])?,
            end: parse_coord(parts[1])?,
            strand: parts[0].parse()?,
        })
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.seqname, self.start, self.end, self.strand)
    }
}

/// A scored, stranded interval on a named sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenomicInterval {
    pub seqname: String,
    pub start: i32,
    pub end: i32,
    pub strand: Strand,
    pub score: f64,
    pub normalized_score: Option<f64>,
}

impl GenomicInterval {
    pub fn new(seqname: &str, start: i32, end: i32, strand: Strand, score: f64) -> Self {
        Self {
            seqname: seqname.to_string(),
            start,
            end,
            strand,
            score,
            normalized_score: None,
        }
    }

    /// A single-base interval, the usual shape of a TSS.
    pub fn position(seqname: &str, pos: i32, strand: Strand, score: f64) -> Self {
        Self::new(seqname, pos, pos, strand, score)
    }

    pub fn with_normalized_score(mut self, normalized_score: f64) -> Self {
        self.normalized_score = Some(normalized_score);
        self
    }

    pub fn width(&self) -> i32 {
        self.end - self.start + 1
    }

    pub fn key(&self) -> FeatureKey {
        FeatureKey {
            seqname: self.seqname.clone(),
            start: self.start,
            end: self.end,
            strand: self.strand,
        }
    }

    pub fn fhash(&self) -> String {
        format!("{}:{}:{}:{}", self.seqname, self.start, self.end, self.strand)
    }

    /// Check the invariants every engine relies on.
    pub fn validate(&self, sample: &str) -> Result<()> {
        if !self.strand.is_stranded() {
            return Err(TsrError::Unstranded {
                sample: sample.to_string(),
                fhash: self.fhash(),
            });
        }
        if self.start < 1 || self.start > self.end {
            return Err(TsrError::InvalidInterval {
                sample: sample.to_string(),
                fhash: self.fhash(),
            });
        }
        Ok(())
    }
}

/// Validate every record of a sample and reject repeated feature hashes.
pub fn validate_sample<T: Feature>(sample: &str, records: &[T]) -> Result<()> {
    let mut seen: FxHashSet<FeatureKey> = FxHashSet::default();
    for record in records {
        let interval = record.interval();
        interval.validate(sample)?;
        if !seen.insert(interval.key()) {
            return Err(TsrError::DuplicateFeature {
                sample: sample.to_string(),
                fhash: interval.fhash(),
            });
        }
    }
    Ok(())
}

/// Anything that sits on the genome as a [`GenomicInterval`].
pub trait Feature {
    fn interval(&self) -> &GenomicInterval;
}

impl Feature for GenomicInterval {
    fn interval(&self) -> &GenomicInterval {
        self
    }
}

/// Mutable access for transformations that rewrite score fields in place on
/// their own copy of a sample.
pub trait FeatureMut: Feature {
    fn interval_mut(&mut self) -> &mut GenomicInterval;
}

impl FeatureMut for GenomicInterval {
    fn interval_mut(&mut self) -> &mut GenomicInterval {
        self
    }
}

impl<T: Feature> Feature for &T {
    fn interval(&self) -> &GenomicInterval {
        (**self).interval()
    }
}

/// Output order of every engine: natural seqname order, then start, then
/// strand, then end.
pub fn cmp_position(a: &GenomicInterval, b: &GenomicInterval) -> Ordering {
    natord::compare(&a.seqname, &b.seqname)
        .then(a.start.cmp(&b.start))
        .then(a.strand.cmp(&b.strand))
        .then(a.end.cmp(&b.end))
}
