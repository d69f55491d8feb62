use crate::interval::{Feature, FeatureMut, GenomicInterval};
use serde::{Deserialize, Serialize};

/// TSR-level fields copied onto a TSS that falls inside the TSR.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TsrSummary {
    pub fhash: String,
    pub score: f64,
    pub width: i32,
    pub n_unique: u32,
    pub normalized_score: Option<f64>,
}

impl TsrSummary {
    pub fn from_tsr(tsr: &Tsr) -> Self {
        Self {
            fhash: tsr.interval.fhash(),
            score: tsr.interval.score,
            width: tsr.interval.width(),
            n_unique: tsr.n_unique,
            normalized_score: tsr.interval.normalized_score,
        }
    }
}

/// Result of matching a TSS against a TSR sample. `tsr` is `None` for a TSS
/// that no TSR of `tsr_sample` overlaps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub tsr_sample: String,
    pub tsr: Option<TsrSummary>,
    pub dominant: bool,
}

/// One observed transcription start site.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tss {
    pub interval: GenomicInterval,
    pub association: Option<Association>,
}

impl Tss {
    pub fn new(interval: GenomicInterval) -> Self {
        Self {
            interval,
            association: None,
        }
    }

    pub fn tsr_fhash(&self) -> Option<&str> {
        self.association
            .as_ref()
            .and_then(|a| a.tsr.as_ref())
            .map(|tsr| tsr.fhash.as_str())
    }

    pub fn is_dominant(&self) -> bool {
        self.association.as_ref().is_some_and(|a| a.dominant)
    }
}

impl From<GenomicInterval> for Tss {
    fn from(interval: GenomicInterval) -> Self {
        Tss::new(interval)
    }
}

impl Feature for Tss {
    fn interval(&self) -> &GenomicInterval {
        &self.interval
    }
}

impl FeatureMut for Tss {
    fn interval_mut(&mut self) -> &mut GenomicInterval {
        &mut self.interval
    }
}

/// A transcription start region aggregated from one or more TSSs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tsr {
    pub interval: GenomicInterval,
    pub n_unique: u32,
}

impl Tsr {
    pub fn width(&self) -> i32 {
        self.interval.width()
    }

    pub fn fhash(&self) -> String {
        self.interval.fhash()
    }
}

impl Feature for Tsr {
    fn interval(&self) -> &GenomicInterval {
        &self.interval
    }
}

impl FeatureMut for Tsr {
    fn interval_mut(&mut self) -> &mut GenomicInterval {
        &mut self.interval
    }
}
