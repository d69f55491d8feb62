use crate::error::{Result, TsrError};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-sample tables keyed by sample name. Iteration order carries no meaning;
/// use [`sample_names`] when a stable order is needed.
pub type SampleCollection<T> = FxHashMap<String, Vec<T>>;

/// Sample names in natural order.
pub fn sample_names<T>(samples: &SampleCollection<T>) -> Vec<&str> {
    let mut names: Vec<&str> = samples.keys().map(String::as_str).collect();
    names.sort_by(|a, b| natord::compare(a, b));
    names
}

/// Kind of record a slot holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Tss,
    Tsr,
}

impl RecordKind {
    pub fn name(&self) -> &'static str {
        match self {
            RecordKind::Tss => "TSS",
            RecordKind::Tsr => "TSR",
        }
    }
}

/// Storage slot of an experiment.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum DataType {
    Tss,
    Tsr,
    TssFeatures,
    TsrFeatures,
}

impl DataType {
    pub const ALL: [DataType; 4] = [
        DataType::Tss,
        DataType::Tsr,
        DataType::TssFeatures,
        DataType::TsrFeatures,
    ];

    pub fn slot_name(&self) -> &'static str {
        match self {
            DataType::Tss => "tss",
            DataType::Tsr => "tsr",
            DataType::TssFeatures => "tss_features",
            DataType::TsrFeatures => "tsr_features",
        }
    }

    /// Annotated feature slots hold the same records as their base slot.
    pub fn record_kind(&self) -> RecordKind {
        match self {
            DataType::Tss | DataType::TssFeatures => RecordKind::Tss,
            DataType::Tsr | DataType::TsrFeatures => RecordKind::Tsr,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slot_name())
    }
}

/// Parse `key=value` assignments such as `tsr_sample=tss_a,tss_b` or
/// `sample=group`.
pub fn parse_assignment(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() && !value.is_empty() => {
            Ok((key.to_string(), value.to_string()))
        }
        _ => Err(TsrError::invalid_parameter(
            "assignment",
            format!("expected `name=value`, got '{arg}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_selection() {
        assert_eq!(DataType::TssFeatures.record_kind(), RecordKind::Tss);
        assert_eq!(DataType::TsrFeatures.record_kind(), RecordKind::Tsr);
        assert_eq!(DataType::TsrFeatures.slot_name(), "tsr_features");
    }

    #[test]
    fn test_sample_names_natural_order() {
        let mut samples: SampleCollection<u8> = SampleCollection::default();
        for name in ["s10", "s2", "s1"] {
            samples.insert(name.to_string(), Vec::new());
        }
        assert_eq!(sample_names(&samples), vec!["s1", "s2", "s10"]);
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("ctrl=a,b").unwrap(),
            ("ctrl".to_string(), "a,b".to_string())
        );
        assert!(parse_assignment("ctrl").is_err());
        assert!(parse_assignment("=x").is_err());
    }
}
