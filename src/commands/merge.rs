use crate::error::{Result, TsrError};
use crate::merge::{merge, MergeConfig};
use crate::sample::{parse_assignment, DataType, RecordKind};
use crate::store::ExperimentStore;
use rustc_hash::FxHashMap;

/// Configuration for the merge command
pub struct MergeCommandConfig {
    /// Slot whose samples are merged.
    pub input: DataType,
    /// TSR slot receiving the consensus sets.
    pub output: DataType,
    pub merge: MergeConfig,
}

/// Build a `group_by` table from `sample=group` arguments.
pub fn parse_group_by(args: &[String]) -> Result<FxHashMap<String, String>> {
    let mut group_by = FxHashMap::default();
    for arg in args {
        let (sample, group) = parse_assignment(arg)?;
        if group_by.insert(sample.clone(), group).is_some() {
            return Err(TsrError::invalid_parameter(
                "group_by",
                format!("sample '{sample}' is assigned twice"),
            ));
        }
    }
    Ok(group_by)
}

pub fn run_merge(store: &mut ExperimentStore, config: &MergeCommandConfig) -> Result<()> {
    let (merged, schema) = match config.input.record_kind() {
        RecordKind::Tss => {
            let (samples, schema) = store.tss(config.input)?;
            (merge(samples, schema, &config.merge)?, schema.clone())
        }
        RecordKind::Tsr => {
            let (samples, schema) = store.tsr(config.input)?;
            (merge(samples, schema, &config.merge)?, schema.clone())
        }
    };
    store.set_tsr(config.output, merged, schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_group_by() {
        let args = vec!["a=ctrl".to_string(), "b=ctrl".to_string()];
        let group_by = parse_group_by(&args).unwrap();
        assert_eq!(group_by["a"], "ctrl");
        assert_eq!(group_by.len(), 2);

        let twice = vec!["a=ctrl".to_string(), "a=trt".to_string()];
        assert!(parse_group_by(&twice).is_err());
    }
}
