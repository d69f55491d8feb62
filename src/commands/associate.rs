use crate::associate::{associate, AssociateConfig};
use crate::error::{Result, TsrError};
use crate::sample::{parse_assignment, DataType};
use crate::store::ExperimentStore;
use rustc_hash::FxHashMap;

/// Build a sample mapping from `tsr_sample=tss_a,tss_b` arguments. A TSR
/// sample may be named in several arguments.
pub fn parse_sample_mapping(args: &[String]) -> Result<Option<FxHashMap<String, Vec<String>>>> {
    if args.is_empty() {
        return Ok(None);
    }
    let mut mapping: FxHashMap<String, Vec<String>> = FxHashMap::default();
    for arg in args {
        let (tsr_sample, tss_list) = parse_assignment(arg)?;
        let tss_names = tss_list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from);
        mapping.entry(tsr_sample).or_default().extend(tss_names);
    }
    if mapping.values().any(Vec::is_empty) {
        return Err(TsrError::invalid_parameter(
            "sample_mapping",
            "every TSR sample needs at least one TSS sample",
        ));
    }
    Ok(Some(mapping))
}

/// Associate the `tss` slot with a TSR slot (`tsr` or `tsr_features`) and
/// write the annotated TSSs back to `tss`.
pub fn run_associate(
    store: &mut ExperimentStore,
    tsr_slot: DataType,
    config: &AssociateConfig,
) -> Result<()> {
    let (tss_samples, schema) = store.tss(DataType::Tss)?;
    let (tsr_samples, _) = store.tsr(tsr_slot)?;
    let schema = schema.clone();

    let associated = associate(tss_samples, tsr_samples, config)?;
    store.set_tss(DataType::Tss, associated, schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::{GenomicInterval, Strand};
    use crate::record::{Tsr, Tss};
    use crate::sample::SampleCollection;
    use crate::schema::ScoreSchema;

    #[test]
    fn test_parse_sample_mapping() {
        assert_eq!(parse_sample_mapping(&[]).unwrap(), None);

        let args = vec!["merged=a,b".to_string(), "merged=c".to_string(), "x=y".to_string()];
        let mapping = parse_sample_mapping(&args).unwrap().unwrap();
        assert_eq!(mapping["merged"], vec!["a", "b", "c"]);
        assert_eq!(mapping["x"], vec!["y"]);

        assert!(parse_sample_mapping(&["merged=,".to_string()]).is_err());
    }

    #[test]
    fn test_associate_against_consensus_slot() {
        let mut tss_samples: SampleCollection<Tss> = SampleCollection::default();
        for sample in ["rep1", "rep2"] {
            tss_samples.insert(
                sample.to_string(),
                vec![Tss::new(GenomicInterval::position("chr1", 105, Strand::Forward, 2.0))],
            );
        }
        let mut consensus: SampleCollection<Tsr> = SampleCollection::default();
        consensus.insert(
            "all".to_string(),
            vec![Tsr {
                interval: GenomicInterval::new("chr1", 100, 120, Strand::Forward, 9.0),
                n_unique: 4,
            }],
        );

        let mut store = ExperimentStore::new();
        store.set_tss(DataType::Tss, tss_samples, ScoreSchema::raw()).unwrap();
        store.set_tsr(DataType::TsrFeatures, consensus, ScoreSchema::raw()).unwrap();

        let config = AssociateConfig {
            sample_mapping: parse_sample_mapping(&["all=rep1,rep2".to_string()]).unwrap(),
        };
        assert!(matches!(
            run_associate(&mut store, DataType::Tsr, &config),
            Err(TsrError::EmptySlot { slot: "tsr" })
        ));
        assert!(matches!(
            run_associate(&mut store, DataType::TssFeatures, &config),
            Err(TsrError::SlotKind { .. })
        ));

        run_associate(&mut store, DataType::TsrFeatures, &config).unwrap();
        let (associated, _) = store.tss(DataType::Tss).unwrap();
        for sample in ["rep1", "rep2"] {
            assert_eq!(associated[sample][0].tsr_fhash(), Some("chr1:100:120:+"));
        }
        assert!(!store.contains(DataType::Tsr));
    }
}
