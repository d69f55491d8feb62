//! On-disk experiment: one sample collection per [`DataType`] slot.
//!
//! Engines never touch the store. Commands read the collections they need,
//! call an engine, and hand the result back with `set_*`, which replaces the
//! slot wholesale.

use crate::error::{Result, TsrError};
use crate::record::{Tsr, Tss};
use crate::sample::{DataType, RecordKind, SampleCollection};
use crate::schema::ScoreSchema;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const STORE_MAGIC: &[u8; 8] = b"TSRKIT01";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum SlotData {
    Tss(SampleCollection<Tss>),
    Tsr(SampleCollection<Tsr>),
}

impl SlotData {
    fn kind(&self) -> RecordKind {
        match self {
            SlotData::Tss(_) => RecordKind::Tss,
            SlotData::Tsr(_) => RecordKind::Tsr,
        }
    }

    fn sample_sizes(&self) -> BTreeMap<String, usize> {
        match self {
            SlotData::Tss(samples) => samples.iter().map(|(k, v)| (k.clone(), v.len())).collect(),
            SlotData::Tsr(samples) => samples.iter().map(|(k, v)| (k.clone(), v.len())).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Slot {
    schema: ScoreSchema,
    data: SlotData,
}

/// Summary of one filled slot, as reported by [`ExperimentStore::slots`].
#[derive(Clone, Debug, PartialEq)]
pub struct SlotInfo<'a> {
    pub data_type: DataType,
    pub kind: RecordKind,
    pub schema: &'a ScoreSchema,
    /// Sample name -> record count, in name order.
    pub samples: BTreeMap<String, usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentStore {
    slots: BTreeMap<DataType, Slot>,
}

impl ExperimentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_kind(data_type: DataType, expected: RecordKind) -> Result<()> {
        let found = data_type.record_kind();
        if found != expected {
            return Err(TsrError::SlotKind {
                slot: data_type.slot_name(),
                expected: expected.name(),
                found: found.name(),
            });
        }
        Ok(())
    }

    fn slot(&self, data_type: DataType) -> Result<&Slot> {
        self.slots.get(&data_type).ok_or(TsrError::EmptySlot {
            slot: data_type.slot_name(),
        })
    }

    pub fn contains(&self, data_type: DataType) -> bool {
        self.slots.contains_key(&data_type)
    }

    /// Replace a TSS slot.
    pub fn set_tss(
        &mut self,
        data_type: DataType,
        samples: SampleCollection<Tss>,
        schema: ScoreSchema,
    ) -> Result<()> {
        Self::check_kind(data_type, RecordKind::Tss)?;
        debug!("Storing {} TSS samples in slot '{}'", samples.len(), data_type);
        self.slots.insert(
            data_type,
            Slot {
                schema,
                data: SlotData::Tss(samples),
            },
        );
        Ok(())
    }

    /// Replace a TSR slot.
    pub fn set_tsr(
        &mut self,
        data_type: DataType,
        samples: SampleCollection<Tsr>,
        schema: ScoreSchema,
    ) -> Result<()> {
        Self::check_kind(data_type, RecordKind::Tsr)?;
        debug!("Storing {} TSR samples in slot '{}'", samples.len(), data_type);
        self.slots.insert(
            data_type,
            Slot {
                schema,
                data: SlotData::Tsr(samples),
            },
        );
        Ok(())
    }

    pub fn tss(&self, data_type: DataType) -> Result<(&SampleCollection<Tss>, &ScoreSchema)> {
        Self::check_kind(data_type, RecordKind::Tss)?;
        let slot = self.slot(data_type)?;
        match &slot.data {
            SlotData::Tss(samples) => Ok((samples, &slot.schema)),
            other => Err(TsrError::Store(format!(
                "slot '{}' holds {} records",
                data_type,
                other.kind().name()
            ))),
        }
    }

    pub fn tsr(&self, data_type: DataType) -> Result<(&SampleCollection<Tsr>, &ScoreSchema)> {
        Self::check_kind(data_type, RecordKind::Tsr)?;
        let slot = self.slot(data_type)?;
        match &slot.data {
            SlotData::Tsr(samples) => Ok((samples, &slot.schema)),
            other => Err(TsrError::Store(format!(
                "slot '{}' holds {} records",
                data_type,
                other.kind().name()
            ))),
        }
    }

    /// Filled slots in [`DataType`] order.
    pub fn slots(&self) -> Vec<SlotInfo<'_>> {
        self.slots
            .iter()
            .map(|(&data_type, slot)| SlotInfo {
                data_type,
                kind: slot.data.kind(),
                schema: &slot.schema,
                samples: slot.data.sample_sizes(),
            })
            .collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(STORE_MAGIC)?;
        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())
            .map_err(|e| TsrError::Store(format!("failed to write {}: {e}", path.display())))?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);

        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if &magic != STORE_MAGIC {
            return Err(TsrError::Store(format!(
                "invalid magic bytes in {}",
                path.display()
            )));
        }

        bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())
            .map_err(|e| TsrError::Store(format!("failed to read {}: {e}", path.display())))
    }

    /// Load `path` if it exists, otherwise start an empty store.
    pub fn open_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::{GenomicInterval, Strand};
    use tempfile::TempDir;

    fn tss_samples() -> SampleCollection<Tss> {
        let mut samples = SampleCollection::default();
        samples.insert(
            "s1".to_string(),
            vec![Tss::new(GenomicInterval::position("chr1", 10, Strand::Forward, 3.0))],
        );
        samples
    }

    #[test]
    fn test_slot_kind_is_enforced() {
        let mut store = ExperimentStore::new();
        assert!(matches!(
            store.set_tss(DataType::Tsr, tss_samples(), ScoreSchema::raw()),
            Err(TsrError::SlotKind { slot: "tsr", expected: "TSS", found: "TSR" })
        ));
        assert!(matches!(store.tss(DataType::Tss), Err(TsrError::EmptySlot { slot: "tss" })));

        store.set_tss(DataType::TssFeatures, tss_samples(), ScoreSchema::raw()).unwrap();
        assert!(store.contains(DataType::TssFeatures));
        assert!(store.tsr(DataType::TssFeatures).is_err());
        assert_eq!(store.tss(DataType::TssFeatures).unwrap().0.len(), 1);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("experiment.tsrkit");

        let mut store = ExperimentStore::new();
        store.set_tss(DataType::Tss, tss_samples(), ScoreSchema::normalized()).unwrap();
        store.save(&path).unwrap();

        let loaded = ExperimentStore::load(&path).unwrap();
        assert_eq!(loaded, store);
        let info = loaded.slots();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].data_type, DataType::Tss);
        assert_eq!(info[0].samples["s1"], 1);
    }

    #[test]
    fn test_load_rejects_foreign_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("not_a_store");
        std::fs::write(&path, b"seqname\tstart\n").unwrap();
        assert!(matches!(ExperimentStore::load(&path), Err(TsrError::Store(_))));
        assert!(ExperimentStore::open_or_default(&dir.path().join("missing")).unwrap().slots().is_empty());
    }
}
