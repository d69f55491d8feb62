use crate::error::Result;
use crate::normalize::cpm;
use crate::sample::{DataType, RecordKind};
use crate::store::ExperimentStore;
use log::info;

/// Add CPM-normalized scores to every sample of a slot, in place.
pub fn run_normalize(store: &mut ExperimentStore, data_type: DataType) -> Result<()> {
    match data_type.record_kind() {
        RecordKind::Tss => {
            let (samples, _) = store.tss(data_type)?;
            let (normalized, schema) = cpm(samples)?;
            store.set_tss(data_type, normalized, schema)?;
        }
        RecordKind::Tsr => {
            let (samples, _) = store.tsr(data_type)?;
            let (normalized, schema) = cpm(samples)?;
            store.set_tsr(data_type, normalized, schema)?;
        }
    }
    info!("Normalized slot '{}'", data_type);
    Ok(())
}
