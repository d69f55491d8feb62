use crate::dominant::{mark_dominant, DominantConfig};
use crate::error::Result;
use crate::sample::DataType;
use crate::store::ExperimentStore;
use log::info;

pub fn run_mark_dominant(store: &mut ExperimentStore, config: &DominantConfig) -> Result<()> {
    let (tss_samples, schema) = store.tss(DataType::Tss)?;
    let schema = schema.clone();
    let marked = mark_dominant(tss_samples, &schema, config)?;

    let dominant = marked
        .values()
        .flatten()
        .filter(|tss| tss.is_dominant())
        .count();
    store.set_tss(DataType::Tss, marked, schema)?;
    info!("Marked {} dominant TSSs", dominant);
    Ok(())
}
