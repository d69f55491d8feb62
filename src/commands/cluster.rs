use crate::cluster::{cluster, ClusterConfig};
use crate::error::Result;
use crate::sample::DataType;
use crate::store::ExperimentStore;
use log::info;

/// Cluster the `tss` slot and replace the `tsr` slot with the result.
pub fn run_cluster(store: &mut ExperimentStore, config: &ClusterConfig) -> Result<()> {
    let (tss_samples, schema) = store.tss(DataType::Tss)?;
    let schema = schema.clone();
    let tsr_samples = cluster(tss_samples, &schema, config)?;

    let total: usize = tsr_samples.values().map(Vec::len).sum();
    store.set_tsr(DataType::Tsr, tsr_samples, schema)?;
    info!("Stored {} TSRs in slot '{}'", total, DataType::Tsr);
    Ok(())
}
