use crate::error::{Result, TsrError};
use crate::sample::{sample_names, DataType, RecordKind};
use crate::store::ExperimentStore;
use crate::table::{write_tsr_table, write_tss_table};
use log::info;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Write every sample of a slot to `<out_dir>/<sample>.<slot>.tsv`, or a
/// single sample to stdout when `sample` is given and `out_dir` is not.
pub fn run_export(
    store: &ExperimentStore,
    data_type: DataType,
    sample: Option<&str>,
    out_dir: Option<&Path>,
) -> Result<()> {
    let Some(out_dir) = out_dir else {
        let sample = sample.ok_or_else(|| {
            TsrError::invalid_parameter("output_dir", "required unless a single sample is exported")
        })?;
        let stdout = std::io::stdout().lock();
        return match data_type.record_kind() {
            RecordKind::Tss => {
                let (samples, schema) = store.tss(data_type)?;
                let records = samples.get(sample).ok_or_else(|| unknown(sample))?;
                write_tss_table(BufWriter::new(stdout), records, schema)
            }
            RecordKind::Tsr => {
                let (samples, schema) = store.tsr(data_type)?;
                let records = samples.get(sample).ok_or_else(|| unknown(sample))?;
                write_tsr_table(BufWriter::new(stdout), records, schema)
            }
        };
    };

    fs::create_dir_all(out_dir)?;
    let path_for = |name: &str| -> PathBuf { out_dir.join(format!("{name}.{data_type}.tsv")) };

    let written = match data_type.record_kind() {
        RecordKind::Tss => {
            let (samples, schema) = store.tss(data_type)?;
            let names = selected(sample_names(samples), sample)?;
            for name in &names {
                let writer = BufWriter::new(File::create(path_for(name))?);
                write_tss_table(writer, &samples[*name], schema)?;
            }
            names.len()
        }
        RecordKind::Tsr => {
            let (samples, schema) = store.tsr(data_type)?;
            let names = selected(sample_names(samples), sample)?;
            for name in &names {
                let writer = BufWriter::new(File::create(path_for(name))?);
                write_tsr_table(writer, &samples[*name], schema)?;
            }
            names.len()
        }
    };

    info!("Exported {} samples of slot '{}' to {}", written, data_type, out_dir.display());
    Ok(())
}

fn unknown(sample: &str) -> TsrError {
    TsrError::UnknownSample {
        role: "exported",
        sample: sample.to_string(),
    }
}

fn selected<'a>(names: Vec<&'a str>, sample: Option<&str>) -> Result<Vec<&'a str>> {
    match sample {
        None => Ok(names),
        Some(sample) => names
            .into_iter()
            .find(|name| *name == sample)
            .map(|name| vec![name])
            .ok_or_else(|| unknown(sample)),
    }
}
