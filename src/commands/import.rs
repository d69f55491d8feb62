use crate::error::{Result, TsrError};
use crate::interval::validate_sample;
use crate::record::{Tsr, Tss};
use crate::sample::{DataType, RecordKind, SampleCollection};
use crate::schema::ScoreSchema;
use crate::store::ExperimentStore;
use crate::table::{open_table, read_tsr_table, read_tss_table};
use log::{debug, info};
use rayon::prelude::*;
use std::path::PathBuf;

/// Configuration for the import command
pub struct ImportConfig {
    pub data_type: DataType,
    /// (sample name, table path) pairs.
    pub tables: Vec<(String, PathBuf)>,
}

/// Parse `sample=path` arguments. A bare path takes its file name, minus
/// extensions, as the sample name.
pub fn parse_table_arg(arg: &str) -> (String, PathBuf) {
    match arg.split_once('=') {
        Some((sample, path)) if !sample.is_empty() => (sample.to_string(), PathBuf::from(path)),
        _ => {
            let path = PathBuf::from(arg);
            let sample = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.split('.').next())
                .unwrap_or(arg)
                .to_string();
            (sample, path)
        }
    }
}

/// All tables of one slot must declare the same columns.
fn unify_schemas(schemas: &[(String, ScoreSchema)]) -> Result<ScoreSchema> {
    let Some((first_sample, first)) = schemas.first() else {
        return Ok(ScoreSchema::raw());
    };
    for (sample, schema) in &schemas[1..] {
        if schema != first {
            return Err(TsrError::invalid_parameter(
                "tables",
                format!(
                    "samples '{first_sample}' and '{sample}' declare different score columns"
                ),
            ));
        }
    }
    Ok(first.clone())
}

fn read_all<T, F>(tables: &[(String, PathBuf)], read: F) -> Result<(SampleCollection<T>, ScoreSchema)>
where
    T: Send,
    F: Fn(Box<dyn std::io::BufRead>) -> Result<(Vec<T>, ScoreSchema)> + Sync,
{
    let parsed = tables
        .par_iter()
        .map(|(sample, path)| {
            let (records, schema) = read(open_table(path)?).map_err(|e| match e {
                TsrError::Parse { line, message } => TsrError::Parse {
                    line,
                    message: format!("{}: {message}", path.display()),
                },
                other => other,
            })?;
            debug!("Read {} records for sample '{}' from {}", records.len(), sample, path.display());
            Ok((sample.clone(), records, schema))
        })
        .collect::<Result<Vec<_>>>()?;

    let schemas: Vec<(String, ScoreSchema)> = parsed
        .iter()
        .map(|(sample, _, schema)| (sample.clone(), schema.clone()))
        .collect();
    let schema = unify_schemas(&schemas)?;

    let mut samples = SampleCollection::default();
    for (sample, records, _) in parsed {
        if samples.insert(sample.clone(), records).is_some() {
            return Err(TsrError::invalid_parameter(
                "tables",
                format!("sample '{sample}' is given more than once"),
            ));
        }
    }
    Ok((samples, schema))
}

pub fn run_import(store: &mut ExperimentStore, config: &ImportConfig) -> Result<()> {
    if config.tables.is_empty() {
        return Err(TsrError::invalid_parameter("tables", "no tables given"));
    }

    match config.data_type.record_kind() {
        RecordKind::Tss => {
            let (samples, schema) = read_all::<Tss, _>(&config.tables, read_tss_table)?;
            for (sample, records) in &samples {
                validate_sample(sample, records)?;
            }
            store.set_tss(config.data_type, samples, schema)?;
        }
        RecordKind::Tsr => {
            let (samples, schema) = read_all::<Tsr, _>(&config.tables, read_tsr_table)?;
            for (sample, records) in &samples {
                validate_sample(sample, records)?;
            }
            store.set_tsr(config.data_type, samples, schema)?;
        }
    }

    info!(
        "Imported {} samples into slot '{}'",
        config.tables.len(),
        config.data_type
    );
    Ok(())
}
