use clap::Parser;
use log::info;
use rayon::ThreadPoolBuilder;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tsrkit::associate::AssociateConfig;
use tsrkit::cluster::ClusterConfig;
use tsrkit::commands::associate::{parse_sample_mapping, run_associate};
use tsrkit::commands::cluster::run_cluster;
use tsrkit::commands::dominant::run_mark_dominant;
use tsrkit::commands::export::run_export;
use tsrkit::commands::import::{parse_table_arg, run_import, ImportConfig};
use tsrkit::commands::merge::{parse_group_by, run_merge, MergeCommandConfig};
use tsrkit::commands::normalize::run_normalize;
use tsrkit::commands::stats::run_stats;
use tsrkit::dominant::DominantConfig;
use tsrkit::merge::MergeConfig;
use tsrkit::sample::DataType;
use tsrkit::store::ExperimentStore;

/// Common options shared between all commands
#[derive(Parser, Debug)]
struct CommonOpts {
    /// Path to the experiment store. Created by `import` if missing.
    #[clap(short = 's', long, value_parser)]
    store: PathBuf,

    /// Number of threads for parallel processing.
    #[clap(short = 't', long, value_parser, default_value_t = NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN))]
    threads: NonZeroUsize,

    /// Verbosity level (0 = error, 1 = info, 2 = debug)
    #[clap(short, long, default_value = "0")]
    verbose: u8,
}

/// Clustering, association and merging of transcription start sites.
#[derive(Parser, Debug)]
#[command(author, version, about, disable_help_subcommand = true)]
enum Args {
    /// Read sample tables into a slot of the store, replacing it
    Import {
        #[clap(flatten)]
        common: CommonOpts,

        /// Slot to fill
        #[clap(short = 'd', long, value_enum, default_value_t = DataType::Tss)]
        data_type: DataType,

        /// Tables as `sample=path` or bare paths (sample named after the file)
        #[clap(required = true, num_args = 1..)]
        tables: Vec<String>,
    },
    /// Add CPM-normalized scores to a slot
    Normalize {
        #[clap(flatten)]
        common: CommonOpts,

        #[clap(short = 'd', long, value_enum, default_value_t = DataType::Tss)]
        data_type: DataType,
    },
    /// Cluster the TSS slot into the TSR slot
    Cluster {
        #[clap(flatten)]
        common: CommonOpts,

        /// Minimum TSS score
        #[clap(long, value_parser)]
        threshold: Option<f64>,

        /// Minimum number of samples in which a TSS must pass the threshold
        #[clap(long, value_parser)]
        n_samples: Option<usize>,

        /// Maximum distance between TSSs of the same TSR
        #[clap(short = 'D', long, value_parser, default_value_t = 25)]
        max_distance: i32,

        /// Drop TSRs wider than this
        #[clap(short = 'w', long, value_parser)]
        max_width: Option<i32>,

        /// Apply the threshold to normalized scores
        #[clap(long, action)]
        use_normalized: bool,
    },
    /// Annotate the TSS slot with the TSRs that contain each TSS
    Associate {
        #[clap(flatten)]
        common: CommonOpts,

        /// `tsr_sample=tss_a,tss_b` pairs; defaults to matching samples by name
        #[clap(short = 'm', long = "map", value_parser)]
        sample_mapping: Vec<String>,

        /// TSR slot to match against
        #[clap(long, value_enum, default_value_t = DataType::Tsr)]
        tsr_slot: DataType,
    },
    /// Flag the strongest TSS of every associated TSR
    MarkDominant {
        #[clap(flatten)]
        common: CommonOpts,

        /// TSSs below this score are never dominant
        #[clap(long, value_parser)]
        threshold: Option<f64>,

        /// Rank by normalized scores
        #[clap(long, action)]
        use_normalized: bool,
    },
    /// Merge samples into per-group consensus sets
    Merge {
        #[clap(flatten)]
        common: CommonOpts,

        /// `sample=group` assignments, one per input sample
        #[clap(short = 'g', long, value_parser, required = true)]
        group_by: Vec<String>,

        /// Slot to read
        #[clap(short = 'i', long, value_enum, default_value_t = DataType::Tsr)]
        input: DataType,

        /// TSR slot to write
        #[clap(short = 'o', long, value_enum, default_value_t = DataType::Tsr)]
        output: DataType,

        /// Maximum distance between merged intervals
        #[clap(short = 'D', long, value_parser, default_value_t = 0)]
        max_distance: i32,
    },
    /// Write a slot as tab-separated tables
    Export {
        #[clap(flatten)]
        common: CommonOpts,

        #[clap(short = 'd', long, value_enum, default_value_t = DataType::Tsr)]
        data_type: DataType,

        /// Only this sample
        #[clap(long, value_parser)]
        sample: Option<String>,

        /// Output directory; a single `--sample` goes to stdout when omitted
        #[clap(short = 'o', long, value_parser)]
        output_dir: Option<PathBuf>,
    },
    /// Print per-sample statistics of every filled slot
    Stats {
        #[clap(flatten)]
        common: CommonOpts,
    },
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    match args {
        Args::Import {
            common,
            data_type,
            tables,
        } => {
            let mut store = initialize_store(&common, true)?;
            let config = ImportConfig {
                data_type,
                tables: tables.iter().map(|arg| parse_table_arg(arg)).collect(),
            };
            run_import(&mut store, &config)?;
            save_store(&store, &common.store)?;
        }
        Args::Normalize { common, data_type } => {
            let mut store = initialize_store(&common, false)?;
            run_normalize(&mut store, data_type)?;
            save_store(&store, &common.store)?;
        }
        Args::Cluster {
            common,
            threshold,
            n_samples,
            max_distance,
            max_width,
            use_normalized,
        } => {
            let mut store = initialize_store(&common, false)?;
            let config = ClusterConfig {
                threshold,
                n_samples,
                max_distance,
                max_width,
                use_normalized,
            };
            run_cluster(&mut store, &config)?;
            save_store(&store, &common.store)?;
        }
        Args::Associate {
            common,
            sample_mapping,
            tsr_slot,
        } => {
            let mut store = initialize_store(&common, false)?;
            let config = AssociateConfig {
                sample_mapping: parse_sample_mapping(&sample_mapping)?,
            };
            run_associate(&mut store, tsr_slot, &config)?;
            save_store(&store, &common.store)?;
        }
        Args::MarkDominant {
            common,
            threshold,
            use_normalized,
        } => {
            let mut store = initialize_store(&common, false)?;
            let config = DominantConfig {
                threshold,
                use_normalized,
            };
            run_mark_dominant(&mut store, &config)?;
            save_store(&store, &common.store)?;
        }
        Args::Merge {
            common,
            group_by,
            input,
            output,
            max_distance,
        } => {
            let mut store = initialize_store(&common, false)?;
            let mut merge = MergeConfig::new(parse_group_by(&group_by)?);
            merge.max_distance = max_distance;
            run_merge(
                &mut store,
                &MergeCommandConfig {
                    input,
                    output,
                    merge,
                },
            )?;
            save_store(&store, &common.store)?;
        }
        Args::Export {
            common,
            data_type,
            sample,
            output_dir,
        } => {
            let store = initialize_store(&common, false)?;
            run_export(&store, data_type, sample.as_deref(), output_dir.as_deref())?;
        }
        Args::Stats { common } => {
            let store = initialize_store(&common, false)?;
            run_stats(&store, io::stdout().lock())?;
        }
    }

    Ok(())
}

/// Initialize logging and the thread pool, then load the store. Only
/// `import` may start from a store that does not exist yet.
fn initialize_store(common: &CommonOpts, allow_new: bool) -> io::Result<ExperimentStore> {
    env_logger::Builder::new()
        .filter_level(match common.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    ThreadPoolBuilder::new()
        .num_threads(common.threads.into())
        .build_global()
        .map_err(io::Error::other)?;

    let store = if allow_new {
        ExperimentStore::open_or_default(&common.store)?
    } else {
        ExperimentStore::load(&common.store)?
    };
    info!("Loaded store {} using {} threads", common.store.display(), common.threads);
    Ok(store)
}

fn save_store(store: &ExperimentStore, path: &Path) -> io::Result<()> {
    store.save(path)?;
    info!("Saved store {}", path.display());
    Ok(())
}
