//! Implementation of `ingest` subcommand.

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use thousands::Separable;

use crate::{
    classify::DiseaseCatalog,
    common::{self, io::read_to_string_maybe_gz, AccessTier, GenomeRelease},
    conf::IngestConf,
    err::InputError,
    store::Warehouse,
};

pub mod dataset;
pub mod patient;
pub mod variants;

use patient::{NormalizeContext, PatientDocument};
use variants::{VariantCall, VariantOptions, VariantStats, VcfSource};

/// Command line arguments for `ingest` subcommand.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "ingest cohort JSON and VCF into the warehouse", long_about = None)]
pub struct Args {
    /// Path to the SQLite warehouse.
    #[arg(long)]
    pub path_db: String,
    /// Path to the cohort JSON file (may be gzip-compressed).
    #[arg(long)]
    pub path_data: String,
    /// Path to the VCF file (may be gzip-compressed); optional.
    #[arg(long)]
    pub path_vcf: Option<String>,
    /// Path to the TOML configuration file; optional.
    #[arg(long)]
    pub path_conf: Option<String>,
    /// Stable name of the dataset, overrides the configuration.
    #[arg(long)]
    pub dataset_name: Option<String>,
    /// Description of the dataset, overrides the configuration.
    #[arg(long)]
    pub dataset_description: Option<String>,
    /// Access tier of the dataset, overrides the configuration.
    #[arg(long)]
    pub access_tier: Option<AccessTier>,
    /// The assumed genome build, overrides the configuration.
    #[arg(long)]
    pub genomebuild: Option<GenomeRelease>,
    /// Maximal number of variants to write out, `0` for no limit.
    #[arg(long)]
    pub max_var_count: Option<usize>,
    /// Reference time for ages (`YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`), defaults to now.
    #[arg(long)]
    pub now: Option<String>,
    /// Empty all warehouse tables before ingesting.
    #[arg(long, default_value_t = false)]
    pub clear_tables: bool,
    /// Create missing warehouse tables (and the database file) before ingesting.
    #[arg(long, default_value_t = false)]
    pub init_schema: bool,
}

/// Row counts of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub dataset_id: i64,
    pub individuals: usize,
    pub diseases: usize,
    pub samples: usize,
    pub variants: VariantStats,
}

/// Parse the `--now` argument.
pub fn parse_now(value: &str) -> Result<NaiveDateTime, anyhow::Error> {
    if let Ok(now) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(now);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "invalid --now value {:?}, expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS",
                value
            )
        })
}

/// Load the configuration file, if any, and apply command line overrides.
fn build_conf(args: &Args) -> Result<IngestConf, anyhow::Error> {
    let mut conf = match &args.path_conf {
        Some(path_conf) => IngestConf::from_path(path_conf)?,
        None => IngestConf::default(),
    };
    if let Some(name) = &args.dataset_name {
        conf.dataset.name = name.clone();
    }
    if let Some(description) = &args.dataset_description {
        conf.dataset.description = description.clone();
    }
    if let Some(access_tier) = args.access_tier {
        conf.dataset.access_tier = access_tier;
    }
    if let Some(genomebuild) = args.genomebuild {
        conf.dataset.genomebuild = genomebuild;
    }
    if let Some(max_var_count) = args.max_var_count {
        conf.variants.max_var_count = max_var_count;
    }
    Ok(conf)
}

/// Read the cohort file, a JSON array of patient documents.
pub fn read_patients(path: &str) -> Result<Vec<PatientDocument>, anyhow::Error> {
    let json = read_to_string_maybe_gz(path)
        .map_err(|e| anyhow::anyhow!("could not read data file {}: {}", path, e))?;
    let patients: Vec<PatientDocument> = serde_json::from_str(&json)
        .map_err(|e| anyhow::anyhow!("could not parse data file {}: {}", path, e))?;
    if patients.is_empty() {
        return Err(InputError::EmptyCohort.into());
    }
    Ok(patients)
}

/// Open the VCF file; failures are logged and yield `None`.
fn open_vcf(path_vcf: Option<&str>) -> Option<VcfSource> {
    let path_vcf = path_vcf?;
    match VcfSource::open(path_vcf) {
        Ok(source) => Some(source),
        Err(e) => {
            tracing::warn!(
                "Could not read VCF file {}: {}; continuing without variant data",
                path_vcf,
                e
            );
            None
        }
    }
}

/// Run the whole pipeline in one transaction of `warehouse`.
///
/// The i-th patient is paired with the i-th name in `samples`; patients beyond the
/// end of `samples` get no sample row.  With `clear_tables`, all existing rows are
/// deleted first.  Nothing is committed if any step fails, including the clearing.
pub fn ingest<I>(
    warehouse: &mut Warehouse,
    clear_tables: bool,
    conf: &IngestConf,
    now: NaiveDateTime,
    patients: &[PatientDocument],
    samples: &[String],
    records: I,
) -> Result<IngestSummary, anyhow::Error>
where
    I: IntoIterator<Item = Result<VariantCall, anyhow::Error>>,
{
    if patients.is_empty() {
        return Err(InputError::EmptyCohort.into());
    }
    if samples.len() > patients.len() {
        tracing::warn!(
            "{} samples in VCF but only {} patients; the remaining samples are not linked",
            samples.len(),
            patients.len()
        );
    }

    let catalog = DiseaseCatalog::new(conf.diseases.display_names.clone());
    let writer = warehouse.writer()?;
    if clear_tables {
        tracing::info!("clearing warehouse tables...");
        writer.clear()?;
    }
    let dataset_id = dataset::register(&writer, &conf.dataset, samples.len())?;

    tracing::info!("normalizing {} patients...", patients.len());
    let ctx = NormalizeContext {
        now,
        stable_id_prefix: &conf.individuals.stable_id_prefix,
        tissue: &conf.samples.tissue,
        catalog: &catalog,
        dataset_id,
    };
    let mut summary = IngestSummary {
        dataset_id,
        ..Default::default()
    };
    let mut sample_ids = IndexMap::new();
    for (i, patient) in patients.iter().enumerate() {
        let sample = samples.get(i).map(|s| s.as_str());
        let normalized = patient::normalize(&writer, &ctx, i + 1, patient, sample)?;
        summary.individuals += 1;
        summary.diseases += normalized.disease_ids.len();
        if let (Some(sample), Some(sample_id)) = (sample, normalized.sample_id) {
            sample_ids.insert(sample.to_string(), sample_id);
            summary.samples += 1;
        }
    }

    tracing::info!("processing variants...");
    summary.variants = variants::process_variants(
        &writer,
        dataset_id,
        records,
        samples.len(),
        &sample_ids,
        &VariantOptions {
            max_var_count: conf.variants.cap(),
            progress_every: conf.variants.progress_every,
        },
    )?;

    dataset::finalize(
        &writer,
        dataset_id,
        &conf.dataset,
        &conf.metadata,
        &summary.variants,
    )?;
    writer
        .commit()
        .map_err(|e| anyhow::anyhow!("could not commit ingestion: {}", e))?;

    Ok(summary)
}

/// Main entry point for `ingest` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = std::time::Instant::now();
    tracing::info!("args_common = {:#?}", &args_common);
    tracing::info!("args = {:#?}", &args);
    tracing::debug!("beacon-ingest version {}", common::worker_version());

    let conf = build_conf(args)?;
    tracing::debug!("conf = {:#?}", &conf);
    let now = match &args.now {
        Some(now) => parse_now(now)?,
        None => chrono::Local::now().naive_local(),
    };

    tracing::info!("opening warehouse...");
    let mut warehouse = Warehouse::open(&args.path_db, args.init_schema)?;
    if args.init_schema {
        warehouse.init_schema()?;
    }
    warehouse.ensure_schema()?;

    tracing::info!("loading patients...");
    let patients = read_patients(&args.path_data)?;
    tracing::info!("... loaded {} patients", patients.len().separate_with_commas());

    let mut vcf_source = open_vcf(args.path_vcf.as_deref());
    let samples = vcf_source
        .as_ref()
        .map(|source| source.sample_names())
        .unwrap_or_default();
    tracing::info!("... {} samples in VCF", samples.len().separate_with_commas());

    let summary = match vcf_source.as_mut() {
        Some(source) => ingest(
            &mut warehouse,
            args.clear_tables,
            &conf,
            now,
            &patients,
            &samples,
            source.records(),
        )?,
        None => ingest(
            &mut warehouse,
            args.clear_tables,
            &conf,
            now,
            &patients,
            &samples,
            std::iter::empty(),
        )?,
    };
    tracing::info!("summary = {:#?}", &summary);

    tracing::info!(
        "All of `ingest` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}
