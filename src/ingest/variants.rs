//! Streaming of variant calls into variant rows and variant/sample links.

use std::{io::BufRead, path::Path};

use indexmap::IndexMap;
use noodles_vcf as vcf;
use thousands::Separable;

use crate::{
    common::{io::open_read_maybe_gz, Genotype},
    store::{rows, Writer},
};

/// The call of one sample at a variant site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleCall {
    pub sample: String,
    /// Whether the call carries an alternate allele.
    pub is_variant: bool,
}

/// One VCF record, reduced to what ends up in the warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCall {
    pub chrom: String,
    /// 1-based position.
    pub pos: usize,
    /// Value of the `ID` column, `None` for `.`.
    pub id: Option<String>,
    pub reference: String,
    pub alternates: Vec<String>,
    pub calls: Vec<SampleCall>,
}

impl VariantCall {
    /// Names of the samples carrying the variant, in sample order.
    pub fn carriers(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter(|call| call.is_variant)
            .map(|call| call.sample.as_str())
            .collect()
    }

    /// 1-based inclusive end position as covered by the reference allele.
    pub fn end(&self) -> usize {
        (self.pos + self.reference.len()).saturating_sub(1)
    }

    /// Convert from VCF record.
    pub fn from_vcf(record: &vcf::Record, header: &vcf::Header) -> Result<Self, anyhow::Error> {
        let chrom = record.chromosome().to_string();
        let pos: usize = record.position().into();
        let ids = record.ids();
        let id = if ids.is_empty() {
            None
        } else {
            Some(ids.to_string())
        };
        let reference = record.reference_bases().to_string();
        let alternates = record
            .alternate_bases()
            .iter()
            .map(|allele| allele.to_string())
            .collect();

        let mut calls = Vec::with_capacity(header.sample_names().len());
        for (name, sample) in header
            .sample_names()
            .iter()
            .zip(record.genotypes().values())
        {
            let genotype = if let Some(Some(vcf::record::genotypes::sample::Value::String(gt))) =
                sample.get(&vcf::record::genotypes::keys::key::GENOTYPE)
            {
                gt.parse::<Genotype>()
                    .map_err(|e| anyhow::anyhow!("{}:{} sample {}: {}", &chrom, pos, name, e))?
            } else {
                Genotype::NoCall
            };
            calls.push(SampleCall {
                sample: name.clone(),
                is_variant: genotype == Genotype::Variant,
            });
        }

        Ok(Self {
            chrom,
            pos,
            id,
            reference,
            alternates,
            calls,
        })
    }
}

/// A VCF file opened for streaming its records as [`VariantCall`]s.
pub struct VcfSource {
    reader: vcf::Reader<Box<dyn BufRead>>,
    header: vcf::Header,
}

impl VcfSource {
    /// Open the (optionally gzip-compressed) VCF file and read its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let mut reader = open_read_maybe_gz(path.as_ref())
            .map(vcf::Reader::new)
            .map_err(|e| anyhow::anyhow!("could not open VCF {:?}: {}", path.as_ref(), e))?;
        let header = reader
            .read_header()
            .map_err(|e| anyhow::anyhow!("problem reading VCF header: {}", e))?;
        Ok(Self { reader, header })
    }

    /// Sample names in header order.
    pub fn sample_names(&self) -> Vec<String> {
        self.header.sample_names().iter().cloned().collect()
    }

    /// Lazily read the remaining records.
    pub fn records(&mut self) -> impl Iterator<Item = Result<VariantCall, anyhow::Error>> + '_ {
        let header = &self.header;
        self.reader.records(header).map(move |record| {
            let record = record.map_err(|e| anyhow::anyhow!("problem reading VCF record: {}", e))?;
            VariantCall::from_vcf(&record, header)
        })
    }
}

/// Knobs of the variant scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantOptions {
    /// Stop after this many variant rows, `None` for no limit.
    pub max_var_count: Option<usize>,
    /// Log progress after every this many variant rows, `0` to disable.
    pub progress_every: usize,
}

/// Counters of the variant scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariantStats {
    /// Number of variant rows written.
    pub variant_cnt: usize,
    /// Sum of carrying samples over all written variants.
    pub call_cnt: usize,
    /// Records skipped for lack of carriers or alternate alleles.
    pub skipped: usize,
    /// Carrying samples without a known sample row.
    pub unlinked: usize,
}

/// Write variant rows and carrier links for the records in `records`.
///
/// `sample_count` is the number of samples in the VCF and `sample_ids` maps the
/// names of the ingested samples to their ids.  Nothing is read if `sample_count`
/// is zero.
pub fn process_variants<I>(
    writer: &Writer,
    dataset_id: i64,
    records: I,
    sample_count: usize,
    sample_ids: &IndexMap<String, i64>,
    options: &VariantOptions,
) -> Result<VariantStats, anyhow::Error>
where
    I: IntoIterator<Item = Result<VariantCall, anyhow::Error>>,
{
    let mut stats = VariantStats::default();
    if sample_count == 0 {
        tracing::info!("no samples, skipping variant scan");
        return Ok(stats);
    }

    let start = std::time::Instant::now();
    let mut records = records.into_iter();
    loop {
        if let Some(max_var_count) = options.max_var_count {
            if stats.variant_cnt >= max_var_count {
                tracing::warn!(
                    "Stopping after {} variants as requested by max_var_count",
                    stats.variant_cnt
                );
                break;
            }
        }
        let Some(record) = records.next() else {
            break; // all done
        };
        let record = record?;

        let carriers = record.carriers();
        // Only the first alternate allele is stored.
        let alternate = match record.alternates.first() {
            Some(alternate) if !carriers.is_empty() => alternate,
            _ => {
                stats.skipped += 1;
                continue;
            }
        };

        let variant_id = writer.insert_variant(&rows::NewVariant {
            dataset_id,
            variant_id: record.id.clone(),
            chromosome: record.chrom.clone(),
            reference: record.reference.clone(),
            alternate: alternate.clone(),
            start: record.pos as i64,
            end: record.end() as i64,
            call_cnt: sample_count as i64,
            sample_cnt: sample_count as i64,
            matching_sample_cnt: carriers.len() as i64,
            frequency: carriers.len() as f64 / sample_count as f64,
        })?;

        let linked = carriers
            .iter()
            .filter_map(|name| sample_ids.get(*name).copied())
            .collect::<Vec<_>>();
        stats.unlinked += carriers.len() - linked.len();
        writer.link_variant_samples(variant_id, &linked)?;

        stats.variant_cnt += 1;
        stats.call_cnt += carriers.len();
        if options.progress_every > 0 && stats.variant_cnt % options.progress_every == 0 {
            tracing::info!(
                "... at {} variants, {} calls ({}:{})",
                stats.variant_cnt.separate_with_commas(),
                stats.call_cnt.separate_with_commas(),
                &record.chrom,
                record.pos
            );
        }
    }

    if stats.unlinked > 0 {
        tracing::warn!(
            "{} carrier calls belong to samples without a sample row and were not linked",
            stats.unlinked.separate_with_commas()
        );
    }
    tracing::info!(
        "... wrote {} variants with {} calls ({} records skipped) in {:?}",
        stats.variant_cnt.separate_with_commas(),
        stats.call_cnt.separate_with_commas(),
        stats.skipped.separate_with_commas(),
        start.elapsed()
    );

    Ok(stats)
}
