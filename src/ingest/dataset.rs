//! Creation and finalization of the dataset record of a run.

use crate::{
    conf::{DatasetConf, MetadataConf},
    store::{rows, Writer},
};

use super::variants::VariantStats;

/// Insert the dataset row with zeroed counters and return its id.
pub fn register(
    writer: &Writer,
    conf: &DatasetConf,
    sample_count: usize,
) -> Result<i64, anyhow::Error> {
    let dataset_id = writer
        .insert_dataset(&rows::NewDataset {
            stable_id: conf.name.clone(),
            description: conf.description.clone(),
            access_type: conf.access_tier.to_string(),
            reference_genome: conf.genomebuild.name(),
            sample_cnt: sample_count as i64,
        })
        .map_err(|e| anyhow::anyhow!("could not create dataset {:?}: {}", &conf.name, e))?;
    tracing::info!(
        "registered dataset {:?} ({}) with id {}",
        &conf.name,
        conf.access_tier,
        dataset_id
    );
    Ok(dataset_id)
}

/// Write the variant summary and the access level and consent entries.
pub fn finalize(
    writer: &Writer,
    dataset_id: i64,
    dataset: &DatasetConf,
    metadata: &MetadataConf,
    stats: &VariantStats,
) -> Result<(), anyhow::Error> {
    writer.update_dataset_counts(dataset_id, stats.variant_cnt as i64, stats.call_cnt as i64)?;
    writer.insert_access_level(&rows::AccessLevelEntry {
        dataset_id,
        parent_field: metadata.access_parent_field.clone(),
        field: metadata.access_field.clone(),
        access_level: dataset.access_tier.to_string(),
    })?;
    writer.insert_consent(&rows::ConsentEntry {
        dataset_id,
        consent_code_id: metadata.consent_code_id,
        additional_constraint: metadata.consent_additional_constraint.clone(),
        version: metadata.consent_version.clone(),
    })?;
    Ok(())
}
