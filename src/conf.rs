//! Code for supporting the ingestion configuration file.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::common::{AccessTier, GenomeRelease};

/// Top-level configuration, read from TOML.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct IngestConf {
    pub dataset: DatasetConf,
    pub individuals: IndividualsConf,
    pub samples: SamplesConf,
    pub variants: VariantsConf,
    pub metadata: MetadataConf,
    pub diseases: DiseasesConf,
}

impl IngestConf {
    /// Load configuration from the TOML file at `path`.
    pub fn from_path<P>(path: P) -> Result<Self, anyhow::Error>
    where
        P: AsRef<std::path::Path>,
    {
        let toml_str = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow::anyhow!("could not read config file {:?}: {}", path.as_ref(), e)
        })?;
        toml::from_str(&toml_str)
            .map_err(|e| anyhow::anyhow!("could not parse config file {:?}: {}", path.as_ref(), e))
    }
}

/// The dataset record created for the run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DatasetConf {
    /// Stable name of the dataset.
    pub name: String,
    pub description: String,
    pub access_tier: AccessTier,
    pub genomebuild: GenomeRelease,
}

impl Default for DatasetConf {
    fn default() -> Self {
        Self {
            name: "childdemo".into(),
            description: "CHILD db demo for AGM".into(),
            access_tier: AccessTier::Public,
            genomebuild: GenomeRelease::Grch37,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct IndividualsConf {
    /// Prefix of the generated stable ids, e.g. `CHILD` for `CHILD001`.
    pub stable_id_prefix: String,
}

impl Default for IndividualsConf {
    fn default() -> Self {
        Self {
            stable_id_prefix: "CHILD".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SamplesConf {
    /// Tissue recorded for every sample.
    pub tissue: String,
}

impl Default for SamplesConf {
    fn default() -> Self {
        Self {
            tissue: "blood".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct VariantsConf {
    /// Stop after this many variant rows; `0` disables the limit.
    pub max_var_count: usize,
    /// Log progress after every this many variant rows.
    pub progress_every: usize,
}

impl Default for VariantsConf {
    fn default() -> Self {
        Self {
            max_var_count: 1000,
            progress_every: 100,
        }
    }
}

impl VariantsConf {
    /// The cap as an option, `None` meaning unlimited.
    pub fn cap(&self) -> Option<usize> {
        if self.max_var_count == 0 {
            None
        } else {
            Some(self.max_var_count)
        }
    }
}

/// Fixed access level and consent metadata written per dataset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MetadataConf {
    pub access_parent_field: String,
    pub access_field: String,
    pub consent_code_id: i64,
    pub consent_additional_constraint: Option<String>,
    pub consent_version: String,
}

impl Default for MetadataConf {
    fn default() -> Self {
        Self {
            access_parent_field: "accessLevelSummary".into(),
            access_field: "-".into(),
            consent_code_id: 1,
            consent_additional_constraint: None,
            consent_version: "v1.0".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DiseasesConf {
    /// Mapping from questionnaire category key to the name stored in the warehouse.
    pub display_names: IndexMap<String, String>,
}

impl Default for DiseasesConf {
    fn default() -> Self {
        let mut display_names = IndexMap::new();
        display_names.insert("oncological".to_string(), "Cancer".to_string());
        Self { display_names }
    }
}
