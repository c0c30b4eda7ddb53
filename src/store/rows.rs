//! Rows written into the warehouse tables.

#[derive(Debug, Clone, PartialEq)]
pub struct NewDataset {
    pub stable_id: String,
    pub description: String,
    pub access_type: String,
    pub reference_genome: String,
    pub sample_cnt: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewIndividual {
    pub stable_id: String,
    pub sex: String,
    pub ethnicity: Option<String>,
    pub geographic_origin: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDisease {
    pub individual_id: i64,
    pub disease: String,
    pub age_of_onset: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSample {
    pub stable_id: String,
    pub individual_id: i64,
    pub sex: String,
    pub tissue: String,
    pub age_at_collection: i64,
    /// ISO 8601 timestamp.
    pub collection_date: String,
}

/// One variant of the dataset, with its carrier statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVariant {
    pub dataset_id: i64,
    /// External identifier from the `ID` column, if any.
    pub variant_id: Option<String>,
    pub chromosome: String,
    pub reference: String,
    pub alternate: String,
    /// 1-based start position.
    pub start: i64,
    /// 1-based inclusive end position.
    pub end: i64,
    pub call_cnt: i64,
    pub sample_cnt: i64,
    pub matching_sample_cnt: i64,
    pub frequency: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccessLevelEntry {
    pub dataset_id: i64,
    pub parent_field: String,
    pub field: String,
    pub access_level: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsentEntry {
    pub dataset_id: i64,
    pub consent_code_id: i64,
    pub additional_constraint: Option<String>,
    pub version: String,
}
