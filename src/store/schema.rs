//! Table definitions of the Beacon warehouse.

/// Tables written by the importer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum Table {
    #[strum(serialize = "beacon_dataset_table")]
    Dataset,
    #[strum(serialize = "individual_table")]
    Individual,
    #[strum(serialize = "disease_table")]
    Disease,
    #[strum(serialize = "beacon_sample_table")]
    Sample,
    #[strum(serialize = "beacon_data_table")]
    Variant,
    #[strum(serialize = "beacon_data_sample_table")]
    VariantSample,
    #[strum(serialize = "beacon_dataset_sample_table")]
    DatasetSample,
    #[strum(serialize = "dataset_access_level_table")]
    AccessLevel,
    #[strum(serialize = "beacon_dataset_consent_code_table")]
    ConsentCode,
}

impl Table {
    /// Whether rows of the table carry a surrogate `id` column.
    pub fn has_id(self) -> bool {
        matches!(
            self,
            Table::Dataset | Table::Individual | Table::Disease | Table::Sample | Table::Variant
        )
    }
}

/// DDL for bootstrapping an empty warehouse.
///
/// Ids are plain integer keys filled by the importer (max + 1), not `AUTOINCREMENT`.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS beacon_dataset_table (
    id INTEGER PRIMARY KEY,
    stable_id TEXT NOT NULL,
    description TEXT,
    access_type TEXT NOT NULL,
    reference_genome TEXT NOT NULL,
    variant_cnt INTEGER NOT NULL,
    call_cnt INTEGER NOT NULL,
    sample_cnt INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS individual_table (
    id INTEGER PRIMARY KEY,
    stable_id TEXT NOT NULL,
    sex TEXT NOT NULL,
    ethnicity TEXT,
    geographic_origin TEXT
);

CREATE TABLE IF NOT EXISTS disease_table (
    id INTEGER PRIMARY KEY,
    individual_id INTEGER NOT NULL REFERENCES individual_table(id),
    disease TEXT NOT NULL,
    age_of_onset INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS beacon_sample_table (
    id INTEGER PRIMARY KEY,
    stable_id TEXT NOT NULL,
    individual_id INTEGER NOT NULL REFERENCES individual_table(id),
    sex TEXT NOT NULL,
    tissue TEXT NOT NULL,
    age_at_collection INTEGER NOT NULL,
    collection_date TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS beacon_data_table (
    id INTEGER PRIMARY KEY,
    dataset_id INTEGER NOT NULL REFERENCES beacon_dataset_table(id),
    variant_id TEXT,
    chromosome TEXT NOT NULL,
    reference TEXT NOT NULL,
    alternate TEXT NOT NULL,
    start INTEGER NOT NULL,
    "end" INTEGER NOT NULL,
    call_cnt INTEGER NOT NULL,
    sample_cnt INTEGER NOT NULL,
    matching_sample_cnt INTEGER NOT NULL,
    frequency REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS beacon_data_sample_table (
    data_id INTEGER NOT NULL REFERENCES beacon_data_table(id),
    sample_id INTEGER NOT NULL REFERENCES beacon_sample_table(id)
);

CREATE TABLE IF NOT EXISTS beacon_dataset_sample_table (
    dataset_id INTEGER NOT NULL REFERENCES beacon_dataset_table(id),
    sample_id INTEGER NOT NULL REFERENCES beacon_sample_table(id)
);

CREATE TABLE IF NOT EXISTS dataset_access_level_table (
    dataset_id INTEGER NOT NULL REFERENCES beacon_dataset_table(id),
    parent_field TEXT NOT NULL,
    field TEXT NOT NULL,
    access_level TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS beacon_dataset_consent_code_table (
    dataset_id INTEGER NOT NULL REFERENCES beacon_dataset_table(id),
    consent_code_id INTEGER NOT NULL,
    additional_constraint TEXT,
    version TEXT NOT NULL
);
"#;

/// Tables in an order that satisfies foreign keys when deleting.
pub const CLEAR_ORDER: &[Table] = &[
    Table::VariantSample,
    Table::DatasetSample,
    Table::AccessLevel,
    Table::ConsentCode,
    Table::Variant,
    Table::Disease,
    Table::Sample,
    Table::Individual,
    Table::Dataset,
];
