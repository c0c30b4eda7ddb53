//! Access to the relational Beacon warehouse (SQLite via `rusqlite`).
//!
//! Surrogate ids are allocated as `max(id) + 1` right before each insert.  This is
//! only sound with a single writer; all writes go through a [`Writer`] which holds an
//! `IMMEDIATE` transaction, i.e., the database write lock, for its whole lifetime.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags, TransactionBehavior};

pub mod rows;
pub mod schema;

pub use schema::Table;

/// Error type for warehouse access.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not open warehouse {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("warehouse lacks tables {0:?}; run `db init` first")]
    MissingTables(Vec<String>),
    #[error("table {0} has no surrogate key")]
    NoSurrogateKey(Table),
    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Handle on the warehouse database.
pub struct Warehouse {
    conn: Connection,
}

impl Warehouse {
    /// Open the warehouse at `path`; the file is only created if `create` is set.
    pub fn open<P: AsRef<Path>>(path: P, create: bool) -> Result<Self, Error> {
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if create {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }
        let conn = Connection::open_with_flags(path.as_ref(), flags).map_err(|source| {
            Error::Open {
                path: path.as_ref().to_path_buf(),
                source,
            }
        })?;
        Self::from_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, Error> {
        let result = Self::from_connection(Connection::open_in_memory()?)?;
        result.init_schema()?;
        Ok(result)
    }

    fn from_connection(conn: Connection) -> Result<Self, Error> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// Create all tables that do not exist yet.
    pub fn init_schema(&self) -> Result<(), Error> {
        tracing::debug!("creating warehouse tables (if not exist)");
        self.conn.execute_batch(schema::CREATE_TABLES)?;
        Ok(())
    }

    /// Fail with [`Error::MissingTables`] unless all tables are present.
    pub fn ensure_schema(&self) -> Result<(), Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
        let mut missing = Vec::new();
        for table in schema::CLEAR_ORDER {
            if !stmt.exists(params![table.to_string()])? {
                missing.push(table.to_string());
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingTables(missing))
        }
    }

    /// Remove all rows from all warehouse tables.
    pub fn clear(&mut self) -> Result<(), Error> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        delete_all(&tx)?;
        tx.commit()?;
        Ok(())
    }

    /// Number of rows in `table`.
    pub fn count(&self, table: Table) -> Result<i64, Error> {
        Ok(self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?)
    }

    /// Start the single write transaction of a run.
    pub fn writer(&mut self) -> Result<Writer<'_>, Error> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(Writer { tx })
    }

    #[cfg(test)]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Delete all rows of all tables, children first.
fn delete_all(conn: &Connection) -> Result<(), Error> {
    for table in schema::CLEAR_ORDER {
        let n = conn.execute(&format!("DELETE FROM {}", table), [])?;
        tracing::debug!("  cleared {} rows from {}", n, table);
    }
    Ok(())
}

/// The storage-mutation interface used by the ingestion pipeline.
///
/// Dropping a writer without calling [`Writer::commit`] rolls back everything written.
pub struct Writer<'a> {
    tx: rusqlite::Transaction<'a>,
}

impl Writer<'_> {
    /// Remove all rows as part of this transaction.
    pub fn clear(&self) -> Result<(), Error> {
        delete_all(&self.tx)
    }

    /// Allocate the next surrogate id for `table`; `1` for an empty table.
    pub fn next_id(&self, table: Table) -> Result<i64, Error> {
        if !table.has_id() {
            return Err(Error::NoSurrogateKey(table));
        }
        let id: i64 = self.tx.query_row(
            &format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {}", table),
            [],
            |row| row.get(0),
        )?;
        tracing::trace!("allocated id {} in {}", id, table);
        Ok(id)
    }

    /// Insert the dataset with zeroed variant/call counters.
    pub fn insert_dataset(&self, dataset: &rows::NewDataset) -> Result<i64, Error> {
        let id = self.next_id(Table::Dataset)?;
        self.tx.execute(
            "INSERT INTO beacon_dataset_table \
             (id, stable_id, description, access_type, reference_genome, variant_cnt, call_cnt, sample_cnt) \
             VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, ?6)",
            params![
                id,
                dataset.stable_id,
                dataset.description,
                dataset.access_type,
                dataset.reference_genome,
                dataset.sample_cnt
            ],
        )?;
        Ok(id)
    }

    pub fn update_dataset_counts(
        &self,
        dataset_id: i64,
        variant_cnt: i64,
        call_cnt: i64,
    ) -> Result<(), Error> {
        self.tx.execute(
            "UPDATE beacon_dataset_table SET variant_cnt = ?1, call_cnt = ?2 WHERE id = ?3",
            params![variant_cnt, call_cnt, dataset_id],
        )?;
        Ok(())
    }

    pub fn insert_individual(&self, individual: &rows::NewIndividual) -> Result<i64, Error> {
        let id = self.next_id(Table::Individual)?;
        self.tx.execute(
            "INSERT INTO individual_table (id, stable_id, sex, ethnicity, geographic_origin) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                individual.stable_id,
                individual.sex,
                individual.ethnicity,
                individual.geographic_origin
            ],
        )?;
        Ok(id)
    }

    pub fn insert_disease(&self, disease: &rows::NewDisease) -> Result<i64, Error> {
        let id = self.next_id(Table::Disease)?;
        self.tx.execute(
            "INSERT INTO disease_table (id, individual_id, disease, age_of_onset) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                id,
                disease.individual_id,
                disease.disease,
                disease.age_of_onset
            ],
        )?;
        Ok(id)
    }

    pub fn insert_sample(&self, sample: &rows::NewSample) -> Result<i64, Error> {
        let id = self.next_id(Table::Sample)?;
        self.tx.execute(
            "INSERT INTO beacon_sample_table \
             (id, stable_id, individual_id, sex, tissue, age_at_collection, collection_date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                sample.stable_id,
                sample.individual_id,
                sample.sex,
                sample.tissue,
                sample.age_at_collection,
                sample.collection_date
            ],
        )?;
        Ok(id)
    }

    pub fn link_dataset_sample(&self, dataset_id: i64, sample_id: i64) -> Result<(), Error> {
        self.tx.execute(
            "INSERT INTO beacon_dataset_sample_table (dataset_id, sample_id) VALUES (?1, ?2)",
            params![dataset_id, sample_id],
        )?;
        Ok(())
    }

    pub fn insert_variant(&self, variant: &rows::NewVariant) -> Result<i64, Error> {
        let id = self.next_id(Table::Variant)?;
        self.tx.execute(
            "INSERT INTO beacon_data_table \
             (id, dataset_id, variant_id, chromosome, reference, alternate, start, \"end\", \
              call_cnt, sample_cnt, matching_sample_cnt, frequency) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                id,
                variant.dataset_id,
                variant.variant_id,
                variant.chromosome,
                variant.reference,
                variant.alternate,
                variant.start,
                variant.end,
                variant.call_cnt,
                variant.sample_cnt,
                variant.matching_sample_cnt,
                variant.frequency
            ],
        )?;
        Ok(id)
    }

    /// Bulk-insert one link row per sample id.
    pub fn link_variant_samples(&self, variant_id: i64, sample_ids: &[i64]) -> Result<(), Error> {
        let mut stmt = self
            .tx
            .prepare_cached("INSERT INTO beacon_data_sample_table (data_id, sample_id) VALUES (?1, ?2)")?;
        for sample_id in sample_ids {
            stmt.execute(params![variant_id, sample_id])?;
        }
        Ok(())
    }

    pub fn insert_access_level(&self, entry: &rows::AccessLevelEntry) -> Result<(), Error> {
        self.tx.execute(
            "INSERT INTO dataset_access_level_table (dataset_id, parent_field, field, access_level) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.dataset_id,
                entry.parent_field,
                entry.field,
                entry.access_level
            ],
        )?;
        Ok(())
    }

    pub fn insert_consent(&self, entry: &rows::ConsentEntry) -> Result<(), Error> {
        self.tx.execute(
            "INSERT INTO beacon_dataset_consent_code_table \
             (dataset_id, consent_code_id, additional_constraint, version) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.dataset_id,
                entry.consent_code_id,
                entry.additional_constraint,
                entry.version
            ],
        )?;
        Ok(())
    }

    /// Make everything written so far durable.
    pub fn commit(self) -> Result<(), Error> {
        self.tx.commit()?;
        Ok(())
    }
}
