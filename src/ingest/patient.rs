//! Normalization of raw patient documents into individual, disease and sample rows.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::{
    classify::{DiseaseAnswer, DiseaseCatalog},
    err::InputError,
    store::{rows, Writer},
};

/// Format of the date of birth, e.g., `05-Jan-99`.
pub const DATE_OF_BIRTH_FORMAT: &str = "%d-%b-%y";

/// One patient as found in the cohort JSON file.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PatientDocument {
    pub demographic: Option<Demographic>,
    #[serde(default)]
    pub diseases: IndexMap<String, DiseaseAnswer>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Demographic {
    pub biological_sex: Option<String>,
    /// Date of birth, despite the name.
    pub age: Option<String>,
    pub ethnicity: Option<serde_json::Value>,
    pub residence: Option<serde_json::Value>,
}

/// Fixed inputs of normalization shared by all patients of a run.
#[derive(Debug, Clone)]
pub struct NormalizeContext<'a> {
    /// Reference timestamp for ages.
    pub now: NaiveDateTime,
    pub stable_id_prefix: &'a str,
    pub tissue: &'a str,
    pub catalog: &'a DiseaseCatalog,
    pub dataset_id: i64,
}

/// The rows derived from one patient, before ids are allocated.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPatient {
    pub individual: rows::NewIndividual,
    /// Age in whole years at `now`.
    pub age: i64,
    /// Display names of the present disease categories.
    pub diseases: Vec<String>,
}

/// Ids of the rows written for one patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPatient {
    pub individual_id: i64,
    pub disease_ids: Vec<i64>,
    pub sample_id: Option<i64>,
}

/// Stable id of the `ordinal`-th (1-based) patient.
pub fn stable_id(prefix: &str, ordinal: usize) -> String {
    format!("{}{:03}", prefix, ordinal)
}

/// Parse a date of birth such as `05-Jan-99`.
///
/// Two-digit years 69..=99 are 19xx, 00..=68 are 20xx.
pub fn parse_date_of_birth(ordinal: usize, value: &str) -> Result<NaiveDate, InputError> {
    let date = NaiveDate::parse_from_str(value.trim(), DATE_OF_BIRTH_FORMAT).map_err(|source| {
        InputError::InvalidDate {
            patient: ordinal,
            value: value.to_string(),
            source,
        }
    })?;
    let yy = date.year().rem_euclid(100);
    let century = if yy >= 69 { 1900 } else { 2000 };
    Ok(date.with_year(century + yy).unwrap_or(date))
}

/// Whole calendar years from `birth` to `today`, negative if `birth` is later.
pub fn age_in_years(birth: NaiveDate, today: NaiveDate) -> i64 {
    if birth > today {
        return -age_in_years(today, birth);
    }
    let mut years = (today.year() - birth.year()) as i64;
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years
}

/// Render a free-form JSON value as text, strings without quotes.
fn value_to_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Derive the rows for the `ordinal`-th (1-based) patient without touching storage.
pub fn prepare(
    ctx: &NormalizeContext,
    ordinal: usize,
    patient: &PatientDocument,
) -> Result<PreparedPatient, InputError> {
    let demographic = patient
        .demographic
        .as_ref()
        .ok_or(InputError::MissingField {
            patient: ordinal,
            field: "demographic",
        })?;
    let sex = demographic
        .biological_sex
        .as_ref()
        .ok_or(InputError::MissingField {
            patient: ordinal,
            field: "demographic.biologicalSex",
        })?
        .to_lowercase();
    let date_of_birth = demographic.age.as_ref().ok_or(InputError::MissingField {
        patient: ordinal,
        field: "demographic.age",
    })?;
    let date_of_birth = parse_date_of_birth(ordinal, date_of_birth)?;

    Ok(PreparedPatient {
        individual: rows::NewIndividual {
            stable_id: stable_id(ctx.stable_id_prefix, ordinal),
            sex,
            ethnicity: demographic.ethnicity.as_ref().and_then(value_to_text),
            geographic_origin: demographic.residence.as_ref().and_then(value_to_text),
        },
        age: age_in_years(date_of_birth, ctx.now.date()),
        diseases: ctx.catalog.classify(&patient.diseases),
    })
}

/// Write the rows of the `ordinal`-th patient, plus its sample if `sample` is a
/// non-empty name.
pub fn normalize(
    writer: &Writer,
    ctx: &NormalizeContext,
    ordinal: usize,
    patient: &PatientDocument,
    sample: Option<&str>,
) -> Result<NormalizedPatient, anyhow::Error> {
    let prepared = prepare(ctx, ordinal, patient)?;

    let individual_id = writer.insert_individual(&prepared.individual)?;
    let disease_ids = prepared
        .diseases
        .iter()
        .map(|disease| {
            writer.insert_disease(&rows::NewDisease {
                individual_id,
                disease: disease.clone(),
                age_of_onset: prepared.age,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let sample = sample.filter(|name| !name.is_empty());
    let sample_id = if let Some(sample) = sample {
        let sample_id = writer.insert_sample(&rows::NewSample {
            stable_id: sample.to_string(),
            individual_id,
            sex: prepared.individual.sex.clone(),
            tissue: ctx.tissue.to_string(),
            age_at_collection: prepared.age,
            collection_date: ctx.now.format("%Y-%m-%dT%H:%M:%S").to_string(),
        })?;
        writer.link_dataset_sample(ctx.dataset_id, sample_id)?;
        Some(sample_id)
    } else {
        None
    };

    tracing::debug!(
        "{} -> individual {} ({}, age {}), diseases {:?}, sample {:?}",
        &prepared.individual.stable_id,
        individual_id,
        &prepared.individual.sex,
        prepared.age,
        &prepared.diseases,
        sample
    );

    Ok(NormalizedPatient {
        individual_id,
        disease_ids,
        sample_id,
    })
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, NaiveDateTime};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{
        age_in_years, normalize, parse_date_of_birth, prepare, stable_id, NormalizeContext,
        PatientDocument,
    };
    use crate::{
        classify::DiseaseCatalog,
        conf::DiseasesConf,
        err::InputError,
        store::{rows, Table, Warehouse},
    };

    fn catalog() -> DiseaseCatalog {
        DiseaseCatalog::new(DiseasesConf::default().display_names)
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn ctx(catalog: &DiseaseCatalog) -> NormalizeContext<'_> {
        NormalizeContext {
            now: now(),
            stable_id_prefix: "CHILD",
            tissue: "blood",
            catalog,
            dataset_id: 1,
        }
    }

    fn patient(json: &str) -> PatientDocument {
        serde_json::from_str(json).expect("invalid test JSON")
    }

    #[rstest]
    #[case(1, "CHILD001")]
    #[case(42, "CHILD042")]
    #[case(1234, "CHILD1234")]
    fn stable_id_is_zero_padded(#[case] ordinal: usize, #[case] expected: &str) {
        assert_eq!(stable_id("CHILD", ordinal), expected);
    }

    #[rstest]
    #[case("05-Jan-99", (1999, 1, 5))]
    #[case("31-Dec-68", (2068, 12, 31))]
    #[case("01-Mar-69", (1969, 3, 1))]
    #[case("29-Feb-00", (2000, 2, 29))]
    #[case("12-Jun-15", (2015, 6, 12))]
    fn parse_date_of_birth_two_digit_years(#[case] value: &str, #[case] expected: (i32, u32, u32)) {
        let (y, m, d) = expected;
        assert_eq!(
            parse_date_of_birth(1, value).unwrap(),
            NaiveDate::from_ymd_opt(y, m, d).unwrap()
        );
    }

    #[rstest]
    #[case("1999-01-05")]
    #[case("05-Foo-99")]
    #[case("32-Jan-99")]
    #[case("")]
    fn parse_date_of_birth_invalid(#[case] value: &str) {
        assert!(matches!(
            parse_date_of_birth(3, value),
            Err(InputError::InvalidDate { patient: 3, .. })
        ));
    }

    #[rstest]
    #[case((1999, 1, 5), (2024, 6, 15), 25)]
    #[case((1999, 6, 15), (2024, 6, 15), 25)]
    #[case((1999, 6, 16), (2024, 6, 15), 24)]
    #[case((2000, 2, 29), (2023, 2, 28), 22)]
    #[case((2024, 6, 15), (2024, 6, 15), 0)]
    #[case((2026, 6, 16), (2024, 6, 15), -2)]
    fn age_in_years_cases(
        #[case] birth: (i32, u32, u32),
        #[case] today: (i32, u32, u32),
        #[case] expected: i64,
    ) {
        let birth = NaiveDate::from_ymd_opt(birth.0, birth.1, birth.2).unwrap();
        let today = NaiveDate::from_ymd_opt(today.0, today.1, today.2).unwrap();
        assert_eq!(age_in_years(birth, today), expected);
    }

    #[test]
    fn prepare_full_document() -> Result<(), anyhow::Error> {
        let catalog = catalog();
        let prepared = prepare(
            &ctx(&catalog),
            7,
            &patient(
                r#"{
                    "demographic": {
                        "biologicalSex": "Female",
                        "age": "05-Jan-99",
                        "ethnicity": "Caucasian",
                        "residence": {"city": "Toronto"}
                    },
                    "diseases": {"respiratorySystem": ["Yes"], "circulatorySystem": "No"}
                }"#,
            ),
        )?;

        assert_eq!(
            prepared.individual,
            rows::NewIndividual {
                stable_id: "CHILD007".into(),
                sex: "female".into(),
                ethnicity: Some("Caucasian".into()),
                geographic_origin: Some(r#"{"city":"Toronto"}"#.into()),
            }
        );
        assert_eq!(prepared.age, 25);
        assert_eq!(prepared.diseases, vec!["respiratorySystem".to_string()]);

        Ok(())
    }

    #[test]
    fn prepare_is_deterministic() -> Result<(), anyhow::Error> {
        let catalog = catalog();
        let doc = patient(r#"{"demographic": {"biologicalSex": "Male", "age": "05-Jan-99"}}"#);

        assert_eq!(prepare(&ctx(&catalog), 1, &doc)?, prepare(&ctx(&catalog), 1, &doc)?);

        Ok(())
    }

    #[rstest]
    #[case(r#"{"diseases": {}}"#, "demographic")]
    #[case(r#"{"demographic": {"age": "05-Jan-99"}}"#, "demographic.biologicalSex")]
    #[case(r#"{"demographic": {"biologicalSex": "Male"}}"#, "demographic.age")]
    fn prepare_missing_field(#[case] json: &str, #[case] expected_field: &str) {
        let catalog = catalog();
        match prepare(&ctx(&catalog), 2, &patient(json)) {
            Err(InputError::MissingField { patient, field }) => {
                assert_eq!(patient, 2);
                assert_eq!(field, expected_field);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn normalize_with_sample() -> Result<(), anyhow::Error> {
        let mut warehouse = Warehouse::open_in_memory()?;
        let catalog = catalog();
        {
            let writer = warehouse.writer()?;
            let dataset_id = writer.insert_dataset(&rows::NewDataset {
                stable_id: "childdemo".into(),
                description: "demo".into(),
                access_type: "PUBLIC".into(),
                reference_genome: "GRCh37".into(),
                sample_cnt: 1,
            })?;
            let ctx = NormalizeContext {
                dataset_id,
                ..ctx(&catalog)
            };

            let res = normalize(
                &writer,
                &ctx,
                1,
                &patient(
                    r#"{
                        "demographic": {"biologicalSex": "Male", "age": "05-Jan-99"},
                        "diseases": {"respiratorySystem": ["Yes"], "oncological": "Yes"}
                    }"#,
                ),
                Some("NA12878"),
            )?;
            assert_eq!(res.individual_id, 1);
            assert_eq!(res.disease_ids, vec![1, 2]);
            assert_eq!(res.sample_id, Some(1));
            writer.commit()?;
        }

        assert_eq!(warehouse.count(Table::Individual)?, 1);
        assert_eq!(warehouse.count(Table::Disease)?, 2);
        assert_eq!(warehouse.count(Table::Sample)?, 1);
        assert_eq!(warehouse.count(Table::DatasetSample)?, 1);

        let diseases = warehouse
            .conn()
            .prepare("SELECT disease, age_of_onset FROM disease_table ORDER BY id")?
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(
            diseases,
            vec![
                ("respiratorySystem".to_string(), 25),
                ("Cancer".to_string(), 25)
            ]
        );

        let (stable_id, individual_id, collection_date): (String, i64, String) =
            warehouse.conn().query_row(
                "SELECT stable_id, individual_id, collection_date FROM beacon_sample_table",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;
        assert_eq!(stable_id, "NA12878");
        assert_eq!(individual_id, 1);
        insta::assert_snapshot!(collection_date, @"2024-06-15T12:00:00");

        Ok(())
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    fn normalize_without_sample(#[case] sample: Option<&str>) -> Result<(), anyhow::Error> {
        let mut warehouse = Warehouse::open_in_memory()?;
        let catalog = catalog();
        {
            let writer = warehouse.writer()?;
            let res = normalize(
                &writer,
                &ctx(&catalog),
                1,
                &patient(r#"{"demographic": {"biologicalSex": "Male", "age": "05-Jan-99"}}"#),
                sample,
            )?;
            assert_eq!(res.sample_id, None);
            assert!(res.disease_ids.is_empty());
            writer.commit()?;
        }

        assert_eq!(warehouse.count(Table::Individual)?, 1);
        assert_eq!(warehouse.count(Table::Sample)?, 0);
        assert_eq!(warehouse.count(Table::DatasetSample)?, 0);

        Ok(())
    }
}
