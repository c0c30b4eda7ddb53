//! Classification of free-text disease questionnaire answers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Answers that mark a disease category as absent (exact, case-sensitive match).
pub const ABSENT_ANSWERS: &[&str] = &["No", "Never"];

/// Raw answer(s) given for one disease category.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum DiseaseAnswer {
    One(String),
    Many(Vec<String>),
}

impl DiseaseAnswer {
    /// The answers as a slice; a single string is a one-element list.
    pub fn answers(&self) -> &[String] {
        match self {
            DiseaseAnswer::One(answer) => std::slice::from_ref(answer),
            DiseaseAnswer::Many(answers) => answers.as_slice(),
        }
    }

    /// Whether any answer reports the disease as present.
    pub fn is_present(&self) -> bool {
        self.answers()
            .iter()
            .any(|answer| !ABSENT_ANSWERS.contains(&answer.as_str()))
    }
}

/// Lookup from internal category key to the name stored in the warehouse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiseaseCatalog {
    display_names: IndexMap<String, String>,
}

impl DiseaseCatalog {
    pub fn new(display_names: IndexMap<String, String>) -> Self {
        Self { display_names }
    }

    /// Name to store for `category`; unmapped categories keep their key.
    pub fn display_name<'a>(&'a self, category: &'a str) -> &'a str {
        self.display_names
            .get(category)
            .map(|s| s.as_str())
            .unwrap_or(category)
    }

    /// Return the display names of all present categories, in input order.
    pub fn classify(&self, diseases: &IndexMap<String, DiseaseAnswer>) -> Vec<String> {
        diseases
            .iter()
            .filter(|(_, answer)| answer.is_present())
            .map(|(category, _)| self.display_name(category).to_string())
            .collect()
    }
}
