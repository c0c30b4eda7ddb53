//! Common functionality.

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

pub mod io;

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            verbose: Verbosity::new(0, 0),
        }
    }
}

/// Return the version of the `beacon-ingest` crate and `x.y.z` in tests.
pub fn worker_version() -> &'static str {
    if cfg!(test) {
        "x.y.z"
    } else {
        env!("CARGO_PKG_VERSION")
    }
}

/// Select the genome release to use.
#[derive(
    clap::ValueEnum,
    serde::Serialize,
    serde::Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    strum::Display,
    PartialEq,
    Eq,
    Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum GenomeRelease {
    /// GRCh37 / hg19
    #[default]
    #[strum(serialize = "grch37")]
    Grch37,
    /// GRCh38 / hg38
    #[strum(serialize = "grch38")]
    Grch38,
}

impl GenomeRelease {
    /// Name as written into the dataset table.
    pub fn name(&self) -> String {
        match self {
            GenomeRelease::Grch37 => String::from("GRCh37"),
            GenomeRelease::Grch38 => String::from("GRCh38"),
        }
    }
}

impl std::str::FromStr for GenomeRelease {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase();
        if s.starts_with("grch37") {
            Ok(GenomeRelease::Grch37)
        } else if s.starts_with("grch38") {
            Ok(GenomeRelease::Grch38)
        } else {
            Err(anyhow::anyhow!("Unknown genome release: {}", s))
        }
    }
}

/// Access tier of a dataset.
#[derive(
    clap::ValueEnum,
    serde::Serialize,
    serde::Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    strum::Display,
    strum::EnumString,
    PartialEq,
    Eq,
    Hash,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessTier {
    /// Anyone may query.
    #[default]
    Public,
    /// Registered users only.
    Registered,
    /// Requires an approved data access request.
    Controlled,
}

/// Helper type for classifying genotype calls.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Genotype {
    /// All alleles are the reference.
    HomRef,
    /// At least one allele is an alternate allele.
    Variant,
    /// At least one allele is missing, e.g. `./.` or `./1`.
    NoCall,
}

impl std::str::FromStr for Genotype {
    type Err = anyhow::Error;

    /// Parse a `FORMAT/GT` value such as `0/1`, `1|1`, `./.` or `2`.
    ///
    /// Partially called genotypes count as not called.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut any_missing = false;
        let mut any_alt = false;
        for allele in s.split(['/', '|']) {
            match allele {
                "." => any_missing = true,
                "0" => (),
                _ => {
                    allele
                        .parse::<u32>()
                        .map_err(|_| anyhow::anyhow!("invalid genotype value: {:?}", s))?;
                    any_alt = true;
                }
            }
        }
        Ok(if any_missing {
            Genotype::NoCall
        } else if any_alt {
            Genotype::Variant
        } else {
            Genotype::HomRef
        })
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{AccessTier, GenomeRelease, Genotype};

    #[rstest]
    #[case("0/0", Genotype::HomRef)]
    #[case("0|0", Genotype::HomRef)]
    #[case("0", Genotype::HomRef)]
    #[case("0/1", Genotype::Variant)]
    #[case("1|0", Genotype::Variant)]
    #[case("1/1", Genotype::Variant)]
    #[case("1/2", Genotype::Variant)]
    #[case("./1", Genotype::NoCall)]
    #[case("1|.", Genotype::NoCall)]
    #[case("1", Genotype::Variant)]
    #[case("./.", Genotype::NoCall)]
    #[case(".", Genotype::NoCall)]
    #[case("./0", Genotype::NoCall)]
    fn genotype_from_str(#[case] gt: &str, #[case] expected: Genotype) -> Result<(), anyhow::Error> {
        assert_eq!(gt.parse::<Genotype>()?, expected);
        Ok(())
    }

    #[test]
    fn genotype_from_str_invalid() {
        assert!("0/x".parse::<Genotype>().is_err());
        assert!("".parse::<Genotype>().is_err());
    }

    #[rstest]
    #[case("GRCh37", GenomeRelease::Grch37)]
    #[case("grch38", GenomeRelease::Grch38)]
    #[case("GRCh37.p10", GenomeRelease::Grch37)]
    fn genome_release_from_str(
        #[case] s: &str,
        #[case] expected: GenomeRelease,
    ) -> Result<(), anyhow::Error> {
        assert_eq!(s.parse::<GenomeRelease>()?, expected);
        Ok(())
    }

    #[test]
    fn access_tier_display() {
        assert_eq!(AccessTier::Public.to_string(), "PUBLIC");
        assert_eq!(AccessTier::Registered.to_string(), "REGISTERED");
        assert_eq!(AccessTier::Controlled.to_string(), "CONTROLLED");
        assert_eq!(
            "CONTROLLED".parse::<AccessTier>().ok(),
            Some(AccessTier::Controlled)
        );
    }
}
