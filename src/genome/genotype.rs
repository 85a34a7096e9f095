use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Markers vendors use when the chip could not call a position
const NO_CALL_MARKERS: &[&str] = &["", "-", "--", "0", "00", "NC", "??"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GenotypeError {
    #[error("Invalid allele '{0}'")]
    InvalidAllele(char),

    #[error("Genotype '{0}' has an unsupported number of alleles")]
    BadLength(String),
}

/// One allele as reported by a genotyping chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Allele {
    A,
    C,
    G,
    T,
    /// Deletion
    D,
    /// Insertion
    I,
}

impl Allele {
    pub fn from_char(c: char) -> Result<Self, GenotypeError> {
        match c.to_ascii_uppercase() {
            'A' => Ok(Self::A),
            'C' => Ok(Self::C),
            'G' => Ok(Self::G),
            'T' => Ok(Self::T),
            'D' => Ok(Self::D),
            'I' => Ok(Self::I),
            _ => Err(GenotypeError::InvalidAllele(c)),
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Self::A => 'A',
            Self::C => 'C',
            Self::G => 'G',
            Self::T => 'T',
            Self::D => 'D',
            Self::I => 'I',
        }
    }

    /// Base on the opposite strand. Indels have no complement.
    pub fn complement(&self) -> Self {
        match self {
            Self::A => Self::T,
            Self::T => Self::A,
            Self::C => Self::G,
            Self::G => Self::C,
            Self::D => Self::D,
            Self::I => Self::I,
        }
    }
}

/// Normalized genotype. Called genotypes keep their alleles sorted,
/// so `GA` and `AG` compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Genotype {
    NoCall,
    /// Single allele (X/Y/MT calls in males)
    Hemizygous(Allele),
    Diploid(Allele, Allele),
}

impl Genotype {
    /// Normalize a raw vendor genotype string.
    pub fn parse(raw: &str) -> Result<Self, GenotypeError> {
        let cleaned = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
        let upper = cleaned.to_ascii_uppercase();

        if NO_CALL_MARKERS.contains(&upper.as_str()) {
            return Ok(Self::NoCall);
        }

        let chars: Vec<char> = upper
            .chars()
            .filter(|c| !matches!(c, '/' | '|' | ' '))
            .collect();

        match chars.as_slice() {
            [a] => Ok(Self::Hemizygous(Allele::from_char(*a)?)),
            [a, b] => Ok(Self::diploid(Allele::from_char(*a)?, Allele::from_char(*b)?)),
            _ => Err(GenotypeError::BadLength(cleaned.to_string())),
        }
    }

    /// Build from the two allele columns of a split-allele export
    pub fn from_pair(first: &str, second: &str) -> Result<Self, GenotypeError> {
        let first = first.trim();
        let second = second.trim();
        // A half call is still unusable for interpretation
        if NO_CALL_MARKERS.contains(&first) || NO_CALL_MARKERS.contains(&second) {
            return Ok(Self::NoCall);
        }
        Self::parse(&format!("{first}{second}"))
    }

    fn diploid(a: Allele, b: Allele) -> Self {
        if a <= b {
            Self::Diploid(a, b)
        } else {
            Self::Diploid(b, a)
        }
    }

    pub fn is_called(&self) -> bool {
        !matches!(self, Self::NoCall)
    }

    pub fn is_homozygous(&self) -> bool {
        matches!(self, Self::Diploid(a, b) if a == b)
    }

    pub fn is_hemizygous(&self) -> bool {
        matches!(self, Self::Hemizygous(_))
    }

    /// Same call read from the opposite strand
    pub fn complement(&self) -> Self {
        match self {
            Self::NoCall => Self::NoCall,
            Self::Hemizygous(a) => Self::Hemizygous(a.complement()),
            Self::Diploid(a, b) => Self::diploid(a.complement(), b.complement()),
        }
    }

    /// Canonical text form: `AG`, `T`, or `--`
    pub fn as_string(&self) -> String {
        match self {
            Self::NoCall => "--".to_string(),
            Self::Hemizygous(a) => a.as_char().to_string(),
            Self::Diploid(a, b) => [a.as_char(), b.as_char()].iter().collect(),
        }
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl std::str::FromStr for Genotype {
    type Err = GenotypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Genotype {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

impl<'de> Deserialize<'de> for Genotype {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allele_order_is_canonical() {
        assert_eq!(Genotype::parse("GA").unwrap(), Genotype::parse("AG").unwrap());
        assert_eq!(Genotype::parse("GA").unwrap().as_string(), "AG");
    }

    #[test]
    fn lowercase_and_separators_accepted() {
        assert_eq!(Genotype::parse("c/t").unwrap().as_string(), "CT");
        assert_eq!(Genotype::parse("T|C").unwrap().as_string(), "CT");
        assert_eq!(Genotype::parse(" \"gg\" ").unwrap().as_string(), "GG");
    }

    #[test]
    fn no_call_markers() {
        for raw in ["--", "00", "0", "", "nc", "??", "-"] {
            assert_eq!(Genotype::parse(raw).unwrap(), Genotype::NoCall, "{raw:?}");
        }
    }

    #[test]
    fn hemizygous_call() {
        let g = Genotype::parse("A").unwrap();
        assert!(g.is_hemizygous());
        assert!(!g.is_homozygous());
        assert_eq!(g.as_string(), "A");
    }

    #[test]
    fn indels_are_valid_alleles() {
        assert_eq!(Genotype::parse("ID").unwrap().as_string(), "DI");
        assert!(Genotype::parse("II").unwrap().is_homozygous());
    }

    #[test]
    fn rejects_unknown_alleles_and_lengths() {
        assert_eq!(
            Genotype::parse("AX"),
            Err(GenotypeError::InvalidAllele('X'))
        );
        assert!(matches!(
            Genotype::parse("AGT"),
            Err(GenotypeError::BadLength(_))
        ));
    }

    #[test]
    fn complement_flips_strand_and_stays_canonical() {
        let g = Genotype::parse("AG").unwrap();
        // A->T, G->C gives TC, stored as CT
        assert_eq!(g.complement().as_string(), "CT");
        assert_eq!(g.complement().complement(), g);
        assert_eq!(Genotype::parse("DI").unwrap().complement().as_string(), "DI");
        assert_eq!(Genotype::NoCall.complement(), Genotype::NoCall);
    }

    #[test]
    fn pair_of_columns() {
        assert_eq!(Genotype::from_pair("T", "C").unwrap().as_string(), "CT");
        assert_eq!(Genotype::from_pair("0", "0").unwrap(), Genotype::NoCall);
        assert_eq!(Genotype::from_pair("A", "0").unwrap(), Genotype::NoCall);
    }

    #[test]
    fn serde_uses_canonical_text() {
        let g = Genotype::parse("TC").unwrap();
        let json = serde_json::to_string(&g).unwrap();
        assert_eq!(json, "\"CT\"");
        let back: Genotype = serde_json::from_str(&json).unwrap();
        assert_eq!(back, g);
    }
}
