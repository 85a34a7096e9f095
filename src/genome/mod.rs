//! Raw genome export ingestion: format sniffing, genotype normalization
//! and the tolerant line parser.

pub mod format;
pub mod genotype;
pub mod parser;

pub use format::*;
pub use genotype::*;
pub use parser::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenomeError {
    #[error("Upload is empty")]
    EmptyInput,

    #[error("Upload too large: {size_mb:.1}MB exceeds {max_mb}MB limit")]
    TooLarge { size_mb: f64, max_mb: u64 },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Could not decompress upload: {0}")]
    Decompression(#[from] std::io::Error),

    #[error("No genotypes found in upload ({malformed} malformed lines)")]
    NoGenotypes { malformed: usize },
}
