//! Static trait interpretations and the genotype matcher.

pub mod catalog;
pub mod matcher;

pub use catalog::*;
pub use matcher::*;
