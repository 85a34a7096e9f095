//! DNA report assembly and its JSON blob form.

pub mod preview;

pub use preview::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::genome::{ParseStats, ParsedGenome, SourceFormat};
use crate::traits::{match_traits, Insight, MatchSummary, TraitCategory};

/// Bumped whenever the serialized shape changes incompatibly
pub const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report JSON invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported report schema version {0}")]
    UnsupportedSchema(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub source_format: SourceFormat,
    /// Called positions in the upload
    pub snp_count: usize,
    pub parse_stats: ParseStats,
    pub insights: Vec<Insight>,
    pub summary: MatchSummary,
}

impl Report {
    /// Run the trait lookup over a parsed upload.
    pub fn build(genome: &ParsedGenome) -> Self {
        let outcome = match_traits(genome);
        let report = Self {
            id: Uuid::new_v4(),
            schema_version: REPORT_SCHEMA_VERSION,
            generated_at: Utc::now(),
            source_format: genome.format,
            snp_count: genome.called_count(),
            parse_stats: genome.stats.clone(),
            insights: outcome.insights,
            summary: outcome.summary,
        };
        tracing::info!(
            report_id = %report.id,
            insights = report.insights.len(),
            not_tested = report.summary.not_tested,
            "Built report"
        );
        report
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ReportError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, ReportError> {
        let report: Self = serde_json::from_slice(bytes)?;
        if report.schema_version != REPORT_SCHEMA_VERSION {
            return Err(ReportError::UnsupportedSchema(report.schema_version));
        }
        Ok(report)
    }

    /// Insights grouped for display, categories in catalog order.
    /// Categories without insights are left out.
    pub fn by_category(&self) -> Vec<(TraitCategory, Vec<&Insight>)> {
        TraitCategory::ALL
            .into_iter()
            .filter_map(|category| {
                let insights: Vec<&Insight> = self
                    .insights
                    .iter()
                    .filter(|insight| insight.category == category)
                    .collect();
                (!insights.is_empty()).then_some((category, insights))
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::genome::parse_genome;

    pub(crate) const SAMPLE_EXPORT: &str = "\
# This data file generated by 23andMe at: Thu Mar 14 2024
# rsid\tchromosome\tposition\tgenotype
rs4988235\t2\t136608646\tAG
rs762551\t15\t75041917\tAC
rs1815739\t11\t66328095\tCT
rs12913832\t15\t28365618\tGG
rs713598\t7\t141673345\tCG
rs4680\t22\t19963748\tAA
rs671\t12\t111803962\tGG
rs1801260\t4\t56301369\t--
rs3094315\t1\t752566\tAG
";

    pub(crate) fn sample_report() -> Report {
        Report::build(&parse_genome(SAMPLE_EXPORT).unwrap())
    }

    #[test]
    fn build_collects_insights_and_stats() {
        let report = sample_report();
        assert_eq!(report.schema_version, REPORT_SCHEMA_VERSION);
        assert_eq!(report.source_format, SourceFormat::TwentyThreeAndMe);
        assert_eq!(report.insights.len(), 7);
        assert_eq!(report.snp_count, 8);
        assert_eq!(report.summary.no_call, 1);
        assert_eq!(report.parse_stats.no_calls, 1);
    }

    #[test]
    fn json_round_trip() {
        let report = sample_report();
        let bytes = report.to_json_bytes().unwrap();
        let restored = Report::from_json_bytes(&bytes).unwrap();
        assert_eq!(restored, report);
    }

    #[test]
    fn unknown_schema_rejected() {
        let mut report = sample_report();
        report.schema_version = 99;
        let bytes = serde_json::to_vec(&report).unwrap();
        assert!(matches!(
            Report::from_json_bytes(&bytes),
            Err(ReportError::UnsupportedSchema(99))
        ));
    }

    #[test]
    fn garbage_json_rejected() {
        assert!(matches!(
            Report::from_json_bytes(b"{not json"),
            Err(ReportError::Json(_))
        ));
    }

    #[test]
    fn grouping_preserves_category_order() {
        let report = sample_report();
        let categories: Vec<_> = report.by_category().iter().map(|(c, _)| *c).collect();
        assert_eq!(
            categories,
            vec![
                TraitCategory::Nutrition,
                TraitCategory::Fitness,
                TraitCategory::Appearance,
                TraitCategory::Sensory,
                TraitCategory::Wellbeing,
            ]
        );
        let total: usize = report.by_category().iter().map(|(_, v)| v.len()).sum();
        assert_eq!(total, report.insights.len());
    }
}
