use serde::{Deserialize, Serialize};

use super::Report;
use crate::genome::SourceFormat;
use crate::traits::{Insight, TraitCategory};

/// Insights shown in full before purchase
pub const FREE_INSIGHT_COUNT: usize = 2;

/// A purchased-only insight, reduced to what the paywall may show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedInsight {
    pub trait_id: String,
    pub title: String,
    pub category: TraitCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: TraitCategory,
    pub count: usize,
}

/// Paywalled view of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPreview {
    pub source_format: SourceFormat,
    pub snp_count: usize,
    pub total_insights: usize,
    pub categories: Vec<CategoryCount>,
    pub free: Vec<Insight>,
    pub locked: Vec<LockedInsight>,
    pub not_tested: usize,
}

impl ReportPreview {
    pub fn from_report(report: &Report) -> Self {
        let categories = TraitCategory::ALL
            .iter()
            .map(|category| CategoryCount {
                category: *category,
                count: report
                    .insights
                    .iter()
                    .filter(|i| i.category == *category)
                    .count(),
            })
            .filter(|c| c.count > 0)
            .collect();

        let free = report
            .insights
            .iter()
            .take(FREE_INSIGHT_COUNT)
            .cloned()
            .collect();

        let locked = report
            .insights
            .iter()
            .skip(FREE_INSIGHT_COUNT)
            .map(|i| LockedInsight {
                trait_id: i.trait_id.clone(),
                title: i.title.clone(),
                category: i.category,
            })
            .collect();

        Self {
            source_format: report.source_format,
            snp_count: report.snp_count,
            total_insights: report.insights.len(),
            categories,
            free,
            locked,
            not_tested: report.summary.not_tested,
        }
    }
}
