use serde::{Deserialize, Serialize};

use super::catalog::{catalog, Effect, TraitCategory, TraitDefinition};
use crate::genome::{Genotype, ParsedGenome};

/// One interpreted trait in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub trait_id: String,
    pub rsid: String,
    pub gene: String,
    pub title: String,
    pub category: TraitCategory,
    pub genotype: Genotype,
    pub headline: String,
    pub detail: String,
    pub effect: Effect,
    /// Matched only after reading the opposite strand
    pub strand_flipped: bool,
}

/// A called genotype the catalog has no interpretation for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unrecognized {
    pub trait_id: String,
    pub genotype: Genotype,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub evaluated: usize,
    pub matched: usize,
    pub not_tested: usize,
    pub no_call: usize,
    pub unrecognized: Vec<Unrecognized>,
}

#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub insights: Vec<Insight>,
    pub summary: MatchSummary,
}

/// Evaluate every catalog trait against an uploaded genome.
pub fn match_traits(genome: &ParsedGenome) -> MatchOutcome {
    match_against(genome, catalog())
}

fn match_against(genome: &ParsedGenome, definitions: &[TraitDefinition]) -> MatchOutcome {
    let mut insights = Vec::new();
    let mut summary = MatchSummary {
        evaluated: definitions.len(),
        ..MatchSummary::default()
    };

    for definition in definitions {
        let Some(genotype) = genome.genotype(definition.rsid) else {
            summary.not_tested += 1;
            continue;
        };
        if !genotype.is_called() {
            summary.no_call += 1;
            continue;
        }

        match interpret(definition, genotype) {
            Some(insight) => {
                summary.matched += 1;
                insights.push(insight);
            }
            None => {
                tracing::debug!(trait_id = definition.id, "Genotype has no interpretation");
                summary.unrecognized.push(Unrecognized {
                    trait_id: definition.id.to_string(),
                    genotype,
                });
            }
        }
    }

    MatchOutcome { insights, summary }
}

/// Exact match first, then the opposite strand.
fn interpret(definition: &TraitDefinition, genotype: Genotype) -> Option<Insight> {
    let (outcome, flipped) = match definition.outcome_for(&genotype.as_string()) {
        Some(outcome) => (outcome, false),
        None => (definition.outcome_for(&genotype.complement().as_string())?, true),
    };

    Some(Insight {
        trait_id: definition.id.to_string(),
        rsid: definition.rsid.to_string(),
        gene: definition.gene.to_string(),
        title: definition.title.to_string(),
        category: definition.category,
        genotype,
        headline: outcome.headline.to_string(),
        detail: outcome.detail.to_string(),
        effect: outcome.effect,
        strand_flipped: flipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::parse_genome;

    fn genome(lines: &str) -> ParsedGenome {
        parse_genome(lines).unwrap()
    }

    #[test]
    fn exact_match_produces_insight() {
        let g = genome("rs4988235\t2\t136608646\tGG\n");
        let outcome = match_traits(&g);
        assert_eq!(outcome.insights.len(), 1);
        let insight = &outcome.insights[0];
        assert_eq!(insight.trait_id, "lactose_tolerance");
        assert_eq!(insight.headline, "Likely lactose intolerant");
        assert!(!insight.strand_flipped);
        assert_eq!(outcome.summary.matched, 1);
    }

    #[test]
    fn unordered_alleles_still_match() {
        let g = genome("rs671\t12\t111803962\tGA\n");
        let outcome = match_traits(&g);
        assert_eq!(outcome.insights[0].headline, "Likely alcohol flush");
    }

    #[test]
    fn opposite_strand_matches_with_flag() {
        // TT on the minus strand is AA on the plus strand
        let g = genome("rs12913832\t15\t28365618\tTT\n");
        let outcome = match_traits(&g);
        let insight = &outcome.insights[0];
        assert_eq!(insight.headline, "Likely brown eyes");
        assert!(insight.strand_flipped);
        assert_eq!(insight.genotype.as_string(), "TT");
    }

    #[test]
    fn missing_and_no_call_are_counted() {
        let g = genome("rs4988235\t2\t136608646\t--\nrs1\t1\t1\tAA\n");
        let outcome = match_traits(&g);
        assert!(outcome.insights.is_empty());
        assert_eq!(outcome.summary.no_call, 1);
        assert_eq!(outcome.summary.not_tested, catalog().len() - 1);
        assert_eq!(outcome.summary.evaluated, catalog().len());
    }

    #[test]
    fn uninterpretable_genotype_recorded() {
        // Hemizygous call at an autosomal trait has no entry on either strand
        let g = genome("rs4680\t22\t19963748\tA\n");
        let outcome = match_traits(&g);
        assert!(outcome.insights.is_empty());
        assert_eq!(
            outcome.summary.unrecognized,
            vec![Unrecognized {
                trait_id: "stress_response".into(),
                genotype: Genotype::parse("A").unwrap(),
            }]
        );
    }

    #[test]
    fn insights_follow_catalog_order() {
        let g = genome(
            "rs4680\t22\t19963748\tAG\nrs4988235\t2\t136608646\tAA\nrs671\t12\t111803962\tGG\n",
        );
        let ids: Vec<_> = match_traits(&g)
            .insights
            .iter()
            .map(|i| i.trait_id.clone())
            .collect();
        assert_eq!(ids, vec!["lactose_tolerance", "stress_response", "alcohol_flush"]);
    }
}
