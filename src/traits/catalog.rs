//! Curated trait table.
//!
//! Genotypes are written on the plus strand with alleles sorted, the same
//! canonical form `Genotype::as_string` produces. Content is informational
//! and deliberately avoids disease-risk markers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitCategory {
    Nutrition,
    Fitness,
    Appearance,
    Sensory,
    Sleep,
    Wellbeing,
}

impl TraitCategory {
    pub const ALL: [TraitCategory; 6] = [
        Self::Nutrition,
        Self::Fitness,
        Self::Appearance,
        Self::Sensory,
        Self::Sleep,
        Self::Wellbeing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nutrition => "nutrition",
            Self::Fitness => "fitness",
            Self::Appearance => "appearance",
            Self::Sensory => "sensory",
            Self::Sleep => "sleep",
            Self::Wellbeing => "wellbeing",
        }
    }
}

/// How an outcome compares with the most common result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Typical,
    Notable,
    Elevated,
    Reduced,
}

#[derive(Debug)]
pub struct Outcome {
    pub genotype: &'static str,
    pub headline: &'static str,
    pub detail: &'static str,
    pub effect: Effect,
}

#[derive(Debug)]
pub struct TraitDefinition {
    pub id: &'static str,
    pub rsid: &'static str,
    pub gene: &'static str,
    pub title: &'static str,
    pub category: TraitCategory,
    pub outcomes: &'static [Outcome],
}

impl TraitDefinition {
    /// Outcome for a canonical genotype string
    pub fn outcome_for(&self, genotype: &str) -> Option<&'static Outcome> {
        self.outcomes.iter().find(|o| o.genotype == genotype)
    }
}

static CATALOG: &[TraitDefinition] = &[
    TraitDefinition {
        id: "lactose_tolerance",
        rsid: "rs4988235",
        gene: "MCM6",
        title: "Lactose tolerance",
        category: TraitCategory::Nutrition,
        outcomes: &[
            Outcome {
                genotype: "AA",
                headline: "Likely lactose tolerant",
                detail: "Two copies of the lactase-persistence variant. Most people with this result keep digesting milk sugar into adulthood.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "AG",
                headline: "Likely lactose tolerant",
                detail: "One lactase-persistence copy is usually enough to keep producing lactase as an adult.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "GG",
                headline: "Likely lactose intolerant",
                detail: "No lactase-persistence copy. Lactase production often declines after childhood, so large servings of dairy may cause discomfort.",
                effect: Effect::Reduced,
            },
        ],
    },
    TraitDefinition {
        id: "caffeine_metabolism",
        rsid: "rs762551",
        gene: "CYP1A2",
        title: "Caffeine metabolism",
        category: TraitCategory::Nutrition,
        outcomes: &[
            Outcome {
                genotype: "AA",
                headline: "Fast caffeine metabolizer",
                detail: "CYP1A2 clears caffeine quickly for you; an afternoon coffee is less likely to linger.",
                effect: Effect::Elevated,
            },
            Outcome {
                genotype: "AC",
                headline: "Slower caffeine metabolizer",
                detail: "One slow copy of CYP1A2. Caffeine may stay in your system longer than average.",
                effect: Effect::Reduced,
            },
            Outcome {
                genotype: "CC",
                headline: "Slow caffeine metabolizer",
                detail: "Two slow copies of CYP1A2. Late-day caffeine is more likely to affect your sleep.",
                effect: Effect::Reduced,
            },
        ],
    },
    TraitDefinition {
        id: "muscle_composition",
        rsid: "rs1815739",
        gene: "ACTN3",
        title: "Muscle fiber type",
        category: TraitCategory::Fitness,
        outcomes: &[
            Outcome {
                genotype: "CC",
                headline: "Power-oriented muscle profile",
                detail: "Both copies produce alpha-actinin-3, a protein found in fast-twitch fibers. Common among sprint and power athletes.",
                effect: Effect::Elevated,
            },
            Outcome {
                genotype: "CT",
                headline: "Mixed muscle profile",
                detail: "One working copy of ACTN3. Most people with this result respond well to both power and endurance training.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "TT",
                headline: "Endurance-oriented muscle profile",
                detail: "Neither copy produces alpha-actinin-3. This is more common among endurance athletes.",
                effect: Effect::Notable,
            },
        ],
    },
    TraitDefinition {
        id: "endurance_response",
        rsid: "rs8192678",
        gene: "PPARGC1A",
        title: "Endurance training response",
        category: TraitCategory::Fitness,
        outcomes: &[
            Outcome {
                genotype: "CC",
                headline: "Typical endurance response",
                detail: "The common PGC-1alpha variant, linked to a standard aerobic adaptation to training.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "CT",
                headline: "Slightly reduced endurance response",
                detail: "One copy of the Ser482 variant, associated with somewhat smaller aerobic gains from the same training.",
                effect: Effect::Reduced,
            },
            Outcome {
                genotype: "TT",
                headline: "Reduced endurance response",
                detail: "Two copies of the Ser482 variant. Consistency and volume matter more for your aerobic progress.",
                effect: Effect::Reduced,
            },
        ],
    },
    TraitDefinition {
        id: "appetite_fto",
        rsid: "rs9939609",
        gene: "FTO",
        title: "Appetite regulation",
        category: TraitCategory::Nutrition,
        outcomes: &[
            Outcome {
                genotype: "TT",
                headline: "Typical appetite signaling",
                detail: "No copies of the FTO variant associated with increased appetite.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "AT",
                headline: "Slightly increased appetite tendency",
                detail: "One copy of the FTO A variant. Carriers report feeling full a little later on average.",
                effect: Effect::Elevated,
            },
            Outcome {
                genotype: "AA",
                headline: "Increased appetite tendency",
                detail: "Two copies of the FTO A variant. Regular activity is known to offset most of this effect.",
                effect: Effect::Elevated,
            },
        ],
    },
    TraitDefinition {
        id: "eye_color",
        rsid: "rs12913832",
        gene: "HERC2",
        title: "Eye color",
        category: TraitCategory::Appearance,
        outcomes: &[
            Outcome {
                genotype: "AA",
                headline: "Likely brown eyes",
                detail: "Two copies of the variant that keeps OCA2 active, the most common result worldwide.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "AG",
                headline: "Likely brown or hazel eyes",
                detail: "One copy of each variant. Brown, hazel and green are all common with this result.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "GG",
                headline: "Likely blue eyes",
                detail: "Two copies of the variant that dials down OCA2 in the iris. Most people with this result have blue or light eyes.",
                effect: Effect::Notable,
            },
        ],
    },
    TraitDefinition {
        id: "red_hair",
        rsid: "rs1805007",
        gene: "MC1R",
        title: "Red hair variant",
        category: TraitCategory::Appearance,
        outcomes: &[
            Outcome {
                genotype: "CC",
                headline: "No red hair variant",
                detail: "You do not carry the R151C variant of MC1R.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "CT",
                headline: "Red hair variant carrier",
                detail: "One copy of R151C. Carriers often have fair skin or reddish tints and can pass the variant on.",
                effect: Effect::Notable,
            },
            Outcome {
                genotype: "TT",
                headline: "Two red hair variants",
                detail: "Two copies of R151C. Red hair and very fair skin are likely.",
                effect: Effect::Elevated,
            },
        ],
    },
    TraitDefinition {
        id: "freckling",
        rsid: "rs12203592",
        gene: "IRF4",
        title: "Freckling",
        category: TraitCategory::Appearance,
        outcomes: &[
            Outcome {
                genotype: "CC",
                headline: "Typical freckling",
                detail: "The common IRF4 variant; freckling depends mostly on other genes and sun exposure.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "CT",
                headline: "More likely to freckle",
                detail: "One copy of the IRF4 T variant, associated with freckles and sun sensitivity.",
                effect: Effect::Elevated,
            },
            Outcome {
                genotype: "TT",
                headline: "Much more likely to freckle",
                detail: "Two copies of the IRF4 T variant. Freckles and light hair are common with this result.",
                effect: Effect::Elevated,
            },
        ],
    },
    TraitDefinition {
        id: "earwax_type",
        rsid: "rs17822931",
        gene: "ABCC11",
        title: "Earwax type",
        category: TraitCategory::Appearance,
        outcomes: &[
            Outcome {
                genotype: "CC",
                headline: "Wet earwax",
                detail: "Two working copies of ABCC11, the most common result outside East Asia.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "CT",
                headline: "Wet earwax",
                detail: "One working copy of ABCC11 is enough for the wet type.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "TT",
                headline: "Dry earwax",
                detail: "Both copies carry the variant that switches off ABCC11. This also tends to mean less underarm odor.",
                effect: Effect::Notable,
            },
        ],
    },
    TraitDefinition {
        id: "bitter_taste",
        rsid: "rs713598",
        gene: "TAS2R38",
        title: "Bitter taste perception",
        category: TraitCategory::Sensory,
        outcomes: &[
            Outcome {
                genotype: "GG",
                headline: "Strong bitter taster",
                detail: "Two taster copies of TAS2R38. Raw broccoli, kale and tonic water may taste noticeably bitter.",
                effect: Effect::Elevated,
            },
            Outcome {
                genotype: "CG",
                headline: "Bitter taster",
                detail: "One taster copy of TAS2R38. You likely notice bitterness in some greens.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "CC",
                headline: "Bitter non-taster",
                detail: "No taster copies of TAS2R38. Bitter vegetables may taste mild to you.",
                effect: Effect::Reduced,
            },
        ],
    },
    TraitDefinition {
        id: "cilantro_aversion",
        rsid: "rs72921001",
        gene: "OR6A2",
        title: "Cilantro taste",
        category: TraitCategory::Sensory,
        outcomes: &[
            Outcome {
                genotype: "AA",
                headline: "Cilantro may taste soapy",
                detail: "Two copies of the OR6A2 variant linked to sensing the aldehydes that make cilantro taste like soap.",
                effect: Effect::Elevated,
            },
            Outcome {
                genotype: "AC",
                headline: "Cilantro may taste slightly soapy",
                detail: "One copy of the OR6A2 variant associated with cilantro aversion.",
                effect: Effect::Notable,
            },
            Outcome {
                genotype: "CC",
                headline: "Cilantro likely tastes fresh",
                detail: "No copies of the OR6A2 aversion variant.",
                effect: Effect::Typical,
            },
        ],
    },
    TraitDefinition {
        id: "asparagus_odor",
        rsid: "rs4481887",
        gene: "OR2M7",
        title: "Asparagus odor detection",
        category: TraitCategory::Sensory,
        outcomes: &[
            Outcome {
                genotype: "AA",
                headline: "Likely to smell asparagus metabolites",
                detail: "Two copies of the variant associated with detecting the sulfur compounds asparagus produces.",
                effect: Effect::Elevated,
            },
            Outcome {
                genotype: "AG",
                headline: "May smell asparagus metabolites",
                detail: "One copy of the detection variant.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "GG",
                headline: "Less likely to smell asparagus metabolites",
                detail: "No copies of the detection variant. Many people with this result never notice the smell.",
                effect: Effect::Reduced,
            },
        ],
    },
    TraitDefinition {
        id: "photic_sneeze",
        rsid: "rs10427255",
        gene: "ZEB2",
        title: "Photic sneeze reflex",
        category: TraitCategory::Sensory,
        outcomes: &[
            Outcome {
                genotype: "CC",
                headline: "More likely to sneeze in bright light",
                detail: "Two copies of the variant associated with sneezing when stepping into sunlight.",
                effect: Effect::Elevated,
            },
            Outcome {
                genotype: "CT",
                headline: "Somewhat likely to sneeze in bright light",
                detail: "One copy of the photic sneeze variant.",
                effect: Effect::Notable,
            },
            Outcome {
                genotype: "TT",
                headline: "Less likely to sneeze in bright light",
                detail: "No copies of the photic sneeze variant.",
                effect: Effect::Typical,
            },
        ],
    },
    TraitDefinition {
        id: "chronotype",
        rsid: "rs1801260",
        gene: "CLOCK",
        title: "Chronotype",
        category: TraitCategory::Sleep,
        outcomes: &[
            Outcome {
                genotype: "AA",
                headline: "Morning-leaning",
                detail: "The common CLOCK variant, associated with an earlier natural wake time.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "AG",
                headline: "Slightly evening-leaning",
                detail: "One copy of the CLOCK 3111C variant, linked to a modest preference for later hours.",
                effect: Effect::Notable,
            },
            Outcome {
                genotype: "GG",
                headline: "Evening-leaning",
                detail: "Two copies of the CLOCK 3111C variant. A later bedtime and wake time may feel natural.",
                effect: Effect::Notable,
            },
        ],
    },
    TraitDefinition {
        id: "deep_sleep",
        rsid: "rs73598374",
        gene: "ADA",
        title: "Deep sleep",
        category: TraitCategory::Sleep,
        outcomes: &[
            Outcome {
                genotype: "CC",
                headline: "Typical deep sleep",
                detail: "The common ADA variant.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "CT",
                headline: "More deep sleep",
                detail: "One copy of the ADA variant associated with more slow-wave sleep and stronger sleepiness after staying up late.",
                effect: Effect::Elevated,
            },
            Outcome {
                genotype: "TT",
                headline: "Much more deep sleep",
                detail: "Two copies of the ADA variant associated with more slow-wave sleep.",
                effect: Effect::Elevated,
            },
        ],
    },
    TraitDefinition {
        id: "stress_response",
        rsid: "rs4680",
        gene: "COMT",
        title: "Stress response",
        category: TraitCategory::Wellbeing,
        outcomes: &[
            Outcome {
                genotype: "AA",
                headline: "Higher baseline dopamine",
                detail: "Two Met copies of COMT clear dopamine slowly. Often linked to strong focus and higher stress sensitivity.",
                effect: Effect::Elevated,
            },
            Outcome {
                genotype: "AG",
                headline: "Balanced dopamine clearance",
                detail: "One Val and one Met copy of COMT, the most common result.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "GG",
                headline: "Lower baseline dopamine",
                detail: "Two Val copies clear dopamine quickly. Often linked to resilience under pressure.",
                effect: Effect::Reduced,
            },
        ],
    },
    TraitDefinition {
        id: "alcohol_flush",
        rsid: "rs671",
        gene: "ALDH2",
        title: "Alcohol flush",
        category: TraitCategory::Wellbeing,
        outcomes: &[
            Outcome {
                genotype: "GG",
                headline: "No alcohol flush variant",
                detail: "Both copies of ALDH2 break down acetaldehyde normally.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "AG",
                headline: "Likely alcohol flush",
                detail: "One copy of ALDH2*2. Acetaldehyde builds up after drinking, causing redness and a fast heartbeat.",
                effect: Effect::Elevated,
            },
            Outcome {
                genotype: "AA",
                headline: "Strong alcohol flush",
                detail: "Two copies of ALDH2*2. Even small amounts of alcohol are likely to cause a strong reaction.",
                effect: Effect::Elevated,
            },
        ],
    },
    TraitDefinition {
        id: "vitamin_d",
        rsid: "rs2282679",
        gene: "GC",
        title: "Vitamin D levels",
        category: TraitCategory::Wellbeing,
        outcomes: &[
            Outcome {
                genotype: "AA",
                headline: "Typical vitamin D levels",
                detail: "The common variant of the vitamin D binding protein gene.",
                effect: Effect::Typical,
            },
            Outcome {
                genotype: "AC",
                headline: "Slightly lower vitamin D levels",
                detail: "One copy of the GC variant associated with lower circulating vitamin D.",
                effect: Effect::Reduced,
            },
            Outcome {
                genotype: "CC",
                headline: "Lower vitamin D levels",
                detail: "Two copies of the GC variant. Blood levels tend to run lower for the same sun exposure.",
                effect: Effect::Reduced,
            },
        ],
    },
];

/// Every trait the report evaluates, in display order
pub fn catalog() -> &'static [TraitDefinition] {
    CATALOG
}

pub fn find_by_rsid(rsid: &str) -> Option<&'static TraitDefinition> {
    CATALOG.iter().find(|t| t.rsid.eq_ignore_ascii_case(rsid))
}

pub fn find_by_id(id: &str) -> Option<&'static TraitDefinition> {
    CATALOG.iter().find(|t| t.id == id)
}

/// SNP ids an upload must contain for a complete report
pub fn required_rsids() -> Vec<&'static str> {
    CATALOG.iter().map(|t| t.rsid).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::genome::Genotype;

    #[test]
    fn ids_and_rsids_unique() {
        let ids: HashSet<_> = catalog().iter().map(|t| t.id).collect();
        let rsids: HashSet<_> = catalog().iter().map(|t| t.rsid).collect();
        assert_eq!(ids.len(), catalog().len());
        assert_eq!(rsids.len(), catalog().len());
    }

    #[test]
    fn rsids_are_lowercase_dbsnp_ids() {
        for t in catalog() {
            let digits = t.rsid.strip_prefix("rs").expect(t.rsid);
            assert!(!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()), "{}", t.rsid);
        }
    }

    #[test]
    fn outcome_genotypes_are_canonical() {
        for t in catalog() {
            for o in t.outcomes {
                let parsed = Genotype::parse(o.genotype).unwrap();
                assert_eq!(parsed.as_string(), o.genotype, "{} {}", t.id, o.genotype);
            }
        }
    }

    #[test]
    fn no_genotype_mapped_twice() {
        for t in catalog() {
            let genotypes: HashSet<_> = t.outcomes.iter().map(|o| o.genotype).collect();
            assert_eq!(genotypes.len(), t.outcomes.len(), "{}", t.id);
        }
    }

    #[test]
    fn every_category_is_represented() {
        for category in TraitCategory::ALL {
            assert!(
                catalog().iter().any(|t| t.category == category),
                "{}",
                category.as_str()
            );
        }
    }

    #[test]
    fn lookups() {
        assert_eq!(find_by_rsid("RS671").unwrap().id, "alcohol_flush");
        assert_eq!(find_by_id("eye_color").unwrap().gene, "HERC2");
        assert!(find_by_rsid("rs1").is_none());
        assert_eq!(required_rsids().len(), catalog().len());
    }

    #[test]
    fn outcome_for_requires_canonical_form() {
        let lactose = find_by_id("lactose_tolerance").unwrap();
        assert!(lactose.outcome_for("AG").is_some());
        assert!(lactose.outcome_for("GA").is_none());
    }
}
