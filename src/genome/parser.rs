use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::format::{detect_format, sniff_bytes, SourceFormat};
use super::genotype::Genotype;
use super::GenomeError;

/// `rs` ids from dbSNP, `i` ids are vendor-internal probes
static SNP_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:rs|i)\d+$").unwrap());

/// Line counters collected while scanning an export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub total_lines: usize,
    pub comment_lines: usize,
    pub header_lines: usize,
    pub parsed: usize,
    pub no_calls: usize,
    pub malformed: usize,
    pub duplicates: usize,
}

/// Normalized genotype map for one uploaded export
#[derive(Debug, Clone)]
pub struct ParsedGenome {
    pub format: SourceFormat,
    pub genotypes: HashMap<String, Genotype>,
    pub stats: ParseStats,
}

impl ParsedGenome {
    /// Case-insensitive lookup by SNP id
    pub fn genotype(&self, rsid: &str) -> Option<Genotype> {
        self.genotypes.get(&rsid.to_ascii_lowercase()).copied()
    }

    /// Number of positions with an actual call
    pub fn called_count(&self) -> usize {
        self.genotypes.values().filter(|g| g.is_called()).count()
    }
}

enum LineOutcome {
    Skipped,
    Header,
    Malformed,
    Call(String, Genotype),
}

/// Decode raw upload bytes and parse them.
pub fn parse_upload(bytes: &[u8]) -> Result<ParsedGenome, GenomeError> {
    let text = sniff_bytes(bytes)?;
    parse_genome(&text)
}

/// Parse a raw export in a single pass. Bad lines are counted and
/// skipped; the parse only fails when nothing usable is found.
pub fn parse_genome(text: &str) -> Result<ParsedGenome, GenomeError> {
    if text.trim().is_empty() {
        return Err(GenomeError::EmptyInput);
    }

    let format = detect_format(text);
    let mut genotypes: HashMap<String, Genotype> = HashMap::new();
    let mut stats = ParseStats::default();

    for line in text.lines() {
        stats.total_lines += 1;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') {
            stats.comment_lines += 1;
            continue;
        }

        match parse_line(line, format) {
            LineOutcome::Skipped => {}
            LineOutcome::Header => stats.header_lines += 1,
            LineOutcome::Malformed => stats.malformed += 1,
            LineOutcome::Call(id, genotype) => {
                if genotypes.contains_key(&id) {
                    stats.duplicates += 1;
                    continue;
                }
                if genotype.is_called() {
                    stats.parsed += 1;
                } else {
                    stats.no_calls += 1;
                }
                genotypes.insert(id, genotype);
            }
        }
    }

    if genotypes.is_empty() {
        return Err(GenomeError::NoGenotypes {
            malformed: stats.malformed,
        });
    }

    tracing::info!(
        format = format.as_str(),
        parsed = stats.parsed,
        no_calls = stats.no_calls,
        malformed = stats.malformed,
        duplicates = stats.duplicates,
        "Parsed genome export"
    );

    Ok(ParsedGenome {
        format,
        genotypes,
        stats,
    })
}

fn parse_line(line: &str, format: SourceFormat) -> LineOutcome {
    let fields = split_fields(line);
    let Some(first) = fields.first() else {
        return LineOutcome::Skipped;
    };

    if first.eq_ignore_ascii_case("rsid") {
        return LineOutcome::Header;
    }

    let id = first.to_ascii_lowercase();
    if !SNP_ID.is_match(&id) {
        return LineOutcome::Malformed;
    }

    let genotype = match fields.len() {
        n if n >= 5 => {
            if !valid_locus(fields[1], fields[2]) {
                return LineOutcome::Malformed;
            }
            if format.has_split_alleles() || (fields[3].len() <= 1 && fields[4].len() <= 1) {
                Genotype::from_pair(fields[3], fields[4])
            } else {
                Genotype::parse(fields[3])
            }
        }
        4 => {
            if !valid_locus(fields[1], fields[2]) {
                return LineOutcome::Malformed;
            }
            Genotype::parse(fields[3])
        }
        // `rsid,A,G` carries split alleles; `rsid,X,T` is a locus plus a call
        3 if fields[1].len() == 1 && fields[2].len() == 1 => {
            Genotype::from_pair(fields[1], fields[2]).or_else(|_| Genotype::parse(fields[2]))
        }
        2 | 3 => Genotype::parse(fields[fields.len() - 1]),
        _ => return LineOutcome::Malformed,
    };

    match genotype {
        Ok(genotype) => LineOutcome::Call(id, genotype),
        Err(_) => LineOutcome::Malformed,
    }
}

fn valid_locus(chromosome: &str, position: &str) -> bool {
    valid_chromosome(chromosome) && position.parse::<u64>().is_ok()
}

fn valid_chromosome(raw: &str) -> bool {
    let upper = raw.to_ascii_uppercase();
    let name = upper.strip_prefix("CHR").unwrap_or(&upper);
    match name {
        "X" | "Y" | "XY" | "MT" | "M" => true,
        other => matches!(other.parse::<u8>(), Ok(1..=26)),
    }
}

/// Split a line on tabs, else commas, else whitespace. Fields come
/// back trimmed with surrounding quotes removed.
pub(crate) fn split_fields(line: &str) -> Vec<&str> {
    fn clean(f: &str) -> &str {
        f.trim().trim_matches('"').trim()
    }

    if line.contains('\t') {
        line.split('\t').map(clean).collect()
    } else if line.contains(',') {
        line.split(',').map(clean).collect()
    } else {
        line.split_whitespace().map(clean).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWENTY_THREE: &str = "\
# This data file generated by 23andMe at: Thu Mar 14 2024
#
# rsid\tchromosome\tposition\tgenotype
rs4477212\t1\t82154\tAA
rs3094315\t1\t752566\tGA
rs4988235\t2\t136608646\tAG
i6019299\t1\t9012\tCC
rs12913832\t15\t28365618\t--
rs9939609\tMT\t16089\tT
";

    const ANCESTRY: &str = "\
#AncestryDNA raw data download
#Data was collected using AncestryDNA array version: V2.0
rsid\tchromosome\tposition\tallele1\tallele2
rs4477212\t1\t82154\tT\tT
rs3094315\t1\t752566\tA\tG
rs671\t12\t111803962\t0\t0
";

    #[test]
    fn parses_23andme_export() {
        let genome = parse_genome(TWENTY_THREE).unwrap();
        assert_eq!(genome.format, SourceFormat::TwentyThreeAndMe);
        assert_eq!(genome.stats.parsed, 5);
        assert_eq!(genome.stats.no_calls, 1);
        assert_eq!(genome.stats.comment_lines, 3);
        assert_eq!(genome.genotype("rs3094315").unwrap().as_string(), "AG");
        assert_eq!(genome.genotype("i6019299").unwrap().as_string(), "CC");
        assert_eq!(genome.genotype("rs12913832"), Some(Genotype::NoCall));
        assert!(genome.genotype("rs9939609").unwrap().is_hemizygous());
    }

    #[test]
    fn parses_ancestry_export() {
        let genome = parse_genome(ANCESTRY).unwrap();
        assert_eq!(genome.format, SourceFormat::AncestryDna);
        assert_eq!(genome.stats.header_lines, 1);
        assert_eq!(genome.stats.parsed, 2);
        assert_eq!(genome.stats.no_calls, 1);
        assert_eq!(genome.genotype("rs3094315").unwrap().as_string(), "AG");
        assert_eq!(genome.genotype("rs671"), Some(Genotype::NoCall));
    }

    #[test]
    fn crlf_and_case_insensitive_lookup() {
        let text = "RS4988235\t2\t136608646\tgg\r\nrs671\t12\t111803962\tGA\r\n";
        let genome = parse_genome(text).unwrap();
        assert_eq!(genome.genotype("rs4988235").unwrap().as_string(), "GG");
        assert_eq!(genome.genotype("RS671").unwrap().as_string(), "AG");
    }

    #[test]
    fn malformed_lines_are_counted_not_fatal() {
        let text = "\
rs1\t1\t100\tAG
not-a-snp\t1\t100\tAG
rs2\tchr99\t100\tAG
rs3\t1\tabc\tAG
rs4\t1\t100\tAXG
rs5\t1\t100\tCT
";
        let genome = parse_genome(text).unwrap();
        assert_eq!(genome.stats.parsed, 2);
        assert_eq!(genome.stats.malformed, 4);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let text = "rs1\t1\t100\tAG\nrs1\t1\t100\tTT\n";
        let genome = parse_genome(text).unwrap();
        assert_eq!(genome.genotype("rs1").unwrap().as_string(), "AG");
        assert_eq!(genome.stats.duplicates, 1);
    }

    #[test]
    fn comma_and_space_separated_lines() {
        let csv = "\"rs1\",\"1\",\"100\",\"AG\"\nrs2,X,200,T\n";
        let genome = parse_genome(csv).unwrap();
        assert_eq!(genome.genotype("rs1").unwrap().as_string(), "AG");
        assert_eq!(genome.genotype("rs2").unwrap().as_string(), "T");

        let spaced = "rs1   1   100   CT\n";
        let genome = parse_genome(spaced).unwrap();
        assert_eq!(genome.genotype("rs1").unwrap().as_string(), "CT");
    }

    #[test]
    fn minimal_generic_lines() {
        let genome = parse_genome("rs10,AG\nrs11 TT\n").unwrap();
        assert_eq!(genome.format, SourceFormat::Generic);
        assert_eq!(genome.stats.parsed, 2);
    }

    #[test]
    fn three_field_lines_with_split_alleles() {
        let genome = parse_genome("rs4988235,A,G\nrs671,X,T\nrs12,G,-\n").unwrap();
        assert_eq!(genome.genotype("rs4988235").unwrap().as_string(), "AG");
        assert_eq!(genome.genotype("rs671").unwrap().as_string(), "T");
        assert!(!genome.genotype("rs12").unwrap().is_called());
        assert_eq!(genome.stats.malformed, 0);
    }

    #[test]
    fn empty_input_rejected() {
        assert!(matches!(parse_genome("   \n"), Err(GenomeError::EmptyInput)));
    }

    #[test]
    fn no_usable_lines_rejected() {
        let result = parse_genome("# only comments\nhello world\n");
        assert!(matches!(
            result,
            Err(GenomeError::NoGenotypes { malformed: 1 })
        ));
    }

    #[test]
    fn parse_upload_handles_raw_bytes() {
        let genome = parse_upload(TWENTY_THREE.as_bytes()).unwrap();
        assert_eq!(genome.called_count(), 5);
    }

    #[test]
    fn chromosome_validation() {
        for ok in ["1", "22", "X", "Y", "XY", "MT", "chr7", "25"] {
            assert!(valid_chromosome(ok), "{ok}");
        }
        for bad in ["0", "27", "Z", "", "chr"] {
            assert!(!valid_chromosome(bad), "{bad}");
        }
    }
}
