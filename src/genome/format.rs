use std::io::Read;

use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};

use super::parser::split_fields;
use super::GenomeError;

/// Largest accepted upload, measured after decompression.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024; // 64MB

/// Lines scanned for a provider banner before giving up on comments.
const BANNER_SCAN_LINES: usize = 64;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Vendor layout of a raw genotype export
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// `rsid chromosome position genotype`
    TwentyThreeAndMe,
    /// `rsid chromosome position allele1 allele2`
    AncestryDna,
    /// Unrecognized vendor, parsed best-effort
    Generic,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TwentyThreeAndMe => "23andme",
            Self::AncestryDna => "ancestrydna",
            Self::Generic => "generic",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::TwentyThreeAndMe => "23andMe",
            Self::AncestryDna => "AncestryDNA",
            Self::Generic => "Unknown provider",
        }
    }

    /// Whether alleles arrive split across two columns
    pub fn has_split_alleles(&self) -> bool {
        matches!(self, Self::AncestryDna)
    }
}

impl std::str::FromStr for SourceFormat {
    type Err = GenomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "23andme" => Ok(Self::TwentyThreeAndMe),
            "ancestrydna" => Ok(Self::AncestryDna),
            "generic" => Ok(Self::Generic),
            other => Err(GenomeError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Identify the vendor layout from the banner, the column header, or
/// the shape of the first data line, in that order.
pub fn detect_format(text: &str) -> SourceFormat {
    let mut first_data_line = None;

    for line in text.lines().take(BANNER_SCAN_LINES) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            let lower = comment.to_ascii_lowercase();
            if lower.contains("23andme") {
                return SourceFormat::TwentyThreeAndMe;
            }
            if lower.contains("ancestrydna") {
                return SourceFormat::AncestryDna;
            }
            // 23andMe puts its column header inside a comment
            if let Some(format) = format_from_header(comment) {
                return format;
            }
            continue;
        }
        first_data_line = Some(line);
        break;
    }

    let Some(line) = first_data_line else {
        return SourceFormat::Generic;
    };

    if let Some(format) = format_from_header(line) {
        return format;
    }

    match split_fields(line).len() {
        5 => SourceFormat::AncestryDna,
        4 => SourceFormat::TwentyThreeAndMe,
        _ => SourceFormat::Generic,
    }
}

fn format_from_header(line: &str) -> Option<SourceFormat> {
    let fields: Vec<String> = split_fields(line)
        .iter()
        .map(|f| f.to_ascii_lowercase())
        .collect();
    if fields.first().map(String::as_str) != Some("rsid") {
        return None;
    }
    if fields.iter().any(|f| f == "allele1") {
        Some(SourceFormat::AncestryDna)
    } else if fields.iter().any(|f| f == "genotype") {
        Some(SourceFormat::TwentyThreeAndMe)
    } else {
        None
    }
}

/// Turn raw upload bytes into text: inflate gzip, strip a BOM, and
/// reject anything that is not plain UTF-8 text.
pub fn sniff_bytes(bytes: &[u8]) -> Result<String, GenomeError> {
    let raw = if bytes.starts_with(&GZIP_MAGIC) {
        inflate(bytes)?
    } else {
        check_size(bytes.len())?;
        bytes.to_vec()
    };

    let body = raw.strip_prefix(&UTF8_BOM).unwrap_or(&raw);

    if body.contains(&0u8) {
        return Err(GenomeError::UnsupportedFormat(
            "binary data (NUL bytes)".into(),
        ));
    }

    let text = std::str::from_utf8(body)
        .map_err(|_| GenomeError::UnsupportedFormat("not UTF-8 text".into()))?;

    if text.trim().is_empty() {
        return Err(GenomeError::EmptyInput);
    }

    Ok(text.to_string())
}

fn inflate(bytes: &[u8]) -> Result<Vec<u8>, GenomeError> {
    let mut out = Vec::new();
    // Read one byte past the limit so oversized archives are detected
    // without inflating them completely.
    MultiGzDecoder::new(bytes)
        .take(MAX_UPLOAD_BYTES as u64 + 1)
        .read_to_end(&mut out)?;
    check_size(out.len())?;
    tracing::debug!(
        compressed = bytes.len(),
        inflated = out.len(),
        "Inflated gzip upload"
    );
    Ok(out)
}

fn check_size(len: usize) -> Result<(), GenomeError> {
    if len > MAX_UPLOAD_BYTES {
        return Err(GenomeError::TooLarge {
            size_mb: len as f64 / (1024.0 * 1024.0),
            max_mb: (MAX_UPLOAD_BYTES / (1024 * 1024)) as u64,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn detects_23andme_banner() {
        let text = "# This data file generated by 23andMe at: Mon Jan 01 2024\n\
                    # rsid\tchromosome\tposition\tgenotype\n\
                    rs4477212\t1\t82154\tAA\n";
        assert_eq!(detect_format(text), SourceFormat::TwentyThreeAndMe);
    }

    #[test]
    fn detects_ancestry_banner() {
        let text = "#AncestryDNA raw data download\n\
                    rsid\tchromosome\tposition\tallele1\tallele2\n\
                    rs4477212\t1\t82154\tT\tT\n";
        assert_eq!(detect_format(text), SourceFormat::AncestryDna);
    }

    #[test]
    fn detects_ancestry_from_header_without_banner() {
        let text = "rsid\tchromosome\tposition\tallele1\tallele2\nrs1\t1\t5\tA\tG\n";
        assert_eq!(detect_format(text), SourceFormat::AncestryDna);
    }

    #[test]
    fn detects_23andme_from_commented_header() {
        let text = "# rsid\tchromosome\tposition\tgenotype\nrs1\t1\t5\tAG\n";
        assert_eq!(detect_format(text), SourceFormat::TwentyThreeAndMe);
    }

    #[test]
    fn falls_back_to_column_count() {
        assert_eq!(
            detect_format("rs1\t1\t5\tAG\n"),
            SourceFormat::TwentyThreeAndMe
        );
        assert_eq!(
            detect_format("rs1\t1\t5\tA\tG\n"),
            SourceFormat::AncestryDna
        );
        assert_eq!(detect_format("rs1,AG\n"), SourceFormat::Generic);
    }

    #[test]
    fn comment_only_input_is_generic() {
        assert_eq!(detect_format("# nothing here\n"), SourceFormat::Generic);
    }

    #[test]
    fn sniff_strips_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"rs1\t1\t5\tAG\n");
        let text = sniff_bytes(&bytes).unwrap();
        assert!(text.starts_with("rs1"));
    }

    #[test]
    fn sniff_inflates_gzip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"rs1\t1\t5\tAG\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let text = sniff_bytes(&compressed).unwrap();
        assert_eq!(text, "rs1\t1\t5\tAG\n");
    }

    #[test]
    fn sniff_inflates_every_gzip_member() {
        let mut concatenated = Vec::new();
        for line in [b"rs1\t1\t5\tAG\n".as_slice(), b"rs2\t1\t9\tCT\n".as_slice()] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(line).unwrap();
            concatenated.extend(encoder.finish().unwrap());
        }

        let text = sniff_bytes(&concatenated).unwrap();
        assert_eq!(text, "rs1\t1\t5\tAG\nrs2\t1\t9\tCT\n");
    }

    #[test]
    fn sniff_rejects_oversized_raw() {
        let bytes = vec![b'\n'; MAX_UPLOAD_BYTES + 1];
        assert!(matches!(
            sniff_bytes(&bytes),
            Err(GenomeError::TooLarge { max_mb: 64, .. })
        ));
    }

    #[test]
    fn sniff_rejects_gzip_that_inflates_past_limit() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        let chunk = vec![b'\n'; 1024 * 1024];
        for _ in 0..65 {
            encoder.write_all(&chunk).unwrap();
        }
        let compressed = encoder.finish().unwrap();
        assert!(compressed.len() < MAX_UPLOAD_BYTES);

        assert!(matches!(
            sniff_bytes(&compressed),
            Err(GenomeError::TooLarge { max_mb: 64, .. })
        ));
    }

    #[test]
    fn sniff_rejects_binary() {
        let result = sniff_bytes(&[0x25, 0x50, 0x44, 0x46, 0x00, 0x01]);
        assert!(matches!(result, Err(GenomeError::UnsupportedFormat(_))));
    }

    #[test]
    fn sniff_rejects_invalid_utf8() {
        let result = sniff_bytes(&[0xFF, 0xFE, 0x41]);
        assert!(matches!(result, Err(GenomeError::UnsupportedFormat(_))));
    }

    #[test]
    fn sniff_rejects_whitespace_only() {
        assert!(matches!(
            sniff_bytes(b"  \n\t\n"),
            Err(GenomeError::EmptyInput)
        ));
    }

    #[test]
    fn sniff_rejects_truncated_gzip() {
        let result = sniff_bytes(&[0x1F, 0x8B, 0x08]);
        assert!(matches!(result, Err(GenomeError::Decompression(_))));
    }

    #[test]
    fn source_format_round_trips_through_str() {
        for format in [
            SourceFormat::TwentyThreeAndMe,
            SourceFormat::AncestryDna,
            SourceFormat::Generic,
        ] {
            assert_eq!(format.as_str().parse::<SourceFormat>().unwrap(), format);
        }
    }
}
