//! Preferred-codon selection from a codon usage frequency table.

use crate::codon_to_aa;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tcr_types::Advisory;

lazy_static! {
    /// Kazusa tables annotate each frequency with a raw count in
    /// parentheses; the annotation is noise here.
    static ref PARENTHETICAL: Regex = Regex::new(r"\(.*?\)").unwrap();
}

/// The number of standard amino acids a usable table should cover.
const FULL_ALPHABET: usize = 20;

/// Errors raised while building a [`CodonTable`].
#[derive(Debug, thiserror::Error)]
pub enum CodonUsageError {
    /// The codon usage file could not be opened or read.
    #[error("Could not read the codon usage file {path:?}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// A line did not reduce to whitespace-separated codon/count pairs.
    #[error(
        "Unexpected format in the codon usage table at line {line_num}: '{line}'. \
         Expected whitespace-separated 'codon count' pairs"
    )]
    MalformedCodonTable {
        /// 1-based line number.
        line_num: usize,
        /// The offending line, after annotation stripping.
        line: String,
    },
}

/// One preferred (most frequently used) codon per amino acid, for
/// back-translating non-templated junction residues.
#[derive(Debug, Clone, Default)]
pub struct CodonTable {
    preferred: HashMap<u8, [u8; 3]>,
}

impl CodonTable {
    /// Build the table from the lines of a Kazusa-style frequency file.
    ///
    /// Parenthetical annotations are stripped, codons are uppercased with RNA
    /// `U` mapped to `T`, and for each amino acid the codon with the highest
    /// count wins, ties broken by first-encountered order. Stop codons are
    /// dropped: '*' is not a residue anything should back-translate to.
    ///
    /// A table covering fewer than 20 amino acids is usable but earns an
    /// advisory, since junctions containing the missing residues will fail.
    pub fn from_frequency_lines<I>(lines: I) -> Result<(Self, Vec<Advisory>), CodonUsageError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        // Per-residue candidate lists, in file order for the tie-break.
        let mut candidates: HashMap<u8, Vec<([u8; 3], f64)>> = HashMap::new();
        let mut residue_order: Vec<u8> = Vec::new();

        for (idx, line) in lines.into_iter().enumerate() {
            let cleaned = PARENTHETICAL
                .replace_all(line.as_ref(), "")
                .to_ascii_uppercase()
                .replace('U', "T");
            let tokens: Vec<&str> = cleaned.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            let malformed = || CodonUsageError::MalformedCodonTable {
                line_num: idx + 1,
                line: cleaned.trim().to_string(),
            };
            if tokens.len() % 2 != 0 {
                return Err(malformed());
            }
            for pair in tokens.chunks_exact(2) {
                let codon: [u8; 3] = pair[0].as_bytes().try_into().map_err(|_| malformed())?;
                if !codon.iter().all(|b| b"ACGT".contains(b)) {
                    return Err(malformed());
                }
                let count: f64 = pair[1].parse().map_err(|_| malformed())?;
                let residue = codon_to_aa(&codon);
                if residue == b'*' {
                    continue;
                }
                if !candidates.contains_key(&residue) {
                    residue_order.push(residue);
                }
                candidates.entry(residue).or_default().push((codon, count));
            }
        }

        let mut preferred = HashMap::new();
        for residue in residue_order {
            let mut best: Option<([u8; 3], f64)> = None;
            for &(codon, count) in &candidates[&residue] {
                // Strictly greater keeps the first-encountered codon on ties.
                if best.map_or(true, |(_, best_count)| count > best_count) {
                    best = Some((codon, count));
                }
            }
            if let Some((codon, _)) = best {
                preferred.insert(residue, codon);
            }
        }

        let mut advisories = Vec::new();
        if preferred.len() < FULL_ALPHABET {
            advisories.push(Advisory::IncompleteCodonTable {
                residues: preferred.len(),
            });
        }
        Ok((CodonTable { preferred }, advisories))
    }

    /// Build the table from a frequency file on disk.
    pub fn from_path(path: &Path) -> Result<(Self, Vec<Advisory>), CodonUsageError> {
        let io_err = |source| CodonUsageError::Io {
            path: path.to_path_buf(),
            source,
        };
        let reader = BufReader::new(File::open(path).map_err(io_err)?);
        let lines = reader
            .lines()
            .collect::<Result<Vec<String>, _>>()
            .map_err(io_err)?;
        CodonTable::from_frequency_lines(lines)
    }

    /// The preferred codon for a residue, if the table covers it.
    pub fn preferred(&self, residue: u8) -> Option<&[u8; 3]> {
        self.preferred.get(&residue)
    }

    /// Whether the table can back-translate the given residue.
    pub fn contains(&self, residue: u8) -> bool {
        self.preferred.contains_key(&residue)
    }

    /// Number of residues covered.
    pub fn len(&self) -> usize {
        self.preferred.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.preferred.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_count_wins() {
        let (table, _) = CodonTable::from_frequency_lines(["TTT 10 TTC 5"]).unwrap();
        assert_eq!(table.preferred(b'F'), Some(b"TTT"));
    }

    #[test]
    fn test_first_encountered_wins_ties() {
        let (table, _) = CodonTable::from_frequency_lines(["GGA 7 GGC 7 GGG 7"]).unwrap();
        assert_eq!(table.preferred(b'G'), Some(b"GGA"));
    }

    #[test]
    fn test_kazusa_annotations_and_rna_codons() {
        let (table, _) = CodonTable::from_frequency_lines([
            "UUU 17.6 (714298)  UUC 20.3 (622407)",
            "CUG 39.6 (2290773)  CUA  7.2 (413576)",
        ])
        .unwrap();
        assert_eq!(table.preferred(b'F'), Some(b"TTC"));
        assert_eq!(table.preferred(b'L'), Some(b"CTG"));
    }

    #[test]
    fn test_stop_codons_are_dropped() {
        let (table, _) = CodonTable::from_frequency_lines(["TAA 100 TTT 1"]).unwrap();
        assert!(!table.contains(b'*'));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_odd_token_count_is_malformed() {
        assert!(matches!(
            CodonTable::from_frequency_lines(["TTT 10 TTC"]),
            Err(CodonUsageError::MalformedCodonTable { line_num: 1, .. })
        ));
    }

    #[test]
    fn test_bad_codon_or_count_is_malformed() {
        assert!(CodonTable::from_frequency_lines(["TTTT 10"]).is_err());
        assert!(CodonTable::from_frequency_lines(["TTT ten"]).is_err());
    }

    #[test]
    fn test_incomplete_coverage_advisory() {
        let (table, advisories) = CodonTable::from_frequency_lines(["TTT 10"]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            advisories,
            vec![Advisory::IncompleteCodonTable { residues: 1 }]
        );
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let (table, _) =
            CodonTable::from_frequency_lines(["", "   ", "ATG 1"]).unwrap();
        assert_eq!(table.preferred(b'M'), Some(b"ATG"));
    }
}
