//! Cloning-primer design for stitched TCR pairs: trim each chain back to its
//! V-J portion by locating the start of the constant region, then wrap fixed
//! adapter sequences around the terminal windows.

use crate::batch::{self, ChainDbs};
use anyhow::{bail, Context, Result};
use bio::alphabets::dna::revcomp;
use codon_usage::CodonTable;
use log::{error, warn};
use rayon::prelude::*;
use std::path::Path;

// Nucleotide prefixes of the human constant regions, marking where the V-J
// portion of a stitched chain ends.
const ALPHA_CONSTANT_PREFIX: &str = "ATATCCAGAACCCT";
const BETA_CONSTANT_PREFIX: &str = "GAGGACCTGAA";

// Vector-specific adapter sequences, case kept as the wet-lab protocol
// writes them.
const ALPHA_COMMON_FORWARD: &str = "agatgtggaggaaaaccccggccct";
const ALPHA_COMMON_REVERSE: &str = "GCCTGCAGGTCGACTCTAGAGTCGC";
const BETA_COMMON_FORWARD: &str = "CTCCGACAGACTGAGTCGCCCGGGgccgccacc";
const BETA_COMMON_REVERSE: &str = "gtggtgtcacgttacgtagatcttc";

/// Template bases carried into each primer.
const PRIMER_WINDOW: usize = 18;

#[derive(Debug, PartialEq, Eq)]
pub struct PrimerPair {
    pub forward: String,
    pub reverse: String,
}

/// Forward primer from the first window, reverse primer from the reverse
/// complement of the last.
fn primer_pair(vdj_nt: &str, common_forward: &str, common_reverse: &str) -> Result<PrimerPair> {
    if vdj_nt.len() < PRIMER_WINDOW {
        bail!(
            "V-J portion is only {} nt, shorter than the {PRIMER_WINDOW} nt primer window",
            vdj_nt.len()
        );
    }
    let tail = revcomp(vdj_nt[vdj_nt.len() - PRIMER_WINDOW..].as_bytes());
    Ok(PrimerPair {
        forward: format!("{common_forward}{}", &vdj_nt[..PRIMER_WINDOW]),
        reverse: format!("{common_reverse}{}", String::from_utf8_lossy(&tail)),
    })
}

/// The alpha V-J portion ends one base ahead of the constant prefix.
fn alpha_vdj(full_nt: &str) -> Result<&str> {
    match full_nt.find(ALPHA_CONSTANT_PREFIX) {
        Some(index) => Ok(&full_nt[..index.saturating_sub(1)]),
        None => bail!("could not locate the alpha constant region in the stitched sequence"),
    }
}

fn beta_vdj(full_nt: &str) -> Result<&str> {
    match full_nt.find(BETA_CONSTANT_PREFIX) {
        Some(index) => Ok(&full_nt[..index]),
        None => bail!("could not locate the beta constant region in the stitched sequence"),
    }
}

/// Stitch every record in the TSV and print a primer table, one line per
/// clone, failures logged and skipped.
pub fn run(tsv: &Path, dbs: &ChainDbs, codons: &CodonTable) -> Result<()> {
    let pairs = batch::read_pairs(tsv)?;
    let outcomes: Vec<_> = pairs
        .par_iter()
        .map(|pair| -> Result<String> {
            let (alpha, beta) = batch::stitch_pair(pair, dbs, codons)?;
            let alpha_vdj = alpha_vdj(&alpha.full_nt).with_context(|| pair.name.clone())?;
            let beta_vdj = beta_vdj(&beta.full_nt).with_context(|| pair.name.clone())?;
            let alpha_primers =
                primer_pair(alpha_vdj, ALPHA_COMMON_FORWARD, ALPHA_COMMON_REVERSE)?;
            let beta_primers = primer_pair(beta_vdj, BETA_COMMON_FORWARD, BETA_COMMON_REVERSE)?;
            Ok([
                pair.name.as_str(),
                &alpha_primers.forward,
                &alpha_primers.reverse,
                &beta_primers.forward,
                &beta_primers.reverse,
                alpha_vdj,
                beta_vdj,
            ]
            .join("\t"))
        })
        .collect();

    println!(
        "TCR clone\talpha forward\talpha reverse\tbeta forward\tbeta reverse\t\
         alpha full V-J\tbeta full V-J"
    );
    let mut failures = 0usize;
    for outcome in outcomes {
        match outcome {
            Ok(line) => println!("{line}"),
            Err(err) => {
                error!("{err:#}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        warn!("{failures} of {} records failed primer design", pairs.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primer_windows() {
        let vdj = "ATGGATATTCAGTGTGCCAGCAGCCTGGGAGTG";
        let primers = primer_pair(vdj, "xxxx", "YYYY").unwrap();
        assert_eq!(primers.forward, "xxxxATGGATATTCAGTGTGCC");
        // Reverse primer carries the reverse complement of the last 18 nt.
        assert_eq!(primers.reverse, "YYYYCACTCCCAGGCTGCTGGC");
    }

    #[test]
    fn test_primer_window_too_short() {
        assert!(primer_pair("ATGGAT", "x", "y").is_err());
    }

    #[test]
    fn test_constant_trimming() {
        let alpha = format!("AAACCCGGGTTT{ALPHA_CONSTANT_PREFIX}AAAA");
        assert_eq!(alpha_vdj(&alpha).unwrap(), "AAACCCGGGTT");
        let beta = format!("AAACCCGGGTTT{BETA_CONSTANT_PREFIX}AAAA");
        assert_eq!(beta_vdj(&beta).unwrap(), "AAACCCGGGTTT");
        assert!(alpha_vdj("AAACCCGGGTTT").is_err());
    }
}
