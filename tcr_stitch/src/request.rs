//! Request construction and validation: chain inference, gene autofill and
//! the CDR3 sanity rules.

use crate::errors::StitchError;
use codon_usage::CodonTable;
use tcr_types::{GeneId, TcrChain};

/// Shorter CDR3s than this do not leave room for a plausible junction.
pub const MIN_CDR3_LEN: usize = 8;

/// Residues a CDR3 may start with: the conserved cysteine, plus the rarer
/// valine/tyrosine variants seen in productive rearrangements.
const CDR3_FIRST_RESIDUES: &[u8] = b"CVY";

/// Residues a CDR3 may end with: the conserved phenylalanine and its
/// tryptophan/cysteine variants.
const CDR3_LAST_RESIDUES: &[u8] = b"FWC";

/// One TCR to stitch: fully resolved gene identifiers plus the CDR3 protein
/// sequence. Construction infers the chain and fills in the genes the caller
/// left out; [`TcrRequest::validate`] applies the CDR3 rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcrRequest {
    pub chain: TcrChain,
    pub v: GeneId,
    pub j: GeneId,
    pub constant: GeneId,
    pub leader: GeneId,
    pub cdr3_aa: String,
}

impl TcrRequest {
    /// Build a request from raw gene names. The chain comes from the V/J
    /// name prefixes (which must agree); a missing constant gene defaults to
    /// TRAC for alpha and to the TRBC paired with the J family for beta; a
    /// missing leader gene defaults to the V gene, whose leader exons IMGT
    /// catalogues under the same name.
    pub fn new(
        v: &str,
        j: &str,
        cdr3: &str,
        constant: Option<&str>,
        leader: Option<&str>,
    ) -> Result<Self, StitchError> {
        let v_id = parse_gene(v)?;
        let j_id = parse_gene(j)?;

        let chain = match (TcrChain::of_gene(&v_id.gene), TcrChain::of_gene(&j_id.gene)) {
            (Some(vc), Some(jc)) if vc == jc => vc,
            _ => {
                return Err(StitchError::ChainMismatch {
                    v: v_id.to_string(),
                    j: j_id.to_string(),
                })
            }
        };

        let constant = match constant {
            Some(name) => parse_gene(name)?,
            None => default_constant(chain, &j_id)?,
        };
        let leader = match leader {
            Some(name) => parse_gene(name)?,
            None => v_id.clone(),
        };

        Ok(TcrRequest {
            chain,
            v: v_id,
            j: j_id,
            constant,
            leader,
            cdr3_aa: cdr3.trim().to_ascii_uppercase(),
        })
    }

    /// Check the CDR3 against the conserved-residue and length rules, and
    /// that every residue can be back-translated by the given codon table.
    pub fn validate(&self, codons: &CodonTable) -> Result<(), StitchError> {
        let cdr3 = self.cdr3_aa.as_bytes();
        if cdr3.len() < MIN_CDR3_LEN {
            return Err(StitchError::Cdr3TooShort {
                cdr3: self.cdr3_aa.clone(),
                len: cdr3.len(),
            });
        }
        if !CDR3_FIRST_RESIDUES.contains(&cdr3[0]) {
            return Err(StitchError::Cdr3BadFirstResidue {
                cdr3: self.cdr3_aa.clone(),
            });
        }
        if !CDR3_LAST_RESIDUES.contains(&cdr3[cdr3.len() - 1]) {
            return Err(StitchError::Cdr3BadLastResidue {
                cdr3: self.cdr3_aa.clone(),
            });
        }
        if let Some(&residue) = cdr3.iter().find(|&&r| !codons.contains(r)) {
            return Err(StitchError::Cdr3UnknownResidue {
                residue: residue as char,
            });
        }
        Ok(())
    }
}

fn parse_gene(name: &str) -> Result<GeneId, StitchError> {
    name.parse().map_err(|reason| StitchError::InvalidGeneName {
        name: name.to_string(),
        reason,
    })
}

/// The constant gene implied by the chain and J family. Alpha has a single
/// constant gene; beta pairs TRBJ1 genes with TRBC1 and TRBJ2 with TRBC2.
fn default_constant(chain: TcrChain, j: &GeneId) -> Result<GeneId, StitchError> {
    match chain {
        TcrChain::TRA => Ok(GeneId::with_default_allele("TRAC")),
        TcrChain::TRB => {
            if j.gene.starts_with("TRBJ1") {
                Ok(GeneId::with_default_allele("TRBC1"))
            } else if j.gene.starts_with("TRBJ2") {
                Ok(GeneId::with_default_allele("TRBC2"))
            } else {
                Err(StitchError::UnresolvedConstant { j: j.to_string() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn full_table() -> CodonTable {
        let (table, advisories) = CodonTable::from_frequency_lines([
            "TTT 1 CTG 1 ATT 1 GTG 1 TCC 1 CCC 1 ACC 1 GCC 1",
            "TAT 1 CAT 1 CAG 1 AAT 1 AAA 1 GAT 1 GAA 1 TGT 1",
            "TGG 1 CGG 1 AGC 0.5 GGA 1 ATG 1",
        ])
        .unwrap();
        assert_eq!(advisories, vec![]);
        table
    }

    #[test]
    fn test_chain_inference_and_autofill() {
        let req = TcrRequest::new("trbv19", "TRBJ2-7*01", "CASSLGVSSYEQYF", None, None).unwrap();
        assert_eq!(req.chain, TcrChain::TRB);
        assert_eq!(req.v, GeneId::new("TRBV19", "01"));
        assert_eq!(req.constant, GeneId::new("TRBC2", "01"));
        assert_eq!(req.leader, GeneId::new("TRBV19", "01"));

        let req = TcrRequest::new("TRBV19", "TRBJ1-1", "CASSLGVSSYEQYF", None, None).unwrap();
        assert_eq!(req.constant, GeneId::new("TRBC1", "01"));

        let req = TcrRequest::new("TRAV1-2", "TRAJ33", "CAVRDSNYQLIW", None, None).unwrap();
        assert_eq!(req.chain, TcrChain::TRA);
        assert_eq!(req.constant, GeneId::new("TRAC", "01"));
    }

    #[test]
    fn test_explicit_genes_are_kept() {
        let req = TcrRequest::new(
            "TRBV19",
            "TRBJ2-7",
            "CASSLGVSSYEQYF",
            Some("TRBC1*02"),
            Some("TRBV19*03"),
        )
        .unwrap();
        assert_eq!(req.constant, GeneId::new("TRBC1", "02"));
        assert_eq!(req.leader, GeneId::new("TRBV19", "03"));
    }

    #[test]
    fn test_chain_mismatch() {
        assert!(matches!(
            TcrRequest::new("TRBV19", "TRAJ33", "CASSLGVSSYEQYF", None, None),
            Err(StitchError::ChainMismatch { .. })
        ));
        assert!(matches!(
            TcrRequest::new("IGHV1-2", "TRBJ2-7", "CASSLGVSSYEQYF", None, None),
            Err(StitchError::ChainMismatch { .. })
        ));
    }

    #[test]
    fn test_unresolved_constant() {
        assert!(matches!(
            TcrRequest::new("TRBV19", "TRBJ9-9", "CASSLGVSSYEQYF", None, None),
            Err(StitchError::UnresolvedConstant { .. })
        ));
    }

    #[test]
    fn test_cdr3_validation() {
        let codons = full_table();
        let req = |cdr3: &str| TcrRequest::new("TRBV19", "TRBJ2-7", cdr3, None, None).unwrap();

        assert!(req("CASSLGVSSYEQYF").validate(&codons).is_ok());
        // Lowercase input is folded before validation.
        assert!(req("casslgvssyeqyf").validate(&codons).is_ok());

        assert!(matches!(
            req("CASSF").validate(&codons),
            Err(StitchError::Cdr3TooShort { len: 5, .. })
        ));
        assert!(matches!(
            req("XASSLGVSSYEQYF").validate(&codons),
            Err(StitchError::Cdr3BadFirstResidue { .. })
        ));
        assert!(matches!(
            req("CASSLGVSSYEQYT").validate(&codons),
            Err(StitchError::Cdr3BadLastResidue { .. })
        ));
        assert!(matches!(
            req("CASSBGVSSYEQYF").validate(&codons),
            Err(StitchError::Cdr3UnknownResidue { residue: 'B' })
        ));
    }
}
