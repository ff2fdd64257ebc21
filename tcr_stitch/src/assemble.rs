//! Final assembly: germline lookups, frame normalisation, junction
//! resolution and back-translation of the non-templated span.

use crate::errors::StitchError;
use crate::frame::{frame_c_term, trim_n_term};
use crate::junction::{resolve_j, resolve_v};
use crate::request::TcrRequest;
use codon_usage::CodonTable;
use tcr_germline::GermlineDatabase;
use tcr_types::{Advisory, GeneRegion};

/// A stitched coding sequence. `n_term_nt` and `c_term_nt` are the
/// junction-trimmed germline halves the full sequence was assembled from;
/// `warnings` carries every advisory in the order it was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyResult {
    pub full_nt: String,
    pub n_term_nt: String,
    pub c_term_nt: String,
    pub warnings: Vec<Advisory>,
}

/// Stitch one validated request against a germline database and codon table.
///
/// The concatenation order is fixed: junction-trimmed leader+V, the
/// back-translated non-templated CDR3 span, junction-trimmed J+constant.
pub fn stitch(
    request: &TcrRequest,
    db: &GermlineDatabase,
    codons: &CodonTable,
) -> Result<AssemblyResult, StitchError> {
    request.validate(codons)?;

    let mut warnings = Vec::new();
    for id in [&request.v, &request.j] {
        match db.functionality(id) {
            Some("F") | None => {}
            Some(call) => warnings.push(Advisory::NonFunctionalGene {
                gene: id.gene.clone(),
                allele: id.allele.clone(),
                functionality: call.to_string(),
            }),
        }
    }

    let leader = db.sequence(GeneRegion::Leader, &request.leader)?;
    let v = db.sequence(GeneRegion::V, &request.v)?;
    let j = db.sequence(GeneRegion::J, &request.j)?;
    let constant = db.sequence(GeneRegion::Constant, &request.constant)?;

    let n_term = trim_n_term([leader, v].concat().as_bytes());
    let c_term = frame_c_term([j, constant].concat().as_bytes(), request.chain)?;

    let cdr3 = request.cdr3_aa.as_bytes();
    let vj = resolve_v(cdr3, &n_term)?;
    let jj = resolve_j(cdr3, &c_term)?;
    warnings.extend(jj.advisory.clone());

    // The residues neither germline side explains. A germline V running past
    // the J boundary leaves nothing to fill in.
    let junction_aa = if vj.germline_prefix_len < jj.cdr3_boundary {
        &cdr3[vj.germline_prefix_len..jj.cdr3_boundary]
    } else {
        &[]
    };
    let mut junction_nt = Vec::with_capacity(junction_aa.len() * 3);
    for &residue in junction_aa {
        let codon = codons
            .preferred(residue)
            .ok_or(StitchError::UnknownResidue {
                residue: residue as char,
            })?;
        junction_nt.extend_from_slice(codon);
    }

    let full_nt = [vj.n_term_nt.as_slice(), &junction_nt, &jj.c_term_nt].concat();
    Ok(AssemblyResult {
        full_nt: String::from_utf8_lossy(&full_nt).into_owned(),
        n_term_nt: String::from_utf8_lossy(&vj.n_term_nt).into_owned(),
        c_term_nt: String::from_utf8_lossy(&jj.c_term_nt).into_owned(),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use codon_usage::{has_stop_before, translate};
    use pretty_assertions::assert_eq;
    use tcr_germline::GermlineRecord;

    fn record(region: GeneRegion, gene: &str, sequence: &str, functionality: &str) -> GermlineRecord {
        GermlineRecord {
            region,
            gene: gene.to_string(),
            allele: "01".to_string(),
            sequence: sequence.to_string(),
            functionality: functionality.to_string(),
            partial: false,
        }
    }

    fn test_db() -> GermlineDatabase {
        GermlineDatabase::from_records([
            // Beta: V translates MDIQCASS with its leader, J+C to
            // SSYEQYFEDLNKVFPP.
            record(GeneRegion::Leader, "TRBV19", "ATG", "F"),
            record(GeneRegion::V, "TRBV19", "GATATTCAGTGTGCCAGCAGC", "F"),
            record(GeneRegion::J, "TRBJ2-7", "AGCAGCTACGAGCAGTACTTT", "F"),
            record(GeneRegion::J, "TRBJ2-2", "AACACCGGGGAGCTGTTTTTT", "ORF"),
            record(
                GeneRegion::Constant,
                "TRBC2",
                "GAGGATCTGAACAAGGTGTTCCCACCC",
                "F",
            ),
            // Alpha: V translates MGAQCAVR with its leader; the constant
            // carries the premature stop ahead of its DLQDCK marker.
            record(GeneRegion::Leader, "TRAV1-2", "ATG", "F"),
            record(GeneRegion::V, "TRAV1-2", "GGAGCCCAGTGTGCTGTGAGA", "F"),
            record(GeneRegion::J, "TRAJ33", "GATAGCAACTATCAGTTAATCTGG", "F"),
            record(
                GeneRegion::Constant,
                "TRAC",
                "ATACAGAACCCAGACCCTGCCGTGTATTAAGATCTGCAGGACTGCAAGGGGTTT",
                "F",
            ),
        ])
        .unwrap()
    }

    fn codons() -> CodonTable {
        let (table, _) = CodonTable::from_frequency_lines([
            "TTT 1 CTG 1 ATT 1 GTG 1 TCC 1 CCC 1 ACC 1 GCC 1",
            "TAT 1 CAT 1 CAG 1 AAT 1 AAA 1 GAT 1 GAA 1 TGT 1",
            "TGG 1 CGG 1 AGC 1 GGA 1 ATG 1",
        ])
        .unwrap();
        table
    }

    #[test]
    fn test_beta_end_to_end() {
        let request =
            TcrRequest::new("TRBV19", "TRBJ2-7", "CASSLGVSSYEQYF", None, None).unwrap();
        let result = stitch(&request, &test_db(), &codons()).unwrap();

        // MDIQCASS + LGV + SSYEQYFEDLNKVFPP, with LGV back-translated through
        // the preferred codons CTG/GGA/GTG.
        assert_eq!(
            result.full_nt,
            "ATGGATATTCAGTGTGCCAGCAGC\
             CTGGGAGTG\
             AGCAGCTACGAGCAGTACTTTGAGGATCTGAACAAGGTGTTCCCACCC"
        );
        assert_eq!(result.n_term_nt, "ATGGATATTCAGTGTGCCAGCAGC");
        assert_eq!(
            result.c_term_nt,
            "AGCAGCTACGAGCAGTACTTTGAGGATCTGAACAAGGTGTTCCCACCC"
        );
        assert_eq!(result.warnings, vec![]);

        // In frame, and clean until past the constant anchor.
        assert_eq!(result.full_nt.len() % 3, 0);
        let aa = translate(result.full_nt.as_bytes(), 0);
        assert!(!has_stop_before(&aa, aa.len()));
        assert_eq!(aa, b"MDIQCASSLGVSSYEQYFEDLNKVFPP");
    }

    #[test]
    fn test_back_translation_round_trip() {
        let request =
            TcrRequest::new("TRBV19", "TRBJ2-7", "CASSLGVSSYEQYF", None, None).unwrap();
        let result = stitch(&request, &test_db(), &codons()).unwrap();

        let junction_start = result.n_term_nt.len();
        let junction_end = result.full_nt.len() - result.c_term_nt.len();
        let junction = &result.full_nt[junction_start..junction_end];
        assert_eq!(translate(junction.as_bytes(), 0), b"LGV");
    }

    #[test]
    fn test_alpha_end_to_end_empty_junction() {
        let request = TcrRequest::new("TRAV1-2", "TRAJ33", "CAVRDSNYQLIW", None, None).unwrap();
        let result = stitch(&request, &test_db(), &codons()).unwrap();

        // The CDR3 is fully germline-encoded: CAVR from the V, DSNYQLIW from
        // the J; the constant region is cut ahead of its late-exon stop.
        let aa = translate(result.full_nt.as_bytes(), 0);
        assert_eq!(aa, b"MGAQCAVRDSNYQLIWIQNPDPAVY");
        assert!(!aa.contains(&b'*'));
        assert_eq!(result.full_nt.len() % 3, 0);
    }

    #[test]
    fn test_non_functional_gene_advisory() {
        let request =
            TcrRequest::new("TRBV19", "TRBJ2-2", "CASSLGNTGELFF", None, None).unwrap();
        let result = stitch(&request, &test_db(), &codons()).unwrap();
        assert_eq!(
            result.warnings,
            vec![Advisory::NonFunctionalGene {
                gene: "TRBJ2-2".to_string(),
                allele: "01".to_string(),
                functionality: "ORF".to_string(),
            }]
        );
    }

    #[test]
    fn test_unknown_gene_is_request_scoped() {
        let request =
            TcrRequest::new("TRBV99", "TRBJ2-7", "CASSLGVSSYEQYF", None, None).unwrap();
        assert!(matches!(
            stitch(&request, &test_db(), &codons()),
            Err(StitchError::Germline(_))
        ));
    }

    #[test]
    fn test_unknown_residue_in_junction() {
        let (sparse, _) = CodonTable::from_frequency_lines([
            // Covers the CDR3 alphabet except L, which only occurs in the
            // non-templated span.
            "TTT 1 ATT 1 GTG 1 TCC 1 CCC 1 ACC 1 GCC 1 TAT 1",
            "CAT 1 CAG 1 AAT 1 AAA 1 GAT 1 GAA 1 TGT 1 TGG 1",
            "CGG 1 AGC 1 GGA 1 ATG 1",
        ])
        .unwrap();
        let request =
            TcrRequest::new("TRBV19", "TRBJ2-7", "CASSGGVSSYEQYF", None, None).unwrap();
        // The junction GGV back-translates fine without L...
        assert!(stitch(&request, &test_db(), &sparse).is_ok());
        // ...but request validation rejects a CDR3 containing L outright.
        let request =
            TcrRequest::new("TRBV19", "TRBJ2-7", "CASSLGVSSYEQYF", None, None).unwrap();
        assert!(matches!(
            stitch(&request, &test_db(), &sparse),
            Err(StitchError::Cdr3UnknownResidue { residue: 'L' })
        ));
    }
}
