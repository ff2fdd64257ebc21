use crate::request::MIN_CDR3_LEN;
use tcr_germline::errors::GermlineError;
use tcr_types::TcrChain;

/// Everything that can fail a single stitching request. One bad request must
/// never take down a batch, so every condition here is a value returned to
/// the caller, not an exit.
#[derive(Debug, thiserror::Error)]
pub enum StitchError {
    #[error("Invalid gene name '{name}': {reason}")]
    InvalidGeneName { name: String, reason: String },

    #[error(
        "V gene '{v}' and J gene '{j}' do not name one chain. Please provide full IMGT \
         gene names from the same chain, starting 'TRA' or 'TRB'"
    )]
    ChainMismatch { v: String, j: String },

    #[error(
        "Could not pick a constant gene for J gene '{j}'. Beta constant genes pair with \
         the TRBJ1/TRBJ2 families; please supply the constant gene explicitly"
    )]
    UnresolvedConstant { j: String },

    #[error("CDR3 '{cdr3}' has {len} residues; at least {} are expected", MIN_CDR3_LEN)]
    Cdr3TooShort { cdr3: String, len: usize },

    #[error("CDR3 '{cdr3}' does not begin with a conserved residue (C, V or Y)")]
    Cdr3BadFirstResidue { cdr3: String },

    #[error("CDR3 '{cdr3}' does not end with a conserved residue (F, W or C)")]
    Cdr3BadLastResidue { cdr3: String },

    #[error(
        "Unexpected character '{residue}' in the CDR3. Please use one-letter amino acid \
         codes covered by the codon usage table"
    )]
    Cdr3UnknownResidue { residue: char },

    #[error("Could not find an in-frame {chain} constant region in any reading frame")]
    NoValidFrame { chain: TcrChain },

    #[error(
        "Unable to locate the N terminus of the CDR3 in the V gene. Please check \
         sequence plausibility"
    )]
    VJunctionNotFound,

    #[error(
        "The C-terminal CDR3 match '{matched}' begins at residue {position} of the \
         J+constant translation, which places it beyond the J segment. Please double \
         check the CDR3 sequence and the J gene name"
    )]
    JMatchOutOfRange { matched: String, position: usize },

    #[error(
        "Unable to locate the C terminus of the CDR3 in the J gene. Please check \
         sequence plausibility"
    )]
    JJunctionNotFound,

    #[error("No preferred codon for junction residue '{residue}'")]
    UnknownResidue { residue: char },

    #[error(transparent)]
    Germline(#[from] GermlineError),
}
