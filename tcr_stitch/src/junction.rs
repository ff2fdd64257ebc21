//! CDR3 junction resolution against the translated germline halves.
//!
//! Each side is resolved independently: the V side asks how many of the
//! CDR3's first residues are already encoded by the end of the leader+V
//! translation, the J side asks where in the J+constant translation the
//! CDR3's tail reappears. Whatever the two sides do not explain is the
//! non-templated span that gets back-translated later.

use crate::errors::StitchError;
use crate::find_subseq;
use crate::frame::FramedSegment;
use log::debug;
use tcr_types::Advisory;

/// Longest CDR3 prefix the V side will try to attribute to germline.
const MAX_V_MATCH: usize = 4;

/// How far before the end of the V translation a match may start, to
/// tolerate germline tails shortened by junctional trimming.
const MAX_V_OFFSET: usize = 10;

/// A J-side match must start within this many residues of the start of the
/// J+constant translation; anything further in would sit inside the constant
/// region rather than the J segment.
const MAX_J_START: usize = 22;

/// J matches shorter than this are suspicious enough to flag.
const SHORT_J_MATCH: usize = 5;

/// V-side outcome: germline nucleotides up to the junction, and how many
/// CDR3 N-terminal residues the germline already explains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VJunction {
    pub n_term_nt: Vec<u8>,
    pub germline_prefix_len: usize,
}

/// J-side outcome: germline nucleotides from the junction onwards, the CDR3
/// index where germline J contribution begins, and an advisory for
/// suspiciously short matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JJunction {
    pub c_term_nt: Vec<u8>,
    pub cdr3_boundary: usize,
    pub advisory: Option<Advisory>,
}

/// Find the longest CDR3 prefix (4 down to 1 residues) matching a suffix of
/// the leader+V translation, allowing the matched window to end up to
/// `MAX_V_OFFSET - 1` residues before the translation's end. Longer matches
/// win over shorter; for one length, smaller offsets win over larger.
pub fn resolve_v(cdr3: &[u8], n_term: &FramedSegment) -> Result<VJunction, StitchError> {
    let aa_len = n_term.aa.len();
    for take in (1..=MAX_V_MATCH.min(cdr3.len())).rev() {
        let chunk = &cdr3[..take];
        for offset in 0..MAX_V_OFFSET {
            let Some(start) = aa_len.checked_sub(take + offset) else {
                break;
            };
            if &n_term.aa[start..aa_len - offset] == chunk {
                debug!(
                    "V junction: CDR3 prefix of {take} matched {offset} residues before \
                     the germline end"
                );
                return Ok(VJunction {
                    n_term_nt: n_term.nt[..(aa_len - offset) * 3].to_vec(),
                    germline_prefix_len: take,
                });
            }
        }
    }
    Err(StitchError::VJunctionNotFound)
}

/// Find the longest CDR3 suffix (starting from all but the first residue)
/// occurring anywhere in the J+constant translation. The first length found
/// wins; its position must fall inside the J segment.
pub fn resolve_j(cdr3: &[u8], c_term: &FramedSegment) -> Result<JJunction, StitchError> {
    for take in (1..cdr3.len()).rev() {
        let chunk = &cdr3[cdr3.len() - take..];
        let Some(position) = find_subseq(&c_term.aa, chunk) else {
            continue;
        };
        let matched = String::from_utf8_lossy(chunk).into_owned();
        if position > MAX_J_START {
            return Err(StitchError::JMatchOutOfRange { matched, position });
        }
        debug!("J junction: CDR3 suffix of {take} matched at translation residue {position}");
        return Ok(JJunction {
            c_term_nt: c_term.nt[position * 3..].to_vec(),
            cdr3_boundary: cdr3.len() - take,
            advisory: (take < SHORT_J_MATCH).then_some(Advisory::ShortJMatch { matched }),
        });
    }
    Err(StitchError::JJunctionNotFound)
}
