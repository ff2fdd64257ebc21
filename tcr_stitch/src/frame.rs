//! Reading-frame normalisation for the two germline halves of a stitched
//! transcript.
//!
//! The N-terminal half (leader + V) is left-anchored, so its frame is always
//! zero and only a trailing partial codon needs trimming. The C-terminal half
//! (J + constant) starts wherever the J segment happens to start, so the
//! correct frame is found by scanning offsets 0..3 for a translation that
//! contains a constant-region anchor peptide.

use crate::errors::StitchError;
use crate::find_subseq;
use codon_usage::translate;
use log::debug;
use tcr_types::TcrChain;

/// Anchor peptides identifying an in-frame constant region, one row per
/// chain. Kept as data so that supporting another locus or species is a row
/// edit, not a code change.
pub struct ChainAnchors {
    pub chain: TcrChain,
    /// Peptides whose presence in a translation marks the frame as correct;
    /// one per constant-gene family.
    pub anchors: &'static [&'static [u8]],
    /// A marker immediately downstream of a known premature in-frame stop.
    /// When present, the sequence is cut at the stop after frame selection.
    pub stop_marker: Option<&'static [u8]>,
}

/// Human TRA/TRB anchors. TRAC carries a late-exon stop codon that has to be
/// read through during frame detection and then cut; the two TRBC families
/// differ by a two-residue swap in the anchor.
pub const ANCHOR_TABLE: [ChainAnchors; 2] = [
    ChainAnchors {
        chain: TcrChain::TRA,
        anchors: &[b"IQNPDPA"],
        stop_marker: Some(b"*DLQDCK"),
    },
    ChainAnchors {
        chain: TcrChain::TRB,
        anchors: &[b"DLKNVF", b"DLNKVF"],
        stop_marker: None,
    },
];

fn anchors_for(chain: TcrChain) -> &'static ChainAnchors {
    ANCHOR_TABLE
        .iter()
        .find(|row| row.chain == chain)
        .unwrap_or(&ANCHOR_TABLE[0])
}

/// A germline half trimmed to a whole number of codons, with its translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedSegment {
    pub nt: Vec<u8>,
    pub aa: Vec<u8>,
}

/// Trim trailing nucleotides off the leader+V half so it translates cleanly
/// from its first base.
pub fn trim_n_term(n_term_nt: &[u8]) -> FramedSegment {
    let keep = n_term_nt.len() - n_term_nt.len() % 3;
    let nt = n_term_nt[..keep].to_vec();
    let aa = translate(&nt, 0);
    FramedSegment { nt, aa }
}

/// Find the reading frame of the J+constant half by scanning offsets 0, 1, 2
/// for a translation containing the chain's constant-region anchor, and
/// apply the chain's stop-marker cut when one is defined.
///
/// The scan is an explicit loop with early exit; re-running it on its own
/// output selects offset 0.
pub fn frame_c_term(c_term_nt: &[u8], chain: TcrChain) -> Result<FramedSegment, StitchError> {
    let row = anchors_for(chain);
    for offset in 0..3 {
        let aa = translate(c_term_nt, offset);
        if !row.anchors.iter().any(|a| find_subseq(&aa, a).is_some()) {
            continue;
        }
        let framed = &c_term_nt[offset..];
        let mut nt = framed[..framed.len() - framed.len() % 3].to_vec();
        let mut aa = aa;

        if let Some(marker) = row.stop_marker {
            // The marker sits just past a premature stop; cut there, in
            // frame-adjusted coordinates. A translation with the anchor but
            // no marker means a truncated constant region, so keep scanning.
            let Some(stop) = find_subseq(&aa, marker) else {
                continue;
            };
            nt.truncate(stop * 3);
            aa.truncate(stop);
        }

        debug!("constant region in frame at offset {offset} for {chain}");
        return Ok(FramedSegment { nt, aa });
    }
    Err(StitchError::NoValidFrame { chain })
}
