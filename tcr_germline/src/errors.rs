use std::path::PathBuf;
use tcr_types::GeneRegion;

/// Everything that can go wrong while loading or querying germline data.
/// All variants are request- or load-scoped values; nothing here aborts the
/// process.
#[derive(Debug, thiserror::Error)]
pub enum GermlineError {
    #[error("Could not read the germline FASTA file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not read a record from the germline FASTA stream")]
    RecordRead {
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Germline FASTA headers must carry at least {} '|'-separated fields \
         (gene*allele in field 2, functionality in field 4, region label in field 5, \
         partial flag in field 14). Found {num_fields} fields in '{header}'",
        crate::MIN_HEADER_FIELDS
    )]
    UnexpectedHeaderFormat { num_fields: usize, header: String },

    #[error("Expected 'gene*allele' in the second header field, found '{field}' in '{header}'")]
    UnexpectedGeneFormat { field: String, header: String },

    #[error(
        "Invalid character '{base}' in the sequence for {gene}*{allele}. \
         Only {} characters are allowed",
        crate::ALLOWED_NUCLEOTIDES
    )]
    InvalidBase {
        gene: String,
        allele: String,
        base: char,
    },

    #[error(
        "No usable {region} entries were loaded. Please check that the germline file \
         was split per chain and contains non-partial {region} records"
    )]
    MissingRegionType { region: GeneRegion },

    #[error("The gene '{gene}' has no {region} entry in the germline database")]
    GeneNotFound { region: GeneRegion, gene: String },

    #[error(
        "Allele '{allele}' of gene '{gene}' is not in the germline database. \
         Known alleles: [{known}]"
    )]
    AlleleNotFound {
        gene: String,
        allele: String,
        known: String,
    },
}
