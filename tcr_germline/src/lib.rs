//!
//! Germline gene database for TCR stitching: typed records parsed from
//! per-chain IMGT FASTA files, indexed by region, gene and allele.
//!
// Warning groups (as of rust 1.55)
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]

use bio::io::fasta::{self, Record};
use errors::GermlineError;
use fxhash::FxHashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::Path;
use tcr_types::{GeneId, GeneRegion};

pub mod errors;

pub(crate) const ALLOWED_NUCLEOTIDES: &str = "ACGTURYKMSWBDHVN";

/// The pipe-separated fields a germline FASTA header must carry.
/// IMGT headers have 16; everything this crate reads sits within the first 14.
pub(crate) const MIN_HEADER_FIELDS: usize = 14;

const GENE_ALLELE_FIELD: usize = 1;
const FUNCTIONALITY_FIELD: usize = 3;
const REGION_LABEL_FIELD: usize = 4;
const PARTIAL_FIELD: usize = 13;

/// One germline segment parsed from an IMGT FASTA record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GermlineRecord {
    pub region: GeneRegion,
    pub gene: String,
    pub allele: String,
    /// Uppercase nucleotide sequence.
    pub sequence: String,
    /// IMGT functionality call with its bracket qualifiers stripped,
    /// e.g. "(F)" and "[F]" both load as "F".
    pub functionality: String,
    /// Whether IMGT flags the record as partial at either end. Partial
    /// records never enter the sequence index.
    pub partial: bool,
}

impl GermlineRecord {
    /// Parse a fasta record whose header follows the IMGT convention:
    /// accession|gene*allele|species|functionality|label|...|partial-flag|...
    ///
    /// Returns `Ok(None)` for records labelled with a region this crate does
    /// not stitch (D segments, UTRs, single exons of a pre-split file).
    pub fn from_record(rec: &Record) -> Result<Option<Self>, GermlineError> {
        let header = match rec.desc() {
            Some(desc) => format!("{} {desc}", rec.id()),
            None => rec.id().to_string(),
        };
        let fields: Vec<&str> = header.split('|').collect();
        if fields.len() < MIN_HEADER_FIELDS {
            return Err(GermlineError::UnexpectedHeaderFormat {
                num_fields: fields.len(),
                header,
            });
        }

        let Ok(region) = fields[REGION_LABEL_FIELD].parse::<GeneRegion>() else {
            return Ok(None);
        };

        let Some((gene, allele)) = fields[GENE_ALLELE_FIELD].split_once('*') else {
            return Err(GermlineError::UnexpectedGeneFormat {
                field: fields[GENE_ALLELE_FIELD].to_string(),
                header,
            });
        };

        let mut sequence = String::with_capacity(rec.seq().len());
        for &base in rec.seq() {
            let base = (base as char).to_ascii_uppercase();
            if !ALLOWED_NUCLEOTIDES.contains(base) {
                return Err(GermlineError::InvalidBase {
                    gene: gene.to_string(),
                    allele: allele.to_string(),
                    base,
                });
            }
            sequence.push(base);
        }

        Ok(Some(GermlineRecord {
            region,
            gene: gene.to_string(),
            allele: allele.to_string(),
            sequence,
            functionality: fields[FUNCTIONALITY_FIELD]
                .chars()
                .filter(|c| !"()[]".contains(*c))
                .collect(),
            partial: fields[PARTIAL_FIELD].contains("partial"),
        }))
    }
}

/// Parse every stitchable record out of an IMGT FASTA stream, dropping
/// records with unrecognised region labels.
pub fn read_imgt_records<B: BufRead>(
    reader: fasta::Reader<B>,
) -> Result<Vec<GermlineRecord>, GermlineError> {
    let mut records = Vec::new();
    for rec in reader.records() {
        let rec = rec.map_err(|source| GermlineError::RecordRead { source })?;
        if let Some(parsed) = GermlineRecord::from_record(&rec)? {
            records.push(parsed);
        }
    }
    Ok(records)
}

/// Read-only germline sequence index for one chain, built once per run.
///
/// Sequences are keyed by (region, gene, allele); functionality is keyed by
/// (gene, allele) alone since it is a property of the allele, not of any one
/// region record.
#[derive(Debug, Clone, Default)]
pub struct GermlineDatabase {
    sequences: FxHashMap<GeneRegion, FxHashMap<String, FxHashMap<String, String>>>,
    functionality: FxHashMap<String, FxHashMap<String, String>>,
}

impl GermlineDatabase {
    /// Index already-parsed records. Partial records contribute their
    /// functionality call but no sequence. Every stitched region must end up
    /// with at least one entry, otherwise the source file was incomplete or
    /// not split per chain.
    pub fn from_records(
        records: impl IntoIterator<Item = GermlineRecord>,
    ) -> Result<Self, GermlineError> {
        let mut db = GermlineDatabase::default();
        for region in GeneRegion::all() {
            db.sequences.insert(region, FxHashMap::default());
        }

        for rec in records {
            db.functionality
                .entry(rec.gene.clone())
                .or_default()
                .insert(rec.allele.clone(), rec.functionality);
            if rec.partial {
                continue;
            }
            db.sequences
                .entry(rec.region)
                .or_default()
                .entry(rec.gene)
                .or_default()
                .insert(rec.allele, rec.sequence);
        }

        for region in GeneRegion::all() {
            if db.sequences[&region].is_empty() {
                return Err(GermlineError::MissingRegionType { region });
            }
        }
        Ok(db)
    }

    /// Build a database straight from an open fasta stream.
    pub fn from_fasta_reader<B: BufRead>(
        reader: fasta::Reader<B>,
    ) -> Result<Self, GermlineError> {
        GermlineDatabase::from_records(read_imgt_records(reader)?)
    }

    /// Build a database from a per-chain IMGT fasta file on disk.
    pub fn from_fasta_path(path: &Path) -> Result<Self, GermlineError> {
        let reader = fasta::Reader::from_file(path).map_err(|source| GermlineError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, source),
        })?;
        GermlineDatabase::from_fasta_reader(reader)
    }

    /// Look up the nucleotide sequence a gene contributes to the given
    /// region, with explicit key-not-found errors at each level.
    pub fn sequence(&self, region: GeneRegion, id: &GeneId) -> Result<&str, GermlineError> {
        let genes = self
            .sequences
            .get(&region)
            .ok_or(GermlineError::MissingRegionType { region })?;
        let alleles = genes.get(&id.gene).ok_or_else(|| GermlineError::GeneNotFound {
            region,
            gene: id.gene.clone(),
        })?;
        alleles
            .get(&id.allele)
            .map(String::as_str)
            .ok_or_else(|| GermlineError::AlleleNotFound {
                gene: id.gene.clone(),
                allele: id.allele.clone(),
                known: alleles.keys().sorted().join(", "),
            })
    }

    /// The recorded functionality call for an allele, if the gene was seen.
    pub fn functionality(&self, id: &GeneId) -> Option<&str> {
        self.functionality
            .get(&id.gene)
            .and_then(|alleles| alleles.get(&id.allele))
            .map(String::as_str)
    }
}
