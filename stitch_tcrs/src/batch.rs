//! Batch stitching of paired alpha/beta rearrangements from a TSV file.
//!
//! The germline databases and codon table are read-only once built, so
//! records fan out across a rayon pool with nothing shared but references.
//! Every record fails on its own: a bad line is logged and skipped, and the
//! sequences stitched for the other lines are still emitted.

use anyhow::{bail, Context, Result};
use codon_usage::CodonTable;
use log::{error, warn};
use rayon::prelude::*;
use std::path::Path;
use tcr_germline::GermlineDatabase;
use tcr_stitch::{stitch, AssemblyResult, TcrRequest};
use tcr_types::TcrChain;

/// Both per-chain germline databases, loaded once per run.
pub struct ChainDbs {
    tra: GermlineDatabase,
    trb: GermlineDatabase,
}

impl ChainDbs {
    pub fn load(data_dir: &Path) -> Result<Self> {
        let load = |chain: TcrChain| {
            let path = data_dir.join(format!("{chain}.fasta"));
            GermlineDatabase::from_fasta_path(&path)
                .with_context(|| format!("loading {chain} germline data"))
        };
        Ok(ChainDbs {
            tra: load(TcrChain::TRA)?,
            trb: load(TcrChain::TRB)?,
        })
    }

    pub fn get(&self, chain: TcrChain) -> &GermlineDatabase {
        match chain {
            TcrChain::TRA => &self.tra,
            TcrChain::TRB => &self.trb,
        }
    }
}

/// One input line: a clone name plus the minimal description of each chain.
#[derive(Debug, Clone)]
pub struct PairedRearrangement {
    pub name: String,
    pub alpha_cdr3: String,
    pub alpha_v: String,
    pub alpha_j: String,
    pub beta_cdr3: String,
    pub beta_v: String,
    pub beta_j: String,
}

const EXPECTED_COLUMNS: usize = 7;

/// Read the TSV, skipping its header line.
pub fn read_pairs(path: &Path) -> Result<Vec<PairedRearrangement>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {path:?}"))?;

    let mut pairs = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading {path:?}"))?;
        if record.len() < EXPECTED_COLUMNS {
            bail!(
                "line {} of {path:?} has {} columns; expected {EXPECTED_COLUMNS} \
                 (name, alpha CDR3/V/J, beta CDR3/V/J)",
                idx + 2,
                record.len()
            );
        }
        let field = |i: usize| record[i].trim().to_string();
        pairs.push(PairedRearrangement {
            name: field(0),
            alpha_cdr3: field(1),
            alpha_v: field(2),
            alpha_j: field(3),
            beta_cdr3: field(4),
            beta_v: field(5),
            beta_j: field(6),
        });
    }
    Ok(pairs)
}

/// Stitch both chains of one record, logging any advisories under the
/// record's name.
pub fn stitch_pair(
    pair: &PairedRearrangement,
    dbs: &ChainDbs,
    codons: &CodonTable,
) -> Result<(AssemblyResult, AssemblyResult)> {
    let one_chain = |v: &str, j: &str, cdr3: &str| -> Result<AssemblyResult> {
        let request = TcrRequest::new(v, j, cdr3, None, None)?;
        let result = stitch(&request, dbs.get(request.chain), codons)?;
        for warning in &result.warnings {
            warn!("{}: {warning}", pair.name);
        }
        Ok(result)
    };
    let alpha = one_chain(&pair.alpha_v, &pair.alpha_j, &pair.alpha_cdr3)
        .with_context(|| format!("{}: alpha chain", pair.name))?;
    let beta = one_chain(&pair.beta_v, &pair.beta_j, &pair.beta_cdr3)
        .with_context(|| format!("{}: beta chain", pair.name))?;
    Ok((alpha, beta))
}

/// Stitch every record and print both chains of each as FASTA, in input
/// order.
pub fn run(tsv: &Path, dbs: &ChainDbs, codons: &CodonTable) -> Result<()> {
    let pairs = read_pairs(tsv)?;
    let outcomes: Vec<_> = pairs
        .par_iter()
        .map(|pair| stitch_pair(pair, dbs, codons))
        .collect();

    let mut failures = 0usize;
    for (pair, outcome) in pairs.iter().zip(outcomes) {
        match outcome {
            Ok((alpha, beta)) => {
                print!(
                    ">{name}|TRA\n{}\n>{name}|TRB\n{}\n",
                    alpha.full_nt,
                    beta.full_nt,
                    name = pair.name
                );
            }
            Err(err) => {
                error!("{err:#}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        warn!("{failures} of {} records failed to stitch", pairs.len());
    }
    Ok(())
}
