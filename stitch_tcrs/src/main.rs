//! stitch_tcrs
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.
#![deny(missing_docs)]

//! Command-line wrapper around the TCR stitching engine: stitch single
//! rearrangements to FASTA, batch-process TSV files of paired chains, and
//! design cloning primers for the stitched products.

mod batch;
mod primers;

use anyhow::{Context, Result};
use batch::ChainDbs;
use clap::{Parser, Subcommand};
use codon_usage::CodonTable;
use log::warn;
use std::path::{Path, PathBuf};
use tcr_germline::GermlineDatabase;
use tcr_stitch::{stitch, TcrRequest};
use tcr_types::TcrChain;

/// Stitch full-length TCR coding sequences from V/J gene names and CDR3s.
#[derive(Parser, Debug)]
#[clap(name = "stitch_tcrs")]
struct StitchTcrs {
    /// Directory holding the per-chain germline files (TRA.fasta, TRB.fasta)
    #[clap(long, default_value = "data")]
    data_dir: PathBuf,

    /// Kazusa-format codon usage table used for back-translation
    #[clap(long, default_value = "data/codon-usage.txt")]
    codon_usage: PathBuf,

    #[clap(subcommand)]
    subcmd: SubCommand,
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    /// Stitch one rearrangement and print it as FASTA
    Stitch {
        /// V gene name, allele optional (TRBV19 or TRBV19*01)
        #[clap(short, long)]
        v: String,

        /// J gene name, allele optional
        #[clap(short, long)]
        j: String,

        /// CDR3 amino acid sequence, conserved C/F residues included
        #[clap(long)]
        cdr3: String,

        /// Constant gene; inferred from the chain and J family if omitted
        #[clap(short, long)]
        constant: Option<String>,

        /// Leader gene; defaults to the V gene
        #[clap(short, long)]
        leader: Option<String>,

        /// Name carried into the FASTA header
        #[clap(short, long, default_value = "")]
        name: String,
    },

    /// Stitch every paired rearrangement in a TSV file
    ///
    /// Columns: clone name, alpha CDR3, alpha V, alpha J, beta CDR3,
    /// beta V, beta J. The first line is treated as a header. Records fail
    /// independently; a bad line never aborts the rest of the file.
    Batch {
        /// Input TSV
        tsv: PathBuf,
    },

    /// Stitch a TSV of paired rearrangements and design cloning primers
    Primers {
        /// Input TSV, same columns as `batch`
        tsv: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = StitchTcrs::parse();

    let (codons, advisories) = CodonTable::from_path(&args.codon_usage)
        .with_context(|| format!("loading codon usage from {:?}", args.codon_usage))?;
    for advisory in &advisories {
        warn!("{advisory}");
    }

    match args.subcmd {
        SubCommand::Stitch {
            v,
            j,
            cdr3,
            constant,
            leader,
            name,
        } => {
            let request = TcrRequest::new(&v, &j, &cdr3, constant.as_deref(), leader.as_deref())?;
            let db = load_chain_db(&args.data_dir, request.chain)?;
            let result = stitch(&request, &db, &codons)?;
            for warning in &result.warnings {
                warn!("{warning}");
            }
            print!("{}", fasta_entry(&name, &request, &result.full_nt));
        }
        SubCommand::Batch { tsv } => {
            let dbs = ChainDbs::load(&args.data_dir)?;
            batch::run(&tsv, &dbs, &codons)?;
        }
        SubCommand::Primers { tsv } => {
            let dbs = ChainDbs::load(&args.data_dir)?;
            primers::run(&tsv, &dbs, &codons)?;
        }
    }
    Ok(())
}

fn load_chain_db(data_dir: &Path, chain: TcrChain) -> Result<GermlineDatabase> {
    let path = data_dir.join(format!("{chain}.fasta"));
    GermlineDatabase::from_fasta_path(&path)
        .with_context(|| format!("loading {chain} germline data"))
}

/// One single-line FASTA entry, headed name|V*allele|J*allele|C*allele|CDR3.
fn fasta_entry(name: &str, request: &TcrRequest, seq: &str) -> String {
    let mut header = String::from(">");
    if !name.is_empty() {
        header.push_str(name);
        header.push('|');
    }
    format!(
        "{header}{}|{}|{}|{}\n{seq}\n",
        request.v, request.j, request.constant, request.cdr3_aa
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fasta_entry() {
        let request = TcrRequest::new("TRBV19", "TRBJ2-7", "CASSLGVSSYEQYF", None, None).unwrap();
        assert_eq!(
            fasta_entry("clone1", &request, "ATGAAA"),
            ">clone1|TRBV19*01|TRBJ2-7*01|TRBC2*01|CASSLGVSSYEQYF\nATGAAA\n"
        );
        assert!(fasta_entry("", &request, "ATGAAA").starts_with(">TRBV19*01|"));
    }
}
