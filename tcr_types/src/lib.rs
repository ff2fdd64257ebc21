//! tcr_types
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.
#![expect(missing_docs)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TCR_CHAINS: [&str; 2] = ["TRA", "TRB"];

/// The two TCR chains that can be stitched.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub enum TcrChain {
    TRA,
    TRB,
}

impl TcrChain {
    pub fn all() -> [Self; 2] {
        [TcrChain::TRA, TcrChain::TRB]
    }

    /// The chain whose name prefixes the given gene name, if any.
    /// IMGT gene names carry their chain up front (TRBV19, TRAJ33, TRBC2).
    pub fn of_gene(gene: &str) -> Option<Self> {
        TcrChain::all()
            .into_iter()
            .find(|chain| gene.starts_with(<&str>::from(*chain)))
    }
}

impl fmt::Display for TcrChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", <&str>::from(*self))
    }
}

impl From<TcrChain> for &'static str {
    fn from(chain: TcrChain) -> &'static str {
        match chain {
            TcrChain::TRA => "TRA",
            TcrChain::TRB => "TRB",
        }
    }
}

impl FromStr for TcrChain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRA" => Ok(TcrChain::TRA),
            "TRB" => Ok(TcrChain::TRB),
            unknown => Err(format!(
                "Unknown variant '{}' for TcrChain. Supported variants are: [{}]",
                unknown,
                TCR_CHAINS.join(", ")
            )),
        }
    }
}

/// Germline gene region types that contribute material to a stitched
/// transcript, named by their IMGT sequence labels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub enum GeneRegion {
    #[serde(rename = "L-PART1+L-PART2")]
    Leader,
    #[serde(rename = "V-REGION")]
    V,
    #[serde(rename = "J-REGION")]
    J,
    #[serde(rename = "EX1+EX2+EX3+EX4")]
    Constant,
}

impl GeneRegion {
    pub fn all() -> [Self; 4] {
        [
            GeneRegion::Leader,
            GeneRegion::V,
            GeneRegion::J,
            GeneRegion::Constant,
        ]
    }

    /// The IMGT label this region is announced under in reference headers.
    pub fn imgt_label(self) -> &'static str {
        match self {
            GeneRegion::Leader => "L-PART1+L-PART2",
            GeneRegion::V => "V-REGION",
            GeneRegion::J => "J-REGION",
            GeneRegion::Constant => "EX1+EX2+EX3+EX4",
        }
    }
}

impl fmt::Display for GeneRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.imgt_label())
    }
}

impl FromStr for GeneRegion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "L-PART1+L-PART2" => Ok(GeneRegion::Leader),
            "V-REGION" => Ok(GeneRegion::V),
            "J-REGION" => Ok(GeneRegion::J),
            // Spliced constant exons; gene-DB releases label TCR constant
            // regions either way.
            "EX1+EX2+EX3+EX4" | "C-REGION" => Ok(GeneRegion::Constant),
            unknown => Err(format!(
                "Unknown region label '{unknown}'. Supported labels are: \
                 [L-PART1+L-PART2, V-REGION, J-REGION, EX1+EX2+EX3+EX4, C-REGION]"
            )),
        }
    }
}

/// A germline gene identifier: gene name plus allele, displayed IMGT-style as
/// gene*allele (e.g. TRBV19*01). Parsing uppercases the input and fills in
/// allele 01 when none is given.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct GeneId {
    pub gene: String,
    pub allele: String,
}

pub const DEFAULT_ALLELE: &str = "01";

impl GeneId {
    pub fn new(gene: impl Into<String>, allele: impl Into<String>) -> Self {
        GeneId {
            gene: gene.into(),
            allele: allele.into(),
        }
    }

    pub fn with_default_allele(gene: impl Into<String>) -> Self {
        GeneId::new(gene, DEFAULT_ALLELE)
    }
}

impl fmt::Display for GeneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*{}", self.gene, self.allele)
    }
}

impl FromStr for GeneId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let mut parts = upper.split('*');
        let gene = parts.next().unwrap_or_default();
        if gene.is_empty() {
            return Err(format!("Empty gene name in '{s}'"));
        }
        let allele = parts.next().unwrap_or(DEFAULT_ALLELE);
        if allele.is_empty() || parts.next().is_some() {
            return Err(format!(
                "Expected 'GENE' or 'GENE*ALLELE' (e.g. TRBV19 or TRBV19*01), got '{s}'"
            ));
        }
        Ok(GeneId::new(gene, allele))
    }
}

/// Non-fatal conditions surfaced alongside a result rather than failing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Advisory {
    /// The codon usage table covers fewer than the 20 standard residues.
    IncompleteCodonTable { residues: usize },
    /// The germline J contribution resolved to an unusually short match.
    ShortJMatch { matched: String },
    /// A requested allele is not annotated as functional.
    NonFunctionalGene {
        gene: String,
        allele: String,
        functionality: String,
    },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::IncompleteCodonTable { residues } => write!(
                f,
                "incomplete codon usage table: only {residues} amino acids are covered, \
                 so back-translation of the missing residues will fail"
            ),
            Advisory::ShortJMatch { matched } => write!(
                f,
                "the J gene match was only \"{matched}\"; most CDR3s retain longer J gene \
                 segments than this, so the C-terminal junction may be worth verifying"
            ),
            Advisory::NonFunctionalGene {
                gene,
                allele,
                functionality,
            } => write!(
                f,
                "{gene}*{allele} is annotated '{functionality}', not as a functional gene"
            ),
        }
    }
}
