// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

// Protein property statistics. A SequenceAnalyzer works on the residue string in-process; a
// FileAnalyzer works on a sequence file, usually by running an external program (see pepstats).
// Either way the resulting map is merged into the record's whole-sequence annotations.

use std::{collections::BTreeMap, path::Path};

use crate::errors::SeqPropError;

// Statistic name -> value.
pub type PropertyStats = BTreeMap<String, f64>;

pub trait SequenceAnalyzer {
    // Fails with SeqPropError::UnknownResidue on a symbol it cannot handle.
    fn analyze(&self, sequence: &str) -> Result<PropertyStats, SeqPropError>;
}

pub trait FileAnalyzer {
    fn analyze_file(&self, path: &Path) -> Result<PropertyStats, SeqPropError>;
}

const KEY_SUFFIX: &str = "-analysis";

// (residue, average mass of the free amino acid, Kyte-Doolittle hydropathy)
const RESIDUES: [(char, f64, f64); 20] = [
    ('A', 89.0932, 1.8),
    ('C', 121.1582, 2.5),
    ('D', 133.1027, -3.5),
    ('E', 147.1293, -3.5),
    ('F', 165.1891, 2.8),
    ('G', 75.0666, -0.4),
    ('H', 155.1546, -3.2),
    ('I', 131.1729, 4.5),
    ('K', 146.1876, -3.9),
    ('L', 131.1729, 3.8),
    ('M', 149.2113, 1.9),
    ('N', 132.1179, -3.5),
    ('P', 115.1305, -1.6),
    ('Q', 146.1445, -3.5),
    ('R', 174.201, -4.5),
    ('S', 105.0926, -0.8),
    ('T', 119.1192, -0.7),
    ('V', 117.1463, 4.2),
    ('W', 204.2252, -0.9),
    ('Y', 181.1885, -1.3),
];

const WATER_MASS: f64 = 18.01528;

// pKa values (EMBOSS)
const PKA_NTERM: f64 = 8.6;
const PKA_CTERM: f64 = 3.6;
const PKA_D: f64 = 3.9;
const PKA_E: f64 = 4.1;
const PKA_C: f64 = 8.5;
const PKA_Y: f64 = 10.1;
const PKA_H: f64 = 6.5;
const PKA_K: f64 = 10.8;
const PKA_R: f64 = 12.5;

// Molar absorptivity at 280 nm
const EXT_TRP: f64 = 5500.0;
const EXT_TYR: f64 = 1490.0;
const EXT_CYSTINE: f64 = 125.0;

// Residues counted towards the naive secondary structure fractions.
const HELIX_FORMERS: &str = "VIYFWL";
const TURN_FORMERS: &str = "NPGS";
const SHEET_FORMERS: &str = "EMAL";

fn residue_index(aa: char) -> Option<usize> {
    RESIDUES.iter().position(|&(r, _, _)| r == aa)
}

// Uppercases and checks every residue against the 20 standard amino acids, returning per-residue
// counts.
fn residue_counts(sequence: &str) -> Result<[usize; 20], SeqPropError> {
    let mut counts = [0usize; 20];
    for (i, c) in sequence.chars().enumerate() {
        let aa = c.to_ascii_uppercase();
        match residue_index(aa) {
            Some(idx) => counts[idx] += 1,
            None => {
                return Err(SeqPropError::UnknownResidue {
                    residue: c,
                    position: i + 1,
                })
            }
        }
    }
    Ok(counts)
}

fn count_of(counts: &[usize; 20], aa: char) -> usize {
    residue_index(aa).map(|i| counts[i]).unwrap_or(0)
}

fn fraction_of(counts: &[usize; 20], residues: &str, len: usize) -> f64 {
    let n: usize = residues.chars().map(|aa| count_of(counts, aa)).sum();
    n as f64 / len as f64
}

fn net_charge(counts: &[usize; 20], ph: f64) -> f64 {
    let positive = |pka: f64| 1.0 / (1.0 + 10_f64.powf(ph - pka));
    let negative = |pka: f64| 1.0 / (1.0 + 10_f64.powf(pka - ph));
    let n = |aa: char| count_of(counts, aa) as f64;

    positive(PKA_NTERM) - negative(PKA_CTERM)
        + n('K') * positive(PKA_K)
        + n('R') * positive(PKA_R)
        + n('H') * positive(PKA_H)
        - n('D') * negative(PKA_D)
        - n('E') * negative(PKA_E)
        - n('C') * negative(PKA_C)
        - n('Y') * negative(PKA_Y)
}

// Bisection on the Henderson-Hasselbalch net charge.
fn isoelectric_point(counts: &[usize; 20]) -> f64 {
    let mut lo = 0.0_f64;
    let mut hi = 14.0_f64;
    for _ in 0..100 {
        let mid = (lo + hi) / 2.0;
        let charge = net_charge(counts, mid);
        if charge.abs() < 0.0001 {
            return mid;
        }
        if charge > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (lo + hi) / 2.0
}

// Built-in analyzer over the 20 standard amino acids (case-insensitive). Any other symbol,
// including ambiguity codes and gaps, is rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProteinAnalysis;

impl SequenceAnalyzer for ProteinAnalysis {
    fn analyze(&self, sequence: &str) -> Result<PropertyStats, SeqPropError> {
        let counts = residue_counts(sequence)?;
        let len: usize = counts.iter().sum();
        if len == 0 {
            return Err(SeqPropError::Validation(String::from(
                "cannot analyze an empty sequence",
            )));
        }

        let mass: f64 = RESIDUES
            .iter()
            .zip(counts.iter())
            .map(|(&(_, w, _), &n)| w * n as f64)
            .sum::<f64>()
            - (len - 1) as f64 * WATER_MASS;
        let hydropathy: f64 = RESIDUES
            .iter()
            .zip(counts.iter())
            .map(|(&(_, _, kd), &n)| kd * n as f64)
            .sum();
        let reduced = count_of(&counts, 'W') as f64 * EXT_TRP + count_of(&counts, 'Y') as f64 * EXT_TYR;
        let cystines = reduced + (count_of(&counts, 'C') / 2) as f64 * EXT_CYSTINE;

        let mut stats = PropertyStats::new();
        let mut put = |name: &str, value: f64| {
            stats.insert(format!("{}{}", name, KEY_SUFFIX), value);
        };
        put("length", len as f64);
        put("molecular_weight", mass);
        put("aromaticity", fraction_of(&counts, "FWY", len));
        put("gravy", hydropathy / len as f64);
        put("isoelectric_point", isoelectric_point(&counts));
        put("extinction_coefficient_reduced", reduced);
        put("extinction_coefficient_cystines", cystines);
        put("percent_helix_naive", fraction_of(&counts, HELIX_FORMERS, len));
        put("percent_turn_naive", fraction_of(&counts, TURN_FORMERS, len));
        put("percent_strand_naive", fraction_of(&counts, SHEET_FORMERS, len));
        for (&(aa, _, _), &n) in RESIDUES.iter().zip(counts.iter()) {
            put(&format!("percent_{}", aa), n as f64 / len as f64);
        }
        Ok(stats)
    }
}
