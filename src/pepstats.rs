// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use log::{debug, info};
use regex::Regex;

use crate::analysis::{FileAnalyzer, PropertyStats};
use crate::errors::SeqPropError;

const KEY_SUFFIX: &str = "-pepstats";

// Runs EMBOSS pepstats on a sequence file. The report is written next to the input, with a
// .pepstats extension, and reused on later calls unless `force_rerun` is set.
#[derive(Debug, Clone, Default)]
pub struct EmbossPepstats {
    bin_dir: Option<PathBuf>,
    force_rerun: bool,
}

impl EmbossPepstats {
    // Without `bin_dir`, pepstats is looked up in PATH.
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        EmbossPepstats {
            bin_dir,
            force_rerun: false,
        }
    }

    pub fn force_rerun(mut self, force: bool) -> Self {
        self.force_rerun = force;
        self
    }

    pub fn report_path(infile: &Path) -> PathBuf {
        infile.with_extension("pepstats")
    }

    pub fn run(&self, infile: &Path) -> Result<PathBuf, SeqPropError> {
        let outfile = Self::report_path(infile);
        if outfile.exists() && !self.force_rerun {
            debug!("{}: pepstats report exists, not rerunning", outfile.display());
            return Ok(outfile);
        }

        let tool_path = match &self.bin_dir {
            Some(dir) => dir.join("pepstats"),
            None => PathBuf::from("pepstats"),
        };
        info!("Running {} on {}", tool_path.display(), infile.display());
        let output = Command::new(&tool_path)
            .arg("-sequence")
            .arg(infile)
            .arg("-outfile")
            .arg(&outfile)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| SeqPropError::Tool(format!("Failed to run pepstats: {}", e)))?;
        if !output.status.success() {
            return Err(SeqPropError::Tool(format!(
                "pepstats failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(outfile)
    }
}

impl FileAnalyzer for EmbossPepstats {
    fn analyze_file(&self, path: &Path) -> Result<PropertyStats, SeqPropError> {
        let report = self.run(path)?;
        let text = fs::read_to_string(&report)?;
        parse_pepstats_report(&text)
    }
}

fn capture_number(text: &str, pattern: &str) -> Result<Option<f64>, SeqPropError> {
    let re = Regex::new(pattern)?;
    Ok(re
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok()))
}

// Parses the text of a pepstats report. Mole percentages of the property table are stored as
// fractions, under `mol_percent_<property>-pepstats`.
pub fn parse_pepstats_report(text: &str) -> Result<PropertyStats, SeqPropError> {
    let mut stats = PropertyStats::new();

    let molecular_weight = capture_number(text, r"Molecular weight\s*=\s*([-\d.]+)")?
        .ok_or_else(|| SeqPropError::Format(String::from("Not a pepstats report")))?;
    stats.insert(format!("molecular_weight{}", KEY_SUFFIX), molecular_weight);

    let fields = [
        ("residues", r"Residues\s*=\s*(\d+)"),
        ("average_residue_weight", r"Average Residue Weight\s*=\s*([-\d.]+)"),
        ("charge", r"Charge\s*=\s*([-\d.]+)"),
        // "None" when pepstats cannot find one; the key is then left out.
        ("isoelectric_point", r"Isoelectric Point\s*=\s*([-\d.]+)"),
        (
            "extinction_coefficient_reduced",
            r"A280 Molar Extinction Coefficients\s*=\s*([\d.]+) \(reduced\)",
        ),
        (
            "extinction_coefficient_cystines",
            r"A280 Molar Extinction Coefficients\s*=.*?([\d.]+) \(cystine bridges\)",
        ),
        (
            "inclusion_body_improbability",
            r"Improbability of expression in inclusion bodies\s*=\s*([\d.]+)",
        ),
    ];
    for (name, pattern) in fields {
        if let Some(value) = capture_number(text, pattern)? {
            stats.insert(format!("{}{}", name, KEY_SUFFIX), value);
        }
    }

    let property_rows = text
        .lines()
        .skip_while(|l| !l.starts_with("Property"))
        .skip(1)
        .take_while(|l| !l.trim().is_empty());
    for row in property_rows {
        let fields: Vec<&str> = row.split_whitespace().collect();
        let (Some(name), Some(percent)) = (fields.first(), fields.last()) else {
            continue;
        };
        let percent: f64 = percent
            .parse()
            .map_err(|_| SeqPropError::Format(format!("Bad pepstats property row: {}", row)))?;
        stats.insert(
            format!("mol_percent_{}{}", name.to_lowercase(), KEY_SUFFIX),
            percent / 100.0,
        );
    }

    Ok(stats)
}
