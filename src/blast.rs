// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::SeqPropError;

// Columns requested from blastp; parse_blast_tabular() expects them in this order.
const TABULAR_FIELDS: &str =
    "6 qseqid sseqid pident length nident mismatch gapopen qstart qend sstart send evalue bitscore";

// Everything a structure search needs to know. `outfile` is a file name inside `outdir`.
#[derive(Debug, Clone)]
pub struct StructureSearchRequest<'a> {
    pub sequence: &'a str,
    pub outfile: String,
    pub outdir: &'a Path,
    pub force_rerun: bool,
    pub evalue: f64,
    // Minimum fraction (0-1) of identical residues.
    pub seq_ident_cutoff: f64,
    pub display_link: bool,
}

impl StructureSearchRequest<'_> {
    pub fn outpath(&self) -> PathBuf {
        self.outdir.join(&self.outfile)
    }
}

pub trait StructureSearch {
    // Implementations report network trouble as SeqPropError::Connection.
    fn search(&self, request: &StructureSearchRequest) -> Result<Vec<BlastHit>, SeqPropError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastHit {
    pub hit_pdb: String,
    pub hit_pdb_chain: Option<String>,
    pub hit_percent_ident: f64,
    pub hit_num_ident: usize,
    pub hit_align_len: usize,
    pub hit_query_start: usize,
    pub hit_query_end: usize,
    pub hit_evalue: f64,
    pub hit_score: f64,
}

impl BlastHit {
    pub fn rcsb_link(&self) -> String {
        format!("https://www.rcsb.org/structure/{}", self.hit_pdb.to_uppercase())
    }
}

// Subject ids come as "pdb|1ABC|A" from the remote service, or "1ABC_A" from local copies of the
// database.
fn split_subject_id(sseqid: &str) -> (String, Option<String>) {
    let parts: Vec<&str> = sseqid.split('|').collect();
    let (pdb, chain) = match parts.as_slice() {
        ["pdb", pdb, chain, ..] => (*pdb, Some(*chain)),
        [pdb_chain] => match pdb_chain.split_once('_') {
            Some((pdb, chain)) => (pdb, Some(chain)),
            None => (*pdb_chain, None),
        },
        _ => (sseqid, None),
    };
    (
        pdb.to_lowercase(),
        chain.filter(|c| !c.is_empty()).map(str::to_string),
    )
}

fn field<T: std::str::FromStr>(fields: &[&str], i: usize, line: &str) -> Result<T, SeqPropError> {
    fields
        .get(i)
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| SeqPropError::Format(format!("Bad BLAST tabular line: {}", line)))
}

// Parses BLAST tabular output (see TABULAR_FIELDS), keeping hits with an e-value of at most
// `evalue` and an identity of at least `seq_ident_cutoff` (a fraction). Comment lines are skipped.
pub fn parse_blast_tabular(
    text: &str,
    evalue: f64,
    seq_ident_cutoff: f64,
) -> Result<Vec<BlastHit>, SeqPropError> {
    let mut hits = Vec::new();
    for line in text.lines() {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        if fields.len() < 13 {
            return Err(SeqPropError::Format(format!(
                "Bad BLAST tabular line: {}",
                line
            )));
        }
        let (hit_pdb, hit_pdb_chain) = split_subject_id(fields[1]);
        let pident: f64 = field(&fields, 2, line)?;
        let hit = BlastHit {
            hit_pdb,
            hit_pdb_chain,
            hit_percent_ident: pident / 100.0,
            hit_align_len: field(&fields, 3, line)?,
            hit_num_ident: field(&fields, 4, line)?,
            hit_query_start: field(&fields, 7, line)?,
            hit_query_end: field(&fields, 8, line)?,
            hit_evalue: field(&fields, 11, line)?,
            hit_score: field(&fields, 12, line)?,
        };
        if hit.hit_evalue > evalue || hit.hit_percent_ident < seq_ident_cutoff {
            debug!("Dropping BLAST hit {} (filtered)", fields[1]);
            continue;
        }
        hits.push(hit);
    }
    Ok(hits)
}

// Tells a network problem apart from any other blastp failure, going by its error output.
pub fn is_connection_failure(stderr: &str) -> bool {
    Regex::new(r"(?i)(connect|network|timed? ?out|resolve host|unreachable|HTTP)")
        .map(|re| re.is_match(stderr))
        .unwrap_or(false)
}

fn classify_failure(stderr: &str) -> SeqPropError {
    let stderr = stderr.trim().to_string();
    if is_connection_failure(&stderr) {
        SeqPropError::Connection(stderr)
    } else {
        SeqPropError::Tool(format!("blastp failed: {}", stderr))
    }
}

// Runs NCBI blastp against the PDB database over the network (`-remote`). The tabular report is
// kept in the request's output directory and reused unless `force_rerun` is set.
#[derive(Debug, Clone, Default)]
pub struct RemoteBlastp {
    bin_dir: Option<PathBuf>,
}

impl RemoteBlastp {
    // Without `bin_dir`, blastp is looked up in PATH.
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        RemoteBlastp { bin_dir }
    }

    fn run(&self, request: &StructureSearchRequest, outpath: &Path) -> Result<(), SeqPropError> {
        let tool_path = match &self.bin_dir {
            Some(dir) => dir.join("blastp"),
            None => PathBuf::from("blastp"),
        };
        info!("Submitting BLAST search against the PDB ({})", tool_path.display());
        let mut child = Command::new(&tool_path)
            .arg("-remote")
            .args(["-db", "pdb"])
            .args(["-query", "-"])
            .arg("-evalue")
            .arg(request.evalue.to_string())
            .args(["-outfmt", TABULAR_FIELDS])
            .arg("-out")
            .arg(outpath)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SeqPropError::Tool(format!("Failed to run blastp: {}", e)))?;
        // The child is always reaped; a failed write usually means blastp exited early, and its
        // stderr says why.
        let write_result = match child.stdin.take() {
            Some(mut stdin) => writeln!(stdin, ">query\n{}", request.sequence),
            None => Ok(()),
        };
        let output = child.wait_with_output()?;
        if !output.status.success() {
            // Don't leave a half-written report to be picked up next time.
            fs::remove_file(outpath).ok();
            return Err(classify_failure(&String::from_utf8_lossy(&output.stderr)));
        }
        write_result?;
        Ok(())
    }
}

impl StructureSearch for RemoteBlastp {
    fn search(&self, request: &StructureSearchRequest) -> Result<Vec<BlastHit>, SeqPropError> {
        let outpath = request.outpath();
        if outpath.exists() && !request.force_rerun {
            debug!("{}: BLAST results exist, not rerunning", outpath.display());
        } else {
            self.run(request, &outpath)?;
        }
        let text = fs::read_to_string(&outpath)?;
        let hits = parse_blast_tabular(&text, request.evalue, request.seq_ident_cutoff)?;
        info!("{}: {} PDB hits", request.outfile, hits.len());
        if request.display_link {
            for hit in &hits {
                info!("{}", hit.rcsb_link());
            }
        }
        Ok(hits)
    }
}

// Keeps letters, digits and "-_."; every other run of characters becomes a single '-'.
pub fn slugify(s: &str) -> String {
    match Regex::new(r"[^A-Za-z0-9_.\-]+") {
        Ok(re) => re.replace_all(s, "-").trim_matches('-').to_string(),
        Err(_) => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_blast_tabular() {
        let text = fs::read_to_string("data/P0A7B8_blast_pdb.txt").expect("Test file not found");
        let hits = parse_blast_tabular(&text, 0.0001, 0.0).unwrap();
        // The last hit has an e-value of 0.0021.
        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].hit_pdb, "1g3k");
        assert_eq!(hits[0].hit_pdb_chain.as_deref(), Some("A"));
        assert_eq!(hits[0].hit_num_ident, 174);
        assert_relative_eq!(hits[2].hit_percent_ident, 0.46821, epsilon = 1e-12);
        assert_relative_eq!(hits[3].hit_evalue, 8.0e-41);
        assert_relative_eq!(hits[3].hit_score, 140.0);
    }

    #[test]
    fn test_parse_blast_identity_cutoff() {
        let text = fs::read_to_string("data/P0A7B8_blast_pdb.txt").expect("Test file not found");
        let hits = parse_blast_tabular(&text, 10.0, 0.9).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.hit_pdb.as_str()).collect();
        assert_eq!(ids, vec!["1g3k", "1ned"]);
    }

    #[test]
    fn test_parse_blast_bad_line() {
        assert!(parse_blast_tabular("q\tpdb|1ABC|A\tnot-a-number", 1.0, 0.0).is_err());
    }

    #[test]
    fn test_split_subject_id() {
        assert_eq!(
            split_subject_id("pdb|1NED|B"),
            (String::from("1ned"), Some(String::from("B")))
        );
        assert_eq!(
            split_subject_id("5JI3_C"),
            (String::from("5ji3"), Some(String::from("C")))
        );
        assert_eq!(split_subject_id("5JI3"), (String::from("5ji3"), None));
    }

    #[test]
    fn test_connection_failure_detection() {
        assert!(is_connection_failure(
            "Error: [blastp] Failed to connect to blast.ncbi.nlm.nih.gov"
        ));
        assert!(is_connection_failure("Error: Request timed out"));
        assert!(!is_connection_failure(
            "BLAST query/options error: Argument \"evalue\". Illegal value"
        ));
    }

    #[test]
    fn test_existing_results_are_reused() {
        let dir = tempfile::tempdir().unwrap();
        fs::copy(
            "data/P0A7B8_blast_pdb.txt",
            dir.path().join("P0A7B8_blast_pdb.txt"),
        )
        .unwrap();
        let request = StructureSearchRequest {
            sequence: "MTTIVSVRRNGHVVIAGDGQ",
            outfile: String::from("P0A7B8_blast_pdb.txt"),
            outdir: dir.path(),
            force_rerun: false,
            evalue: 0.0001,
            seq_ident_cutoff: 0.0,
            display_link: true,
        };
        let blastp = RemoteBlastp::new(Some(PathBuf::from("/nonexistent/blast")));
        let hits = blastp.search(&request).unwrap();
        assert_eq!(hits.len(), 4);
        assert_eq!(hits[1].rcsb_link(), "https://www.rcsb.org/structure/1NED");
    }

    #[test]
    fn test_classify_failure() {
        assert!(matches!(
            classify_failure("Error: Could not resolve host: blast.ncbi.nlm.nih.gov\n"),
            SeqPropError::Connection(ref m) if m == "Error: Could not resolve host: blast.ncbi.nlm.nih.gov"
        ));
        assert!(matches!(
            classify_failure("BLAST query/options error: bad e-value"),
            SeqPropError::Tool(ref m) if m == "blastp failed: BLAST query/options error: bad e-value"
        ));
    }

    // A blastp that quits without reading its input still gets its stderr reported.
    #[cfg(unix)]
    #[test]
    fn test_early_exit_reports_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("blastp");
        fs::write(&tool, "#!/bin/sh\necho 'connection timed out' >&2\nexit 2\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        let sequence = "M".repeat(1 << 20);
        let request = StructureSearchRequest {
            sequence: &sequence,
            outfile: String::from("q_blast_pdb.txt"),
            outdir: dir.path(),
            force_rerun: false,
            evalue: 0.0001,
            seq_ident_cutoff: 0.0,
            display_link: false,
        };
        let blastp = RemoteBlastp::new(Some(dir.path().to_path_buf()));
        let err = blastp.search(&request).unwrap_err();
        assert!(matches!(err, SeqPropError::Connection(ref m) if m == "connection timed out"));
        assert!(!dir.path().join("q_blast_pdb.txt").exists());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("sp|P0A7B8|HSLV_ECOLI"), "sp-P0A7B8-HSLV_ECOLI");
        assert_eq!(slugify("b0870 (E. coli)"), "b0870-E.-coli");
        assert_eq!(slugify("YP_001.2"), "YP_001.2");
    }
}
