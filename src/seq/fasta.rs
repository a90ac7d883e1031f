// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::debug;

use crate::errors::SeqPropError;
use crate::seq::file::{SeqFile, FASTA_EXTENSION, FASTA_LINE_WIDTH};
use crate::seq::record::SeqRecord;

fn record_from_header(hdr: &str) -> SeqRecord {
    let hdr = hdr.trim();
    let (id, description) = match hdr.split_once(char::is_whitespace) {
        Some((id, rest)) => (id, rest.trim()),
        None => (hdr, ""),
    };
    SeqRecord::new(id, description, String::new())
}

pub fn read_fasta_file<P: AsRef<Path>>(path: P) -> Result<SeqFile, SeqPropError> {
    let file = File::open(path)?;
    let mut result: SeqFile = Vec::new();
    let mut current_record: Option<SeqRecord> = None;

    for line in BufReader::new(file).lines() {
        let l = line?;
        let l = l.trim_end();
        if let Some(hdr) = l.strip_prefix('>') {
            // push existing record
            if let Some(rec) = current_record.take() {
                result.push(rec);
            }
            current_record = Some(record_from_header(hdr));
        } else if l.trim().is_empty() {
            continue;
        } else {
            // append line to current record's sequence
            match current_record.as_mut() {
                Some(rec) => rec.sequence.push_str(l.trim()),
                None => {
                    return Err(SeqPropError::Format(String::from(
                        "Sequence data before first FastA header",
                    )))
                }
            }
        }
    }
    if let Some(rec) = current_record {
        result.push(rec);
    }
    Ok(result)
}

// Reads a FastA file that must hold exactly one record.
pub fn read_single_fasta_record<P: AsRef<Path>>(path: P) -> Result<SeqRecord, SeqPropError> {
    let path = path.as_ref();
    let mut records = read_fasta_file(path)?;
    match records.len() {
        1 => Ok(records.remove(0)),
        0 => Err(SeqPropError::Format(format!(
            "{}: no FastA record found",
            path.display()
        ))),
        n => Err(SeqPropError::Format(format!(
            "{}: expected one FastA record, found {}",
            path.display(),
            n
        ))),
    }
}

// Writes `record` to <outdir>/<outname>.faa and returns that path. An existing file is left alone
// unless `force_rerun` is set. Without `outdir`, the current directory is used.
pub fn write_fasta_file(
    record: &SeqRecord,
    outname: &str,
    outdir: Option<&Path>,
    force_rerun: bool,
) -> Result<PathBuf, SeqPropError> {
    let outdir = outdir.unwrap_or_else(|| Path::new("."));
    if !outdir.is_dir() {
        return Err(SeqPropError::Validation(format!(
            "{}: folder does not exist",
            outdir.display()
        )));
    }
    let outfile = outdir.join(format!("{}.{}", outname, FASTA_EXTENSION));
    if outfile.exists() && !force_rerun {
        debug!("{}: file exists, not overwriting", outfile.display());
        return Ok(outfile);
    }

    let mut writer = BufWriter::new(File::create(&outfile)?);
    writeln!(writer, ">{}", record.header())?;
    // Wrap on characters, not bytes: a multi-byte symbol must not be split.
    for chunk in &record.sequence.chars().chunks(FASTA_LINE_WIDTH) {
        writeln!(writer, "{}", chunk.collect::<String>())?;
    }
    writer.flush()?;
    debug!("{}: wrote FastA file", outfile.display());
    Ok(outfile)
}

// True IFF both files hold one record each and their sequences are identical. Headers are not
// compared.
pub fn fasta_files_equal<P: AsRef<Path>, Q: AsRef<Path>>(
    seq_file1: P,
    seq_file2: Q,
) -> Result<bool, SeqPropError> {
    let rec1 = read_single_fasta_record(seq_file1)?;
    let rec2 = read_single_fasta_record(seq_file2)?;
    Ok(rec1.sequence == rec2.sequence)
}
