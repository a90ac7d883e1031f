// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

// A protein sequence and what is known about it: database cross-references, the sequence with its
// annotations, pointers to the FastA and metadata files, and alignments to other sequences and to
// structures. External programs are reached through the traits in analysis and blast.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::alignment::AlignmentList;
use crate::analysis::{FileAnalyzer, PropertyStats, ProteinAnalysis, SequenceAnalyzer};
use crate::blast::{slugify, BlastHit, StructureSearch, StructureSearchRequest};
use crate::errors::SeqPropError;
use crate::mutations::{summarize_mutations, MutationSummary};
use crate::seq::fasta;
use crate::seq::record::{LetterAnnotation, SeqInput, SeqRecord};

pub const DEFAULT_DESCRIPTION: &str = "<unknown description>";

// Where a directory + file name pair points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLocation {
    // At least one half is unset.
    NotConfigured { dir_set: bool, file_set: bool },
    // Both halves are set, but there is no such file.
    Missing(PathBuf),
    Present(PathBuf),
}

impl FileLocation {
    fn locate(dir: Option<&Path>, file: Option<&str>) -> Self {
        match (dir, file) {
            (Some(dir), Some(file)) => {
                let path = dir.join(file);
                if path.exists() {
                    FileLocation::Present(path)
                } else {
                    FileLocation::Missing(path)
                }
            }
            _ => FileLocation::NotConfigured {
                dir_set: dir.is_some(),
                file_set: file.is_some(),
            },
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            FileLocation::Present(p) => Some(p),
            _ => None,
        }
    }
}

fn validate_dir(path: &Path) -> Result<(), SeqPropError> {
    if !path.is_dir() {
        return Err(SeqPropError::Validation(format!(
            "{}: folder does not exist",
            path.display()
        )));
    }
    Ok(())
}

// "some/dir/file.faa" -> ("some/dir", "file.faa"). A bare file name lives in the current
// directory.
fn split_path(path: &Path) -> Result<(PathBuf, String), SeqPropError> {
    let file = path
        .file_name()
        .and_then(|f| f.to_str())
        .ok_or_else(|| SeqPropError::Validation(format!("{}: no file name", path.display())))?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file.to_string()))
}

// Options for SeqProp::blast_pdb().
#[derive(Debug, Clone)]
pub struct BlastPdbOptions {
    pub seq_ident_cutoff: f64,
    pub evalue: f64,
    pub display_link: bool,
    // Defaults to the sequence directory.
    pub outdir: Option<PathBuf>,
    pub force_rerun: bool,
}

impl Default for BlastPdbOptions {
    fn default() -> Self {
        BlastPdbOptions {
            seq_ident_cutoff: 0.0,
            evalue: 0.0001,
            display_link: false,
            outdir: None,
            force_rerun: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeqProp {
    pub id: String,
    pub description: String,

    pub bigg: Option<String>,
    pub kegg: Option<String>,
    pub refseq: Option<String>,
    pub uniprot: Option<String>,
    pub gene_name: Option<String>,
    pub pdbs: Option<Vec<String>>,

    pub seq_record: Option<SeqRecord>,

    sequence_dir: Option<PathBuf>,
    pub sequence_file: Option<String>,
    metadata_dir: Option<PathBuf>,
    pub metadata_file: Option<String>,

    #[serde(default)]
    pub sequence_alignments: AlignmentList,
    #[serde(default)]
    pub structure_alignments: AlignmentList,
}

impl SeqProp {
    pub fn new(id: impl Into<String>) -> Self {
        SeqProp {
            id: id.into(),
            description: String::from(DEFAULT_DESCRIPTION),
            bigg: None,
            kegg: None,
            refseq: None,
            uniprot: None,
            gene_name: None,
            pdbs: None,
            seq_record: None,
            sequence_dir: None,
            sequence_file: None,
            metadata_dir: None,
            metadata_file: None,
            sequence_alignments: AlignmentList::new(),
            structure_alignments: AlignmentList::new(),
        }
    }

    pub fn builder(id: impl Into<String>) -> SeqPropBuilder {
        SeqPropBuilder::new(id)
    }

    // Shortcut for a record that only has a payload.
    pub fn with_seq(id: impl Into<String>, seq: impl Into<SeqInput>) -> Self {
        let mut seq_prop = SeqProp::new(id);
        seq_prop.set_seq(seq);
        seq_prop
    }

    pub fn set_seq(&mut self, seq: impl Into<SeqInput>) {
        self.seq_record = Some(seq.into().into_record(&self.id, &self.description));
    }

    // Derived properties

    pub fn seq_str(&self) -> Option<&str> {
        self.seq_record.as_ref().map(|r| r.sequence.as_str())
    }

    pub fn seq_len(&self) -> usize {
        self.seq_record.as_ref().map_or(0, SeqRecord::len)
    }

    pub fn num_pdbs(&self) -> usize {
        self.pdbs.as_ref().map_or(0, Vec::len)
    }

    // A non-empty sequence, if any.
    fn nonempty_seq(&self) -> Option<&str> {
        self.seq_str().filter(|s| !s.is_empty())
    }

    // File pointers

    pub fn sequence_dir(&self) -> Option<&Path> {
        self.sequence_dir.as_deref()
    }

    // On failure, the current directory is kept.
    pub fn set_sequence_dir(&mut self, path: impl AsRef<Path>) -> Result<(), SeqPropError> {
        let path = path.as_ref();
        validate_dir(path)?;
        self.sequence_dir = Some(path.to_path_buf());
        Ok(())
    }

    pub fn metadata_dir(&self) -> Option<&Path> {
        self.metadata_dir.as_deref()
    }

    pub fn set_metadata_dir(&mut self, path: impl AsRef<Path>) -> Result<(), SeqPropError> {
        let path = path.as_ref();
        validate_dir(path)?;
        self.metadata_dir = Some(path.to_path_buf());
        Ok(())
    }

    pub fn sequence_location(&self) -> FileLocation {
        FileLocation::locate(self.sequence_dir.as_deref(), self.sequence_file.as_deref())
    }

    pub fn metadata_location(&self) -> FileLocation {
        FileLocation::locate(self.metadata_dir.as_deref(), self.metadata_file.as_deref())
    }

    fn resolve(&self, kind: &str, location: FileLocation) -> Result<Option<PathBuf>, SeqPropError> {
        match location {
            FileLocation::Present(path) => Ok(Some(std::path::absolute(path)?)),
            FileLocation::Missing(path) => Err(SeqPropError::FileNotFound(path)),
            FileLocation::NotConfigured { dir_set, file_set } => {
                if !dir_set {
                    debug!("{}: {} directory not set", self.id, kind);
                }
                if !file_set {
                    debug!("{}: {} file not available", self.id, kind);
                }
                Ok(None)
            }
        }
    }

    // The absolute path of the sequence file. Ok(None) if the directory or the file name is not
    // set; an error if both are set but the file is not there.
    pub fn sequence_path(&self) -> Result<Option<PathBuf>, SeqPropError> {
        self.resolve("sequence", self.sequence_location())
    }

    pub fn metadata_path(&self) -> Result<Option<PathBuf>, SeqPropError> {
        self.resolve("metadata", self.metadata_location())
    }

    // Points the record at a FastA file holding exactly one sequence, and loads that sequence.
    // Nothing is changed if the file cannot be read.
    pub fn load_sequence_path(&mut self, path: impl AsRef<Path>) -> Result<(), SeqPropError> {
        let path = path.as_ref();
        let (dir, file) = split_path(path)?;
        validate_dir(&dir)?;
        let record = fasta::read_single_fasta_record(path)?;
        self.sequence_dir = Some(dir);
        self.sequence_file = Some(file);
        self.seq_record = Some(record);
        debug!("{}: loaded sequence from {}", self.id, path.display());
        Ok(())
    }

    // Only the location is recorded; the content is not read.
    pub fn load_metadata_file(&mut self, path: impl AsRef<Path>) -> Result<(), SeqPropError> {
        let (dir, file) = split_path(path.as_ref())?;
        validate_dir(&dir)?;
        self.metadata_dir = Some(dir);
        self.metadata_file = Some(file);
        Ok(())
    }

    // Writes the sequence to <outdir>/<outname>.faa (outname defaults to the id) and points the
    // record at the new file, reloading the sequence from it.
    pub fn write_fasta_file(
        &mut self,
        outname: Option<&str>,
        outdir: Option<&Path>,
        force_rerun: bool,
    ) -> Result<PathBuf, SeqPropError> {
        let record = self
            .seq_record
            .as_ref()
            .ok_or_else(|| SeqPropError::Validation(format!("{}: no sequence loaded", self.id)))?;
        let outname = outname.unwrap_or(&self.id);
        let path = fasta::write_fasta_file(record, outname, outdir, force_rerun)?;
        self.load_sequence_path(&path)?;
        Ok(path)
    }

    // Comparisons

    pub fn equal_to(&self, other: Option<&SeqProp>) -> bool {
        let Some(mine) = self.nonempty_seq() else {
            return false;
        };
        match other.and_then(SeqProp::nonempty_seq) {
            Some(theirs) => mine == theirs,
            None => false,
        }
    }

    // Compares this record's sequence file to another FastA file. False (with an error logged)
    // when this record has no sequence file to compare.
    pub fn equal_to_fasta(&self, seq_file: impl AsRef<Path>) -> Result<bool, SeqPropError> {
        match self.sequence_location() {
            FileLocation::Present(path) => fasta::fasta_files_equal(path, seq_file),
            _ => {
                error!("{}: sequence file not available", self.id);
                Ok(false)
            }
        }
    }

    // Annotations

    // Replaces any annotation of the same name. The length is not checked against the sequence.
    pub fn load_letter_annotations(&mut self, name: &str, values: impl Into<LetterAnnotation>) {
        let Some(record) = self.seq_record.as_mut() else {
            error!("{}: no sequence loaded, cannot store \"{}\"", self.id, name);
            return;
        };
        let values = values.into();
        if values.len() != record.len() {
            debug!(
                "{}: \"{}\" has {} values for {} residues",
                self.id,
                name,
                values.len(),
                record.len()
            );
        }
        record.letter_annotations.insert(name.to_string(), values);
        debug!("{}: loaded letter_annotations and saved as \"{}\"", self.id, name);
    }

    fn merge_annotations(&mut self, stats: PropertyStats) -> Result<(), SeqPropError> {
        let record = self
            .seq_record
            .as_mut()
            .ok_or_else(|| SeqPropError::Validation(format!("{}: no sequence loaded", self.id)))?;
        for (k, v) in stats {
            record.annotations.insert(k, serde_json::Value::from(v));
        }
        Ok(())
    }

    // Runs `analyzer` on the sequence and stores the statistics in the record's annotations.
    // Returns false, with an error logged, if there is no sequence or it has a residue the
    // analyzer does not know; nothing is stored then.
    pub fn get_protein_analysis(
        &mut self,
        analyzer: &dyn SequenceAnalyzer,
    ) -> Result<bool, SeqPropError> {
        let Some(seq) = self.nonempty_seq() else {
            error!("{}: no sequence loaded", self.id);
            return Ok(false);
        };
        let stats = match analyzer.analyze(seq) {
            Ok(stats) => stats,
            Err(SeqPropError::UnknownResidue { residue, position }) => {
                error!(
                    "{}: unable to run protein analysis, unknown amino acid {} at {}",
                    self.id, residue, position
                );
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        self.merge_annotations(stats)?;
        Ok(true)
    }

    pub fn get_default_protein_analysis(&mut self) -> Result<bool, SeqPropError> {
        self.get_protein_analysis(&ProteinAnalysis)
    }

    // Runs a file-based analyzer (normally EMBOSS pepstats) on the sequence file and stores the
    // statistics in the record's annotations.
    pub fn get_emboss_pepstats(&mut self, analyzer: &dyn FileAnalyzer) -> Result<(), SeqPropError> {
        let path = self.sequence_path()?.ok_or_else(|| {
            SeqPropError::Validation(format!("{}: sequence file not available", self.id))
        })?;
        let stats = analyzer.analyze_file(&path)?;
        self.merge_annotations(stats)
    }

    // Searches the PDB for structures similar to this sequence. Ok(None) if there is no sequence
    // or if the search could not reach the server; both are logged.
    pub fn blast_pdb(
        &self,
        search: &dyn StructureSearch,
        options: &BlastPdbOptions,
    ) -> Result<Option<Vec<BlastHit>>, SeqPropError> {
        let outdir = options
            .outdir
            .as_deref()
            .or(self.sequence_dir.as_deref())
            .ok_or_else(|| {
                SeqPropError::Validation(String::from("Output directory must be specified"))
            })?;

        let Some(seq) = self.nonempty_seq() else {
            error!("{}: no sequence loaded", self.id);
            return Ok(None);
        };

        let request = StructureSearchRequest {
            sequence: seq,
            outfile: format!("{}_blast_pdb.txt", slugify(&self.id)),
            outdir,
            force_rerun: options.force_rerun,
            evalue: options.evalue,
            seq_ident_cutoff: options.seq_ident_cutoff,
            display_link: options.display_link,
        };
        match search.search(&request) {
            Ok(hits) => Ok(Some(hits)),
            Err(SeqPropError::Connection(msg)) => {
                error!("{}: BLAST request failed: {}", self.id, msg);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    // Mutations

    // Groups the mutations found in the sequence alignments. None, with an error logged, when
    // there are no alignments at all.
    pub fn sequence_mutation_summary(&self) -> Option<MutationSummary> {
        if self.sequence_alignments.is_empty() {
            error!("{}: no sequence alignments", self.id);
            return None;
        }
        Some(summarize_mutations(&self.sequence_alignments))
    }

    // Saving and restoring

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), SeqPropError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SeqPropError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

// Request to write the payload to a new FastA file right after construction.
#[derive(Debug, Clone, Default)]
pub struct FastaOutput {
    pub outname: Option<String>,
    pub outdir: Option<PathBuf>,
    pub force_rerun: bool,
}

pub struct SeqPropBuilder {
    id: String,
    description: Option<String>,
    sequence_path: Option<PathBuf>,
    metadata_path: Option<PathBuf>,
    seq: Option<SeqInput>,
    fasta_output: Option<FastaOutput>,
}

impl SeqPropBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        SeqPropBuilder {
            id: id.into(),
            description: None,
            sequence_path: None,
            metadata_path: None,
            seq: None,
            fasta_output: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn sequence_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sequence_path = Some(path.into());
        self
    }

    pub fn metadata_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata_path = Some(path.into());
        self
    }

    pub fn seq(mut self, seq: impl Into<SeqInput>) -> Self {
        self.seq = Some(seq.into());
        self
    }

    pub fn write_fasta_file(mut self, output: FastaOutput) -> Self {
        self.fasta_output = Some(output);
        self
    }

    // The sequence file is loaded first, so a raw sequence given with seq() replaces its
    // content.
    pub fn build(self) -> Result<SeqProp, SeqPropError> {
        let mut seq_prop = SeqProp::new(self.id);
        if let Some(description) = self.description {
            seq_prop.description = description;
        }
        if let Some(path) = self.sequence_path {
            seq_prop.load_sequence_path(path)?;
        }
        if let Some(path) = self.metadata_path {
            seq_prop.load_metadata_file(path)?;
        }
        if let Some(seq) = self.seq {
            seq_prop.set_seq(seq);
        }
        if let Some(output) = self.fasta_output {
            seq_prop.write_fasta_file(
                output.outname.as_deref(),
                output.outdir.as_deref(),
                output.force_rerun,
            )?;
        }
        Ok(seq_prop)
    }
}
