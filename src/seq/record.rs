// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// A record for sequences: an identifier, a free-text description, the raw residues, and two
// annotation bags. Per-residue ("letter") annotations are expected to be as long as the sequence;
// whole-sequence annotations hold arbitrary values (e.g. merged analysis statistics).

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeqRecord {
    pub id: String,
    pub description: String,
    pub sequence: String,
    #[serde(default)]
    pub letter_annotations: BTreeMap<String, LetterAnnotation>,
    #[serde(default)]
    pub annotations: Map<String, Value>,
}

impl SeqRecord {
    pub fn new(id: impl Into<String>, description: impl Into<String>, sequence: impl Into<String>) -> Self {
        SeqRecord {
            id: id.into(),
            description: description.into(),
            sequence: sequence.into(),
            letter_annotations: BTreeMap::new(),
            annotations: Map::new(),
        }
    }

    // The FastA header line, without the leading '>'.
    pub fn header(&self) -> String {
        if self.description.is_empty() || self.description == self.id {
            self.id.clone()
        } else {
            format!("{} {}", self.id, self.description)
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

// Serialized with the variant name as key ({"numbers": [0.1, null]}), so that an empty list keeps
// its kind. A missing numeric value is None; NaN is stored as None since JSON has no NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterAnnotation {
    Symbols(String),
    Numbers(Vec<Option<f64>>),
    Labels(Vec<String>),
}

impl LetterAnnotation {
    pub fn len(&self) -> usize {
        match self {
            LetterAnnotation::Symbols(s) => s.chars().count(),
            LetterAnnotation::Numbers(v) => v.len(),
            LetterAnnotation::Labels(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for LetterAnnotation {
    fn from(s: &str) -> Self {
        LetterAnnotation::Symbols(s.to_string())
    }
}

impl From<String> for LetterAnnotation {
    fn from(s: String) -> Self {
        LetterAnnotation::Symbols(s)
    }
}

impl From<Vec<f64>> for LetterAnnotation {
    fn from(v: Vec<f64>) -> Self {
        LetterAnnotation::Numbers(v.into_iter().map(|x| x.is_finite().then_some(x)).collect())
    }
}

impl From<Vec<Option<f64>>> for LetterAnnotation {
    fn from(v: Vec<Option<f64>>) -> Self {
        LetterAnnotation::Numbers(v)
    }
}

impl From<Vec<String>> for LetterAnnotation {
    fn from(v: Vec<String>) -> Self {
        LetterAnnotation::Labels(v)
    }
}

// What a record can be built from. Either way it ends up as a SeqRecord.
#[derive(Debug, Clone, PartialEq)]
pub enum SeqInput {
    Raw(String),
    Record(SeqRecord),
}

impl SeqInput {
    // Raw residues get the owner's id and description; a ready-made record is kept as is.
    pub fn into_record(self, id: &str, description: &str) -> SeqRecord {
        match self {
            SeqInput::Raw(sequence) => SeqRecord::new(id, description, sequence),
            SeqInput::Record(record) => record,
        }
    }
}

impl From<&str> for SeqInput {
    fn from(s: &str) -> Self {
        SeqInput::Raw(s.to_string())
    }
}

impl From<String> for SeqInput {
    fn from(s: String) -> Self {
        SeqInput::Raw(s)
    }
}

impl From<SeqRecord> for SeqInput {
    fn from(record: SeqRecord) -> Self {
        SeqInput::Record(record)
    }
}
