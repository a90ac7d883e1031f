// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

// Flat key/value view of a SeqProp, for tables and data frames.

use itertools::Itertools;
use log::warn;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::seqprop::SeqProp;

// Export keys, in output order.
pub const EXPORT_KEYS: [&str; 18] = [
    "id",
    "description",
    "bigg",
    "kegg",
    "refseq",
    "uniprot",
    "gene_name",
    "pdbs",
    "seq_record",
    "sequence_dir",
    "metadata_dir",
    "sequence_alignments",
    "structure_alignments",
    "seq_str",
    "seq_len",
    "sequence_file",
    "metadata_file",
    "num_pdbs",
];

// An ordered map from export key to value. Serializes as a JSON object with the keys in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportDict {
    entries: Vec<(String, Value)>,
}

impl ExportDict {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // One "key<TAB>value" line per entry. Strings are printed bare, null as an empty cell.
    pub fn to_table(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{}\t{}", k, cell_text(v)))
            .join("\n")
    }
}

impl Serialize for ExportDict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

// Best-effort string form of a structured value: a list of scalars is joined with ';', anything
// else is compact JSON.
fn flatten(value: Value) -> Value {
    if value.is_null() || is_scalar(&value) {
        return value;
    }
    if let Value::Array(items) = &value {
        if items.iter().all(is_scalar) {
            return Value::String(items.iter().map(cell_text).join(";"));
        }
    }
    Value::String(value.to_string())
}

fn to_value<T: Serialize>(key: &str, value: &T) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("{}: cannot export, dropped ({})", key, e);
            None
        }
    }
}

impl SeqProp {
    fn export_value(&self, key: &str) -> Option<Value> {
        let path_value = |p: Option<&std::path::Path>| match p {
            Some(p) => Value::String(p.display().to_string()),
            None => Value::Null,
        };
        let value = match key {
            "id" => Value::String(self.id.clone()),
            "description" => Value::String(self.description.clone()),
            "bigg" => Value::from(self.bigg.clone()),
            "kegg" => Value::from(self.kegg.clone()),
            "refseq" => Value::from(self.refseq.clone()),
            "uniprot" => Value::from(self.uniprot.clone()),
            "gene_name" => Value::from(self.gene_name.clone()),
            "pdbs" => Value::from(self.pdbs.clone()),
            "seq_record" => to_value(key, &self.seq_record)?,
            "sequence_dir" => path_value(self.sequence_dir()),
            "metadata_dir" => path_value(self.metadata_dir()),
            "sequence_alignments" => to_value(key, &self.sequence_alignments)?,
            "structure_alignments" => to_value(key, &self.structure_alignments)?,
            "seq_str" => Value::from(self.seq_str()),
            "seq_len" => Value::from(self.seq_len()),
            "sequence_file" => Value::from(self.sequence_file.clone()),
            "metadata_file" => Value::from(self.metadata_file.clone()),
            "num_pdbs" => Value::from(self.num_pdbs()),
            _ => return None,
        };
        Some(value)
    }

    // Exports the attributes in EXPORT_KEYS order. Unknown keys in `only_keys` are ignored, and
    // `exclude_attributes` wins over `only_keys`. With `df_format`, structured values become
    // strings that fit in a table cell; lists of strings or numbers are joined with ';'.
    pub fn get_dict(
        &self,
        only_keys: Option<&[&str]>,
        exclude_attributes: &[&str],
        df_format: bool,
    ) -> ExportDict {
        let entries = EXPORT_KEYS
            .iter()
            .copied()
            .filter(|k| only_keys.map_or(true, |only| only.contains(k)))
            .filter(|k| !exclude_attributes.contains(k))
            .filter_map(|k| {
                let value = self.export_value(k)?;
                let value = if df_format { flatten(value) } else { value };
                Some((k.to_string(), value))
            })
            .collect();
        ExportDict { entries }
    }
}
