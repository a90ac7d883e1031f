// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::blast::RemoteBlastp;
use crate::errors::SeqPropError;
use crate::pepstats::EmbossPepstats;

pub const CONFIG_FILENAME: &str = ".seqpropconfig";

// Where the external programs live. A missing entry means the program is looked up in PATH.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolsConfig {
    pub emboss_bin_dir: Option<PathBuf>,
    pub blast_bin_dir: Option<PathBuf>,
}

impl ToolsConfig {
    pub fn from_value(value: &Value) -> Self {
        let dir = |key: &str| value.get(key).and_then(Value::as_str).map(PathBuf::from);
        ToolsConfig {
            emboss_bin_dir: dir("emboss_bin_dir"),
            blast_bin_dir: dir("blast_bin_dir"),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, SeqPropError> {
        let text = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;
        if !value.is_object() {
            return Err(SeqPropError::Format(format!(
                "{}: expected a JSON object",
                path.display()
            )));
        }
        Ok(Self::from_value(&value))
    }

    pub fn pepstats(&self) -> EmbossPepstats {
        EmbossPepstats::new(self.emboss_bin_dir.clone())
    }

    pub fn blastp(&self) -> RemoteBlastp {
        RemoteBlastp::new(self.blast_bin_dir.clone())
    }
}

// Looks for the config file in $HOME, then in the current directory.
pub fn find_config() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        let path = PathBuf::from(home).join(CONFIG_FILENAME);
        if path.exists() {
            return Some(path);
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        let path = cwd.join(CONFIG_FILENAME);
        if path.exists() {
            return Some(path);
        }
    }
    None
}
