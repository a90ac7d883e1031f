// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::path::Path;

use seqprop::seqprop::SeqProp;

// Copies the FastA file at `path` into a scratch directory, loads it into a record, and hands
// both to `f`. The directory is removed afterwards.
#[allow(dead_code)]
pub fn with_record_dir<F>(path: &str, mut f: F)
where
    F: FnMut(&mut SeqProp, &Path),
{
    let dir = tempfile::tempdir().expect("temp dir");
    let src = Path::new(path);
    let dest = dir.path().join(src.file_name().expect("file name"));
    std::fs::copy(src, &dest).expect("copy");

    let id = src
        .file_stem()
        .and_then(|s| s.to_str())
        .expect("file stem");
    let mut seq_prop = SeqProp::builder(id)
        .sequence_path(&dest)
        .build()
        .expect("build record");

    // Events and assertions here
    f(&mut seq_prop, dir.path());
}

#[allow(dead_code)]
pub fn fasta_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("read")
        .lines()
        .map(String::from)
        .collect()
}
