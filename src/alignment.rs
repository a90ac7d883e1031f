// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::SeqPropError;

// A point mutation: residue `original` at (1-based) `position` became `new`. Serialized as the
// tuple ["A", 24, "V"].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(char, usize, char)", into = "(char, usize, char)")]
pub struct Mutation {
    pub original: char,
    pub position: usize,
    pub new: char,
}

impl Mutation {
    pub fn new(original: char, position: usize, new: char) -> Self {
        Mutation {
            original,
            position,
            new,
        }
    }
}

impl From<(char, usize, char)> for Mutation {
    fn from((original, position, new): (char, usize, char)) -> Self {
        Mutation::new(original, position, new)
    }
}

impl From<Mutation> for (char, usize, char) {
    fn from(m: Mutation) -> Self {
        (m.original, m.position, m.new)
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.original, self.position, self.new)
    }
}

// One pairwise alignment of this sequence (`a_seq`) to another sequence or structure (`b_seq`),
// as produced by an aligner. Anything the aligner reports beyond the mutations goes into
// `annotations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseAlignment {
    pub id: String,
    pub a_seq: String,
    pub b_seq: String,
    #[serde(default)]
    pub mutations: Vec<Mutation>,
    #[serde(default)]
    pub annotations: Map<String, Value>,
}

impl PairwiseAlignment {
    pub fn new(id: impl Into<String>, a_seq: impl Into<String>, b_seq: impl Into<String>) -> Self {
        PairwiseAlignment {
            id: id.into(),
            a_seq: a_seq.into(),
            b_seq: b_seq.into(),
            mutations: Vec::new(),
            annotations: Map::new(),
        }
    }

    pub fn with_mutations<I, M>(mut self, mutations: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<Mutation>,
    {
        self.mutations = mutations.into_iter().map(Into::into).collect();
        self
    }
}

// Alignments keyed by id, in insertion order. Appending an id that is already present is an
// error; the list is left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PairwiseAlignment>", into = "Vec<PairwiseAlignment>")]
pub struct AlignmentList {
    alignments: Vec<PairwiseAlignment>,
    index: HashMap<String, usize>,
}

impl AlignmentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.alignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alignments.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&PairwiseAlignment> {
        self.index.get(id).map(|&i| &self.alignments[i])
    }

    pub fn append(&mut self, alignment: PairwiseAlignment) -> Result<(), SeqPropError> {
        if self.index.contains_key(&alignment.id) {
            return Err(SeqPropError::DuplicateKey(alignment.id));
        }
        self.index.insert(alignment.id.clone(), self.alignments.len());
        self.alignments.push(alignment);
        Ok(())
    }

    // All-or-nothing: on a duplicate id, nothing from `alignments` is kept.
    pub fn extend<I>(&mut self, alignments: I) -> Result<(), SeqPropError>
    where
        I: IntoIterator<Item = PairwiseAlignment>,
    {
        let mut staged = self.clone();
        for aln in alignments {
            staged.append(aln)?;
        }
        *self = staged;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<PairwiseAlignment> {
        let pos = self.index.remove(id)?;
        let removed = self.alignments.remove(pos);
        for i in self.index.values_mut() {
            if *i > pos {
                *i -= 1;
            }
        }
        Some(removed)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.alignments.iter().map(|a| a.id.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PairwiseAlignment> {
        self.alignments.iter()
    }
}

impl<'a> IntoIterator for &'a AlignmentList {
    type Item = &'a PairwiseAlignment;
    type IntoIter = std::slice::Iter<'a, PairwiseAlignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.alignments.iter()
    }
}

impl TryFrom<Vec<PairwiseAlignment>> for AlignmentList {
    type Error = SeqPropError;

    fn try_from(alignments: Vec<PairwiseAlignment>) -> Result<Self, Self::Error> {
        let mut list = AlignmentList::new();
        list.extend(alignments)?;
        Ok(list)
    }
}

impl From<AlignmentList> for Vec<PairwiseAlignment> {
    fn from(list: AlignmentList) -> Self {
        list.alignments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aln(id: &str, b_seq: &str) -> PairwiseAlignment {
        PairwiseAlignment::new(id, "b0870", b_seq)
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let mut list = AlignmentList::new();
        list.append(aln("z", "S1")).unwrap();
        list.append(aln("a", "S2")).unwrap();
        list.append(aln("m", "S3")).unwrap();
        assert_eq!(list.ids().collect::<Vec<_>>(), vec!["z", "a", "m"]);
        assert_eq!(list.get("a").unwrap().b_seq, "S2");
    }

    #[test]
    fn test_append_rejects_duplicate_key() {
        let mut list = AlignmentList::new();
        list.append(aln("x", "S1")).unwrap();
        let err = list.append(aln("x", "S2")).unwrap_err();
        assert!(matches!(err, SeqPropError::DuplicateKey(ref k) if k == "x"));
        assert_eq!(list.len(), 1);
        assert_eq!(list.get("x").unwrap().b_seq, "S1");
    }

    #[test]
    fn test_extend_is_all_or_nothing() {
        let mut list = AlignmentList::new();
        list.append(aln("x", "S1")).unwrap();
        let res = list.extend(vec![aln("y", "S2"), aln("x", "S3")]);
        assert!(res.is_err());
        assert_eq!(list.len(), 1);
        assert!(!list.contains("y"));
    }

    #[test]
    fn test_remove_reindexes() {
        let mut list = AlignmentList::new();
        for (id, b) in [("a", "S1"), ("b", "S2"), ("c", "S3")] {
            list.append(aln(id, b)).unwrap();
        }
        let removed = list.remove("a").unwrap();
        assert_eq!(removed.b_seq, "S1");
        assert_eq!(list.get("c").unwrap().b_seq, "S3");
        assert!(list.remove("a").is_none());
        list.append(aln("a", "S4")).unwrap();
        assert_eq!(list.ids().collect::<Vec<_>>(), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_mutations_use_tuple_form() {
        let json = r#"[{"id": "b0870_S1", "a_seq": "b0870", "b_seq": "S1",
                        "mutations": [["A", 24, "V"], ["R", 33, "T"]],
                        "annotations": {"percent_identity": 98.5}}]"#;
        let list: AlignmentList = serde_json::from_str(json).unwrap();
        let a = list.get("b0870_S1").unwrap();
        assert_eq!(a.mutations, vec![Mutation::new('A', 24, 'V'), Mutation::new('R', 33, 'T')]);
        assert_eq!(a.mutations[1].to_string(), "R33T");
        let back = serde_json::to_value(&list).unwrap();
        assert_eq!(back[0]["mutations"][0], serde_json::json!(["A", 24, "V"]));
    }

    #[test]
    fn test_deserialize_rejects_duplicates() {
        let json = r#"[{"id": "x", "a_seq": "a", "b_seq": "S1"},
                       {"id": "x", "a_seq": "a", "b_seq": "S2"}]"#;
        assert!(serde_json::from_str::<AlignmentList>(json).is_err());
    }
}
