// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::{borrow::Borrow, collections::HashMap, hash::Hash};

use serde::{Serialize, Serializer};

use crate::alignment::{Mutation, PairwiseAlignment};

// The exact, ordered combination of mutations seen in one alignment.
pub type Fingerprint = Vec<Mutation>;

// Maps keys to the ids of the entities (strains, genes...) they were seen in. Keys and members
// are kept in first-seen order; a member may appear more than once.
#[derive(Debug, Clone)]
pub struct MutationGroups<K> {
    order: Vec<K>,
    members: HashMap<K, Vec<String>>,
}

impl<K: Hash + Eq + Clone> MutationGroups<K> {
    pub fn new() -> Self {
        MutationGroups {
            order: Vec::new(),
            members: HashMap::new(),
        }
    }

    pub fn push(&mut self, key: K, member: &str) {
        let entry = self.members.entry(key.clone()).or_insert_with(|| {
            self.order.push(key);
            Vec::new()
        });
        entry.push(member.to_string());
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&[String]>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.members.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[String])> {
        self.order
            .iter()
            .map(move |k| (k, self.members[k].as_slice()))
    }
}

impl<K: Hash + Eq + Clone> Default for MutationGroups<K> {
    fn default() -> Self {
        Self::new()
    }
}

// Serialized as a list of [key, members] pairs, so that fingerprints (which are lists) can be keys
// and the order survives.
impl<K: Hash + Eq + Clone + Serialize> Serialize for MutationGroups<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MutationSummary {
    // point mutation -> entities carrying it
    pub single_counter: MutationGroups<Mutation>,
    // mutation combination -> entities carrying exactly that combination
    pub fingerprint_counter: MutationGroups<Fingerprint>,
}

// Groups the mutations of `alignments` by the other sequence (`b_seq`). An alignment contributes
// to one fingerprint and to as many single-mutation groups as it has mutations; alignments
// without mutations contribute nothing.
pub fn summarize_mutations<'a, I>(alignments: I) -> MutationSummary
where
    I: IntoIterator<Item = &'a PairwiseAlignment>,
{
    let mut summary = MutationSummary::default();
    for aln in alignments {
        if aln.mutations.is_empty() {
            continue;
        }
        summary
            .fingerprint_counter
            .push(aln.mutations.clone(), &aln.b_seq);
        for m in &aln.mutations {
            summary.single_counter.push(*m, &aln.b_seq);
        }
    }
    summary
}
