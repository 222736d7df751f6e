// src/engine/permutation.rs

use std::collections::{BTreeMap, HashSet};

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{
    engine::EngineError,
    models::quiz::{Question, RandomizationPolicy},
};

/// How a participant's view was derived from the canonical quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateMapping {
    /// `question_mapping[d]` is the canonical index shown at display position `d`.
    pub question_mapping: Vec<usize>,
    /// Per display position: displayed option label -> canonical option label.
    /// `None` when that question's options were left as authored.
    pub option_mappings: Vec<Option<BTreeMap<String, String>>>,
}

impl CoordinateMapping {
    pub fn identity(question_count: usize) -> Self {
        Self {
            question_mapping: (0..question_count).collect(),
            option_mappings: vec![None; question_count],
        }
    }

    pub fn len(&self) -> usize {
        self.question_mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.question_mapping.is_empty()
    }

    /// Checks the mapping against the view it was built for and the canonical quiz.
    pub fn verify(&self, displayed: usize, canonical: &[Question]) -> Result<(), EngineError> {
        if self.question_mapping.len() != displayed || self.option_mappings.len() != displayed {
            return Err(EngineError::MappingLength {
                displayed,
                mapped: self.question_mapping.len(),
            });
        }

        let mut seen = HashSet::with_capacity(displayed);
        for (display_index, &canonical_index) in self.question_mapping.iter().enumerate() {
            let Some(question) = canonical.get(canonical_index) else {
                return Err(EngineError::InvalidMapping {
                    display_index,
                    canonical_index,
                    canonical_count: canonical.len(),
                });
            };
            if !seen.insert(canonical_index) {
                return Err(EngineError::DuplicateMapping {
                    display_index,
                    canonical_index,
                });
            }

            if let Some(labels) = &self.option_mappings[display_index] {
                let known = question.options.as_ref();
                for original in labels.values() {
                    if !known.is_some_and(|options| options.contains_key(original)) {
                        return Err(EngineError::UnknownOption {
                            display_index,
                            label: original.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// A question carried through selection together with its canonical index.
#[derive(Debug, Clone)]
pub struct IndexedQuestion {
    pub canonical_index: usize,
    pub question: Question,
}

/// Draws the subset of questions a participant will see.
///
/// Without an active pool every question is kept in canonical order.
/// Otherwise `pool_size` questions are drawn uniformly without replacement.
pub fn select_pool<R: Rng + ?Sized>(
    questions: &[Question],
    policy: &RandomizationPolicy,
    rng: &mut R,
) -> Vec<IndexedQuestion> {
    let mut indexed: Vec<IndexedQuestion> = questions
        .iter()
        .cloned()
        .enumerate()
        .map(|(canonical_index, question)| IndexedQuestion {
            canonical_index,
            question,
        })
        .collect();

    if policy.draws_pool(questions.len()) {
        indexed.shuffle(rng);
        indexed.truncate(policy.pool_size);
    }
    indexed
}

/// Fixes the display order of the selected questions.
///
/// Unshuffled selections keep their canonical relative order.
pub fn order_questions<R: Rng + ?Sized>(
    mut selected: Vec<IndexedQuestion>,
    policy: &RandomizationPolicy,
    rng: &mut R,
) -> Vec<IndexedQuestion> {
    if policy.shuffle_questions {
        selected.shuffle(rng);
    } else {
        selected.sort_by_key(|q| q.canonical_index);
    }
    selected
}

/// Reorders a choice question's options and relabels them `A`, `B`, `C`...
///
/// Returns the displayed question and, when options were reordered, the
/// displayed-label -> canonical-label map.
pub fn shuffle_options<R: Rng + ?Sized>(
    mut question: Question,
    policy: &RandomizationPolicy,
    rng: &mut R,
) -> (Question, Option<BTreeMap<String, String>>) {
    if !policy.shuffle_options || !question.question_type.has_choices() {
        return (question, None);
    }
    let Some(options) = question.options.take() else {
        return (question, None);
    };

    let mut labels: Vec<String> = options.keys().cloned().collect();
    labels.shuffle(rng);

    let mut displayed = BTreeMap::new();
    let mut mapping = BTreeMap::new();
    for (slot, original) in labels.into_iter().enumerate() {
        let label = option_label(slot);
        displayed.insert(label.clone(), options[&original].clone());
        mapping.insert(label, original);
    }

    question.options = Some(displayed);
    (question, Some(mapping))
}

/// Builds a participant's view of `questions` under `policy`.
///
/// All three steps draw from the same `rng`. Without a policy the canonical
/// questions come back unchanged with an identity mapping.
pub fn build_view<R: Rng + ?Sized>(
    questions: &[Question],
    policy: Option<&RandomizationPolicy>,
    rng: &mut R,
) -> (Vec<Question>, CoordinateMapping) {
    let Some(policy) = policy else {
        return (
            questions.to_vec(),
            CoordinateMapping::identity(questions.len()),
        );
    };

    let selected = select_pool(questions, policy, rng);
    let ordered = order_questions(selected, policy, rng);

    let mut displayed = Vec::with_capacity(ordered.len());
    let mut mapping = CoordinateMapping {
        question_mapping: Vec::with_capacity(ordered.len()),
        option_mappings: Vec::with_capacity(ordered.len()),
    };
    for drawn in ordered {
        let (question, options) = shuffle_options(drawn.question, policy, rng);
        displayed.push(question);
        mapping.question_mapping.push(drawn.canonical_index);
        mapping.option_mappings.push(options);
    }

    (displayed, mapping)
}

/// Display label for the option in `slot`: A..Z, then AA, AB...
fn option_label(slot: usize) -> String {
    let mut n = slot;
    let mut label = Vec::new();
    loop {
        label.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    label.iter().rev().map(|&b| char::from(b)).collect()
}
