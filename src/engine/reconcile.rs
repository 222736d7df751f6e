// src/engine/reconcile.rs

use std::collections::BTreeMap;

use crate::{
    engine::{EngineError, permutation::CoordinateMapping},
    models::quiz::Answer,
};

/// Translates a display-order submission back to canonical coordinates.
///
/// The result has one slot per canonical question. Questions the participant
/// never saw stay `None`. Option labels are translated through the question's
/// label map; labels the map doesn't know are kept as submitted.
pub fn reconcile(
    mapping: &CoordinateMapping,
    canonical_count: usize,
    submission: &[Option<Answer>],
) -> Result<Vec<Option<Answer>>, EngineError> {
    let mut canonical = vec![None; canonical_count];

    for (display_index, answer) in submission.iter().enumerate() {
        let Some(answer) = answer else {
            continue;
        };
        let Some(&canonical_index) = mapping.question_mapping.get(display_index) else {
            tracing::warn!(
                display_index,
                displayed = mapping.len(),
                "Ignoring answer for a question that was never displayed"
            );
            continue;
        };
        if canonical_index >= canonical_count {
            return Err(EngineError::InvalidMapping {
                display_index,
                canonical_index,
                canonical_count,
            });
        }

        let translated = match mapping.option_mappings.get(display_index).and_then(Option::as_ref) {
            Some(labels) => translate(answer, labels),
            None => answer.clone(),
        };
        canonical[canonical_index] = Some(translated);
    }

    Ok(canonical)
}

/// Projects canonical answers onto a participant's display coordinates.
/// Inverse of [`reconcile`] over the displayed questions.
pub fn display_answers(
    mapping: &CoordinateMapping,
    canonical: &[Option<Answer>],
) -> Vec<Option<Answer>> {
    mapping
        .question_mapping
        .iter()
        .enumerate()
        .map(|(display_index, &canonical_index)| {
            let answer = canonical.get(canonical_index).cloned().flatten()?;
            match mapping.option_mappings.get(display_index).and_then(Option::as_ref) {
                Some(labels) => {
                    let inverse: BTreeMap<String, String> = labels
                        .iter()
                        .map(|(shown, original)| (original.clone(), shown.clone()))
                        .collect();
                    Some(translate(&answer, &inverse))
                }
                None => Some(answer),
            }
        })
        .collect()
}

fn translate(answer: &Answer, labels: &BTreeMap<String, String>) -> Answer {
    let relabel = |label: &String| labels.get(label).cloned().unwrap_or_else(|| label.clone());
    match answer {
        Answer::Text(label) => Answer::Text(relabel(label)),
        Answer::List(items) => Answer::List(items.iter().map(relabel).collect()),
        Answer::Other(value) => Answer::Other(value.clone()),
    }
}
