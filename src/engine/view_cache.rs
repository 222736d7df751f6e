// src/engine/view_cache.rs

use std::{collections::HashMap, sync::Arc};

use rand::rngs::StdRng;
use tokio::sync::Mutex;

use crate::{
    engine::{EngineError, permutation::{CoordinateMapping, build_view}},
    models::quiz::{Question, RandomizationPolicy},
};

/// The quiz exactly as one participant sees it, plus how to undo it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantView {
    pub questions: Vec<Question>,
    pub mapping: CoordinateMapping,
    /// Whether a randomization policy was applied when the view was built.
    pub randomized: bool,
}

struct CacheState {
    views: HashMap<String, Arc<ParticipantView>>,
    rng: StdRng,
}

/// Views handed out during one session, keyed by participant id.
///
/// A single lock guards both the map and the generator, so lookup, build and
/// insert happen as one step per participant.
pub struct ViewCache {
    state: Mutex<CacheState>,
}

impl ViewCache {
    pub fn new(rng: StdRng) -> Self {
        Self {
            state: Mutex::new(CacheState {
                views: HashMap::new(),
                rng,
            }),
        }
    }

    /// Returns the participant's view, building and storing it on first request.
    pub async fn get_or_create(
        &self,
        participant_id: &str,
        questions: &[Question],
        policy: Option<&RandomizationPolicy>,
    ) -> Result<Arc<ParticipantView>, EngineError> {
        let mut state = self.state.lock().await;
        if let Some(view) = state.views.get(participant_id) {
            return Ok(Arc::clone(view));
        }

        let CacheState { views, rng } = &mut *state;
        let (shown, mapping) = build_view(questions, policy, rng);
        mapping.verify(shown.len(), questions)?;

        let view = Arc::new(ParticipantView {
            questions: shown,
            mapping,
            randomized: policy.is_some(),
        });
        views.insert(participant_id.to_owned(), Arc::clone(&view));

        tracing::debug!(
            participant_id,
            displayed = view.questions.len(),
            "Issued participant view"
        );
        Ok(view)
    }

    pub async fn get(&self, participant_id: &str) -> Option<Arc<ParticipantView>> {
        self.state.lock().await.views.get(participant_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.views.len()
    }
}
