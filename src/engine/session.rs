// src/engine/session.rs

use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    engine::{
        EngineError,
        grading::{GradeReport, grade},
        permutation::CoordinateMapping,
        reconcile::reconcile,
        view_cache::{ParticipantView, ViewCache},
    },
    models::quiz::{Answer, Quiz},
};

/// The running quiz session. Owns the quiz snapshot and every view issued for it.
pub struct ActiveSession {
    pub session_id: String,
    pub quiz: Quiz,
    views: ViewCache,
}

/// A graded submission, ready to be appended to the session's result log.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Answers in canonical question order.
    pub answers: Vec<Option<Answer>>,
    pub report: GradeReport,
    pub was_randomized: bool,
    pub question_mapping: Option<Vec<usize>>,
}

impl ActiveSession {
    /// Creates a session with an empty view cache.
    /// A fixed `seed` makes the sequence of issued views reproducible.
    pub fn new(session_id: String, quiz: Quiz, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            session_id,
            quiz,
            views: ViewCache::new(rng),
        }
    }

    /// The participant's view of the quiz, stable for the rest of the session.
    pub async fn participant_view(
        &self,
        participant_id: &str,
    ) -> Result<Arc<ParticipantView>, EngineError> {
        self.views
            .get_or_create(
                participant_id,
                &self.quiz.questions,
                self.quiz.randomization.as_ref(),
            )
            .await
    }

    /// Reconciles a display-order submission and grades it.
    ///
    /// A participant who never fetched a view is assumed to have answered in
    /// canonical order.
    pub async fn submit_answers(
        &self,
        participant_id: &str,
        submission: &[Option<Answer>],
    ) -> Result<Submission, EngineError> {
        let questions = &self.quiz.questions;
        let view = self.views.get(participant_id).await;

        let answers = match &view {
            Some(view) => reconcile(&view.mapping, questions.len(), submission),
            None => {
                tracing::warn!(
                    participant_id,
                    session_id = %self.session_id,
                    "Submission without an issued view, treating answers as canonical"
                );
                reconcile(
                    &CoordinateMapping::identity(questions.len()),
                    questions.len(),
                    submission,
                )
            }
        }
        .inspect_err(|e| {
            tracing::error!(participant_id, error = %e, "Failed to reconcile submission");
        })?;

        let report = grade(questions, &answers);
        let was_randomized = view.as_ref().is_some_and(|v| v.randomized);
        let question_mapping = view
            .filter(|v| v.randomized)
            .map(|v| v.mapping.question_mapping.clone());

        Ok(Submission {
            answers,
            report,
            was_randomized,
            question_mapping,
        })
    }

    pub async fn issued_views(&self) -> usize {
        self.views.len().await
    }
}
