// src/engine/grading.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::quiz::{Answer, Question, QuestionType};

/// Outcome for one canonical question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedResult {
    pub question_index: usize,
    pub question_type: QuestionType,
    pub student_answer: Option<Answer>,
    /// Always false for manually graded questions.
    pub is_correct: bool,
    pub needs_manual_grading: bool,
    /// 1 or 0 for auto-graded questions; `None` until a reviewer scores it.
    pub manual_score: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    pub score: usize,
    pub total_gradeable: usize,
    pub pending_manual_grading: usize,
    pub detailed_results: Vec<GradedResult>,
}

/// Grades canonical-order answers against the quiz's answer keys.
///
/// Missing answers and answers of the wrong shape count as incorrect.
pub fn grade(questions: &[Question], answers: &[Option<Answer>]) -> GradeReport {
    let mut report = GradeReport {
        score: 0,
        total_gradeable: 0,
        pending_manual_grading: 0,
        detailed_results: Vec::with_capacity(questions.len()),
    };

    for (question_index, question) in questions.iter().enumerate() {
        let student_answer = answers.get(question_index).cloned().flatten();
        let needs_manual_grading = question.question_type.needs_manual_grading();

        let is_correct = if needs_manual_grading {
            report.pending_manual_grading += 1;
            false
        } else {
            report.total_gradeable += 1;
            let correct = is_correct(
                question.question_type,
                question.correct.as_ref(),
                student_answer.as_ref(),
            );
            if correct {
                report.score += 1;
            }
            correct
        };

        report.detailed_results.push(GradedResult {
            question_index,
            question_type: question.question_type,
            student_answer,
            is_correct,
            needs_manual_grading,
            manual_score: (!needs_manual_grading).then_some(u32::from(is_correct)),
        });
    }

    report
}

fn is_correct(question_type: QuestionType, key: Option<&Answer>, answer: Option<&Answer>) -> bool {
    let (Some(key), Some(answer)) = (key, answer) else {
        return false;
    };

    match (question_type, key, answer) {
        (QuestionType::MultipleChoice | QuestionType::TrueFalse, Answer::Text(k), Answer::Text(a)) => {
            a == k
        }
        (QuestionType::MultipleAnswer, Answer::List(k), Answer::List(a)) => {
            let expected: BTreeSet<&str> = k.iter().map(String::as_str).collect();
            let given: BTreeSet<&str> = a.iter().map(String::as_str).collect();
            expected == given
        }
        (QuestionType::FillBlank, Answer::List(accepted), Answer::Text(a)) => accepted.contains(a),
        (QuestionType::Matching, Answer::List(k), Answer::List(a)) => a == k,
        _ => false,
    }
}
