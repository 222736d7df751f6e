// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{SqlitePool, types::Json as SqlJson};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::{
        BankQuestion, CreateQuizRequest, DuplicateQuizRequest, Quiz, UpdateQuizRequest,
    },
    utils::html::{clean_html, clean_question},
};

/// Loads a quiz from the library, or `NotFound`.
pub(crate) async fn load_quiz(pool: &SqlitePool, id: &str) -> Result<Quiz, AppError> {
    let row: Option<(SqlJson<Quiz>,)> = sqlx::query_as("SELECT data FROM quizzes WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch quiz {}: {:?}", id, e);
            AppError::InternalServerError(e.to_string())
        })?;

    row.map(|(quiz,)| quiz.0)
        .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// Inserts or replaces a quiz record.
async fn save_quiz(pool: &SqlitePool, quiz: &Quiz) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO quizzes (id, data, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            data = excluded.data,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&quiz.id)
    .bind(SqlJson(quiz))
    .bind(quiz.created_at)
    .bind(quiz.updated_at)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to save quiz {}: {:?}", quiz.id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(())
}

async fn load_all(pool: &SqlitePool) -> Result<Vec<Quiz>, AppError> {
    let rows: Vec<(SqlJson<Quiz>,)> =
        sqlx::query_as("SELECT data FROM quizzes ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(quiz,)| quiz.0).collect())
}

/// Lists every quiz in the library, newest first.
pub async fn list_quizzes(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(load_all(&pool).await?))
}

/// Retrieves a single quiz by ID, answer keys included.
pub async fn get_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(load_quiz(&pool, &id).await?))
}

/// Creates a new quiz.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let now = Utc::now();
    let quiz = Quiz {
        id: Uuid::new_v4().to_string(),
        name: clean_html(&payload.name),
        description: payload.description.as_deref().map(clean_html).unwrap_or_default(),
        category: payload.category.unwrap_or_else(|| "Other".to_string()),
        difficulty: payload.difficulty.unwrap_or_else(|| "Medium".to_string()),
        questions: payload.questions.into_iter().map(clean_question).collect(),
        total_time_limit: payload.total_time_limit,
        randomization: payload.randomization,
        is_template: payload.is_template,
        is_archived: false,
        archived_at: None,
        created_at: now,
        updated_at: now,
    };

    save_quiz(&pool, &quiz).await?;
    tracing::info!("Quiz created: {} (ID: {})", quiz.name, quiz.id);

    Ok(Json(quiz))
}

/// Updates a quiz. Fields missing from the payload keep their stored value,
/// an explicit `null` clears an optional one.
pub async fn update_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut quiz = load_quiz(&pool, &id).await?;

    if let Some(name) = payload.name {
        quiz.name = clean_html(&name);
    }
    if let Some(description) = payload.description {
        quiz.description = clean_html(&description);
    }
    if let Some(category) = payload.category {
        quiz.category = category;
    }
    if let Some(difficulty) = payload.difficulty {
        quiz.difficulty = difficulty;
    }
    if let Some(questions) = payload.questions {
        quiz.questions = questions.into_iter().map(clean_question).collect();
    }
    if let Some(total_time_limit) = payload.total_time_limit {
        quiz.total_time_limit = total_time_limit;
    }
    if let Some(randomization) = payload.randomization {
        quiz.randomization = randomization;
    }
    if let Some(is_template) = payload.is_template {
        quiz.is_template = is_template;
    }
    quiz.updated_at = Utc::now();

    save_quiz(&pool, &quiz).await?;
    tracing::info!("Quiz updated: {}", quiz.name);

    Ok(Json(quiz))
}

/// Deletes a quiz. Sessions already started from it keep their snapshot.
pub async fn delete_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = load_quiz(&pool, &id).await?;

    sqlx::query("DELETE FROM quizzes WHERE id = ?")
        .bind(&id)
        .execute(&pool)
        .await?;
    tracing::info!("Quiz deleted: {}", quiz.name);

    Ok(Json(serde_json::json!({"message": "Quiz deleted successfully"})))
}

/// Copies a quiz under a new name. The copy is never a template.
pub async fn duplicate_quiz(
    State(pool): State<SqlitePool>,
    Json(payload): Json<DuplicateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let original = load_quiz(&pool, &payload.quiz_id).await?;
    let now = Utc::now();
    let copy = Quiz {
        id: Uuid::new_v4().to_string(),
        name: clean_html(&payload.new_name),
        is_template: false,
        created_at: now,
        updated_at: now,
        ..original.clone()
    };

    save_quiz(&pool, &copy).await?;
    tracing::info!("Quiz duplicated: {} -> {}", original.name, copy.name);

    Ok(Json(copy))
}

async fn set_flags(
    pool: &SqlitePool,
    id: &str,
    apply: impl FnOnce(&mut Quiz),
) -> Result<Quiz, AppError> {
    let mut quiz = load_quiz(pool, id).await?;
    apply(&mut quiz);
    quiz.updated_at = Utc::now();
    save_quiz(pool, &quiz).await?;
    Ok(quiz)
}

pub async fn archive_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = set_flags(&pool, &id, |q| {
        q.is_archived = true;
        q.archived_at = Some(Utc::now());
    })
    .await?;
    tracing::info!("Quiz archived: {}", quiz.name);

    Ok(Json(quiz))
}

pub async fn unarchive_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = set_flags(&pool, &id, |q| {
        q.is_archived = false;
        q.archived_at = None;
    })
    .await?;
    tracing::info!("Quiz restored: {}", quiz.name);

    Ok(Json(quiz))
}

pub async fn mark_template(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = set_flags(&pool, &id, |q| q.is_template = true).await?;
    tracing::info!("Quiz saved as template: {}", quiz.name);

    Ok(Json(quiz))
}

/// Every distinct question across the library.
/// Questions are the same when their trimmed, lowercased text matches.
pub async fn question_bank(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let mut quizzes = load_all(&pool).await?;
    quizzes.reverse();

    Ok(Json(collect_bank(quizzes)))
}

fn collect_bank(quizzes: Vec<Quiz>) -> Vec<BankQuestion> {
    let mut bank: Vec<BankQuestion> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for quiz in quizzes {
        for question in quiz.questions {
            let key = question.question.trim().to_lowercase();
            match index.get(&key) {
                Some(&i) => bank[i].quiz_count += 1,
                None => {
                    index.insert(key, bank.len());
                    bank.push(BankQuestion {
                        question,
                        category: quiz.category.clone(),
                        difficulty: quiz.difficulty.clone(),
                        quiz_count: 1,
                    });
                }
            }
        }
    }
    bank
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::{Question, QuestionType};

    fn quiz(category: &str, prompts: &[&str]) -> Quiz {
        Quiz {
            id: Uuid::new_v4().to_string(),
            name: "q".to_string(),
            description: String::new(),
            category: category.to_string(),
            difficulty: "Easy".to_string(),
            questions: prompts
                .iter()
                .map(|p| Question {
                    question: p.to_string(),
                    question_type: QuestionType::ShortAnswer,
                    options: None,
                    correct: None,
                    explanation: None,
                    time_limit: None,
                })
                .collect(),
            total_time_limit: None,
            randomization: None,
            is_template: false,
            is_archived: false,
            archived_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn bank_merges_questions_by_normalized_text() {
        let bank = collect_bank(vec![
            quiz("Math", &["What is 2+2?", "Define a prime."]),
            quiz("Science", &["  what is 2+2? ", "What is H2O?"]),
        ]);

        assert_eq!(bank.len(), 3);
        assert_eq!(bank[0].quiz_count, 2);
        assert_eq!(bank[0].category, "Math");
        assert_eq!(bank[2].category, "Science");
    }
}
