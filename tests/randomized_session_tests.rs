// tests/randomized_session_tests.rs

use std::collections::HashMap;

use quizroom::{config::Config, routes, state::AppState};
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;

async fn spawn_app() -> String {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        rust_log: "error".to_string(),
        port: 0,
        public_dir: "public".to_string(),
        rng_seed: None,
    };

    let app = routes::create_router(AppState::new(pool, config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Eight choice questions, one of each other type, drawn as a shuffled pool of six.
fn randomized_quiz() -> Value {
    let mut questions: Vec<Value> = (0..8)
        .map(|i| {
            json!({
                "question": format!("Question {i}"),
                "type": if i % 2 == 0 { "multiple-choice" } else { "multiple-answer" },
                "options": {
                    "A": format!("q{i} alpha"),
                    "B": format!("q{i} beta"),
                    "C": format!("q{i} gamma"),
                    "D": format!("q{i} delta")
                },
                "correct": if i % 2 == 0 { json!("C") } else { json!(["A", "D"]) }
            })
        })
        .collect();
    questions.push(json!({
        "question": "Capital of France?", "type": "fill-blank", "correct": ["Paris", "paris"]
    }));
    questions.push(json!({
        "question": "Why is the sky blue?", "type": "short-answer"
    }));

    json!({
        "name": "Randomized",
        "questions": questions,
        "randomization": {
            "shuffleQuestions": true,
            "shuffleOptions": true,
            "useQuestionPool": true,
            "poolSize": 6
        }
    })
}

struct Harness {
    client: reqwest::Client,
    address: String,
    canonical: Value,
    session_id: String,
}

impl Harness {
    async fn new() -> Self {
        let address = spawn_app().await;
        let client = reqwest::Client::new();

        let canonical: Value = client
            .post(&format!("{}/api/quizzes", address))
            .json(&randomized_quiz())
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let start: Value = client
            .post(&format!("{}/api/quizzes/start", address))
            .json(&json!({ "quizId": canonical["id"] }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let session_id = start["sessionId"].as_str().unwrap().to_string();

        Self {
            client,
            address,
            canonical,
            session_id,
        }
    }

    async fn join(&self, name: &str) -> String {
        let join: Value = self
            .client
            .post(&format!("{}/api/join", self.address))
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        join["id"].as_str().unwrap().to_string()
    }

    async fn view(&self, participant_id: &str) -> Value {
        self.client
            .get(&format!(
                "{}/api/currentQuiz?studentId={}",
                self.address, participant_id
            ))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    async fn submit(&self, participant_id: &str, answers: Vec<Value>) -> Value {
        self.client
            .post(&format!("{}/api/submit", self.address))
            .json(&json!({ "participantId": participant_id, "answers": answers }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    /// Correct answers for a view, expressed in its own display labels.
    fn correct_answers(&self, view: &Value) -> Vec<Value> {
        let canonical: HashMap<&str, &Value> = self.canonical["questions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|q| (q["question"].as_str().unwrap(), q))
            .collect();

        view["questions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|shown| {
                let original = canonical[shown["question"].as_str().unwrap()];
                let to_display = |label: &Value| {
                    let text = &original["options"][label.as_str().unwrap()];
                    let (shown_label, _) = shown["options"]
                        .as_object()
                        .unwrap()
                        .iter()
                        .find(|(_, t)| *t == text)
                        .unwrap();
                    json!(shown_label)
                };
                match shown["type"].as_str().unwrap() {
                    "multiple-choice" => to_display(&original["correct"]),
                    "multiple-answer" => Value::Array(
                        original["correct"]
                            .as_array()
                            .unwrap()
                            .iter()
                            .rev()
                            .map(to_display)
                            .collect(),
                    ),
                    "fill-blank" => json!("paris"),
                    _ => json!("Rayleigh scattering"),
                }
            })
            .collect()
    }
}

#[tokio::test]
async fn view_is_stable_and_redacted() {
    let h = Harness::new().await;
    let id = h.join("Grace").await;

    let first = h.view(&id).await;
    let second = h.view(&id).await;
    assert_eq!(first, second);

    let questions = first["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 6);
    assert!(questions.iter().all(|q| q.get("correct").is_none()));

    let prompts: std::collections::HashSet<&str> =
        questions.iter().map(|q| q["question"].as_str().unwrap()).collect();
    assert_eq!(prompts.len(), 6);
}

#[tokio::test]
async fn correct_display_answers_score_full_marks() {
    let h = Harness::new().await;

    for name in ["Alan", "Barbara", "Claude", "Donald"] {
        let id = h.join(name).await;
        let view = h.view(&id).await;
        let answers = h.correct_answers(&view);

        let shown_manual = view["questions"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|q| q["type"] == "short-answer")
            .count();

        let result = h.submit(&id, answers).await;
        assert_eq!(result["score"], json!(6 - shown_manual));
        assert_eq!(result["totalGradeable"], 9);
        assert_eq!(result["pendingManualGrading"], 1);
        assert_eq!(result["totalQuestions"], 10);
    }

    let detail: Value = h
        .client
        .get(&format!("{}/api/sessions/{}", h.address, h.session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let results = detail["results"].as_array().unwrap();
    assert_eq!(results.len(), 4);

    for record in results {
        assert_eq!(record["wasRandomized"], true);
        let mapping: Vec<u64> = record["questionMapping"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_u64().unwrap())
            .collect();
        assert_eq!(mapping.len(), 6);
        assert!(mapping.iter().all(|&c| c < 10));

        // Canonical answers sit at the mapped slots, everything else is empty
        let answers = record["answers"].as_array().unwrap();
        assert_eq!(answers.len(), 10);
        for (c, answer) in answers.iter().enumerate() {
            assert_eq!(!answer.is_null(), mapping.contains(&(c as u64)));
        }
    }
}

#[tokio::test]
async fn new_session_discards_views_and_roster() {
    let h = Harness::new().await;
    let id = h.join("Edsger").await;
    h.view(&id).await;

    let roster: Vec<Value> = h
        .client
        .get(&format!("{}/api/participants", h.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0]["name"], "Edsger");

    let restart: Value = h
        .client
        .post(&format!("{}/api/quizzes/start", h.address))
        .json(&json!({ "quizId": h.canonical["id"] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_ne!(restart["sessionId"], json!(h.session_id));

    let roster: Vec<Value> = h
        .client
        .get(&format!("{}/api/participants", h.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(roster.is_empty());

    // Old participant has no view in the new session: answers are taken as canonical
    let canonical_keys: Vec<Value> = h.canonical["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| match q["type"].as_str().unwrap() {
            "fill-blank" => json!("Paris"),
            "short-answer" => Value::Null,
            _ => q["correct"].clone(),
        })
        .collect();
    let result = h.submit(&id, canonical_keys).await;
    assert_eq!(result["score"], 9);

    let detail: Value = h
        .client
        .get(&format!(
            "{}/api/sessions/{}",
            h.address,
            restart["sessionId"].as_str().unwrap()
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let record = &detail["results"][0];
    assert_eq!(record["wasRandomized"], false);
    assert_eq!(record["participantName"], "Unknown");
}
