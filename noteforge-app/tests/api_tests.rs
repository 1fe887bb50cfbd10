use async_trait::async_trait;
use noteforge_app::api::server::router;
use noteforge_app::generator::build_generator;
use noteforge_core::repo::memory::MemoryRepo;
use noteforge_core::{
    Forge, GenerationError, GenerationParams, Note, Repository, Settings,
    TextGenerator,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Replies with a fixed body, or fails as the upstream would.
struct Fixed(Option<String>);

#[async_trait]
impl TextGenerator for Fixed {
    async fn generate(&self, _prompt: &str, _params: &GenerationParams) -> Result<String, GenerationError> {
        match &self.0 {
            Some(text) => Ok(text.clone()),
            None => Err(GenerationError::Upstream { status: Some(503), body: "overloaded".into() }),
        }
    }
}

/// Counts calls so tests can tell whether a request ever reached the generator.
struct Counted {
    calls: AtomicUsize,
    reply: String,
}

#[async_trait]
impl TextGenerator for Counted {
    async fn generate(&self, _prompt: &str, _params: &GenerationParams) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

fn cards(n: usize) -> String {
    let items: Vec<Value> = (0..n)
        .map(|i| json!({ "question": format!("Question {i}?"), "answer": format!("Answer {i}"), "difficulty": "easy" }))
        .collect();
    format!("Here you go:\n{}", Value::Array(items))
}

struct Harness {
    base: String,
    repo: Arc<MemoryRepo>,
    settings: Settings,
    http: reqwest::Client,
}

async fn start(generator: Arc<dyn TextGenerator>) -> Harness {
    let repo = Arc::new(MemoryRepo::new());
    let settings = Settings::default();
    let forge = Arc::new(Forge::new(repo.clone(), generator));
    let app = router(forge, settings.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Harness { base: format!("http://{addr}"), repo, settings, http: reqwest::Client::new() }
}

impl Harness {
    async fn note(&self, title: &str, content: &str) -> Note {
        self.repo
            .create_note(&Note::new(self.settings.owner_id, title, content))
            .await
            .unwrap()
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self.http.post(format!("{}{path}", self.base)).json(&body).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.http.get(format!("{}{path}", self.base)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap_or(Value::Null))
    }
}

#[tokio::test]
async fn generate_then_study_through_the_api() {
    let h = start(Arc::new(Fixed(Some(cards(3))))).await;
    let note = h.note("Photosynthesis", "Plants turn light into chemical energy.").await;

    let (status, body) = h.post(&format!("/notes/{}/generate", note.id), json!({ "count": 3 })).await;
    assert_eq!(status, 201);
    assert_eq!(body["set"]["title"], "Flashcards from: Photosynthesis");
    assert_eq!(body["set"]["total_cards"], 3);
    let set_id = body["set"]["id"].as_str().unwrap().to_string();

    let (_, cards) = h.get(&format!("/sets/{set_id}/cards")).await;
    let cards = cards.as_array().unwrap().clone();
    assert_eq!(cards.len(), 3);
    assert_eq!(cards[0]["question"], "Question 0?");
    assert_eq!(cards[0]["status"], "new");

    let (status, body) = h.post(&format!("/cards/{}/mastered", cards[0]["id"].as_str().unwrap()), json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["card"]["status"], "mastered");
    assert_eq!(body["progress"]["percentage"], 33);

    let (_, progress) = h.get(&format!("/sets/{set_id}/progress")).await;
    assert_eq!(progress["mastered"], 1);
    assert_eq!(progress["total"], 3);
}

#[tokio::test]
async fn preview_stores_nothing() {
    let h = start(Arc::new(Fixed(Some(cards(2))))).await;
    let note = h.note("Rivers", "Rivers flow from sources to mouths.").await;

    let (status, body) = h
        .post(&format!("/notes/{}/generate", note.id), json!({ "count": 2, "preview": true }))
        .await;
    assert_eq!(status, 200);
    assert!(body["set"].is_null());
    assert_eq!(body["flashcards"].as_array().unwrap().len(), 2);

    let (_, sets) = h.get("/sets").await;
    assert!(sets.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn reforge_add_more_appends() {
    let h = start(Arc::new(Fixed(Some(cards(2))))).await;
    let note = h.note("Tides", "The moon's gravity drives ocean tides.").await;
    let (_, body) = h.post(&format!("/notes/{}/generate", note.id), json!({ "count": 2 })).await;
    let set_id = body["set"]["id"].as_str().unwrap().to_string();

    let (status, body) = h
        .post(&format!("/sets/{set_id}/reforge"), json!({ "action": "add_more", "count": 2 }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["set"]["total_cards"], 4);

    let (status, body) = h
        .post(&format!("/sets/{set_id}/reforge"), json!({ "action": "regenerate", "count": 2 }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["set"]["total_cards"], 2);
}

#[tokio::test]
async fn errors_map_to_status_codes() {
    let h = start(Arc::new(Fixed(None))).await;
    let note = h.note("Short", "tiny").await;

    let (status, body) = h.post(&format!("/notes/{}/generate", note.id), json!({})).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("at least 10"));

    let (status, _) = h
        .post(&format!("/notes/{}/generate", note.id), json!({ "count": 31 }))
        .await;
    assert_eq!(status, 400);

    let long = h.note("Long", "Enough content to pass validation here.").await;
    let (status, body) = h.post(&format!("/notes/{}/generate", long.id), json!({})).await;
    assert_eq!(status, 502);
    assert_eq!(body["error"], noteforge_core::TRY_AGAIN_MESSAGE);

    let (status, _) = h.get(&format!("/sets/{}/cards", uuid::Uuid::new_v4())).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn missing_api_key_is_a_configuration_error() {
    let generator = build_generator(None, &Settings::default());
    let h = start(generator).await;
    let note = h.note("Keys", "No key has been configured for this run.").await;

    let (status, body) = h.post(&format!("/notes/{}/generate", note.id), json!({})).await;
    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().contains("GEMINI_API_KEY"));
}

#[tokio::test]
async fn only_public_sets_are_shared() {
    let h = start(Arc::new(Fixed(Some(cards(1))))).await;
    let note = h.note("Shared", "Content that will be shared publicly.").await;
    let (_, body) = h.post(&format!("/notes/{}/generate", note.id), json!({ "count": 1 })).await;
    let set_id: uuid::Uuid = body["set"]["id"].as_str().unwrap().parse().unwrap();

    let (status, _) = h.get(&format!("/public/sets/{set_id}")).await;
    assert_eq!(status, 404);

    h.repo.set_public(set_id, true).await.unwrap();
    let (status, body) = h.get(&format!("/public/sets/{set_id}")).await;
    assert_eq!(status, 200);
    assert_eq!(body["cards"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_bodies_are_refused_before_generating() {
    let gen = Arc::new(Counted { calls: AtomicUsize::new(0), reply: cards(2) });
    let h = start(gen.clone()).await;
    let note = h.note("Volcanoes", "Magma rises through cracks in the crust.").await;
    let generate = format!("/notes/{}/generate", note.id);

    for bad in [json!({ "count": -1 }), json!({ "count": "three" }), json!({ "cuont": 2 })] {
        let (status, body) = h.post(&generate, bad.clone()).await;
        assert_eq!(status, 400, "{bad}");
        assert!(body["error"].as_str().unwrap().contains("Invalid request body"));
    }
    assert_eq!(gen.calls.load(Ordering::SeqCst), 0);
    let (_, sets) = h.get("/sets").await;
    assert!(sets.as_array().unwrap().is_empty());

    let (status, body) = h.post(&generate, json!({ "count": 2 })).await;
    assert_eq!(status, 201);
    let set_id = body["set"]["id"].as_str().unwrap().to_string();
    assert_eq!(gen.calls.load(Ordering::SeqCst), 1);

    let (status, _) = h
        .post(&format!("/sets/{set_id}/reforge"), json!({ "action": "regenerat", "count": 2 }))
        .await;
    assert_eq!(status, 400);
    assert_eq!(gen.calls.load(Ordering::SeqCst), 1);
    let (_, progress) = h.get(&format!("/sets/{set_id}/progress")).await;
    assert_eq!(progress["total"], 2);
}

#[tokio::test]
async fn empty_body_uses_saved_settings() {
    let gen = Arc::new(Counted { calls: AtomicUsize::new(0), reply: cards(3) });
    let h = start(gen.clone()).await;
    let note = h.note("Glaciers", "Glaciers carve valleys as they move.").await;

    let resp = h
        .http
        .post(format!("{}/notes/{}/generate", h.base, note.id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    assert_eq!(gen.calls.load(Ordering::SeqCst), 1);
}
