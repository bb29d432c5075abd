//! Integration tests for the DevFest backend.

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::{Config, StorageBackend};
use crate::models::CreateEventRequest;
use crate::store::{self, FileStore, Store};
use crate::{create_router, AppState};

const MIGRATE_SECRET: &str = "test-migrate-secret";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    store: Arc<dyn Store>,
    data_path: PathBuf,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn file() -> Self {
        Self::spawn(StorageBackend::File, Some(MIGRATE_SECRET)).await
    }

    async fn sqlite() -> Self {
        Self::spawn(StorageBackend::Sqlite, Some(MIGRATE_SECRET)).await
    }

    async fn spawn(storage: StorageBackend, migrate_secret: Option<&str>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().join("devfest.json");
        let db_path = temp_dir.path().join("devfest.sqlite");

        let config = Config {
            storage,
            data_path: data_path.clone(),
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            migrate_secret: migrate_secret.map(str::to_string),
        };

        let store = store::from_config(&config)
            .await
            .expect("Failed to init store");

        let state = AppState {
            store: store.clone(),
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            store,
            data_path,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn create_speaker(&self, name: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/speakers"))
            .json(&json!({ "name": name, "title": "Engineer" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body: Value = resp.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::file().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

async fn run_speaker_crud(fixture: TestFixture) {
    // Create speaker
    let create_resp = fixture
        .client
        .post(fixture.url("/api/speakers"))
        .json(&json!({
            "name": "Ada Ndlovu",
            "title": "Staff Engineer",
            "company": "Acme",
            "bio": "Distributed systems."
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(create_resp.status(), 201);
    let create_body: Value = create_resp.json().await.unwrap();
    let speaker_id = create_body["id"].as_str().unwrap();
    assert_eq!(create_body["name"], "Ada Ndlovu");
    assert_eq!(create_body["company"], "Acme");
    assert_eq!(create_body["rating"], 0.0);
    assert_eq!(create_body["reviewCount"], 0);

    // Get speaker
    let get_resp = fixture
        .client
        .get(fixture.url(&format!("/api/speakers/{}", speaker_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_resp.status(), 200);
    let get_body: Value = get_resp.json().await.unwrap();
    assert_eq!(get_body["name"], "Ada Ndlovu");

    // Update speaker
    let update_resp = fixture
        .client
        .put(fixture.url(&format!("/api/speakers/{}", speaker_id)))
        .json(&json!({ "title": "Principal Engineer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);
    let update_body: Value = update_resp.json().await.unwrap();
    assert_eq!(update_body["success"], true);

    let get_resp = fixture
        .client
        .get(fixture.url(&format!("/api/speakers/{}", speaker_id)))
        .send()
        .await
        .unwrap();
    let get_body: Value = get_resp.json().await.unwrap();
    assert_eq!(get_body["title"], "Principal Engineer");
    // Untouched fields survive a partial update
    assert_eq!(get_body["name"], "Ada Ndlovu");

    // List speakers
    let list_resp = fixture
        .client
        .get(fixture.url("/api/speakers"))
        .send()
        .await
        .unwrap();
    assert_eq!(list_resp.status(), 200);
    let list_body: Value = list_resp.json().await.unwrap();
    assert_eq!(list_body.as_array().unwrap().len(), 1);

    // Delete speaker
    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/speakers/{}", speaker_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    // Verify deleted
    let get_deleted_resp = fixture
        .client
        .get(fixture.url(&format!("/api/speakers/{}", speaker_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_deleted_resp.status(), 404);
    let body: Value = get_deleted_resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_speaker_crud_file() {
    run_speaker_crud(TestFixture::file().await).await;
}

#[tokio::test]
async fn test_speaker_crud_sqlite() {
    run_speaker_crud(TestFixture::sqlite().await).await;
}

#[tokio::test]
async fn test_validation_errors() {
    let fixture = TestFixture::file().await;

    // Speaker with empty name
    let resp = fixture
        .client
        .post(fixture.url("/api/speakers"))
        .json(&json!({ "name": "", "title": "Engineer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Session with empty title
    let resp = fixture
        .client
        .post(fixture.url("/api/sessions"))
        .json(&json!({ "title": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

async fn run_session_crud(fixture: TestFixture) {
    let speaker_id = fixture.create_speaker("Session Speaker").await;

    // Create session with a duplicated speaker reference
    let create_resp = fixture
        .client
        .post(fixture.url("/api/sessions"))
        .json(&json!({
            "title": "Intro to Rust",
            "description": "Ownership and borrowing",
            "speakerIds": [speaker_id, speaker_id],
            "track": "Hall A",
            "startTime": "09:00",
            "endTime": "10:00",
            "tags": ["rust", "beginner"]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(create_resp.status(), 201);
    let create_body: Value = create_resp.json().await.unwrap();
    let session_id = create_body["id"].as_str().unwrap();
    assert_eq!(
        create_body["speakerIds"],
        json!([speaker_id]),
        "duplicate speaker ids are dropped"
    );
    assert_eq!(create_body["tags"], json!(["rust", "beginner"]));

    // Update session
    let update_resp = fixture
        .client
        .put(fixture.url(&format!("/api/sessions/{}", session_id)))
        .json(&json!({ "track": "Hall B" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);

    let get_resp = fixture
        .client
        .get(fixture.url(&format!("/api/sessions/{}", session_id)))
        .send()
        .await
        .unwrap();
    let get_body: Value = get_resp.json().await.unwrap();
    assert_eq!(get_body["track"], "Hall B");
    assert_eq!(get_body["title"], "Intro to Rust");

    // Deleting the speaker scrubs the session's reference
    fixture
        .client
        .delete(fixture.url(&format!("/api/speakers/{}", speaker_id)))
        .send()
        .await
        .unwrap();

    let get_resp = fixture
        .client
        .get(fixture.url(&format!("/api/sessions/{}", session_id)))
        .send()
        .await
        .unwrap();
    let get_body: Value = get_resp.json().await.unwrap();
    assert_eq!(get_body["speakerIds"], json!([]));

    // Delete session
    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/sessions/{}", session_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    let get_deleted = fixture
        .client
        .get(fixture.url(&format!("/api/sessions/{}", session_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_deleted.status(), 404);
}

#[tokio::test]
async fn test_session_crud_file() {
    run_session_crud(TestFixture::file().await).await;
}

#[tokio::test]
async fn test_session_crud_sqlite() {
    run_session_crud(TestFixture::sqlite().await).await;
}

#[tokio::test]
async fn test_unknown_id_writes_succeed() {
    let fixture = TestFixture::file().await;

    // Updates and deletes against unknown ids report success without changes
    let resp = fixture
        .client
        .put(fixture.url("/api/speakers/no-such-id"))
        .json(&json!({ "name": "Ghost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);

    let resp = fixture
        .client
        .delete(fixture.url("/api/sessions/no-such-id"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_review_target_validation() {
    let fixture = TestFixture::file().await;

    // Neither target
    let resp = fixture
        .client
        .post(fixture.url("/api/reviews"))
        .json(&json!({ "userName": "Sam", "rating": 4, "comment": "Good" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Empty-string targets count as absent
    let resp = fixture
        .client
        .post(fixture.url("/api/reviews"))
        .json(&json!({
            "speakerId": "",
            "sessionId": "",
            "userName": "Sam",
            "rating": 4
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Both targets
    let resp = fixture
        .client
        .post(fixture.url("/api/reviews"))
        .json(&json!({
            "speakerId": "s1",
            "sessionId": "x1",
            "userName": "Sam",
            "rating": 4
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Out-of-range rating
    let resp = fixture
        .client
        .post(fixture.url("/api/reviews"))
        .json(&json!({ "speakerId": "s1", "userName": "Sam", "rating": 6 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Nothing was persisted
    let resp = fixture
        .client
        .get(fixture.url("/api/reviews"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 0);

    // Session-only target is accepted
    let resp = fixture
        .client
        .post(fixture.url("/api/reviews"))
        .json(&json!({ "sessionId": "x1", "userName": "Sam", "rating": 4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
}

async fn run_speaker_rating(fixture: TestFixture) {
    let speaker_id = fixture.create_speaker("Rated Speaker").await;

    // Two reviews: 5 and 4
    let first_resp = fixture
        .client
        .post(fixture.url("/api/reviews"))
        .json(&json!({
            "speakerId": speaker_id,
            "userName": "Alice",
            "rating": 5,
            "comment": "Excellent"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(first_resp.status(), 201);
    let first_body: Value = first_resp.json().await.unwrap();
    let first_review_id = first_body["id"].as_str().unwrap().to_string();

    fixture
        .client
        .post(fixture.url("/api/reviews"))
        .json(&json!({
            "speakerId": speaker_id,
            "userName": "Bob",
            "rating": 4,
            "comment": "Solid"
        }))
        .send()
        .await
        .unwrap();

    let get_resp = fixture
        .client
        .get(fixture.url(&format!("/api/speakers/{}", speaker_id)))
        .send()
        .await
        .unwrap();
    let speaker: Value = get_resp.json().await.unwrap();
    assert_eq!(speaker["rating"], 4.5);
    assert_eq!(speaker["reviewCount"], 2);

    // Deleting the 5-star review re-derives the aggregate
    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/reviews/{}", first_review_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    let get_resp = fixture
        .client
        .get(fixture.url(&format!("/api/speakers/{}", speaker_id)))
        .send()
        .await
        .unwrap();
    let speaker: Value = get_resp.json().await.unwrap();
    assert_eq!(speaker["rating"], 4.0);
    assert_eq!(speaker["reviewCount"], 1);
}

#[tokio::test]
async fn test_speaker_rating_file() {
    run_speaker_rating(TestFixture::file().await).await;
}

#[tokio::test]
async fn test_speaker_rating_sqlite() {
    run_speaker_rating(TestFixture::sqlite().await).await;
}

#[tokio::test]
async fn test_review_filters() {
    let fixture = TestFixture::sqlite().await;

    let speaker_id = fixture.create_speaker("Filter Speaker").await;

    fixture
        .client
        .post(fixture.url("/api/reviews"))
        .json(&json!({ "speakerId": speaker_id, "userName": "A", "rating": 5 }))
        .send()
        .await
        .unwrap();
    fixture
        .client
        .post(fixture.url("/api/reviews"))
        .json(&json!({ "sessionId": "session-1", "userName": "B", "rating": 3 }))
        .send()
        .await
        .unwrap();

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/reviews?speakerId={}", speaker_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let reviews = body.as_array().unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["userName"], "A");

    let resp = fixture
        .client
        .get(fixture.url("/api/reviews?sessionId=session-1"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let reviews = body.as_array().unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["userName"], "B");

    let resp = fixture
        .client
        .get(fixture.url("/api/reviews"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_event_endpoints() {
    let fixture = TestFixture::file().await;

    // No event yet
    let resp = fixture
        .client
        .get(fixture.url("/api/events"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .put(fixture.url("/api/events"))
        .json(&json!({ "name": "DevFest 2026" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Seed the event record directly in the store
    fixture
        .store
        .create_event(&CreateEventRequest {
            name: "DevFest 2025".to_string(),
            description: "Community conference".to_string(),
            date: "2025-11-22".to_string(),
            location: "Cape Town".to_string(),
            image: String::new(),
        })
        .await
        .unwrap();

    let resp = fixture
        .client
        .get(fixture.url("/api/events"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["name"], "DevFest 2025");

    // Partial update
    let resp = fixture
        .client
        .put(fixture.url("/api/events"))
        .json(&json!({ "location": "Durban" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);

    let resp = fixture
        .client
        .get(fixture.url("/api/events"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["name"], "DevFest 2025");
    assert_eq!(body["location"], "Durban");
}

#[tokio::test]
async fn test_migrate_requires_secret() {
    let fixture = TestFixture::sqlite().await;

    // No header
    let resp = fixture
        .client
        .post(fixture.url("/api/migrate"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    // Wrong header
    let resp = fixture
        .client
        .post(fixture.url("/api/migrate"))
        .header("x-migrate-secret", "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_migrate_disabled_without_configured_secret() {
    let fixture = TestFixture::spawn(StorageBackend::Sqlite, None).await;

    let resp = fixture
        .client
        .post(fixture.url("/api/migrate"))
        .header("x-migrate-secret", MIGRATE_SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_migrate_imports_data_file() {
    let fixture = TestFixture::sqlite().await;

    // Seed the flat-file document the endpoint reads from
    let source = FileStore::new(fixture.data_path.clone());
    source
        .create_speaker(&crate::models::CreateSpeakerRequest {
            name: "Imported Speaker".to_string(),
            title: "Engineer".to_string(),
            company: None,
            bio: None,
            image: String::new(),
            twitter: None,
            linkedin: None,
            github: None,
        })
        .await
        .unwrap();
    source
        .create_session(&crate::models::CreateSessionRequest {
            title: "Imported Session".to_string(),
            description: String::new(),
            start_time: "09:00".to_string(),
            end_time: "10:00".to_string(),
            track: String::new(),
            speaker_ids: Vec::new(),
            tags: Vec::new(),
        })
        .await
        .unwrap();

    let resp = fixture
        .client
        .post(fixture.url("/api/migrate"))
        .header("x-migrate-secret", MIGRATE_SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let report: Value = resp.json().await.unwrap();
    assert_eq!(report["speakers"], 1);
    assert_eq!(report["sessions"], 1);
    assert_eq!(report["reviews"], 0);

    let resp = fixture
        .client
        .get(fixture.url("/api/speakers"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Imported Speaker");

    // Re-running imports nothing new
    let resp = fixture
        .client
        .post(fixture.url("/api/migrate"))
        .header("x-migrate-secret", MIGRATE_SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let report: Value = resp.json().await.unwrap();
    assert_eq!(report["speakers"], 0);
    assert_eq!(report["sessions"], 0);
}
