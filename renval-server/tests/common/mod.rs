//! Shared test utilities for renval-server integration tests

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use renval_core::collaborators::{JsonDocumentRenderer, MemoryArtifactStore, RecordingDispatcher};
use renval_core::model::{NewPerson, Person, SystemRole};
use renval_core::{Collaborators, CoreConfig, MemoryEventBus, Renval, Store};
use renval_server::{AppState, PERSON_HEADER, ROLE_HEADER, RenvalServer, ServerConfig};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// In-process server over in-memory collaborators
#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub dispatcher: Arc<RecordingDispatcher>,
}

#[allow(dead_code)]
impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let artifacts = Arc::new(MemoryArtifactStore::new());
        let dispatcher = Arc::new(RecordingDispatcher::new());
        let renval = Renval::new(
            store,
            Collaborators {
                artifacts: artifacts.clone(),
                renderer: Arc::new(JsonDocumentRenderer::new(artifacts)),
                dispatcher: dispatcher.clone(),
                events: Arc::new(MemoryEventBus::default()),
            },
            CoreConfig::default(),
        );
        let state = Arc::new(AppState::new(renval));
        let server = TestServer::new(renval_server::create_router(Arc::clone(&state))).unwrap();
        Self {
            server,
            state,
            dispatcher,
        }
    }

    pub fn person(&self, name: &str, nip: &str) -> Person {
        self.state
            .renval
            .store()
            .insert_person(NewPerson {
                name: name.to_string(),
                email: format!("{nip}@example.com"),
                phone: Some("6281234567892".to_string()),
                nip: nip.to_string(),
                position: None,
                division: None,
                system_role: SystemRole::User,
            })
            .unwrap()
    }

    /// Create one assessment with two evaluators and return its JSON detail
    pub async fn assessment(&self) -> (Value, Person, Vec<Person>) {
        let participant = self.person("Angga Estibrata", "921722596I");
        let evaluators = vec![
            self.person("Andi Budimansyah", "881721674I"),
            self.person("Rois Syahputra", "961831207I"),
        ];
        let response = self
            .server
            .post("/api/assessments")
            .json(&batch(
                &participant.id,
                &[evaluators[0].id.as_str(), evaluators[1].id.as_str()],
            ))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        (body["data"]["assessments"][0].clone(), participant, evaluators)
    }

    pub async fn set_status(&self, id: &str, status: &str) {
        self.server
            .patch(&format!("/api/assessments/{id}/status"))
            .json(&json!({ "status": status }))
            .await
            .assert_status_ok();
    }
}

pub fn batch(participant: &str, evaluators: &[&str]) -> Value {
    json!({
        "assessment": {
            "title": "Fit and Proper Supervisor",
            "material": "Unit operations and safety",
            "projection": "SUPERVISOR",
            "method": "OFFLINE",
            "room": "B-201"
        },
        "participants": [
            { "participantId": participant, "schedule": "2025-03-10T09:00:00Z" }
        ],
        "evaluators": evaluators
    })
}

/// Attach the acting identity headers
#[allow(dead_code)]
pub fn acting(request: TestRequest, person_id: &str, role: Option<&str>) -> TestRequest {
    let request = request.add_header(
        HeaderName::from_static(PERSON_HEADER),
        HeaderValue::from_str(person_id).unwrap(),
    );
    match role {
        Some(role) => request.add_header(
            HeaderName::from_static(ROLE_HEADER),
            HeaderValue::from_str(role).unwrap(),
        ),
        None => request,
    }
}

/// Spawns a real server on an ephemeral port, returns its address
#[allow(dead_code)]
pub async fn spawn_server() -> SocketAddr {
    spawn_with_state(Arc::new(AppState::in_memory().unwrap())).await
}

#[allow(dead_code)]
pub async fn spawn_with_state(state: Arc<AppState>) -> SocketAddr {
    let server = RenvalServer::with_state(ServerConfig::new("127.0.0.1", 0), state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = server.run_with_listener(listener).await;
    });

    // Brief delay to ensure server is accepting connections
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    addr
}
