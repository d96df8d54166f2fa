//! HTTP surface tests, driven through `warp::test` without binding a port.

use friendgraph::api::v1::{ACTOR_HEADER, recover_error, routes};
use friendgraph::application_impl::{RealRelationshipService, RealUserService};
use friendgraph::application_port::{RelationshipService, UserService};
use friendgraph::domain_model::{EdgeState, NewUser, UserId};
use friendgraph::domain_port::{FriendNotification, FriendNotifier};
use friendgraph::infra_memory::{MemoryEdgeRepo, MemoryStore, MemoryTxManager, MemoryUserRepo};
use friendgraph::server::Server;
use friendgraph::settings::{Http, Log, Settings, Store};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use warp::Filter;
use warp::http::StatusCode;

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<FriendNotification>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<FriendNotification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FriendNotifier for RecordingNotifier {
    async fn notify(&self, notifications: Vec<FriendNotification>) {
        self.sent.lock().unwrap().extend(notifications);
    }
}

struct TestApp {
    server: Arc<Server>,
    store: MemoryStore,
    notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    fn new() -> Self {
        let store = MemoryStore::new();
        let tx_manager = Arc::new(MemoryTxManager::new(store.clone()));
        let notifier = Arc::new(RecordingNotifier::default());
        let server = Server::new(
            Arc::new(RealUserService::new(
                Arc::new(MemoryUserRepo::new(store.clone())),
                tx_manager.clone(),
            )),
            Arc::new(RealRelationshipService::new(
                Arc::new(MemoryEdgeRepo::new(store.clone())),
                tx_manager,
            )),
            notifier.clone(),
        );
        TestApp {
            server: Arc::new(server),
            store,
            notifier,
        }
    }

    async fn user(&self, username: &str) -> UserId {
        self.server
            .user_service
            .create_user(NewUser::with_username(username))
            .await
            .unwrap()
    }

    async fn post(&self, path: &str, actor: Option<UserId>, body: &str) -> (StatusCode, Value) {
        let api = warp::path("api")
            .and(warp::path("v1"))
            .and(routes(self.server.clone()))
            .recover(recover_error);

        let mut request = warp::test::request()
            .method("POST")
            .path(path)
            .header("content-type", "application/json")
            .body(body.to_owned());
        if let Some(actor) = actor {
            request = request.header(ACTOR_HEADER, actor.to_string());
        }

        let res = request.reply(&api).await;
        (res.status(), serde_json::from_slice(res.body()).unwrap())
    }

    async fn get(&self, path: &str, actor: Option<UserId>) -> (StatusCode, Value) {
        let api = warp::path("api")
            .and(warp::path("v1"))
            .and(routes(self.server.clone()))
            .recover(recover_error);

        let mut request = warp::test::request().method("GET").path(path);
        if let Some(actor) = actor {
            request = request.header(ACTOR_HEADER, actor.to_string());
        }

        let res = request.reply(&api).await;
        (res.status(), serde_json::from_slice(res.body()).unwrap())
    }
}

fn ids_body(ids: &[UserId]) -> String {
    let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
    json!({ "ids": ids }).to_string()
}

fn error_message(body: &Value) -> &str {
    body["error"]["message"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn missing_actor_header_is_unauthorized() {
    let app = TestApp::new();
    let bob = app.user("bob").await;

    let (status, body) = app.post("/api/v1/friends/add", None, &ids_body(&[bob])).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));

    let (status, _) = app.get("/api/v1/friends", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_target_list_is_rejected() {
    let app = TestApp::new();
    let alice = app.user("alice").await;

    for path in [
        "/api/v1/friends/add",
        "/api/v1/friends/delete",
        "/api/v1/friends/block",
    ] {
        let (status, body) = app.post(path, Some(alice), "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(error_message(&body), "Specify at least one ID or Username.");
    }
}

#[tokio::test]
async fn self_targets_are_rejected_per_operation() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let body = ids_body(&[alice]);

    let cases = [
        ("/api/v1/friends/add", "Cannot add self as friend."),
        ("/api/v1/friends/delete", "Cannot delete self."),
        ("/api/v1/friends/block", "Cannot block self."),
    ];
    for (path, message) in cases {
        let (status, body) = app.post(path, Some(alice), &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(error_message(&body), message);
    }

    // Naming yourself by username is caught the same way.
    let (status, body) = app
        .post(
            "/api/v1/friends/add",
            Some(alice),
            &json!({ "usernames": ["alice"] }).to_string(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Cannot add self as friend.");
    assert_eq!(app.store.snapshot().await.edges().count(), 0);
}

#[tokio::test]
async fn malformed_ids_and_bodies_are_bad_requests() {
    let app = TestApp::new();
    let alice = app.user("alice").await;

    let (status, _) = app
        .post(
            "/api/v1/friends/add",
            Some(alice),
            &json!({ "ids": ["not-a-uuid"] }).to_string(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/api/v1/friends/add", Some(alice), "{").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invite_and_accept_notify_after_commit() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;

    let (status, body) = app
        .post("/api/v1/friends/add", Some(alice), &ids_body(&[bob]))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let (status, _) = app
        .post(
            "/api/v1/friends/add",
            Some(bob),
            &json!({ "usernames": ["alice"] }).to_string(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // A repeated add changes nothing and sends nothing.
    app.post("/api/v1/friends/add", Some(alice), &ids_body(&[bob]))
        .await;

    assert_eq!(
        app.notifier.sent(),
        vec![
            FriendNotification::InviteReceived {
                from: alice,
                to: bob
            },
            FriendNotification::InviteAccepted { by: bob, to: alice },
        ]
    );

    let tables = app.store.snapshot().await;
    assert_eq!(tables.edge_state(alice, bob), Some(EdgeState::Accepted));
    assert_eq!(tables.edge_state(bob, alice), Some(EdgeState::Accepted));
}

#[tokio::test]
async fn unknown_usernames_are_ignored() {
    let app = TestApp::new();
    let alice = app.user("alice").await;

    let (status, _) = app
        .post(
            "/api/v1/friends/add",
            Some(alice),
            &json!({ "usernames": ["nobody"] }).to_string(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.notifier.sent().is_empty());
    assert_eq!(app.store.snapshot().await.edge_count(alice), Some(0));
}

#[tokio::test]
async fn list_reports_state_from_the_callers_side() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let carol = app.user("carol").await;

    app.post("/api/v1/friends/add", Some(alice), &ids_body(&[bob]))
        .await;
    app.post("/api/v1/friends/block", Some(alice), &ids_body(&[carol]))
        .await;

    let (status, body) = app.get("/api/v1/friends", Some(alice)).await;
    assert_eq!(status, StatusCode::OK);
    let friends = body["data"]["friends"].as_array().unwrap();
    assert_eq!(friends.len(), 2);
    assert_eq!(friends[0]["user"]["username"], json!("bob"));
    assert_eq!(friends[0]["state"], json!("outgoing_request"));
    assert_eq!(friends[0]["user"]["online"], json!(false));
    assert_eq!(friends[1]["user"]["username"], json!("carol"));
    assert_eq!(friends[1]["state"], json!("blocked"));

    let (_, body) = app.get("/api/v1/friends", Some(bob)).await;
    let friends = body["data"]["friends"].as_array().unwrap();
    assert_eq!(friends.len(), 1);
    assert_eq!(friends[0]["state"], json!("invited"));

    let (_, body) = app.get("/api/v1/friends", Some(carol)).await;
    assert!(body["data"]["friends"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn delete_removes_both_sides() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;

    app.post("/api/v1/friends/add", Some(alice), &ids_body(&[bob]))
        .await;
    let (status, _) = app
        .post("/api/v1/friends/delete", Some(bob), &ids_body(&[alice]))
        .await;
    assert_eq!(status, StatusCode::OK);

    let tables = app.store.snapshot().await;
    assert_eq!(tables.edges().count(), 0);
    assert_eq!(tables.edge_count(alice), Some(0));
    assert_eq!(tables.edge_count(bob), Some(0));
}

#[tokio::test]
async fn inconsistent_batch_is_an_internal_error() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;

    app.post("/api/v1/friends/block", Some(alice), &ids_body(&[bob]))
        .await;
    let (status, body) = app
        .post("/api/v1/friends/delete", Some(alice), &ids_body(&[bob]))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));

    let tables = app.store.snapshot().await;
    assert_eq!(tables.edge_state(alice, bob), Some(EdgeState::Blocked));
}

#[tokio::test]
async fn unknown_routes_and_methods_are_rejected() {
    let app = TestApp::new();
    let alice = app.user("alice").await;

    let (status, _) = app.get("/api/v1/enemies", Some(alice)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/v1/friends/add", Some(alice)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn unknown_actor_gets_no_op_not_internal_error() {
    let app = TestApp::new();
    let bob = app.user("bob").await;
    let ghost = UserId::new();

    for path in [
        "/api/v1/friends/add",
        "/api/v1/friends/block",
        "/api/v1/friends/delete",
    ] {
        let (status, body) = app.post(path, Some(ghost), &ids_body(&[bob])).await;
        assert_eq!(status, StatusCode::OK, "{path}");
        assert_eq!(body["success"], json!(true));
    }

    assert!(app.notifier.sent().is_empty());
    let tables = app.store.snapshot().await;
    assert_eq!(tables.edges().count(), 0);
    assert_eq!(tables.edge_count(bob), Some(0));
}

#[tokio::test]
async fn memory_server_seeds_configured_users() {
    let settings = Settings {
        http: Http {
            address: "127.0.0.1:0".to_owned(),
            cert_path: None,
            key_path: None,
        },
        log: Log {
            filter: "info".to_owned(),
        },
        store: Store {
            // Repeated names are skipped rather than failing startup.
            seed_usernames: vec!["alice".to_owned(), "bob".to_owned(), "alice".to_owned()],
            ..Store::memory()
        },
    };

    let server = Server::try_new(&settings).await.unwrap();
    let ids = server
        .user_service
        .resolve_usernames(&["alice".to_owned(), "bob".to_owned()])
        .await
        .unwrap();
    assert_eq!(ids.len(), 2);

    let outcomes = server
        .relationship_service
        .add_friends(ids[0], &[ids[1]])
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    server.shutdown().await;
}
