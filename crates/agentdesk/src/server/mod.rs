//! HTTP API over the client store.
//!
//! | Method | Path                       | Action                    |
//! |--------|----------------------------|---------------------------|
//! | GET    | `/health`                  | liveness and client count |
//! | GET    | `/api/clients`             | all clients               |
//! | POST   | `/api/clients`             | append a client           |
//! | GET    | `/api/clients/{id}`        | one client                |
//! | PUT    | `/api/clients/{id}`        | replace a client          |
//! | GET    | `/api/clients/{id}/notes`  | notes for a client        |
//! | PUT    | `/api/clients/{id}/notes`  | replace notes             |

pub mod error;
mod handlers;

use std::future::Future;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use regex::Regex;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::Client;
use crate::storage::ClientStore;

pub use error::ApiError;

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    store: Arc<ClientStore>,
    /// Present when writes must carry a well-formed mobile number.
    mobile_number_rule: Option<Regex>,
}

impl AppState {
    /// Create state with no mobile number checks.
    #[must_use]
    pub fn new(store: Arc<ClientStore>) -> Self {
        Self {
            store,
            mobile_number_rule: None,
        }
    }

    /// Create state from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured mobile number pattern is invalid.
    pub fn from_config(config: &Config, store: Arc<ClientStore>) -> Result<Self> {
        let mobile_number_rule = if config.validation.strict_mobile_number {
            Some(config.mobile_number_regex()?)
        } else {
            None
        };
        Ok(Self {
            store,
            mobile_number_rule,
        })
    }

    /// The shared store.
    #[must_use]
    pub fn store(&self) -> &Arc<ClientStore> {
        &self.store
    }

    fn check_mobile_number(&self, client: &Client) -> Result<()> {
        match &self.mobile_number_rule {
            Some(rule) => client.validate_mobile_number(rule),
            None => Ok(()),
        }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/clients",
            get(handlers::list_clients).post(handlers::create_client),
        )
        .route(
            "/api/clients/{id}",
            get(handlers::get_client).put(handlers::update_client),
        )
        .route(
            "/api/clients/{id}/notes",
            get(handlers::get_notes).put(handlers::save_notes),
        )
        // Static paths the dashboard fetched the data files from
        .route("/client/clients.json", get(handlers::list_clients))
        .route("/client/clients/{file}", get(handlers::get_client_file))
        .fallback(handlers::not_found)
        .with_state(state)
}

/// Bind the configured address and serve until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the address cannot be bound, the configuration is
/// invalid, or the server fails.
pub async fn serve<F>(config: &Config, store: Arc<ClientStore>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = AppState::from_config(config, store)?;
    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| Error::Bind { addr, source })?;

    serve_listener(listener, state, shutdown).await
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve_listener<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::server(e.to_string()))?;
    info!("server stopped");
    Ok(())
}

/// Resolve on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for Ctrl-C: {e}");
        return;
    }
    info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use tokio::sync::oneshot;

    use super::*;
    use crate::logging::init_test_logging;

    struct TestServer {
        base: String,
        data_dir: PathBuf,
        http: reqwest::Client,
        shutdown: Option<oneshot::Sender<()>>,
        _dir: tempfile::TempDir,
    }

    impl TestServer {
        async fn start(strict: bool) -> Self {
            init_test_logging();
            let dir = tempfile::tempdir().unwrap();
            let store = Arc::new(ClientStore::open(dir.path()).await.unwrap());

            let mut config = Config::default();
            config.validation.strict_mobile_number = strict;
            let state = AppState::from_config(&config, store).unwrap();

            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let (tx, rx) = oneshot::channel::<()>();
            tokio::spawn(serve_listener(listener, state, async {
                let _ = rx.await;
            }));

            Self {
                base: format!("http://{addr}"),
                data_dir: dir.path().to_path_buf(),
                http: reqwest::Client::new(),
                shutdown: Some(tx),
                _dir: dir,
            }
        }

        fn url(&self, path: &str) -> String {
            format!("{}{path}", self.base)
        }

        async fn post_client(&self, body: &Value) -> reqwest::Response {
            self.http
                .post(self.url("/api/clients"))
                .json(body)
                .send()
                .await
                .unwrap()
        }

        async fn list(&self) -> Vec<Value> {
            self.http
                .get(self.url("/api/clients"))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap()
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            if let Some(tx) = self.shutdown.take() {
                let _ = tx.send(());
            }
        }
    }

    #[tokio::test]
    async fn test_health() {
        let server = TestServer::start(false).await;

        let body: Value = server
            .http
            .get(server.url("/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({"status": "ok", "clients": 0}));
    }

    #[tokio::test]
    async fn test_post_then_get_returns_client() {
        let server = TestServer::start(false).await;

        let resp = server
            .post_client(&json!({
                "id": "1718000000000",
                "name": "Asha Verma",
                "mobileNumber": "9876543210",
                "age": 34,
                "additionalFields": [{"id": "1", "title": "Policy", "description": "Term"}]
            }))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = resp.json().await.unwrap();
        assert_eq!(created["id"], "1718000000000");
        assert_eq!(created["name"], "Asha Verma");

        let clients = server.list().await;
        assert_eq!(clients, vec![created]);
    }

    #[tokio::test]
    async fn test_post_generates_id() {
        let server = TestServer::start(false).await;

        let created: Value = server
            .post_client(&json!({"name": "Ravi", "number": "9123456780"}))
            .await
            .json()
            .await
            .unwrap();

        let id = created["id"].as_str().unwrap();
        assert!(id.parse::<i64>().is_ok());
        assert_eq!(created["mobileNumber"], "9123456780");
    }

    #[tokio::test]
    async fn test_post_numeric_id() {
        let server = TestServer::start(false).await;

        let created: Value = server
            .post_client(&json!({"id": 1_718_000_000_001_i64, "name": "Ravi"}))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(created["id"], "1718000000001");

        let resp = server
            .http
            .get(server.url("/api/clients/1718000000001"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_post_duplicate_is_conflict() {
        let server = TestServer::start(false).await;
        let body = json!({"id": "7", "name": "Asha"});

        assert_eq!(server.post_client(&body).await.status(), StatusCode::CREATED);

        let resp = server.post_client(&body).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(server.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_post_malformed_body() {
        let server = TestServer::start(false).await;

        let resp = server
            .http
            .post(server.url("/api/clients"))
            .header("content-type", "application/json")
            .body("{\"name\": ")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_strict_mobile_number() {
        let server = TestServer::start(true).await;

        let resp = server
            .post_client(&json!({"name": "Asha", "mobileNumber": "12345"}))
            .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = server
            .post_client(&json!({"name": "Asha", "mobileNumber": "9876543210"}))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_lenient_mobile_number_by_default() {
        let server = TestServer::start(false).await;

        let resp = server
            .post_client(&json!({"name": "Asha", "mobileNumber": "12345"}))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_get_unknown_client() {
        let server = TestServer::start(false).await;

        let resp = server
            .http
            .get(server.url("/api/clients/404"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"error": "Client not found"}));
    }

    #[tokio::test]
    async fn test_put_replaces_client() {
        let server = TestServer::start(false).await;
        server
            .post_client(&json!({"id": "7", "name": "Asha", "mobileNumber": "9876543210"}))
            .await;

        let resp = server
            .http
            .put(server.url("/api/clients/7"))
            .json(&json!({"id": "7", "name": "Asha Verma", "mobileNumber": "9000000000"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let clients = server.list().await;
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0]["name"], "Asha Verma");
        assert_eq!(clients[0]["mobileNumber"], "9000000000");
    }

    #[tokio::test]
    async fn test_put_unknown_id_is_404() {
        let server = TestServer::start(false).await;

        let resp = server
            .http
            .put(server.url("/api/clients/404"))
            .json(&json!({"name": "Ghost"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(server.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_get_with_malformed_file_is_empty_list() {
        let server = TestServer::start(false).await;
        std::fs::write(server.data_dir.join("clients.json"), "[{\"id\": ").unwrap();

        let resp = server
            .http
            .get(server.url("/api/clients"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let clients: Vec<Value> = resp.json().await.unwrap();
        assert!(clients.is_empty());
    }

    #[tokio::test]
    async fn test_post_with_malformed_file_is_500() {
        let server = TestServer::start(false).await;
        std::fs::write(server.data_dir.join("clients.json"), "oops").unwrap();

        let resp = server.post_client(&json!({"name": "Asha"})).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"error": "Failed to create client"}));
    }

    #[tokio::test]
    async fn test_notes_round_trip() {
        let server = TestServer::start(false).await;
        server.post_client(&json!({"id": "7", "name": "Asha"})).await;

        let empty: Value = server
            .http
            .get(server.url("/api/clients/7/notes"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(empty, json!({"clientId": "7", "notes": ""}));

        let resp = server
            .http
            .put(server.url("/api/clients/7/notes"))
            .json(&json!({"notes": "Prefers email"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let saved: Value = server
            .http
            .get(server.url("/api/clients/7/notes"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(saved["notes"], "Prefers email");
    }

    #[tokio::test]
    async fn test_notes_unknown_client() {
        let server = TestServer::start(false).await;

        let resp = server
            .http
            .put(server.url("/api/clients/404/notes"))
            .json(&json!({"notes": "x"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let server = TestServer::start(false).await;

        let resp = server
            .http
            .get(server.url("/api/nothing-here"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"error": "Not found"}));
    }

    #[tokio::test]
    async fn test_concurrent_posts_lose_nothing() {
        let server = TestServer::start(false).await;

        let requests = (0..20).map(|i| {
            let http = server.http.clone();
            let url = server.url("/api/clients");
            async move {
                http.post(url)
                    .json(&json!({"name": format!("client {i}")}))
                    .send()
                    .await
                    .unwrap()
                    .status()
            }
        });
        let handles: Vec<_> = requests.map(tokio::spawn).collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), StatusCode::CREATED);
        }

        assert_eq!(server.list().await.len(), 20);
    }

    #[tokio::test]
    async fn test_put_with_both_number_keys() {
        let server = TestServer::start(false).await;
        server
            .post_client(&json!({"id": "7", "name": "Asha", "mobileNumber": "9876543210"}))
            .await;

        let resp = server
            .http
            .put(server.url("/api/clients/7"))
            .json(&json!({
                "id": "7",
                "name": "Asha",
                "mobileNumber": "9876543210",
                "number": "9000000000"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let stored: Value = resp.json().await.unwrap();
        assert_eq!(stored["mobileNumber"], "9000000000");
        assert!(stored.get("number").is_none());

        assert_eq!(server.list().await[0]["mobileNumber"], "9000000000");
    }

    #[tokio::test]
    async fn test_unreadable_record_does_not_break_writes() {
        let server = TestServer::start(false).await;
        std::fs::write(
            server.data_dir.join("clients.json"),
            r#"[{"id": 1, "name": "Asha", "mobileNumber": "9876543210"}, {"id": 2}]"#,
        )
        .unwrap();

        let clients = server.list().await;
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0]["id"], "1");

        let resp = server
            .post_client(&json!({"id": "3", "name": "Ravi", "mobileNumber": "9123456780"}))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = server
            .http
            .put(server.url("/api/clients/1"))
            .json(&json!({"name": "Asha Verma", "mobileNumber": "9876543210"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let raw: Vec<Value> = serde_json::from_str(
            &std::fs::read_to_string(server.data_dir.join("clients.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[1], json!({"id": 2}));
    }

    #[tokio::test]
    async fn test_static_clients_file_path() {
        let server = TestServer::start(false).await;
        server
            .post_client(&json!({"id": "7", "name": "Asha", "mobileNumber": "9876543210"}))
            .await;

        let resp = server
            .http
            .get(server.url("/client/clients.json"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let clients: Vec<Value> = resp.json().await.unwrap();
        assert_eq!(clients, server.list().await);
    }

    #[tokio::test]
    async fn test_static_detail_file_path() {
        let server = TestServer::start(false).await;
        server
            .post_client(&json!({"id": "7", "name": "Asha", "mobileNumber": "9876543210"}))
            .await;

        let resp = server
            .http
            .get(server.url("/client/clients/7.json"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let client: Value = resp.json().await.unwrap();
        assert_eq!(client["name"], "Asha");

        for missing in ["/client/clients/8.json", "/client/clients/7"] {
            let resp = server.http.get(server.url(missing)).send().await.unwrap();
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{missing}");
        }
    }
}
