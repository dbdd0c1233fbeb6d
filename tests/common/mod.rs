#![allow(dead_code)]

use github_account_sync::config::SyncConfig;
use github_account_sync::store::{MemoryStore, SyncStore};
use github_account_sync::sync::SyncCoordinator;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test_token";

pub struct TestContext {
    pub server: MockServer,
    pub store: Arc<MemoryStore>,
    pub config: SyncConfig,
}

impl TestContext {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let config = SyncConfig::default().with_api_base_url(server.uri());
        TestContext {
            server,
            store: Arc::new(MemoryStore::new()),
            config,
        }
    }

    pub fn with_config(mut self, f: impl FnOnce(SyncConfig) -> SyncConfig) -> Self {
        self.config = f(self.config);
        self
    }

    pub fn coordinator(&self) -> SyncCoordinator {
        let store: Arc<dyn SyncStore> = self.store.clone();
        SyncCoordinator::new(store, self.config.clone())
    }

    /// Serve `body` for `page` of `endpoint_path`
    pub async fn mount_page(&self, endpoint_path: &str, page: u32, body: Value) {
        Mock::given(method("GET"))
            .and(path(endpoint_path))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Serve `status` for every page of `endpoint_path`
    pub async fn mount_status(&self, endpoint_path: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(endpoint_path))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "message": "Server Error" })))
            .mount(&self.server)
            .await;
    }

    /// Make every top-level listing return an empty first page
    pub async fn mount_empty_account(&self) {
        for endpoint in ["/user/starred", "/user/following", "/user/followers", "/user/repos"] {
            self.mount_page(endpoint, 1, json!([])).await;
        }
    }
}

pub fn repo(id: i64) -> Value {
    json!({
        "id": id,
        "name": format!("repo-{}", id),
        "full_name": format!("owner/repo-{}", id),
        "html_url": format!("https://github.com/owner/repo-{}", id),
        "language": null,
        "stargazers_count": 3,
    })
}

pub fn owned_repo(id: i64, language: Option<&str>) -> Value {
    json!({
        "id": id,
        "full_name": format!("me/repo-{}", id),
        "html_url": format!("https://github.com/me/repo-{}", id),
        "language": language,
    })
}

pub fn user(id: i64, login: &str) -> Value {
    json!({
        "id": id,
        "login": login,
        "html_url": format!("https://github.com/{}", login),
        "avatar_url": format!("https://avatars.githubusercontent.com/u/{}", id),
        "type": "User",
    })
}

pub fn repos(ids: std::ops::Range<i64>) -> Value {
    Value::Array(ids.map(repo).collect())
}

pub fn users(ids: std::ops::Range<i64>) -> Value {
    Value::Array(ids.map(|id| user(id, &format!("user{}", id))).collect())
}
