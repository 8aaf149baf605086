//! Common test utilities and helpers for mirrorsync tests
#![allow(dead_code)]

use std::path::PathBuf;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use mirrorsync::Config;

/// Temporary directory holding a config file pointed at a fake forge
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub config_path: PathBuf,
}

impl TestEnvironment {
    pub fn new(content: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.yml");
        std::fs::write(&config_path, content).expect("Failed to write test config");
        Self {
            temp_dir,
            config_path,
        }
    }

    /// Config with the given ignore list and destinations
    pub fn for_server(api_url: &str, ignore: &[&str], destinations: &[&str]) -> Self {
        let mut content = format!(
            "gitea_api_url: \"{}\"\ngitea_api_token: \"test-token\"\ngitea_ignore_sync:",
            api_url
        );
        if ignore.is_empty() {
            content.push_str(" []\n");
        } else {
            content.push('\n');
            for name in ignore {
                content.push_str(&format!("  - name: \"{}\"\n", name));
            }
        }
        content.push_str("remote_git_servers:\n");
        for (index, base_url) in destinations.iter().enumerate() {
            content.push_str(&format!(
                "  - base_url: \"{}\"\n    username: \"user{}\"\n    password: \"pass{}\"\n",
                base_url, index, index
            ));
        }
        Self::new(&content)
    }

    pub fn load(&self) -> Config {
        Config::load(&self.config_path).expect("Failed to load test config")
    }
}

/// One complete page of a list endpoint, sized through `X-Total-Count`
fn listing(items: Vec<Value>) -> ResponseTemplate {
    let total = items.len().to_string();
    ResponseTemplate::new(200)
        .set_body_json(items)
        .insert_header("x-total-count", total.as_str())
}

/// wiremock-backed Gitea answering the push mirror endpoints
pub struct FakeGitea {
    pub server: MockServer,
}

impl FakeGitea {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub async fn with_orgs(&self, orgs: &[&str]) -> &Self {
        let body: Vec<Value> = orgs.iter().map(|name| json!({ "name": name })).collect();
        Mock::given(method("GET"))
            .and(path("/orgs"))
            .respond_with(listing(body))
            .mount(&self.server)
            .await;
        self
    }

    pub async fn with_repos(&self, org: &str, repos: &[&str]) -> &Self {
        let body: Vec<Value> = repos
            .iter()
            .map(|name| json!({ "name": name, "owner": { "login": org } }))
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("/orgs/{}/repos", org)))
            .respond_with(listing(body))
            .mount(&self.server)
            .await;
        self
    }

    pub async fn with_mirrors(&self, org: &str, repo: &str, mirrors: &[&str]) -> &Self {
        let body: Vec<Value> = mirrors
            .iter()
            .map(|name| json!({ "remote_name": name, "interval": "8h0m0s", "sync_on_commit": true }))
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("/repos/{}/{}/push_mirrors", org, repo)))
            .respond_with(listing(body))
            .mount(&self.server)
            .await;
        self
    }

    /// Accept every DELETE and POST on push mirror endpoints
    pub async fn accepting_writes(&self) -> &Self {
        Mock::given(method("DELETE"))
            .and(path_regex(r"^/repos/[^/]+/[^/]+/push_mirrors/[^/]+$"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&self.server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/repos/[^/]+/[^/]+/push_mirrors$"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "remote_name": "remote_mirror_new" })),
            )
            .mount(&self.server)
            .await;
        self
    }

    pub async fn requests(&self) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .expect("Request recording is disabled")
    }

    /// `METHOD /path` of every request received, in order
    pub async fn request_log(&self) -> Vec<String> {
        self.requests()
            .await
            .iter()
            .map(|request| format!("{} {}", request.method, request.url.path()))
            .collect()
    }

    /// Decoded bodies of the POST requests, in order
    pub async fn created_mirrors(&self) -> Vec<Value> {
        self.requests()
            .await
            .iter()
            .filter(|request| request.method.to_string() == "POST")
            .map(|request| serde_json::from_slice(&request.body).expect("POST body is not JSON"))
            .collect()
    }
}

/// Assertion helpers for test validation
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}
