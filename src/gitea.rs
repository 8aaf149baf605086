//! Gitea REST API client
//!
//! Thin wrapper over `reqwest` that authenticates with `Authorization: token`,
//! applies the configured timeout to every call and turns transport, status
//! and decoding failures into [`ApiError`]. List endpoints are exposed as lazy
//! streams that fetch one page at a time.

use futures::stream::{self, Stream, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::{Config, RemoteGitServer};

/// Sync interval used for every push mirror created by this tool
pub const MIRROR_INTERVAL: &str = "8h0m0s";

/// Header carrying the size of a paginated collection
const TOTAL_COUNT: &str = "x-total-count";

/// Errors returned by the API client
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout)
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The forge answered with a non-2xx status
    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        body: String,
    },

    /// The response body is not the JSON we expected
    #[error("{method} {url} returned malformed JSON: {source}")]
    Decode {
        method: Method,
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The client could not be constructed
    #[error("invalid client setup: {0}")]
    Setup(String),
}

/// Successful API reply
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// `204 No Content`
    NoContent,
    /// Decoded JSON body
    Json(Value),
}

impl Reply {
    /// Decode the body into `T`; `NoContent` decodes as JSON `null`
    fn decode<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        match self {
            Reply::NoContent => serde_json::from_value(Value::Null),
            Reply::Json(value) => serde_json::from_value(value),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Organization {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Repository {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PushMirror {
    remote_name: String,
}

/// Body of `POST /repos/{owner}/{repo}/push_mirrors`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreatePushMirror {
    pub interval: String,
    pub remote_address: String,
    pub remote_password: String,
    pub remote_username: String,
    pub sync_on_commit: bool,
}

impl CreatePushMirror {
    /// Mirror of `owner/repo` towards `server`
    pub fn new(server: &RemoteGitServer, owner: &str, repo: &str) -> Self {
        Self {
            interval: MIRROR_INTERVAL.to_string(),
            remote_address: server.remote_address(owner, repo),
            remote_password: server.password.clone(),
            remote_username: server.username.clone(),
            sync_on_commit: true,
        }
    }
}

/// Authenticated Gitea API client
#[derive(Clone)]
pub struct GiteaClient {
    http: reqwest::Client,
    api_url: String,
    page_size: u32,
}

impl std::fmt::Debug for GiteaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GiteaClient")
            .field("api_url", &self.api_url)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl GiteaClient {
    /// Create a client from the configuration
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("token {}", config.gitea_api_token))
            .map_err(|e| ApiError::Setup(format!("gitea_api_token is not a valid header: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("mirrorsync/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Setup(e.to_string()))?;

        let api_url = config.gitea_api_url.trim_end_matches('/').to_string();
        debug!("Created Gitea client for {}", api_url);

        Ok(Self {
            http,
            api_url,
            page_size: config.http.page_size,
        })
    }

    /// Base URL all paths are resolved against
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Send a request and decode its reply
    async fn send(&self, method: Method, url: String, request: RequestBuilder) -> Result<Reply, ApiError> {
        self.exchange(method, url, request)
            .await
            .map(|(reply, _)| reply)
    }

    /// Send a request, returning the decoded reply with the response headers
    async fn exchange(
        &self,
        method: Method,
        url: String,
        request: RequestBuilder,
    ) -> Result<(Reply, HeaderMap), ApiError> {
        debug!("{} {}", method, url);

        let response = request.send().await.map_err(|source| ApiError::Transport {
            method: method.clone(),
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        if status == StatusCode::NO_CONTENT {
            return Ok((Reply::NoContent, headers));
        }

        let body = response.text().await.map_err(|source| ApiError::Transport {
            method: method.clone(),
            url: url.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                method,
                url,
                status,
                body: body.trim().to_string(),
            });
        }

        serde_json::from_str(&body)
            .map(|value| (Reply::Json(value), headers))
            .map_err(|source| ApiError::Decode { method, url, source })
    }

    /// `GET {api_url}{path}`
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Reply, ApiError> {
        let url = self.url(path);
        let request = self.http.get(&url).query(query);
        self.send(Method::GET, url, request).await
    }

    /// `POST {api_url}{path}` with a JSON body
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Reply, ApiError> {
        let url = self.url(path);
        let request = self.http.post(&url).json(body);
        self.send(Method::POST, url, request).await
    }

    /// `DELETE {api_url}{path}`
    pub async fn delete(&self, path: &str) -> Result<Reply, ApiError> {
        let url = self.url(path);
        let request = self.http.delete(&url);
        self.send(Method::DELETE, url, request).await
    }

    /// Fetch one page of a list endpoint, with the total from `X-Total-Count`
    async fn page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: u32,
    ) -> Result<(Vec<T>, Option<usize>), ApiError> {
        let url = self.url(path);
        let query = [("page", page.to_string()), ("limit", self.page_size.to_string())];
        let request = self.http.get(&url).query(&query);
        let (reply, headers) = self.exchange(Method::GET, url.clone(), request).await?;

        let total = headers
            .get(TOTAL_COUNT)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok());
        let items = reply.decode().map_err(|source| ApiError::Decode {
            method: Method::GET,
            url,
            source,
        })?;

        Ok((items, total))
    }

    /// Lazily walk a paginated list endpoint
    ///
    /// Pages are requested only when the previous one has been consumed.
    /// Gitea caps `limit` at its `MAX_RESPONSE_ITEMS` setting, so a short page
    /// says nothing about what follows. The walk ends once `X-Total-Count`
    /// items have arrived or, without that header, at the first empty page.
    /// The stream ends at the first error.
    fn paginate<'a, T>(&'a self, path: String) -> impl Stream<Item = Result<T, ApiError>> + 'a
    where
        T: DeserializeOwned + 'a,
    {
        stream::try_unfold(Some((1u32, 0usize)), move |state| {
            let path = path.clone();
            async move {
                let Some((page, received)) = state else {
                    return Ok::<_, ApiError>(None);
                };

                let (items, total) = self.page::<T>(&path, page).await?;
                let received = received + items.len();

                let next = match total {
                    _ if items.is_empty() => None,
                    Some(total) if received >= total => None,
                    _ => Some((page + 1, received)),
                };
                let page_items = stream::iter(items.into_iter().map(Ok::<T, ApiError>));
                Ok(Some((page_items, next)))
            }
        })
        .try_flatten()
    }

    /// Names of all organizations (`GET /orgs`)
    pub fn organizations(&self) -> impl Stream<Item = Result<String, ApiError>> + '_ {
        self.paginate::<Organization>("/orgs".to_string())
            .map_ok(|org| org.name)
    }

    /// Names of the repositories owned by an organization (`GET /orgs/{owner}/repos`)
    pub fn org_repositories<'a>(
        &'a self,
        owner: &str,
    ) -> impl Stream<Item = Result<String, ApiError>> + 'a {
        self.paginate::<Repository>(format!("/orgs/{}/repos", owner))
            .map_ok(|repo| repo.name)
    }

    /// Remote names of a repository's push mirrors (`GET /repos/{owner}/{repo}/push_mirrors`)
    pub fn push_mirrors<'a>(
        &'a self,
        owner: &str,
        repo: &str,
    ) -> impl Stream<Item = Result<String, ApiError>> + 'a {
        self.paginate::<PushMirror>(format!("/repos/{}/{}/push_mirrors", owner, repo))
            .map_ok(|mirror| mirror.remote_name)
    }

    /// Register a push mirror, returning the forge's reply unchecked
    pub async fn create_push_mirror(
        &self,
        owner: &str,
        repo: &str,
        mirror: &CreatePushMirror,
    ) -> Result<Reply, ApiError> {
        self.post(&format!("/repos/{}/{}/push_mirrors", owner, repo), mirror)
            .await
    }

    /// Remove a push mirror by its remote name
    pub async fn delete_push_mirror(
        &self,
        owner: &str,
        repo: &str,
        name: &str,
    ) -> Result<Reply, ApiError> {
        self.delete(&format!("/repos/{}/{}/push_mirrors/{}", owner, repo, name))
            .await
    }
}
