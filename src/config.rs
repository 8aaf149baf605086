use anyhow::{bail, Context, Result};
use dirs::config_dir;
use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for mirrorsync
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the Gitea API, e.g. `https://git.example.com/api/v1`
    pub gitea_api_url: String,

    /// Gitea access token, sent as `Authorization: token ...`
    pub gitea_api_token: String,

    /// Repositories that are never mirrored, matched by name only
    pub gitea_ignore_sync: Vec<IgnoredRepo>,

    /// Destinations every mirrored repository is pushed to
    pub remote_git_servers: Vec<RemoteGitServer>,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// Entry of the ignore list
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct IgnoredRepo {
    pub name: String,
}

/// External git host receiving push mirrors
#[derive(Deserialize, Clone, PartialEq, Eq)]
pub struct RemoteGitServer {
    /// Base URL the repository path is appended to
    pub base_url: String,

    /// Username used by Gitea when pushing
    pub username: String,

    /// Password or token used by Gitea when pushing
    pub password: String,
}

impl std::fmt::Debug for RemoteGitServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteGitServer")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl RemoteGitServer {
    /// Clone address of `owner/repo` on this server
    pub fn remote_address(&self, owner: &str, repo: &str) -> String {
        format!(
            "{}/{}/{}.git",
            self.base_url.trim_end_matches('/'),
            owner,
            repo
        )
    }
}

/// HTTP client configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Timeout for every API request in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Number of items requested per page on list endpoints
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_timeout() -> u64 {
    10
}
fn default_page_size() -> u32 {
    50
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            page_size: default_page_size(),
        }
    }
}

impl Config {
    /// Load configuration from the given path, or from the default location
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::load(&Self::default_config_path()?),
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.expand_secrets()?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;

        Ok(config)
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("mirrorsync").join("config.yml"))
    }

    /// Expand environment variables in the token and remote passwords
    pub fn expand_secrets(&mut self) -> Result<()> {
        self.gitea_api_token = shellexpand::env(&self.gitea_api_token)
            .context("Failed to expand gitea_api_token")?
            .into_owned();

        for server in &mut self.remote_git_servers {
            server.password = shellexpand::env(&server.password)
                .with_context(|| format!("Failed to expand password for {}", server.base_url))?
                .into_owned();
        }

        Ok(())
    }

    /// Check that every required value is usable
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.gitea_api_url)
            .with_context(|| format!("gitea_api_url is not a valid URL: {}", self.gitea_api_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("gitea_api_url must use http or https: {}", self.gitea_api_url);
        }

        if self.gitea_api_token.trim().is_empty() {
            bail!("gitea_api_token is empty");
        }

        if self.remote_git_servers.is_empty() {
            bail!("remote_git_servers must list at least one destination");
        }

        for (index, server) in self.remote_git_servers.iter().enumerate() {
            if server.base_url.trim().is_empty() {
                bail!("remote_git_servers[{}].base_url is empty", index);
            }
        }

        if self.http.timeout == 0 {
            bail!("http.timeout must be greater than zero");
        }
        if self.http.page_size == 0 {
            bail!("http.page_size must be greater than zero");
        }

        Ok(())
    }

    /// Names from the ignore list
    pub fn ignored_names(&self) -> impl Iterator<Item = &str> {
        self.gitea_ignore_sync.iter().map(|repo| repo.name.as_str())
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout)
    }
}
