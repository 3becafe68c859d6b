// Run configuration: the settings read once at startup plus the values the
// operator types in (credentials, repository, operation). Nothing here is
// persisted between runs.

use std::fmt;
use std::path::PathBuf;

/// Base URL of the GitHub REST API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";
/// Local directory that gets uploaded, relative to the working directory.
pub const DEFAULT_SITE_DIR: &str = "ghadeer-logistics-site-static";
pub const PAGES_BRANCH: &str = "main";
pub const PAGES_PATH: &str = "/";

/// Settings fixed for the whole run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub site_dir: PathBuf,
    pub pages_branch: String,
    pub pages_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_url: DEFAULT_API_URL.to_string(),
            site_dir: PathBuf::from(DEFAULT_SITE_DIR),
            pages_branch: PAGES_BRANCH.to_string(),
            pages_path: PAGES_PATH.to_string(),
        }
    }
}

impl Settings {
    /// Defaults, with `GHPAGES_API_URL` and `GHPAGES_SITE_DIR` taking
    /// precedence when set. Credentials never come from the environment.
    pub fn from_env() -> Self {
        let mut settings = Settings::default();
        if let Ok(url) = std::env::var("GHPAGES_API_URL") {
            settings.api_url = url;
        }
        if let Ok(dir) = std::env::var("GHPAGES_SITE_DIR") {
            settings.site_dir = PathBuf::from(dir);
        }
        settings
    }
}

/// Personal access token. `Debug` is redacted and there is no `Display`,
/// so the value can only leave through `expose`.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        AccessToken(token.into())
    }

    /// Raw token, for building the auth header only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Account name plus token, sent as basic auth on every request.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub token: AccessToken,
}

/// The repository every remote call of the run targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        RepoRef {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Public Pages address. Derived from the names alone, so it is printed
    /// even when enabling Pages did not succeed.
    pub fn site_url(&self) -> String {
        format!("https://{}.github.io/{}/", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// What the operator typed in at the start of the run.
#[derive(Debug, Clone)]
pub struct Session {
    pub credentials: Credentials,
    pub repo: RepoRef,
}

/// The three operations offered by the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Delete,
    DisablePages,
}

impl Operation {
    /// Parse the literal menu code. Anything but `1`, `2` or `3` is `None`.
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Operation::Upload),
            "2" => Some(Operation::Delete),
            "3" => Some(Operation::DisablePages),
            _ => None,
        }
    }
}
