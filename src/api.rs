// API client module: a small blocking HTTP client for the GitHub REST
// endpoints the sync procedures need. Everything is synchronous; each call
// blocks until the transport answers or gives up on its own timeouts.
//
// Remote statuses are not errors here. Each call maps the HTTP status onto
// `ApiResponse` and the caller decides what a 404 or a 422 means for it.
// `ApiError` is reserved for failures where no usable reply exists.

use crate::config::{Credentials, RepoRef};
use log::{debug, warn};
use reqwest::blocking::{Client, ClientBuilder, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Failures that leave no HTTP status to report.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not decode {what} response: {source}")]
    Decode {
        what: &'static str,
        source: serde_json::Error,
    },

    #[error("invalid API url: {0}")]
    InvalidUrl(String),
}

/// Outcome of one remote call, classified by status. Failed variants keep
/// the raw response body so it can be shown to the operator verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse<T> {
    Ok(T),
    NotFound(String),
    Unauthorized(String),
    Other { status: u16, body: String },
}

impl<T> ApiResponse<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, ApiResponse::Ok(_))
    }

    /// Status and body of a non-`Ok` reply.
    pub fn failure(&self) -> Option<(u16, &str)> {
        match self {
            ApiResponse::Ok(_) => None,
            ApiResponse::NotFound(body) => Some((404, body)),
            ApiResponse::Unauthorized(body) => Some((401, body)),
            ApiResponse::Other { status, body } => Some((*status, body)),
        }
    }

    fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<ApiResponse<U>, E> {
        Ok(match self {
            ApiResponse::Ok(v) => ApiResponse::Ok(f(v)?),
            ApiResponse::NotFound(body) => ApiResponse::NotFound(body),
            ApiResponse::Unauthorized(body) => ApiResponse::Unauthorized(body),
            ApiResponse::Other { status, body } => ApiResponse::Other { status, body },
        })
    }
}

/// Map a status onto `ApiResponse`. `accepted` lists the statuses that count
/// as success for this particular call.
pub fn classify(status: u16, body: String, accepted: &[u16]) -> ApiResponse<String> {
    if accepted.contains(&status) {
        return ApiResponse::Ok(body);
    }
    match status {
        404 => ApiResponse::NotFound(body),
        401 => ApiResponse::Unauthorized(body),
        _ => ApiResponse::Other { status, body },
    }
}

/// The parts of a repository payload the tool looks at.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoInfo {
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Metadata of an existing remote file. `sha` is the identity token that
/// must accompany an overwrite.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub sha: String,
}

/// Payload for `POST /user/repos`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateRepoRequest {
    pub name: String,
    pub private: bool,
}

/// Payload for `PUT /repos/{owner}/{repo}/contents/{path}`. Without a `sha`
/// the API treats the write as a create.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PutFileRequest {
    pub message: String,
    /// Base64 of the file bytes.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PagesSource {
    pub branch: String,
    pub path: String,
}

/// Payload for `POST /repos/{owner}/{repo}/pages`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PagesRequest {
    pub source: PagesSource,
}

/// The remote calls the sync procedures are built from.
pub trait HostingApi {
    /// `GET /repos/{owner}/{repo}`: 200 means the repository exists.
    fn get_repo(&self, repo: &RepoRef) -> Result<ApiResponse<RepoInfo>, ApiError>;
    /// `POST /user/repos`: 200 or 201.
    fn create_repo(&self, req: &CreateRepoRequest) -> Result<ApiResponse<RepoInfo>, ApiError>;
    /// `GET .../contents/{path}`: 200 with the identity token, 404 if absent.
    fn get_file(&self, repo: &RepoRef, path: &str) -> Result<ApiResponse<FileMeta>, ApiError>;
    /// `PUT .../contents/{path}`: 200 (updated) or 201 (created). The `Ok`
    /// value is the status code itself.
    fn put_file(
        &self,
        repo: &RepoRef,
        path: &str,
        req: &PutFileRequest,
    ) -> Result<ApiResponse<u16>, ApiError>;
    /// `POST .../pages`: 200 or 201.
    fn enable_pages(&self, repo: &RepoRef, req: &PagesRequest) -> Result<ApiResponse<()>, ApiError>;
    /// `DELETE .../pages`: 200 or 204.
    fn disable_pages(&self, repo: &RepoRef) -> Result<ApiResponse<()>, ApiError>;
    /// `DELETE /repos/{owner}/{repo}`: 204 only.
    fn delete_repo(&self, repo: &RepoRef) -> Result<ApiResponse<()>, ApiError>;
}

/// Blocking client holding the reqwest client, the API base URL and the
/// session credentials.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    credentials: Credentials,
}

struct Reply {
    status: u16,
    body: String,
}

impl ApiClient {
    /// Build a client for `api_url` (normally `https://api.github.com`).
    pub fn new(api_url: &str, credentials: Credentials) -> Result<Self, ApiError> {
        Self::with_builder(api_url, credentials, Client::builder())
    }

    fn with_builder(
        api_url: &str,
        credentials: Credentials,
        builder: ClientBuilder,
    ) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(api_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", api_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(api_url.to_string()));
        }
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let client = builder
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;
        Ok(ApiClient {
            client,
            base_url,
            credentials,
        })
    }

    /// Append `segments` to the base URL. Each segment is percent-encoded on
    /// its own, so a `/` inside one would be escaped.
    pub fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn repo_url(&self, repo: &RepoRef, rest: &[&str]) -> Result<Url, ApiError> {
        let head = ["repos", repo.owner.as_str(), repo.name.as_str()];
        self.endpoint(head.iter().chain(rest.iter()).copied())
    }

    fn contents_url(&self, repo: &RepoRef, path: &str) -> Result<Url, ApiError> {
        let mut rest = vec!["contents"];
        rest.extend(path.split('/').filter(|s| !s.is_empty()));
        self.repo_url(repo, &rest)
    }

    /// Start a request with basic auth attached.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .basic_auth(&self.credentials.user, Some(self.credentials.token.expose()))
    }

    fn send(&self, req: RequestBuilder) -> Result<Reply, ApiError> {
        let res = req.send()?;
        let status = res.status().as_u16();
        let body = match res.text() {
            Ok(body) => body,
            Err(e) => {
                warn!("reading {} response body: {}", status, e);
                String::new()
            }
        };
        debug!("-> {}", status);
        Ok(Reply { status, body })
    }
}

fn decode<T: DeserializeOwned>(what: &'static str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|source| ApiError::Decode { what, source })
}

impl HostingApi for ApiClient {
    fn get_repo(&self, repo: &RepoRef) -> Result<ApiResponse<RepoInfo>, ApiError> {
        let url = self.repo_url(repo, &[])?;
        let reply = self.send(self.request(Method::GET, url))?;
        classify(reply.status, reply.body, &[200]).try_map(|b| decode("repository", &b))
    }

    fn create_repo(&self, req: &CreateRepoRequest) -> Result<ApiResponse<RepoInfo>, ApiError> {
        let url = self.endpoint(["user", "repos"])?;
        let reply = self.send(self.request(Method::POST, url).json(req))?;
        classify(reply.status, reply.body, &[200, 201]).try_map(|b| decode("repository", &b))
    }

    fn get_file(&self, repo: &RepoRef, path: &str) -> Result<ApiResponse<FileMeta>, ApiError> {
        let url = self.contents_url(repo, path)?;
        let reply = self.send(self.request(Method::GET, url))?;
        classify(reply.status, reply.body, &[200]).try_map(|b| decode("file metadata", &b))
    }

    fn put_file(
        &self,
        repo: &RepoRef,
        path: &str,
        req: &PutFileRequest,
    ) -> Result<ApiResponse<u16>, ApiError> {
        let url = self.contents_url(repo, path)?;
        let reply = self.send(self.request(Method::PUT, url).json(req))?;
        let status = reply.status;
        classify(status, reply.body, &[200, 201]).try_map(|_| Ok(status))
    }

    fn enable_pages(&self, repo: &RepoRef, req: &PagesRequest) -> Result<ApiResponse<()>, ApiError> {
        let url = self.repo_url(repo, &["pages"])?;
        let reply = self.send(self.request(Method::POST, url).json(req))?;
        classify(reply.status, reply.body, &[200, 201]).try_map(|_| Ok(()))
    }

    fn disable_pages(&self, repo: &RepoRef) -> Result<ApiResponse<()>, ApiError> {
        let url = self.repo_url(repo, &["pages"])?;
        let reply = self.send(self.request(Method::DELETE, url))?;
        classify(reply.status, reply.body, &[200, 204]).try_map(|_| Ok(()))
    }

    fn delete_repo(&self, repo: &RepoRef) -> Result<ApiResponse<()>, ApiError> {
        let url = self.repo_url(repo, &[])?;
        let reply = self.send(self.request(Method::DELETE, url))?;
        classify(reply.status, reply.body, &[204]).try_map(|_| Ok(()))
    }
}
