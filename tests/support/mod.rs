//! In-memory stand-in for the hosting API, shared by the integration tests.
//!
//! It records every call in order, keeps decoded file contents per path and
//! hands out fresh identity tokens on each write, so repeated runs behave
//! like they would against the real service.

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ghpages_sync::api::{
    ApiError, ApiResponse, CreateRepoRequest, FileMeta, HostingApi, PagesRequest, PutFileRequest,
    RepoInfo,
};
use ghpages_sync::config::{RepoRef, Settings};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetRepo,
    CreateRepo { name: String, private: bool },
    GetFile(String),
    PutFile { path: String, sha: Option<String> },
    EnablePages { branch: String, path: String },
    DisablePages,
    DeleteRepo,
}

#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub sha: String,
    pub contents: Vec<u8>,
}

/// Canned failure: status and raw body.
pub type Reply = (u16, String);

#[derive(Default)]
pub struct FakeHost {
    pub calls: RefCell<Vec<Call>>,
    pub repo_exists: Cell<bool>,
    pub files: RefCell<BTreeMap<String, RemoteFile>>,
    next_sha: Cell<u32>,

    pub repo_reply: Option<Reply>,
    pub create_reply: Option<Reply>,
    pub lookup_replies: BTreeMap<String, Reply>,
    pub put_replies: BTreeMap<String, Reply>,
    pub pages_reply: Option<Reply>,
    pub disable_reply: Option<Reply>,
    pub delete_reply: Option<Reply>,
}

fn reject<T>(reply: &Reply) -> ApiResponse<T> {
    let (status, body) = reply.clone();
    match status {
        404 => ApiResponse::NotFound(body),
        401 => ApiResponse::Unauthorized(body),
        _ => ApiResponse::Other { status, body },
    }
}

fn not_found<T>() -> ApiResponse<T> {
    ApiResponse::NotFound("{\"message\":\"Not Found\"}".to_string())
}

impl FakeHost {
    pub fn new() -> Self {
        FakeHost::default()
    }

    /// A host where the repository already exists.
    pub fn with_repo() -> Self {
        let host = FakeHost::default();
        host.repo_exists.set(true);
        host
    }

    /// Seed a remote file with a known identity token.
    pub fn seed_file(&self, path: &str, sha: &str, contents: &[u8]) {
        self.files.borrow_mut().insert(
            path.to_string(),
            RemoteFile {
                sha: sha.to_string(),
                contents: contents.to_vec(),
            },
        );
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn put_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::PutFile { .. }))
            .collect()
    }

    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.files.borrow().get(path).map(|f| f.contents.clone())
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn fresh_sha(&self) -> String {
        let n = self.next_sha.get() + 1;
        self.next_sha.set(n);
        format!("sha{:04}", n)
    }
}

impl HostingApi for FakeHost {
    fn get_repo(&self, _repo: &RepoRef) -> Result<ApiResponse<RepoInfo>, ApiError> {
        self.record(Call::GetRepo);
        if let Some(reply) = &self.repo_reply {
            return Ok(reject(reply));
        }
        if self.repo_exists.get() {
            Ok(ApiResponse::Ok(RepoInfo::default()))
        } else {
            Ok(not_found())
        }
    }

    fn create_repo(&self, req: &CreateRepoRequest) -> Result<ApiResponse<RepoInfo>, ApiError> {
        self.record(Call::CreateRepo {
            name: req.name.clone(),
            private: req.private,
        });
        if let Some(reply) = &self.create_reply {
            return Ok(reject(reply));
        }
        self.repo_exists.set(true);
        Ok(ApiResponse::Ok(RepoInfo {
            html_url: Some(format!("https://github.com/octocat/{}", req.name)),
        }))
    }

    fn get_file(&self, _repo: &RepoRef, path: &str) -> Result<ApiResponse<FileMeta>, ApiError> {
        self.record(Call::GetFile(path.to_string()));
        if let Some(reply) = self.lookup_replies.get(path) {
            return Ok(reject(reply));
        }
        Ok(match self.files.borrow().get(path) {
            Some(file) => ApiResponse::Ok(FileMeta {
                sha: file.sha.clone(),
            }),
            None => not_found(),
        })
    }

    fn put_file(
        &self,
        _repo: &RepoRef,
        path: &str,
        req: &PutFileRequest,
    ) -> Result<ApiResponse<u16>, ApiError> {
        self.record(Call::PutFile {
            path: path.to_string(),
            sha: req.sha.clone(),
        });
        if let Some(reply) = self.put_replies.get(path) {
            return Ok(reject(reply));
        }
        if !self.repo_exists.get() {
            return Ok(not_found());
        }
        let contents = match STANDARD.decode(&req.content) {
            Ok(bytes) => bytes,
            Err(_) => {
                return Ok(reject(&(400, "content is not valid Base64".to_string())));
            }
        };

        let current = self.files.borrow().get(path).map(|f| f.sha.clone());
        let status = match (current, &req.sha) {
            (None, None) => 201,
            (Some(existing), Some(sent)) if existing == *sent => 200,
            (Some(_), None) => {
                return Ok(reject(&(422, "\"sha\" wasn't supplied.".to_string())));
            }
            _ => return Ok(reject(&(409, "sha does not match".to_string()))),
        };
        let sha = self.fresh_sha();
        self.files
            .borrow_mut()
            .insert(path.to_string(), RemoteFile { sha, contents });
        Ok(ApiResponse::Ok(status))
    }

    fn enable_pages(&self, _repo: &RepoRef, req: &PagesRequest) -> Result<ApiResponse<()>, ApiError> {
        self.record(Call::EnablePages {
            branch: req.source.branch.clone(),
            path: req.source.path.clone(),
        });
        match &self.pages_reply {
            Some(reply) => Ok(reject(reply)),
            None => Ok(ApiResponse::Ok(())),
        }
    }

    fn disable_pages(&self, _repo: &RepoRef) -> Result<ApiResponse<()>, ApiError> {
        self.record(Call::DisablePages);
        match &self.disable_reply {
            Some(reply) => Ok(reject(reply)),
            None => Ok(ApiResponse::Ok(())),
        }
    }

    fn delete_repo(&self, _repo: &RepoRef) -> Result<ApiResponse<()>, ApiError> {
        self.record(Call::DeleteRepo);
        if let Some(reply) = &self.delete_reply {
            return Ok(reject(reply));
        }
        if !self.repo_exists.get() {
            return Ok(not_found());
        }
        self.repo_exists.set(false);
        self.files.borrow_mut().clear();
        Ok(ApiResponse::Ok(()))
    }
}

pub fn repo() -> RepoRef {
    RepoRef::new("octocat", "site")
}

/// A temp site directory populated with `files` (relative path, bytes).
pub fn site_dir<B: AsRef<[u8]>>(files: &[(&str, B)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (rel, contents) in files {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
    dir
}

pub fn settings_for(dir: &Path) -> Settings {
    Settings {
        site_dir: dir.to_path_buf(),
        ..Settings::default()
    }
}
