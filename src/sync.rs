// Sync procedures: upload/update, delete repository, disable Pages.
//
// Each procedure writes one status line per step to `out`, prefixed with a
// bracketed marker, and returns an `Outcome`. Remote failures are reported
// and mapped onto the outcome; only transport failures on calls the run
// cannot continue without (and write errors on `out`) come back as `Err`.

use crate::api::{
    ApiResponse, CreateRepoRequest, HostingApi, PagesRequest, PagesSource, PutFileRequest,
};
use crate::config::{RepoRef, Settings};
use crate::site::{self, SiteFile};
use anyhow::{Context, Result};
use log::warn;
use std::io::Write;

/// Terminal state of a procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    /// Upload always ends here, even when every file went through: the
    /// result is per file, see `UploadReport::is_clean`.
    PartiallySucceeded(UploadReport),
    Aborted,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResult {
    /// The write was accepted with this status.
    Written { action: FileAction, status: u16 },
    /// The write was answered with an error status.
    Rejected {
        action: FileAction,
        status: u16,
        body: String,
    },
    /// Nothing was written: reading the file, looking up its identity
    /// token or sending the request failed.
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: String,
    pub result: FileResult,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub repo_created: bool,
    pub files: Vec<FileOutcome>,
    pub pages_enabled: bool,
    pub site_url: String,
}

impl UploadReport {
    /// Every file written and Pages enabled.
    pub fn is_clean(&self) -> bool {
        self.pages_enabled
            && self
                .files
                .iter()
                .all(|f| matches!(f.result, FileResult::Written { .. }))
    }

    pub fn written(&self, action: FileAction) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.result, FileResult::Written { action: a, .. } if a == action))
            .count()
    }
}

fn describe<T>(response: &ApiResponse<T>) -> String {
    match response.failure() {
        Some((status, body)) => format!("{} - {}", status, body),
        None => "ok".to_string(),
    }
}

/// Create the repository if needed, write every site file, enable Pages and
/// print the site address.
pub fn upload_site(
    api: &impl HostingApi,
    repo: &RepoRef,
    settings: &Settings,
    out: &mut impl Write,
) -> Result<Outcome> {
    let files = match site::walk(&settings.site_dir) {
        Ok(files) => files,
        Err(e) => {
            writeln!(out, "[error] {}", e)?;
            return Ok(Outcome::Failed(e.to_string()));
        }
    };

    let mut report = UploadReport {
        site_url: repo.site_url(),
        ..UploadReport::default()
    };

    let existing = api
        .get_repo(repo)
        .with_context(|| format!("checking repository {}", repo))?;
    match existing {
        ApiResponse::Ok(_) => {
            writeln!(out, "[repo] {} exists, files will be updated", repo)?;
        }
        ApiResponse::NotFound(_) => {
            writeln!(out, "[repo] {} not found, creating it", repo)?;
            let req = CreateRepoRequest {
                name: repo.name.clone(),
                private: false,
            };
            let created = api
                .create_repo(&req)
                .with_context(|| format!("creating repository {}", repo))?;
            match created {
                ApiResponse::Ok(info) => {
                    let url = info.html_url.unwrap_or_default();
                    writeln!(out, "[repo] created {}", url)?;
                    report.repo_created = true;
                }
                failed => {
                    let msg = format!("repository creation failed: {}", describe(&failed));
                    writeln!(out, "[error] {}", msg)?;
                    return Ok(Outcome::Failed(msg));
                }
            }
        }
        failed => {
            let msg = format!("could not query repository {}: {}", repo, describe(&failed));
            writeln!(out, "[error] {}", msg)?;
            return Ok(Outcome::Failed(msg));
        }
    }

    for item in files {
        let outcome = match item {
            Ok(file) => sync_file(api, repo, &file),
            Err(e) => {
                warn!("{}", e);
                FileOutcome {
                    path: failed_entry_path(&e),
                    result: FileResult::Skipped(e.to_string()),
                }
            }
        };
        print_file_outcome(out, &outcome)?;
        report.files.push(outcome);
    }

    let pages = PagesRequest {
        source: PagesSource {
            branch: settings.pages_branch.clone(),
            path: settings.pages_path.clone(),
        },
    };
    match api.enable_pages(repo, &pages) {
        Ok(ApiResponse::Ok(())) => {
            writeln!(out, "[pages] GitHub Pages enabled")?;
            report.pages_enabled = true;
        }
        Ok(failed) => {
            warn!("enabling pages for {}: {}", repo, describe(&failed));
            writeln!(
                out,
                "[pages] if Pages was not enabled automatically, enable it under Settings > Pages"
            )?;
        }
        Err(e) => {
            warn!("enabling pages for {}: {}", repo, e);
            writeln!(
                out,
                "[pages] if Pages was not enabled automatically, enable it under Settings > Pages"
            )?;
        }
    }

    writeln!(out, "[site] {}", report.site_url)?;
    Ok(Outcome::PartiallySucceeded(report))
}

/// Look up the identity token of one file and write it. Only a 404 lookup
/// counts as a new file; any other lookup failure skips the write.
fn sync_file(api: &impl HostingApi, repo: &RepoRef, file: &SiteFile) -> FileOutcome {
    let path = file.remote_path.clone();
    let skipped = |reason: String| {
        warn!("{}: {}", file.remote_path, reason);
        FileOutcome {
            path: file.remote_path.clone(),
            result: FileResult::Skipped(reason),
        }
    };

    let sha = match api.get_file(repo, &path) {
        Ok(ApiResponse::Ok(meta)) => Some(meta.sha),
        Ok(ApiResponse::NotFound(_)) => None,
        Ok(failed) => return skipped(format!("lookup failed: {}", describe(&failed))),
        Err(e) => return skipped(format!("lookup failed: {}", e)),
    };
    let action = if sha.is_some() {
        FileAction::Updated
    } else {
        FileAction::Created
    };

    let req = PutFileRequest {
        message: format!("Update {}", path),
        content: file.encoded(),
        sha,
    };
    let result = match api.put_file(repo, &path, &req) {
        Ok(ApiResponse::Ok(status)) => FileResult::Written { action, status },
        Ok(failed) => {
            let (status, body) = failed.failure().unwrap_or((0, ""));
            warn!("{}: write rejected with {}", path, status);
            FileResult::Rejected {
                action,
                status,
                body: body.to_string(),
            }
        }
        Err(e) => return skipped(format!("write failed: {}", e)),
    };
    FileOutcome { path, result }
}

fn failed_entry_path(err: &site::SiteError) -> String {
    match err {
        site::SiteError::Read { path, .. } => path.display().to_string(),
        site::SiteError::Walk(e) => e.path().map(|p| p.display().to_string()).unwrap_or_default(),
        site::SiteError::MissingRoot(path)
        | site::SiteError::BrokenLink(path)
        | site::SiteError::NonUtf8Path(path) => path.display().to_string(),
    }
}

fn print_file_outcome(out: &mut impl Write, outcome: &FileOutcome) -> std::io::Result<()> {
    let marker = |action: &FileAction| match action {
        FileAction::Created => "[create]",
        FileAction::Updated => "[update]",
    };
    match &outcome.result {
        FileResult::Written { action, status } => {
            writeln!(out, "{} {} => {}", marker(action), outcome.path, status)
        }
        FileResult::Rejected {
            action,
            status,
            body,
        } => writeln!(out, "{} {} => {} {}", marker(action), outcome.path, status, body),
        FileResult::Skipped(reason) => writeln!(out, "[skip] {} ({})", outcome.path, reason),
    }
}

/// True only for an explicit `yes`, in any letter case.
pub fn confirms_deletion(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// Delete the repository, provided `confirmation` is an explicit `yes`.
pub fn delete_repository(
    api: &impl HostingApi,
    repo: &RepoRef,
    confirmation: &str,
    out: &mut impl Write,
) -> Result<Outcome> {
    if !confirms_deletion(confirmation) {
        writeln!(out, "[cancel] operation canceled")?;
        return Ok(Outcome::Aborted);
    }
    let response = api
        .delete_repo(repo)
        .with_context(|| format!("deleting repository {}", repo))?;
    if response.is_ok() {
        writeln!(out, "[delete] repository {} deleted", repo)?;
        return Ok(Outcome::Succeeded);
    }
    let msg = format!("delete failed: {}", describe(&response));
    writeln!(out, "[error] {}", msg)?;
    Ok(Outcome::Failed(msg))
}

/// Turn off GitHub Pages for the repository.
pub fn disable_pages(api: &impl HostingApi, repo: &RepoRef, out: &mut impl Write) -> Result<Outcome> {
    let response = api
        .disable_pages(repo)
        .with_context(|| format!("disabling pages for {}", repo))?;
    if response.is_ok() {
        writeln!(out, "[pages] GitHub Pages disabled")?;
        return Ok(Outcome::Succeeded);
    }
    let msg = format!("disabling Pages failed: {}", describe(&response));
    writeln!(out, "[error] {}", msg)?;
    Ok(Outcome::Failed(msg))
}

/// Report an unrecognized menu code. No remote call is made.
pub fn invalid_selection(out: &mut impl Write) -> Result<Outcome> {
    writeln!(out, "[cancel] invalid selection")?;
    Ok(Outcome::Aborted)
}
