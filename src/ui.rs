// UI layer: prompts with `dialoguer`, then hands the collected session to
// one of the procedures in `sync`. Status lines go to stdout.

use crate::api::ApiClient;
use crate::config::{AccessToken, Credentials, Operation, RepoRef, Session, Settings};
use crate::sync::{
    confirms_deletion, delete_repository, disable_pages, invalid_selection, upload_site, Outcome,
};
use anyhow::{Context, Result};
use crossterm::style::Stylize;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

/// Prompt for everything, run the chosen operation and return how it ended.
pub fn run(settings: &Settings) -> Result<Outcome> {
    let session = collect_session()?;

    print_menu();
    let choice: String = Input::new()
        .with_prompt("Enter the number")
        .allow_empty(true)
        .interact_text()?;

    let mut stdout = io::stdout();
    let operation = match Operation::from_choice(&choice) {
        Some(op) => op,
        None => return invalid_selection(&mut stdout),
    };

    let api = ApiClient::new(&settings.api_url, session.credentials)
        .context("Failed to build HTTP client")?;
    let repo = &session.repo;

    match operation {
        Operation::Upload => upload_site(&api, repo, settings, &mut stdout),
        Operation::Delete => {
            let answer: String = Input::new()
                .with_prompt(format!(
                    "Are you sure you want to delete the repository {}? (yes/no)",
                    repo.name
                ))
                .allow_empty(true)
                .interact_text()?;
            if !confirms_deletion(&answer) {
                return delete_repository(&api, repo, &answer, &mut stdout);
            }
            with_spinner("Deleting repository...", &mut stdout, |buf| {
                delete_repository(&api, repo, &answer, buf)
            })
        }
        Operation::DisablePages => with_spinner("Disabling GitHub Pages...", &mut stdout, |buf| {
            disable_pages(&api, repo, buf)
        }),
    }
}

/// Account, token and repository name. The token is read with `Password`,
/// so it is never echoed.
fn collect_session() -> Result<Session> {
    let user: String = Input::new()
        .with_prompt("GitHub account name")
        .interact_text()?;
    let token: String = Password::new()
        .with_prompt("Personal access token")
        .interact()?;
    let name: String = Input::new()
        .with_prompt("Repository name (e.g. my-site)")
        .interact_text()?;

    let user = user.trim().to_string();
    Ok(Session {
        repo: RepoRef::new(user.clone(), name.trim()),
        credentials: Credentials {
            user,
            token: AccessToken::new(token.trim()),
        },
    })
}

fn print_menu() {
    println!();
    println!("{}", "Choose an operation:".bold());
    println!("  1) Upload/Update files");
    println!("  2) Delete the whole repository");
    println!("  3) Disable GitHub Pages");
    println!();
}

/// Run a single remote call behind a spinner. Status lines are buffered
/// until the spinner is cleared so they don't tear its line.
fn with_spinner(
    msg: &'static str,
    out: &mut impl Write,
    f: impl FnOnce(&mut Vec<u8>) -> Result<Outcome>,
) -> Result<Outcome> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(msg);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let mut buf = Vec::new();
    let outcome = f(&mut buf);
    spinner.finish_and_clear();
    out.write_all(&buf)?;
    outcome
}
