// Library root
// -----------
// The binary (`main.rs`) is a thin wrapper around these modules.
//
// Module responsibilities:
// - `config`: settings read once at startup, credentials, the target
//   repository and the operation codes.
// - `api`: blocking HTTP client for the GitHub REST endpoints, behind the
//   `HostingApi` trait.
// - `site`: lazy walk of the local site directory.
// - `sync`: the three procedures (upload/update, delete, disable pages).
// - `ui`: prompts and dispatch.
//
// `sync` only talks to `HostingApi`, so the procedures can be driven by an
// in-memory fake in tests.
pub mod api;
pub mod config;
pub mod site;
pub mod sync;
pub mod ui;
