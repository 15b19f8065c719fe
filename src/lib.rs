// Library root
// -----------
// This crate exposes the library surface of the `slyft` CLI. The binary
// (`main.rs`) parses arguments and hands off to `commands`.
//
// Module responsibilities:
// - `preflight`: validates asset files (size, encoding, JSON/YAML/RAML
//   structure) before anything is uploaded.
// - `api`: HTTP interactions with the Slyft backend.
// - `models`: wire types for projects, assets, jobs and sessions.
// - `config`: the auth config store and the project lock file.
// - `jobs`: polling a server-side job until it finishes.
// - `version_check`: comparing the client against the published release.
// - `markdown`: heading and table rendering for command output.
// - `ui`: terminal prompts, spinners and paging.
// - `cli` / `commands`: argument definitions and the command flows.
// - `logging`: tracing subscriber setup.
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod jobs;
pub mod logging;
pub mod markdown;
pub mod models;
pub mod preflight;
pub mod ui;
pub mod version_check;
