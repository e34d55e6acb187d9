//! foglio: a server-rendered blog front end.
//!
//! Articles come from either a local filesystem content store or a remote
//! spreadsheet-backed CMS behind a script-hosted HTTP endpoint. Rendered
//! pages are cached in-process and marked stale through authenticated
//! revalidation webhooks.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
