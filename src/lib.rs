//! # Crustula
//!
//! A cookie-jar cache for automated HTTP clients.
//!
//! Paste a request copied from a browser ("Copy as cURL") and Crustula
//! stores its cookies as a Netscape cookie-jar file, keyed by domain. Later
//! lookups for a URL on that domain get the jar most likely to still hold a
//! logged-in session, and report back whether it worked so that stale jars
//! drop out of rotation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────┐   ┌──────────┐
//! │ curl command │──▶│  crustula-core     │──▶│  SQLite  │
//! └──────────────┘   │ parse+serialize    │   │ jars     │
//!                    │ select best jar    │◀──│ calls    │
//!                    └─────────┬──────────┘   └──────────┘
//!                      ┌───────┴────────┐
//!                      ▼                ▼
//!                ┌──────────┐     ┌──────────┐
//!                │   CLI    │     │   HTTP   │
//!                │(crustula)│     │  (axum)  │
//!                └──────────┘     └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! crustula init
//! crustula add "curl 'https://example.com/' -H 'Cookie: sid=abc'"
//! crustula lookup https://example.com/account --output cookies.txt
//! curl -b cookies.txt https://example.com/account
//! crustula report <call-id> --success
//! crustula serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite implementation of the core `Store` trait |
//! | [`server`] | JSON HTTP API |
//! | [`jars`], [`calls`], [`domains`] | CLI command handlers |
//! | [`logging`] | `tracing` subscriber setup |

pub mod calls;
pub mod config;
pub mod db;
pub mod domains;
pub mod jars;
pub mod logging;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
