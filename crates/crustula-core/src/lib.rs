//! # Crustula Core
//!
//! Storage-agnostic logic for the Crustula cookie-jar cache: turning a
//! copied curl command into a Netscape cookie file, deriving domain keys,
//! and picking the jar most likely to still hold a valid session.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Persistence is
//! reached only through the [`store::Store`] trait.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`curl`] | Extract URL and `Cookie:` header from a curl command line |
//! | [`cookies_txt`] | Serialize a `Cookie:` header into cookie-jar text |
//! | [`domain`] | Domain key derivation |
//! | [`selector`] | Jar scoring and selection |
//! | [`models`] | Jars, calls, and their API shapes |
//! | [`store`] | Storage trait and in-memory backend |
//! | [`service`] | Jar creation, checkout, and outcome reporting |

pub mod cookies_txt;
pub mod curl;
pub mod domain;
pub mod error;
pub mod models;
pub mod selector;
pub mod service;
pub mod store;

pub use error::{CrustulaError, Result};
