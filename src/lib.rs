//! TLS credential bootstrap.
//!
//! Ensures a key directory holds a private key, a salt, a config file copied
//! from a template, and a freshly issued self-signed certificate. Key and
//! certificate work is delegated to the `openssl` toolkit.
//!
//! ## Modules
//! - `cli` — Command-line handlers
//! - `core` — Provisioning logic (provisioner, authority, salt, locking)
//! - `models` — Data structures
//! - `util` — Filesystem helpers

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod util;
