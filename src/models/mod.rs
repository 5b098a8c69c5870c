//! Data structures.

pub mod artifact;
pub mod bootstrap_config;
pub mod cipher;
