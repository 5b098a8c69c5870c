//! Core provisioning modules.

pub mod authority;
pub mod config;
pub mod error;
pub mod file_lock;
pub mod paths;
pub mod provisioner;
pub mod salt;
