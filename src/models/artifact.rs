//! Provisioned artifacts and the idempotency policy that governs them.

use serde::Serialize;
use std::fmt;

/// One entity in the provisioning directory, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    Directory,
    PrivateKey,
    Salt,
    ConfigFile,
    Certificate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Produced once; presence alone is authoritative.
    SkipIfExists,
    /// Produced on every run, replacing any previous artifact.
    AlwaysRegenerate,
}

/// Provisioning order and policy. The provisioner walks this table.
pub const POLICY_TABLE: [(Artifact, Policy); 5] = [
    (Artifact::Directory, Policy::SkipIfExists),
    (Artifact::PrivateKey, Policy::SkipIfExists),
    (Artifact::Salt, Policy::SkipIfExists),
    (Artifact::ConfigFile, Policy::SkipIfExists),
    (Artifact::Certificate, Policy::AlwaysRegenerate),
];

impl Artifact {
    /// Step label used in errors and logs.
    pub fn step_name(&self) -> &'static str {
        match self {
            Self::Directory => "ensure-directory",
            Self::PrivateKey => "ensure-private-key",
            Self::Salt => "ensure-salt",
            Self::ConfigFile => "ensure-config",
            Self::Certificate => "issue-certificate",
        }
    }

    /// State reached once this artifact's step completes.
    pub fn ready_state(&self) -> ProvisionState {
        match self {
            Self::Directory => ProvisionState::DirectoryReady,
            Self::PrivateKey => ProvisionState::KeyReady,
            Self::Salt => ProvisionState::SaltReady,
            Self::ConfigFile => ProvisionState::ConfigReady,
            Self::Certificate => ProvisionState::CertificateIssued,
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Directory => "key directory",
            Self::PrivateKey => "private key",
            Self::Salt => "salt",
            Self::ConfigFile => "config file",
            Self::Certificate => "certificate",
        };
        f.pad(name)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkipIfExists => f.pad("skip-if-exists"),
            Self::AlwaysRegenerate => f.pad("always-regenerate"),
        }
    }
}

/// Linear provisioning state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionState {
    Start,
    DirectoryReady,
    KeyReady,
    SaltReady,
    ConfigReady,
    CertificateIssued,
}

impl fmt::Display for ProvisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::DirectoryReady => "directory-ready",
            Self::KeyReady => "key-ready",
            Self::SaltReady => "salt-ready",
            Self::ConfigReady => "config-ready",
            Self::CertificateIssued => "certificate-issued",
        };
        f.pad(name)
    }
}

/// What a step did (or, for a dry run, would do).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Created,
    Skipped,
    Reissued,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.pad("created"),
            Self::Skipped => f.pad("skipped (exists)"),
            Self::Reissued => f.pad("reissued"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_certificate_always_regenerates() {
        let regenerated: Vec<_> = POLICY_TABLE
            .iter()
            .filter(|(_, p)| *p == Policy::AlwaysRegenerate)
            .map(|(a, _)| *a)
            .collect();
        assert_eq!(regenerated, vec![Artifact::Certificate]);
    }

    #[test]
    fn test_table_order_matches_states() {
        let states: Vec<_> = POLICY_TABLE.iter().map(|(a, _)| a.ready_state()).collect();
        let mut sorted = states.clone();
        sorted.sort();
        assert_eq!(states, sorted);
        assert_eq!(states.last(), Some(&ProvisionState::CertificateIssued));
    }

    #[test]
    fn test_directory_precedes_files() {
        assert_eq!(POLICY_TABLE[0].0, Artifact::Directory);
    }
}
