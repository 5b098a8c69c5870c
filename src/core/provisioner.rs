//! The provisioning sequence.
//!
//! Steps follow [`POLICY_TABLE`]: the directory first, then the private key,
//! salt and config file (each produced once), then the certificate, which is
//! reissued on every run. Everything after the directory step runs under an
//! exclusive flock on the provisioning directory.
//!
//! A failed step leaves the artifacts of earlier steps in place; the next run
//! resumes at the first missing one. Artifacts are written to a temp file in
//! the same directory and renamed on success, so a failed or killed run never
//! leaves a partial file at a final path.

use crate::constants;
use crate::core::authority::{CertificateRequest, KeyAndCertAuthority, KeySpec};
use crate::core::error::ProvisionError;
use crate::core::file_lock::DirLock;
use crate::core::paths::ProvisionPaths;
use crate::core::salt::RandomMaterialSource;
use crate::models::artifact::{Artifact, Outcome, Policy, ProvisionState, POLICY_TABLE};
use crate::models::cipher::CipherStrength;
use crate::util::fs as key_fs;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    pub cipher: Option<CipherStrength>,
    pub passphrase_file: Option<PathBuf>,
    pub subject: String,
    /// Block on a held directory lock instead of failing.
    pub wait_for_lock: bool,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self {
            cipher: None,
            passphrase_file: None,
            subject: constants::DEFAULT_SUBJECT.to_string(),
            wait_for_lock: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub artifact: Artifact,
    pub policy: Policy,
    pub outcome: Outcome,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub state: ProvisionState,
    pub steps: Vec<StepReport>,
    pub certificate_issued_at: DateTime<Utc>,
    pub certificate_expires_at: DateTime<Utc>,
}

impl ProvisionReport {
    pub fn outcome(&self, artifact: Artifact) -> Option<Outcome> {
        self.steps
            .iter()
            .find(|s| s.artifact == artifact)
            .map(|s| s.outcome)
    }
}

/// What a run would do, computed without side effects.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedStep {
    pub artifact: Artifact,
    pub policy: Policy,
    pub outcome: Outcome,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub struct Provisioner<'a> {
    paths: &'a ProvisionPaths,
    authority: &'a dyn KeyAndCertAuthority,
    salt_source: &'a dyn RandomMaterialSource,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        paths: &'a ProvisionPaths,
        authority: &'a dyn KeyAndCertAuthority,
        salt_source: &'a dyn RandomMaterialSource,
    ) -> Self {
        Self {
            paths,
            authority,
            salt_source,
        }
    }

    pub fn run(&self, opts: &ProvisionOptions) -> Result<ProvisionReport, ProvisionError> {
        let mut state = ProvisionState::Start;
        let mut steps = Vec::with_capacity(POLICY_TABLE.len());
        let mut lock: Option<DirLock> = None;
        let mut issued_at = Utc::now();

        for (artifact, policy) in POLICY_TABLE {
            let path = artifact_path(self.paths, artifact).to_path_buf();
            let outcome = self
                .apply(artifact, policy, opts)
                .map_err(|e| ProvisionError::step(artifact, state, e))?;
            if artifact == Artifact::Certificate {
                issued_at = Utc::now();
            }
            info!(step = artifact.step_name(), path = %path.display(), %outcome, "step complete");
            steps.push(StepReport {
                artifact,
                policy,
                outcome,
                path,
            });
            state = artifact.ready_state();

            if artifact == Artifact::Directory {
                lock = Some(self.lock(opts.wait_for_lock, state)?);
            }
        }
        drop(lock);

        Ok(ProvisionReport {
            state,
            steps,
            certificate_issued_at: issued_at,
            certificate_expires_at: issued_at
                + Duration::days(i64::from(constants::CERT_VALIDITY_DAYS)),
        })
    }

    fn lock(&self, wait: bool, state: ProvisionState) -> Result<DirLock, ProvisionError> {
        let dir = &self.paths.key_dir;
        if wait {
            return DirLock::exclusive(dir)
                .map_err(|e| ProvisionError::step(Artifact::Directory, state, e));
        }
        match DirLock::try_exclusive(dir) {
            Ok(Some(lock)) => Ok(lock),
            Ok(None) => Err(ProvisionError::Locked(dir.display().to_string())),
            Err(e) => Err(ProvisionError::step(Artifact::Directory, state, e)),
        }
    }

    fn apply(&self, artifact: Artifact, policy: Policy, opts: &ProvisionOptions) -> Result<Outcome> {
        let existed = is_present(self.paths, artifact);
        if existed && policy == Policy::SkipIfExists {
            if artifact == Artifact::PrivateKey && opts.cipher.is_some() {
                warn!(
                    path = %self.paths.private_key.display(),
                    "private key exists; cipher selector ignored"
                );
            }
            return Ok(Outcome::Skipped);
        }

        match artifact {
            Artifact::Directory => {
                key_fs::ensure_dir(&self.paths.key_dir, constants::KEY_DIR_MODE)?;
            }
            Artifact::PrivateKey => self.generate_key(opts)?,
            Artifact::Salt => self.generate_salt()?,
            Artifact::ConfigFile => self.copy_config()?,
            Artifact::Certificate => self.issue_certificate(opts)?,
        }

        Ok(if existed {
            Outcome::Reissued
        } else {
            Outcome::Created
        })
    }

    fn generate_key(&self, opts: &ProvisionOptions) -> Result<()> {
        let target = &self.paths.private_key;
        let tmp = key_fs::temp_beside(target)?;
        let spec = KeySpec {
            bits: constants::RSA_KEY_BITS,
            cipher: opts.cipher,
            passphrase_file: opts.passphrase_file.clone(),
        };
        self.authority.generate_key(&spec, tmp.path())?;
        ensure_nonempty(tmp.path(), "generated private key")?;
        key_fs::persist(tmp, target, constants::SECRET_FILE_MODE, false)
    }

    fn generate_salt(&self) -> Result<()> {
        let salt = self.salt_source.generate_salt().context("generate salt")?;
        if salt.is_empty() {
            bail!("salt source produced no output");
        }
        // Overwrite: an empty salt left by an older tool counts as absent.
        key_fs::write_atomic(&self.paths.salt, &salt, constants::SECRET_FILE_MODE, true)
    }

    fn copy_config(&self) -> Result<()> {
        let template = &self.paths.template;
        let content = fs::read(template)
            .with_context(|| format!("read config template {}", template.display()))?;
        key_fs::write_atomic(&self.paths.config, &content, constants::CONFIG_FILE_MODE, false)
    }

    fn issue_certificate(&self, opts: &ProvisionOptions) -> Result<()> {
        let target = &self.paths.certificate;
        let tmp = key_fs::temp_beside(target)?;
        let request = CertificateRequest {
            subject: opts.subject.clone(),
            validity_days: constants::CERT_VALIDITY_DAYS,
            passphrase_file: opts.passphrase_file.clone(),
        };
        self.authority
            .self_sign(&self.paths.private_key, &request, tmp.path())?;
        ensure_nonempty(tmp.path(), "issued certificate")?;
        key_fs::persist(tmp, target, constants::CERT_FILE_MODE, true)
    }
}

/// Dry-run view of a provisioning run.
pub fn plan(paths: &ProvisionPaths, cipher: Option<CipherStrength>) -> Vec<PlannedStep> {
    POLICY_TABLE
        .iter()
        .map(|&(artifact, policy)| {
            let existed = is_present(paths, artifact);
            let outcome = match (existed, policy) {
                (true, Policy::SkipIfExists) => Outcome::Skipped,
                (true, Policy::AlwaysRegenerate) => Outcome::Reissued,
                (false, _) => Outcome::Created,
            };
            let note = match artifact {
                Artifact::PrivateKey if existed && cipher.is_some() => {
                    Some("existing key kept; cipher selector ignored".to_string())
                }
                Artifact::PrivateKey if !existed => Some(format!(
                    "RSA {} bits, {}",
                    constants::RSA_KEY_BITS,
                    crate::models::cipher::describe(cipher)
                )),
                Artifact::Salt if !existed && paths.salt.is_file() => {
                    Some("empty salt file will be replaced".to_string())
                }
                Artifact::ConfigFile if !existed && !paths.template.is_file() => {
                    Some(format!("template missing: {}", paths.template.display()))
                }
                Artifact::Certificate => {
                    Some(format!("valid {} days", constants::CERT_VALIDITY_DAYS))
                }
                _ => None,
            };
            PlannedStep {
                artifact,
                policy,
                outcome,
                path: artifact_path(paths, artifact).to_path_buf(),
                note,
            }
        })
        .collect()
}

pub fn artifact_path(paths: &ProvisionPaths, artifact: Artifact) -> &Path {
    match artifact {
        Artifact::Directory => &paths.key_dir,
        Artifact::PrivateKey => &paths.private_key,
        Artifact::Salt => &paths.salt,
        Artifact::ConfigFile => &paths.config,
        Artifact::Certificate => &paths.certificate,
    }
}

/// Existence check behind the skip-if-exists policy. A zero-byte salt is not present.
pub fn is_present(paths: &ProvisionPaths, artifact: Artifact) -> bool {
    let path = artifact_path(paths, artifact);
    match artifact {
        Artifact::Directory => path.is_dir(),
        Artifact::Salt => fs::metadata(path)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false),
        _ => path.exists(),
    }
}

fn ensure_nonempty(path: &Path, what: &str) -> Result<()> {
    let len = fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    if len == 0 {
        bail!("{} is empty", what);
    }
    Ok(())
}
