//! Provisioning path resolution and directory layout.

use crate::constants;
use crate::models::bootstrap_config::BootstrapFile;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProvisionPaths {
    pub key_dir: PathBuf,
    pub private_key: PathBuf,
    pub salt: PathBuf,
    pub config: PathBuf,
    pub certificate: PathBuf,
    pub template: PathBuf,
}

impl ProvisionPaths {
    /// Resolve the working root from the CLI arg, falling back to the current directory.
    pub fn resolve_root(root_arg: Option<PathBuf>) -> Result<PathBuf> {
        match root_arg {
            Some(root) => Ok(root),
            None => env::current_dir().context("resolve current directory"),
        }
    }

    /// Layout with built-in defaults.
    pub fn from_root(root: PathBuf) -> Self {
        Self::with_config(root, &BootstrapFile::default())
    }

    /// Layout honoring `bootstrap.toml` overrides.
    pub fn with_config(root: PathBuf, config: &BootstrapFile) -> Self {
        let key_dir = under(&root, &config.paths.key_dir);
        let template = under(&root, &config.paths.template);
        Self {
            private_key: key_dir.join(constants::PRIVATE_KEY_FILE),
            salt: key_dir.join(constants::SALT_FILE),
            config: key_dir.join(constants::CONFIG_FILE),
            certificate: key_dir.join(constants::CERTIFICATE_FILE),
            key_dir,
            template,
        }
    }

    pub fn with_template(mut self, template: Option<PathBuf>) -> Self {
        if let Some(t) = template {
            self.template = t;
        }
        self
    }
}

fn under(root: &Path, rel: &str) -> PathBuf {
    let p = Path::new(rel);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

impl std::fmt::Display for ProvisionPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "keys@{}", self.key_dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_root() {
        let paths = ProvisionPaths::from_root(PathBuf::from("/srv/app"));
        assert_eq!(paths.key_dir, PathBuf::from("/srv/app/keys"));
        assert_eq!(paths.private_key, PathBuf::from("/srv/app/keys/privkey.pem"));
        assert_eq!(paths.salt, PathBuf::from("/srv/app/keys/salt"));
        assert_eq!(paths.config, PathBuf::from("/srv/app/keys/config.yml"));
        assert_eq!(paths.certificate, PathBuf::from("/srv/app/keys/cert.pem"));
        assert_eq!(paths.template, PathBuf::from("/srv/app/default/config.yml"));
    }

    #[test]
    fn test_config_overrides_and_absolute_template() {
        let mut cfg = BootstrapFile::default();
        cfg.paths.key_dir = "tls".into();
        cfg.paths.template = "/etc/app/config.yml".into();
        let paths = ProvisionPaths::with_config(PathBuf::from("/srv/app"), &cfg);
        assert_eq!(paths.key_dir, PathBuf::from("/srv/app/tls"));
        assert_eq!(paths.template, PathBuf::from("/etc/app/config.yml"));
    }

    #[test]
    fn test_cli_template_wins() {
        let paths = ProvisionPaths::from_root(PathBuf::from("/srv/app"))
            .with_template(Some(PathBuf::from("/tmp/t.yml")));
        assert_eq!(paths.template, PathBuf::from("/tmp/t.yml"));
    }
}
