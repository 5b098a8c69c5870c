use crate::models::bootstrap_config::BootstrapFile;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// Load `bootstrap.toml`. A missing file yields the defaults.
pub fn load(path: &Path) -> Result<BootstrapFile> {
    if !path.exists() {
        return Ok(BootstrapFile::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("read bootstrap config {}", path.display()))?;
    let config: BootstrapFile = toml::from_str(&content)
        .with_context(|| format!("parse bootstrap config {}", path.display()))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &BootstrapFile) -> Result<()> {
    if config.paths.key_dir.trim().is_empty() {
        bail!("paths.key_dir cannot be empty");
    }
    if config.salt.bytes == 0 {
        bail!("salt.bytes must be greater than zero");
    }
    if let Some(cmd) = &config.salt.command {
        if cmd.is_empty() || cmd[0].trim().is_empty() {
            bail!("salt.command must name a program");
        }
    }
    if !config.certificate.subject.starts_with('/') {
        bail!(
            "certificate.subject must be a slash-separated name, e.g. /CN=localhost (got '{}')",
            config.certificate.subject
        );
    }
    Ok(())
}
