//! Random material for password-based key derivation.

use crate::core::error::ToolError;
use crate::models::bootstrap_config::SaltSection;
use anyhow::{bail, Context, Result};
use rand::{rngs::OsRng, RngCore};
use std::process::{Command, Stdio};
use tracing::debug;
use zeroize::Zeroizing;

pub trait RandomMaterialSource {
    /// Produce salt bytes. The provisioner writes them verbatim.
    fn generate_salt(&self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Hex-encoded bytes from the operating system RNG, newline terminated.
#[derive(Debug, Clone)]
pub struct OsRngSaltSource {
    bytes: usize,
}

impl OsRngSaltSource {
    pub fn new(bytes: usize) -> Self {
        Self { bytes }
    }
}

impl RandomMaterialSource for OsRngSaltSource {
    fn generate_salt(&self) -> Result<Zeroizing<Vec<u8>>> {
        if self.bytes == 0 {
            bail!("salt length must be greater than zero");
        }
        let mut raw = Zeroizing::new(vec![0u8; self.bytes]);
        OsRng
            .try_fill_bytes(raw.as_mut_slice())
            .context("read OS random number generator")?;
        let mut encoded = Zeroizing::new(hex::encode(raw.as_slice()).into_bytes());
        encoded.push(b'\n');
        Ok(encoded)
    }
}

/// Captures the stdout of an external salt generator.
#[derive(Debug, Clone)]
pub struct CommandSaltSource {
    argv: Vec<String>,
}

impl CommandSaltSource {
    pub fn new(argv: Vec<String>) -> Result<Self> {
        if argv.first().map(|p| p.trim().is_empty()).unwrap_or(true) {
            bail!("salt command must name a program");
        }
        Ok(Self { argv })
    }
}

impl RandomMaterialSource for CommandSaltSource {
    fn generate_salt(&self) -> Result<Zeroizing<Vec<u8>>> {
        let tool = self.argv.join(" ");
        let mut cmd = Command::new(&self.argv[0]);
        cmd.args(&self.argv[1..])
            .stdin(Stdio::null())
            .stderr(Stdio::inherit());
        debug!(tool = %tool, "running salt generator");
        let output = cmd.output().with_context(|| format!("run {}", tool))?;
        let stdout = Zeroizing::new(output.stdout);
        if !output.status.success() {
            return Err(ToolError {
                tool,
                status: output.status.to_string(),
                detail: String::new(),
            }
            .into());
        }
        if stdout.is_empty() {
            return Err(ToolError {
                tool,
                status: output.status.to_string(),
                detail: "produced no output".to_string(),
            }
            .into());
        }
        Ok(stdout)
    }
}

/// Pick the source configured in `bootstrap.toml`.
pub fn from_config(section: &SaltSection) -> Result<Box<dyn RandomMaterialSource>> {
    match &section.command {
        Some(argv) => Ok(Box::new(CommandSaltSource::new(argv.clone())?)),
        None => Ok(Box::new(OsRngSaltSource::new(section.bytes))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_rng_salt_is_hex_and_unique() {
        let source = OsRngSaltSource::new(16);
        let a = source.generate_salt().unwrap();
        let b = source.generate_salt().unwrap();
        assert_eq!(a.len(), 33);
        assert_eq!(a.last(), Some(&b'\n'));
        assert!(a[..32].iter().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(OsRngSaltSource::new(0).generate_salt().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_output_captured_verbatim() {
        let source = CommandSaltSource::new(vec!["printf".into(), "s@lt\\n".into()]).unwrap();
        assert_eq!(source.generate_salt().unwrap().as_slice(), b"s@lt\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_failure_is_tool_error() {
        let source = CommandSaltSource::new(vec!["false".into()]).unwrap();
        let err = source.generate_salt().unwrap_err();
        assert!(err.is::<ToolError>());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_empty_output_is_tool_error() {
        let source = CommandSaltSource::new(vec!["true".into()]).unwrap();
        assert!(source.generate_salt().unwrap_err().is::<ToolError>());
    }

    #[test]
    fn test_from_config_rejects_empty_command() {
        let section = SaltSection {
            bytes: 32,
            command: Some(vec![]),
        };
        assert!(from_config(&section).is_err());
    }
}
