//! `bootstrap.toml` model.

use crate::constants;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapFile {
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub certificate: CertificateSection,
    #[serde(default)]
    pub salt: SaltSection,
    #[serde(default)]
    pub tools: ToolsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsSection {
    /// Provisioning directory, relative to the working root unless absolute.
    #[serde(default = "default_key_dir")]
    pub key_dir: String,

    /// Template copied to the config file, relative to the working root unless absolute.
    #[serde(default = "default_template")]
    pub template: String,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            key_dir: default_key_dir(),
            template: default_template(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateSection {
    /// Distinguished name passed to the self-signing tool.
    #[serde(default = "default_subject")]
    pub subject: String,
}

impl Default for CertificateSection {
    fn default() -> Self {
        Self {
            subject: default_subject(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaltSection {
    /// Random bytes drawn when no command is configured.
    #[serde(default = "default_salt_bytes")]
    pub bytes: usize,

    /// External command whose stdout becomes the salt, e.g. `["python3", "-m", "app.salt"]`.
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

impl Default for SaltSection {
    fn default() -> Self {
        Self {
            bytes: default_salt_bytes(),
            command: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsSection {
    #[serde(default = "default_openssl")]
    pub openssl: String,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            openssl: default_openssl(),
        }
    }
}

fn default_key_dir() -> String {
    constants::KEY_DIR_NAME.to_string()
}

fn default_template() -> String {
    constants::DEFAULT_TEMPLATE.to_string()
}

fn default_subject() -> String {
    constants::DEFAULT_SUBJECT.to_string()
}

fn default_salt_bytes() -> usize {
    constants::DEFAULT_SALT_BYTES
}

fn default_openssl() -> String {
    constants::DEFAULT_OPENSSL.to_string()
}
