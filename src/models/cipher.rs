//! Cipher-strength selector for private key encryption at rest.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CipherStrength {
    Aes128,
    Aes192,
    Aes256,
}

impl CipherStrength {
    pub const ALL: [CipherStrength; 3] = [Self::Aes128, Self::Aes192, Self::Aes256];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aes128 => "aes128",
            Self::Aes192 => "aes192",
            Self::Aes256 => "aes256",
        }
    }

    /// Option flag understood by `openssl genrsa`.
    pub fn openssl_flag(&self) -> &'static str {
        match self {
            Self::Aes128 => "-aes128",
            Self::Aes192 => "-aes192",
            Self::Aes256 => "-aes256",
        }
    }
}

impl fmt::Display for CipherStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherStrength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_start_matches('-').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "invalid cipher '{}', must be one of: {}",
                    s,
                    Self::ALL.map(|c| c.as_str()).join(", ")
                )
            })
    }
}

/// Render an optional selector for operator output.
pub fn describe(cipher: Option<CipherStrength>) -> &'static str {
    cipher.map(|c| c.as_str()).unwrap_or("unencrypted")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_openssl_style_flag() {
        assert_eq!("-aes256".parse::<CipherStrength>(), Ok(CipherStrength::Aes256));
        assert_eq!("AES128".parse::<CipherStrength>(), Ok(CipherStrength::Aes128));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "des3".parse::<CipherStrength>().unwrap_err();
        assert!(err.contains("aes128, aes192, aes256"));
    }

    #[test]
    fn test_flag_matches_name() {
        for cipher in CipherStrength::ALL {
            assert_eq!(cipher.openssl_flag(), format!("-{}", cipher.as_str()));
        }
    }

    #[test]
    fn test_describe_none() {
        assert_eq!(describe(None), "unencrypted");
        assert_eq!(describe(Some(CipherStrength::Aes192)), "aes192");
    }
}
