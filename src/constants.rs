//! Centralized constants for file names, permissions, and key parameters.

/// Provisioning directory name, relative to the working root.
pub const KEY_DIR_NAME: &str = "keys";

/// Private key file name inside the provisioning directory.
pub const PRIVATE_KEY_FILE: &str = "privkey.pem";

/// Salt file name inside the provisioning directory.
pub const SALT_FILE: &str = "salt";

/// Server configuration file name inside the provisioning directory.
pub const CONFIG_FILE: &str = "config.yml";

/// Certificate file name inside the provisioning directory.
pub const CERTIFICATE_FILE: &str = "cert.pem";

/// Optional bootstrap configuration, relative to the working root.
pub const BOOTSTRAP_TOML: &str = "bootstrap.toml";

/// Default template copied to the config file, relative to the working root.
pub const DEFAULT_TEMPLATE: &str = "default/config.yml";

/// Prefix for in-flight temp files. Existence checks never match it.
pub const TEMP_PREFIX: &str = ".tmp-";

/// Permission mode for the provisioning directory.
pub const KEY_DIR_MODE: u32 = 0o700;

/// Permission mode for the private key and salt.
pub const SECRET_FILE_MODE: u32 = 0o600;

/// Permission mode for the copied config file.
pub const CONFIG_FILE_MODE: u32 = 0o640;

/// Permission mode for the certificate.
pub const CERT_FILE_MODE: u32 = 0o644;

/// RSA modulus size in bits.
pub const RSA_KEY_BITS: u32 = 2048;

/// Certificate validity window in days from issuance.
pub const CERT_VALIDITY_DAYS: u32 = 365;

/// Default certificate subject.
pub const DEFAULT_SUBJECT: &str = "/CN=localhost";

/// Random bytes drawn for the default salt source.
pub const DEFAULT_SALT_BYTES: usize = 32;

/// Default path of the cryptographic toolkit binary.
pub const DEFAULT_OPENSSL: &str = "openssl";
