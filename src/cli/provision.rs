use crate::cli::CliContext;
use crate::core::authority::{key_is_encrypted, OpensslAuthority};
use crate::core::provisioner::{ProvisionOptions, Provisioner};
use crate::core::salt;
use crate::models::artifact::{Artifact, Outcome};
use crate::models::cipher::{self, CipherStrength};
use anyhow::{bail, Result};
use clap::Args;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// Encrypt a newly generated private key (omit for an unencrypted key)
    #[arg(value_enum)]
    pub cipher: Option<CipherStrength>,

    /// Fail immediately if another run holds the key directory lock
    #[arg(long)]
    pub no_wait: bool,
}

impl ProvisionArgs {
    /// True when any provisioning-only argument was given.
    pub fn is_set(&self) -> bool {
        self.cipher.is_some() || self.no_wait
    }
}

/// Refuse an unattended run that would stop at an openssl passphrase prompt.
///
/// A new encrypted key prompts for a passphrase; a self-signature over an
/// existing encrypted key prompts to unlock it.
pub fn check_non_interactive(
    private_key: &Path,
    cipher: Option<CipherStrength>,
    passphrase_file: Option<&Path>,
) -> Result<()> {
    if passphrase_file.is_some() {
        return Ok(());
    }
    if private_key.exists() {
        if key_is_encrypted(private_key) {
            bail!(
                "--non-interactive requires --passphrase-file: {} is encrypted",
                private_key.display()
            );
        }
    } else if cipher.is_some() {
        bail!("--non-interactive requires --passphrase-file when a cipher is selected");
    }
    Ok(())
}

pub fn run(ctx: &CliContext, args: ProvisionArgs) -> Result<()> {
    let paths = &ctx.paths;

    if ctx.non_interactive {
        check_non_interactive(&paths.private_key, args.cipher, ctx.passphrase_file.as_deref())?;
    }

    let authority = OpensslAuthority::new(&ctx.config.tools.openssl);
    let salt_source = salt::from_config(&ctx.config.salt)?;
    let provisioner = Provisioner::new(paths, &authority, salt_source.as_ref());

    let opts = ProvisionOptions {
        cipher: args.cipher,
        passphrase_file: ctx.passphrase_file.clone(),
        subject: ctx.config.certificate.subject.clone(),
        wait_for_lock: !args.no_wait,
    };
    let report = provisioner.run(&opts)?;

    println!("Provisioned {}", paths.key_dir.display());
    for step in &report.steps {
        if step.artifact == Artifact::Directory {
            continue;
        }
        println!("  {:<12} {:<17} {}", step.artifact, step.outcome, step.path.display());
    }
    if report.outcome(Artifact::PrivateKey) == Some(Outcome::Created) {
        println!("  key protection: {}", cipher::describe(args.cipher));
    }
    println!(
        "  certificate valid until {}",
        report.certificate_expires_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();
    println!(
        "Review {} before starting the server; it was copied from {}.",
        paths.config.display(),
        paths.template.display()
    );
    Ok(())
}
