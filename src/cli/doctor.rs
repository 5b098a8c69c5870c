//! Diagnostics for the key directory and toolchain.

use crate::cli::CliContext;
use crate::constants;
use crate::core::authority::{fingerprint, key_is_encrypted, KeyAndCertAuthority, OpensslAuthority};
use crate::core::provisioner::{artifact_path, is_present};
use crate::models::artifact::{Artifact, POLICY_TABLE};
use crate::util::fs as key_fs;
use anyhow::Result;
use clap::Args;
use std::fs;
use std::path::Path;

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Skip the key/certificate match check (it may prompt for a passphrase)
    #[arg(long)]
    pub no_match: bool,
}

#[derive(Default)]
struct Tally {
    pass: u32,
    warn: u32,
    fail: u32,
}

impl Tally {
    fn pass(&mut self, msg: impl AsRef<str>) {
        println!("  [PASS] {}", msg.as_ref());
        self.pass += 1;
    }

    fn warn(&mut self, msg: impl AsRef<str>) {
        println!("  [WARN] {}", msg.as_ref());
        self.warn += 1;
    }

    fn fail(&mut self, msg: impl AsRef<str>) {
        println!("  [FAIL] {}", msg.as_ref());
        self.fail += 1;
    }
}

pub fn run(ctx: &CliContext, args: DoctorArgs) -> Result<()> {
    let paths = &ctx.paths;
    let mut t = Tally::default();

    println!("Doctor: {}", paths);

    let authority = OpensslAuthority::new(&ctx.config.tools.openssl);
    match authority.version() {
        Some(v) => t.pass(format!("{} available: {}", authority.program().display(), v)),
        None => t.fail(format!("{} not found or not runnable", authority.program().display())),
    }

    if let Some(cmd) = &ctx.config.salt.command {
        println!("  [INFO] salt source: command `{}`", cmd.join(" "));
    } else {
        println!("  [INFO] salt source: OS RNG, {} bytes", ctx.config.salt.bytes);
    }

    if !paths.key_dir.is_dir() {
        t.warn(format!(
            "key directory missing: {} (run tls-bootstrap to provision)",
            paths.key_dir.display()
        ));
        if !paths.template.is_file() {
            t.fail(format!("config template missing: {}", paths.template.display()));
        }
        return finish(t);
    }

    check_mode(&mut t, &paths.key_dir, "key directory", &[constants::KEY_DIR_MODE]);
    check_owner(&mut t, &paths.key_dir);

    for (artifact, policy) in POLICY_TABLE.iter().skip(1) {
        let path = artifact_path(paths, *artifact);
        if is_present(paths, *artifact) {
            t.pass(format!("{} present ({}): {}", artifact, policy, path.display()));
        } else if *artifact == Artifact::Salt && path.is_file() {
            t.fail(format!("salt is empty (next run regenerates it): {}", path.display()));
        } else {
            t.warn(format!("{} missing: {}", artifact, path.display()));
        }
    }

    if paths.private_key.exists() {
        check_mode(&mut t, &paths.private_key, "private key", &[constants::SECRET_FILE_MODE]);
        let protection = if key_is_encrypted(&paths.private_key) {
            "encrypted"
        } else {
            "unencrypted"
        };
        println!("  [INFO] private key is {}", protection);
    }
    if is_present(paths, Artifact::Salt) {
        check_mode(&mut t, &paths.salt, "salt", &[constants::SECRET_FILE_MODE]);
    }
    if !paths.config.exists() && !paths.template.is_file() {
        t.fail(format!("config template missing: {}", paths.template.display()));
    }

    match key_fs::stale_temp_files(&paths.key_dir) {
        Ok(stale) if stale.is_empty() => t.pass("no leftover temp files"),
        Ok(stale) => {
            t.warn(format!("{} leftover temp files from an interrupted run:", stale.len()));
            for p in &stale {
                println!("    - {}", p.display());
            }
        }
        Err(e) => t.warn(format!("cannot scan for temp files: {:#}", e)),
    }

    if !args.no_match && paths.private_key.exists() && paths.certificate.exists() {
        check_key_matches_cert(&mut t, &authority, ctx, ctx.passphrase_file.as_deref());
    }

    finish(t)
}

fn finish(t: Tally) -> Result<()> {
    println!();
    println!("Doctor summary: {} pass, {} warn, {} fail", t.pass, t.warn, t.fail);
    if t.fail > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn check_mode(t: &mut Tally, path: &Path, what: &str, allowed: &[u32]) {
    match key_fs::mode_of(path) {
        Some(mode) if allowed.contains(&mode) => t.pass(format!("{} mode ok: {:04o}", what, mode)),
        Some(mode) => t.warn(format!(
            "{} mode: {:04o} (expected {:04o})",
            what, mode, allowed[0]
        )),
        None => {}
    }
}

fn check_owner(t: &mut Tally, path: &Path) {
    #[cfg(unix)]
    {
        use nix::unistd::{Uid, User};
        use std::os::unix::fs::MetadataExt;

        let Ok(meta) = fs::metadata(path) else {
            return;
        };
        let owner = Uid::from_raw(meta.uid());
        let name = User::from_uid(owner)
            .ok()
            .flatten()
            .map(|u| u.name)
            .unwrap_or_else(|| owner.to_string());
        if owner == Uid::effective() {
            t.pass(format!("key directory owned by {}", name));
        } else {
            t.warn(format!(
                "key directory owned by {} (running as uid {})",
                name,
                Uid::effective()
            ));
        }
    }
    #[cfg(not(unix))]
    {
        let _ = (t, path);
    }
}

fn check_key_matches_cert(
    t: &mut Tally,
    authority: &dyn KeyAndCertAuthority,
    ctx: &CliContext,
    passphrase_file: Option<&Path>,
) {
    let paths = &ctx.paths;
    if ctx.non_interactive && passphrase_file.is_none() && key_is_encrypted(&paths.private_key) {
        t.warn("skipping key/certificate match: key is encrypted and no --passphrase-file given");
        return;
    }
    let from_key = match authority.public_key_of_key(&paths.private_key, passphrase_file) {
        Ok(pem) => fingerprint(&pem),
        Err(e) => {
            t.warn(format!("cannot read public key from private key: {:#}", e));
            return;
        }
    };
    let from_cert = match authority.public_key_of_cert(&paths.certificate) {
        Ok(pem) => fingerprint(&pem),
        Err(e) => {
            t.fail(format!("cannot read certificate: {:#}", e));
            return;
        }
    };
    if from_key == from_cert {
        t.pass(format!("certificate matches private key (sha256 {})", &from_key[..16]));
    } else {
        t.fail("certificate was not issued for the current private key (run tls-bootstrap to reissue)");
    }
}
