//! Dry-run preview of a provisioning run.

use crate::cli::CliContext;
use crate::core::provisioner;
use crate::models::cipher::{self, CipherStrength};
use anyhow::{bail, Context, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct PlanOutput<'a> {
    key_dir: &'a Path,
    cipher: &'a str,
    steps: &'a [provisioner::PlannedStep],
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Cipher the run would use for a new private key
    #[arg(value_enum)]
    pub cipher: Option<CipherStrength>,

    /// Output format (table|json)
    #[arg(long, default_value = "table")]
    pub format: String,
}

pub fn run(ctx: &CliContext, args: PlanArgs) -> Result<()> {
    if args.format != "table" && args.format != "json" {
        bail!("invalid format: {} (use table|json)", args.format);
    }

    let steps = provisioner::plan(&ctx.paths, args.cipher);

    if args.format == "json" {
        let plan = PlanOutput {
            key_dir: &ctx.paths.key_dir,
            cipher: cipher::describe(args.cipher),
            steps: &steps,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&plan).context("serialize plan")?
        );
        return Ok(());
    }

    println!("Plan: provision {} ({})", ctx.paths.key_dir.display(), cipher::describe(args.cipher));
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Step").add_attribute(Attribute::Bold),
        Cell::new("Policy").add_attribute(Attribute::Bold),
        Cell::new("Action").add_attribute(Attribute::Bold),
        Cell::new("Path").add_attribute(Attribute::Bold),
        Cell::new("Note").add_attribute(Attribute::Bold),
    ]);
    for step in steps {
        table.add_row(vec![
            step.artifact.step_name().to_string(),
            step.policy.to_string(),
            step.outcome.to_string(),
            step.path.display().to_string(),
            step.note.unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{}", table);
    Ok(())
}
