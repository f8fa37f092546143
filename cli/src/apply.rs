#![deny(missing_docs)]

//! # Apply / Check Commands
//!
//! Reads every document named by the patch plan, runs the operations through the
//! core orchestrator and writes the document back when something changed.
//!
//! `check` runs the same pipeline without writing and fails if anything would
//! still change, which makes it usable as a CI drift check after a rollout.

use crate::error::{CliError, CliResult};
use ncf_patch_core::{apply_all, DocumentPlan, Outcome, PatchPlan, PatchResult, Report};
use std::fs;
use std::path::{Path, PathBuf};

/// The plan shipped with the tool: the NCF expiry-date rollout.
pub const BUILTIN_PLAN: &str = include_str!("../plans/ncf_expiry.yaml");

/// Where the plan and the documents come from.
#[derive(clap::Args, Debug, Clone)]
pub struct PlanArgs {
    /// Patch plan (YAML). Defaults to the built-in NCF expiry plan.
    #[clap(long, env = "NCF_PATCH_PLAN")]
    pub plan: Option<PathBuf>,

    /// Project root that document paths are relative to.
    #[clap(long, default_value = ".")]
    pub root: PathBuf,

    /// Print the report as JSON.
    #[clap(long)]
    pub json: bool,
}

/// Arguments for the apply command.
#[derive(clap::Args, Debug, Clone)]
pub struct ApplyArgs {
    /// Plan source.
    #[clap(flatten)]
    pub source: PlanArgs,

    /// Report what would change without writing.
    #[clap(long)]
    pub dry_run: bool,

    /// Fail when any anchor is missing or any operation fails.
    #[clap(long)]
    pub strict: bool,
}

/// Arguments for the check command.
#[derive(clap::Args, Debug, Clone)]
pub struct CheckArgs {
    /// Plan source.
    #[clap(flatten)]
    pub source: PlanArgs,

    /// Also fail when any anchor is missing or any operation fails.
    #[clap(long)]
    pub strict: bool,
}

/// Loads the plan at `path`, or the built-in plan.
pub fn load_plan(path: Option<&Path>) -> CliResult<PatchPlan> {
    let plan = match path {
        Some(p) => PatchPlan::from_path(p)?,
        None => PatchPlan::from_yaml(BUILTIN_PLAN)?,
    };
    Ok(plan)
}

/// Executes the apply command. Returns whether the run counts as successful.
pub fn execute(args: &ApplyArgs) -> CliResult<bool> {
    let plan = load_plan(args.source.plan.as_deref())?;
    let report = run_plan(&plan, &args.source.root, args.dry_run)?;
    print_report(&report, args.source.json)?;

    if args.strict && !report.is_clean() {
        log::error!("strict mode: some operations did not apply");
        return Ok(false);
    }
    Ok(true)
}

/// Executes the check command. Fails only if some operation would still apply,
/// or, with `--strict`, if anything is missing or failing.
pub fn check(args: &CheckArgs) -> CliResult<bool> {
    let plan = load_plan(args.source.plan.as_deref())?;
    let report = run_plan(&plan, &args.source.root, true)?;
    print_report(&report, args.source.json)?;

    let pending = report.applied().count();
    if pending > 0 {
        log::warn!("{} operation(s) still pending", pending);
    }
    if args.strict && !report.is_clean() {
        log::error!("strict mode: some operations cannot be checked");
        return Ok(false);
    }
    Ok(pending == 0)
}

/// Runs every document of `plan` under `root`.
pub fn run_plan(plan: &PatchPlan, root: &Path, dry_run: bool) -> CliResult<Report> {
    if !root.is_dir() {
        return Err(CliError::General(format!(
            "Project root not found: {:?}",
            root
        )));
    }

    let mut report = Report::new();
    for document in &plan.documents {
        report.extend(process_document(plan, document, root, dry_run)?);
    }
    Ok(report)
}

fn process_document(
    plan: &PatchPlan,
    document: &DocumentPlan,
    root: &Path,
    dry_run: bool,
) -> CliResult<Vec<PatchResult>> {
    let path = root.join(&document.path);
    let id = document.path.display().to_string();

    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("skipping {:?}: {}", path, e);
            return Ok(vec![PatchResult {
                document_id: id,
                label: "read document".into(),
                applied: false,
                match_count: 0,
                outcome: Outcome::Failed(format!("cannot read {:?}: {}", path, e)),
            }]);
        }
    };

    let operations = plan.operations(document);
    let applied = apply_all(&id, &content, &operations);

    if applied.changed() && !dry_run {
        write_document(&path, &applied.text)?;
        log::info!("patched {}", id);
    }

    Ok(applied.results)
}

fn write_document(path: &Path, text: &str) -> CliResult<()> {
    if let Err(e) = fs::write(path, text) {
        log::error!("failed to write {:?}", path);
        return Err(e.into());
    }
    Ok(())
}

fn print_report(report: &Report, json: bool) -> CliResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}
