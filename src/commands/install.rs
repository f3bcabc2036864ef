use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use nupm::{ConflictPolicy, PackageIdentifier, ProgressCallback, ResolutionContext};
use std::env;
use std::sync::Arc;

/// Create an indicatif-based progress callback for CLI display
pub(crate) fn create_spinner_callback() -> ProgressCallback {
    let spinner = Arc::new(std::sync::Mutex::new(ProgressBar::new_spinner()));
    {
        let s = spinner.lock().unwrap();
        s.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        s.enable_steady_tick(std::time::Duration::from_millis(80));
    }

    let spinner_clone = spinner.clone();
    Arc::new(move |msg: &str, current: u64, total: u64| {
        let s = spinner_clone.lock().unwrap();
        if current >= total && total > 0 {
            s.finish_with_message(format!("✓ {}", msg));
        } else {
            s.set_message(msg.to_string());
        }
    })
}

/// Split `id@version` into its parts; a plain id means latest.
pub(crate) fn parse_package_spec(
    spec: &str,
    version_flag: Option<&str>,
) -> Result<(String, Option<String>)> {
    match spec.split_once('@') {
        Some((id, version)) => {
            if version_flag.is_some() {
                bail!("Version given both inline and with --version");
            }
            Ok((id.to_string(), Some(version.to_string())))
        }
        None => Ok((spec.to_string(), version_flag.map(str::to_string))),
    }
}

pub fn run(package: &str, version: Option<&str>, no_overwrite: bool, dry_run: bool) -> Result<()> {
    let (id, version) = parse_package_spec(package, version)?;
    let current_dir = env::current_dir()?;

    let policy = if no_overwrite {
        ConflictPolicy::Fail
    } else {
        ConflictPolicy::Overwrite
    };
    let mut context = ResolutionContext::open(&current_dir)?.with_conflict_policy(policy);

    let wanted = match version {
        Some(version) => PackageIdentifier::new(id, version)?,
        None => {
            // No version asked for: take the newest the sources offer.
            let latest = context
                .aggregator
                .get_latest(&id, false)
                .ok_or_else(|| nupm::Error::PackageNotFound(id.clone()))?;
            PackageIdentifier::new(id, format!("[{}]", latest.version))?
        }
    };

    println!("Resolving {}...", wanted);
    let plan = context.plan_install(&wanted)?;

    for satisfied in &plan.already_satisfied {
        println!("  {} is already satisfied", satisfied.id);
    }
    if plan.is_empty() {
        println!("Nothing to install.");
        return Ok(());
    }

    println!(
        "Will install {} package{}:",
        plan.actions.len(),
        if plan.actions.len() == 1 { "" } else { "s" }
    );
    for action in &plan.actions {
        println!(
            "  {} {} (from {})",
            action.package.id, action.package.version, action.package.source_name
        );
    }

    if dry_run {
        println!();
        println!("Dry run - nothing was installed.");
        return Ok(());
    }

    let progress = create_spinner_callback();
    let installed = context.apply(&plan, Some(&progress))?;

    println!();
    println!(
        "Installed {} package{}.",
        installed.len(),
        if installed.len() == 1 { "" } else { "s" }
    );
    Ok(())
}
