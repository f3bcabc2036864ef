use crate::commands::install::create_spinner_callback;
use anyhow::Result;
use nupm::ResolutionContext;
use std::env;

pub fn run(package: Option<&str>, prerelease: bool, dry_run: bool) -> Result<()> {
    let current_dir = env::current_dir()?;
    let mut context = ResolutionContext::open(&current_dir)?;

    if context.installed.is_empty() {
        println!("No packages installed.");
        return Ok(());
    }

    match package {
        Some(id) => println!("Checking for updates to {}...", id),
        None => println!(
            "Checking {} installed package{} for updates...",
            context.installed.len(),
            if context.installed.len() == 1 { "" } else { "s" }
        ),
    }

    if dry_run {
        let targets: Vec<_> = context
            .installed
            .snapshot()
            .into_iter()
            .filter(|p| package.map(|id| p.matches_id(id)).unwrap_or(true))
            .collect();
        let updates = context.aggregator.get_updates(&targets, prerelease, false);
        if updates.is_empty() {
            println!("Everything is up to date.");
        } else {
            println!("Available updates:");
            for update in &updates {
                let current = context
                    .installed
                    .get(&update.id)
                    .map(|p| p.version_literal.clone())
                    .unwrap_or_default();
                println!("  {} {} -> {}", update.id, current, update.version);
            }
            println!();
            println!("Dry run - nothing was updated.");
        }
        return Ok(());
    }

    let progress = create_spinner_callback();
    let upgraded = context.update(package, prerelease, Some(&progress))?;

    println!();
    if upgraded.is_empty() {
        println!("Everything is up to date.");
    } else {
        println!(
            "Updated {} package{}:",
            upgraded.len(),
            if upgraded.len() == 1 { "" } else { "s" }
        );
        for package in &upgraded {
            println!("  {} {}", package.id, package.version);
        }
    }
    Ok(())
}
