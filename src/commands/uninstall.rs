use anyhow::Result;
use nupm::ResolutionContext;
use std::env;

pub fn run(package: &str) -> Result<()> {
    let current_dir = env::current_dir()?;
    let mut context = ResolutionContext::open(&current_dir)?;

    let Some(installed) = context.installed.get(package).cloned() else {
        println!("⚠ Package '{}' is not installed", package);
        if !context.installed.is_empty() {
            println!();
            println!("Currently installed packages:");
            for entry in context.installed.iter() {
                println!("  - {}@{}", entry.id, entry.version_literal);
            }
        }
        return Ok(());
    };

    println!("Uninstalling {} {}...", installed.id, installed.version);
    context.uninstall(package)?;

    println!("✓ Successfully uninstalled {}", installed.id);
    Ok(())
}
