use anyhow::Result;
use nupm::{InstalledPackagesSet, PACKAGES_CONFIG};
use std::env;

pub fn run() -> Result<()> {
    let current_dir = env::current_dir()?;
    let path = current_dir.join(PACKAGES_CONFIG);

    if !path.exists() {
        println!("No {} found in current directory.", PACKAGES_CONFIG);
        println!();
        println!("Run 'nupm init' to initialize a project.");
        return Ok(());
    }

    let installed = InstalledPackagesSet::load_from(&path)?;

    if installed.is_empty() {
        println!("No packages installed.");
        println!();
        println!("Install packages with: nupm install <package>");
        return Ok(());
    }

    let manual: Vec<_> = installed.iter().filter(|p| p.manually_installed).collect();
    let dependencies: Vec<_> = installed.iter().filter(|p| !p.manually_installed).collect();

    if !manual.is_empty() {
        println!("Packages:");
        for entry in &manual {
            println!("  {} @ {}", entry.id, entry.version_literal);
        }
        println!();
    }

    if !dependencies.is_empty() {
        println!("Dependencies:");
        for entry in &dependencies {
            println!("  {} @ {}", entry.id, entry.version_literal);
        }
        println!();
    }

    println!(
        "Total: {} package{}",
        installed.len(),
        if installed.len() == 1 { "" } else { "s" }
    );

    Ok(())
}
