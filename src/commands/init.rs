use anyhow::Result;
use nupm::{InstalledPackagesSet, NugetConfig, NUGET_CONFIG, PACKAGES_CONFIG};
use std::env;

pub fn run() -> Result<()> {
    let current_dir = env::current_dir()?;

    let config_path = current_dir.join(NUGET_CONFIG);
    if config_path.exists() {
        println!("✓ {} already exists in this directory", NUGET_CONFIG);
    } else {
        NugetConfig::default().save_to(&config_path)?;
        println!("✓ Created {} (nuget.org enabled)", NUGET_CONFIG);
    }

    let packages_path = current_dir.join(PACKAGES_CONFIG);
    if packages_path.exists() {
        println!("✓ {} already exists in this directory", PACKAGES_CONFIG);
    } else {
        InstalledPackagesSet::new().save_to(&packages_path)?;
        println!("✓ Created empty {}", PACKAGES_CONFIG);
    }

    println!();
    println!("Next steps:");
    println!("  • Install a package: nupm install <package>");
    println!("  • Search for packages: nupm search <term>");

    Ok(())
}
