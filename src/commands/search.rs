use anyhow::Result;
use nupm::ResolutionContext;
use std::env;

pub fn run(term: &str, all_versions: bool, prerelease: bool) -> Result<()> {
    let current_dir = env::current_dir()?;
    let context = ResolutionContext::open(&current_dir)?;

    if term.is_empty() {
        println!("Listing available packages...");
    } else {
        println!("Searching for: {}", term);
    }
    println!();

    let results = context.aggregator.search(term, all_versions, prerelease);

    if results.is_empty() {
        println!("No packages found matching '{}'", term);
        println!();
        println!("Try a different search term or check your configured sources.");
        return Ok(());
    }

    println!(
        "Found {} package{}:",
        results.len(),
        if results.len() == 1 { "" } else { "s" }
    );
    for package in &results {
        match package.description.as_deref() {
            Some(description) => println!(
                "  {} {} - {}",
                package.id,
                package.version,
                description.lines().next().unwrap_or_default()
            ),
            None => println!("  {} {}", package.id, package.version),
        }
    }
    println!();

    Ok(())
}
