use crate::commands::install::create_spinner_callback;
use anyhow::Result;
use nupm::ResolutionContext;
use std::env;

pub fn run() -> Result<()> {
    let current_dir = env::current_dir()?;
    let mut context = ResolutionContext::open(&current_dir)?;

    if context.installed.is_empty() {
        println!("Nothing to restore: packages.config is empty.");
        return Ok(());
    }

    println!(
        "Restoring {} package{}...",
        context.installed.len(),
        if context.installed.len() == 1 { "" } else { "s" }
    );

    let progress = create_spinner_callback();
    let report = context.restore(Some(&progress))?;

    println!();
    println!(
        "Restore complete: {} restored, {} already present, {} failed.",
        report.restored, report.already_present, report.failed
    );
    if report.failed > 0 {
        println!("Run with RUST_LOG=error for details on the failures.");
    }
    Ok(())
}
