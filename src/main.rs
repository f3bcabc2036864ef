use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

mod commands;

/// nupm - A NuGet package manager for Unity projects
#[derive(Parser)]
#[command(name = "nupm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize NuGet.config and packages.config in the current directory
    Init,

    /// Install a package and its dependencies
    Install {
        /// Package id, optionally with a version or range (e.g.,
        /// Newtonsoft.Json@13.0.1); without one the latest version is installed
        package: String,

        /// Version or range (alternative to the id@version syntax)
        #[arg(short, long)]
        version: Option<String>,

        /// Fail instead of replacing an existing content directory
        #[arg(long)]
        no_overwrite: bool,

        /// Show what would be installed without actually installing
        #[arg(long)]
        dry_run: bool,
    },

    /// Uninstall a package
    Uninstall {
        /// Package id
        package: String,
    },

    /// Update installed packages to their newest versions
    Update {
        /// Specific package to update (optional)
        package: Option<String>,

        /// Consider prerelease versions
        #[arg(long)]
        prerelease: bool,

        /// Show what would be updated without actually updating
        #[arg(long)]
        dry_run: bool,
    },

    /// Reinstate content for everything in packages.config
    Restore,

    /// Search configured sources for packages
    Search {
        /// Search term (empty lists everything)
        #[arg(default_value = "")]
        term: String,

        /// Show every version instead of only the latest
        #[arg(long)]
        all_versions: bool,

        /// Include prerelease versions
        #[arg(long)]
        prerelease: bool,
    },

    /// List installed packages
    List,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Install {
            package,
            version,
            no_overwrite,
            dry_run,
        } => commands::install::run(&package, version.as_deref(), no_overwrite, dry_run),
        Commands::Uninstall { package } => commands::uninstall::run(&package),
        Commands::Update {
            package,
            prerelease,
            dry_run,
        } => commands::update::run(package.as_deref(), prerelease, dry_run),
        Commands::Restore => commands::restore::run(),
        Commands::Search {
            term,
            all_versions,
            prerelease,
        } => commands::search::run(&term, all_versions, prerelease),
        Commands::List => commands::list::run(),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "nupm", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
