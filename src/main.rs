use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use gcamkit::commands;
use gcamkit::{init_logging, load_from_file, save_to_file, Settings, BUILD_DATE};

#[derive(Parser)]
#[command(name = "gcamkit")]
#[command(about = "Build CNC programs from block trees and generate G-code", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (.toml or .json); defaults to the platform config dir
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate G-code from a program file
    Make {
        /// Program file (.gcam or .xml)
        file: PathBuf,
        /// Output file (default: program path with the G-code extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert a program between the binary and XML formats
    Convert {
        /// Input program file
        input: PathBuf,
        /// Output file (format determined by extension: .gcam, .xml)
        output: PathBuf,
    },
    /// Display information about a program file
    Info {
        /// Program file
        file: PathBuf,
    },
    /// Create a program with the default setup blocks
    New {
        /// Program file to create
        file: PathBuf,
        /// Program name (default: derived from the file name)
        #[arg(short, long)]
        name: Option<String>,
    },
}

fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();
    info!("gcamkit {} (built {})", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let settings = load_settings(cli.settings.as_deref())?;

    match cli.command {
        Commands::Make { file, output } => {
            let written = commands::make_file(&file, output.as_deref(), &settings)?;
            println!("Wrote {}", written.display());
        }
        Commands::Convert { input, output } => {
            commands::convert_file(&input, &output)?;
            println!("Converted {} to {}", input.display(), output.display());
        }
        Commands::Info { file } => {
            let program = load_from_file(&file)?;
            print!("{}", commands::describe(&program));
        }
        Commands::New { file, name } => {
            let path = commands::program_path(&file, &settings);
            let mut program = commands::new_program(&settings)?;
            program.config.name = name.unwrap_or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("Untitled")
                    .to_string()
            });
            save_to_file(&program, &path)?;
            println!("Created {}", path.display());
        }
    }

    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => match Settings::default_path() {
            Some(path) => Settings::load_or_default(&path)
                .with_context(|| format!("Failed to load settings from {}", path.display())),
            None => Ok(Settings::default()),
        },
    }
}
