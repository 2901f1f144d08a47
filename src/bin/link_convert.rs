//! Link Conversion CLI
//!
//! Loads th2 resources from a directory, resolves `Th2Link` documents into
//! the boxes they connect and prints the converted boxes.
//!
//! Usage:
//!   link-convert convert --input ./schema --output ./converted
//!   link-convert index --input ./schema --strict
//!   link-convert config show

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use th2_links::loader::{load_from_directory, LoadConfig};
use th2_links::{ConversionSummary, ConverterConfig, LinkConverter, LinkDocument};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "link-convert")]
#[command(about = "Resolve th2 link documents into box specs")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every box under a directory
    Convert {
        /// Directory holding link and box YAML files
        #[arg(short, long)]
        input: PathBuf,

        /// Write one `<box>.yaml` per box here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Exit with status 1 when any error was collected
        #[arg(long)]
        strict: bool,
    },

    /// Print the link index built from a directory as JSON
    Index {
        /// Directory holding link YAML files
        #[arg(short, long)]
        input: PathBuf,

        /// Exit with status 1 when any error was collected
        #[arg(long)]
        strict: bool,
    },

    /// Configuration helpers
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration as TOML
    Show,

    /// Write the default configuration to a file
    Init {
        #[arg(short, long, default_value = "links.toml")]
        output: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the run finished but should fail the process
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let config = ConverterConfig::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Convert { input, output, strict } => {
            let mut documents = load_from_directory(&input, &LoadConfig::default())?;
            let mut summary = ConversionSummary::new();
            LinkConverter::new(config).convert_documents(&mut documents, &mut summary);

            if let Some(dir) = output {
                // Check every name before writing anything
                let mut file_names = HashSet::new();
                for document in &documents {
                    let file_name = document.file_name()?;
                    if !file_names.insert(file_name.clone()) {
                        return Err(format!("more than one resource would be written to {}", file_name).into());
                    }
                }

                fs::create_dir_all(&dir)?;
                for document in &documents {
                    fs::write(dir.join(document.file_name()?), serde_yaml::to_string(document)?)?;
                }
                eprintln!("Wrote {} resource(s) to {}", documents.len(), dir.display());
            } else {
                for document in &documents {
                    println!("---");
                    print!("{}", serde_yaml::to_string(document)?);
                }
            }

            eprint!("{}", summary);
            Ok(summary.passes(strict))
        }

        Commands::Index { input, strict } => {
            let links: Vec<LinkDocument> = load_from_directory(&input, &LoadConfig::default())?
                .iter()
                .filter(|d| d.is_link())
                .map(LinkDocument::from)
                .collect();

            let mut summary = ConversionSummary::new();
            let mut errors = th2_links::ErrorSink::new();
            let index = LinkConverter::new(config).build_index(&links, &mut errors);
            errors.drain_into(&mut summary);

            println!("{}", serde_json::to_string_pretty(&index)?);
            eprint!("{}", summary);
            Ok(summary.passes(strict))
        }

        Commands::Config { action } => {
            match action {
                ConfigAction::Show => print!("{}", toml::to_string_pretty(&config)?),
                ConfigAction::Init { output } => {
                    ConverterConfig::default().save(&output)?;
                    println!("Wrote default configuration to {}", output);
                }
            }
            Ok(true)
        }
    }
}
