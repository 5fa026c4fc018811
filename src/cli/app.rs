//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{build, generate};
use crate::storage::Project;

#[derive(Parser)]
#[command(name = "sfcpack")]
#[command(author, version, about = "Build pipeline for single-file component libraries")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new sfcpack project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Build the library into the output directory
    Build {
        /// Rebuild when sources change
        #[arg(long, short)]
        watch: bool,

        /// Library version embedded in the entry module
        #[arg(long, env = "PACKAGE_VERSION")]
        pkg_version: Option<String>,
    },

    /// Split single-file components into script and style files, in place
    Decompose {
        /// Component files to decompose
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the style dependency order of the components
    Sequence,

    /// Generate the library entry module
    Entry {
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Library version embedded in the entry module
        #[arg(long, env = "PACKAGE_VERSION")]
        pkg_version: Option<String>,
    },

    /// Generate the aggregated library stylesheet
    Style {
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    output.verbose("sfcpack starting");

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path));
            let project = Project::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Source directory: {}", project.src_dir().display()),
            );
            output.success(&format!(
                "Initialized sfcpack project at {}",
                project.root().display()
            ));
        }

        Commands::Build { watch, pkg_version } => {
            build::run(&output, watch, pkg_version.as_deref())?
        }

        Commands::Decompose { files } => generate::decompose(&output, &files)?,

        Commands::Sequence => generate::sequence(&output)?,

        Commands::Entry { output: path, pkg_version } => {
            generate::entry(&output, path.as_deref(), pkg_version.as_deref())?
        }

        Commands::Style { output: path } => generate::style(&output, path.as_deref())?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_build_flags() {
        let cli = Cli::try_parse_from(["sfcpack", "--format", "json", "build", "--watch", "--pkg-version", "2.0.0"])
            .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Build { watch, pkg_version } => {
                assert!(watch);
                assert_eq!(pkg_version.as_deref(), Some("2.0.0"));
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn decompose_requires_files() {
        assert!(Cli::try_parse_from(["sfcpack", "decompose"]).is_err());
    }
}
