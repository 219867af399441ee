use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use threatspec::config::Config;

mod cli;

#[derive(Parser)]
#[command(name = "threatspec")]
#[command(about = "Threat modeling as code - collect threat tags from source comments")]
#[command(version)]
struct Cli {
    /// Path to the repository (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    path: Option<PathBuf>,

    /// Path to the config file (defaults to .threatspec/config.toml in repo root)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan source files for tags and write the threat model document
    Parse {
        /// Files or directories to scan (defaults to the repository path)
        paths: Vec<PathBuf>,

        /// Project name (default: from config, or "default")
        #[arg(short, long)]
        project: Option<String>,

        /// Output file (default: PROJECT.threatspec.json)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Threat library documents to preload
        #[arg(short, long = "library")]
        library: Vec<PathBuf>,
    },

    /// Extract x-threatspec fields from OpenAPI documents
    Openapi {
        /// OpenAPI files (YAML or JSON)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Project name (default: from config, or "default")
        #[arg(short, long)]
        project: Option<String>,

        /// Output file (default: PROJECT.threatspec.json)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Validate threat model documents against the schema
    Validate {
        /// Documents to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// JSON schema file (default: built-in schema)
        #[arg(short = 'j', long)]
        schema: Option<PathBuf>,

        /// Relax the validation (-r ignores additionalProperties, -rr also required)
        #[arg(short, long, action = ArgAction::Count)]
        relax: u8,
    },

    /// Convert a project into the indexed threat model format
    Convert {
        /// Threat model document(s); several are merged first
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Project to convert (default: the only project, or from config)
        #[arg(short, long)]
        project: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Check cross references of indexed threat models
    Check {
        /// Indexed threat model files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Summarise threat coverage of one or more documents
    Report {
        /// Threat model documents (merged)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Show the threat hierarchy instead of coverage
        #[arg(long)]
        tree: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build a threat library from the MITRE CWE XML catalogue
    ImportCwe {
        /// CWE XML file
        file: PathBuf,

        /// Only import weaknesses of the Software Fault Pattern clusters, as a hierarchy
        #[arg(long)]
        sfp: bool,

        /// Output file (default: cwe_library.threatspec.json or sfp_library.threatspec.json)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Initialize a new .threatspec/config.toml configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    // Determine the working directory
    let work_dir = cli.path.unwrap_or_else(|| PathBuf::from("."));

    if let Commands::Init { force } = cli.command {
        return cli::init::init_command(&work_dir, cli.config, force).await;
    }

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_dir(&work_dir)?,
    };

    match cli.command {
        Commands::Parse {
            paths,
            project,
            out,
            library,
        } => {
            cli::parse::parse_command(&work_dir, &config, paths, project, out, library).await?;
        }
        Commands::Openapi { files, project, out } => {
            cli::openapi::openapi_command(&work_dir, &config, files, project, out)?;
        }
        Commands::Validate {
            files,
            schema,
            relax,
        } => {
            cli::validate::validate_command(&config, &files, schema, relax)?;
        }
        Commands::Convert {
            files,
            project,
            out,
        } => {
            cli::convert::convert_command(&config, &files, project, out)?;
        }
        Commands::Check { files } => {
            cli::check::check_command(&files)?;
        }
        Commands::Report { files, tree, json } => {
            cli::report::report_command(&files, tree, json)?;
        }
        Commands::ImportCwe { file, sfp, out } => {
            cli::import_cwe::import_cwe_command(&work_dir, &file, sfp, out)?;
        }
        Commands::Init { .. } => unreachable!("handled before loading config"),
    }

    Ok(())
}
