//! step-labeler: inspect, measure and name the faces of a STEP solid.
//!
//! Faces are numbered in kernel traversal order; the same numbers are used
//! by `faces`, `measure` and the feature map given to `export`.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=face_engine=info` - Per-document summaries
//! - `RUST_LOG=face_engine=debug,brep_kernel=debug` - Per-face detail
//!
//! # Example
//!
//! ```bash
//! step-labeler faces bracket.step --kind cylindrical
//! step-labeler measure bracket.step 4 9 --unit in
//! step-labeler export bracket.step --features names.json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use face_engine::{EngineConfig, LengthUnit};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod output;

use commands::{export, faces, info, measure, mesh};

/// step-labeler - Name the faces of a STEP solid.
///
/// Loads a STEP file, lists and measures its faces, and writes feature names
/// into the ADVANCED_FACE entities of a copy of the file.
#[derive(Parser)]
#[command(name = "step-labeler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Display lengths in this unit (mm, cm, m, in, ft, ...) instead of the file's own
    #[arg(long, global = true)]
    pub unit: Option<LengthUnit>,

    /// Maximum chordal deviation of the face meshes
    #[arg(long, global = true)]
    pub linear_deflection: Option<f64>,

    /// Maximum angle between adjacent mesh normals, in radians
    #[arg(long, global = true)]
    pub angular_deflection: Option<f64>,

    /// Skip edge polylines
    #[arg(long, global = true)]
    pub no_edges: bool,
}

impl Cli {
    /// Engine settings after applying the mesh flags.
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(linear) = self.linear_deflection {
            config.tessellation.linear_deflection = linear;
        }
        if let Some(angular) = self.angular_deflection {
            config.tessellation.angular_deflection = angular;
        }
        if self.no_edges {
            config.tessellation.include_edges = false;
        }
        config
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the face count, unit and STEP correspondence of a file
    Info {
        /// Input STEP file
        input: PathBuf,
    },

    /// List faces with their surface type and geometry
    Faces {
        /// Input STEP file
        input: PathBuf,

        /// Only list faces of this surface type (planar, cylindrical, ...)
        #[arg(long)]
        kind: Option<String>,
    },

    /// Write the indexed triangle mesh as JSON
    Mesh {
        /// Input STEP file
        input: PathBuf,

        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Measure one face (radius/diameter) or a pair (distance/angle)
    Measure {
        /// Input STEP file
        input: PathBuf,

        /// One or two face ids
        #[arg(required = true, num_args = 1..=2)]
        ids: Vec<u32>,
    },

    /// Write feature names into a copy of the file
    Export {
        /// Input STEP file
        input: PathBuf,

        /// JSON feature map: {"name": [{"face_id": 0, "sub_name": "top"}, ...]}
        #[arg(long)]
        features: PathBuf,

        /// Output STEP file (defaults to <stem>_named.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "face_engine=info,brep_kernel=info",
            2 => "face_engine=debug,brep_kernel=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Info { input } => info::run(input, &cli),
        Commands::Faces { input, kind } => faces::run(input, kind.as_deref(), &cli),
        Commands::Mesh { input, output } => mesh::run(input, output, &cli),
        Commands::Measure { input, ids } => measure::run(input, ids, &cli),
        Commands::Export {
            input,
            features,
            output,
        } => export::run(input, features, output.as_deref(), &cli),
    };

    if let Err(e) = &result {
        if !cli.quiet {
            eprintln!("{}: {}", "Error".red().bold(), e);
            for cause in e.chain().skip(1) {
                eprintln!("  {}: {}", "Caused by".yellow(), cause);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
