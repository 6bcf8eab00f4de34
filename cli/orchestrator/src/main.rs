//! `mimlc`: compile a MIML wiring document into C glue code.
//!
//! Loads the tool configuration, runs the expand, validate and generate
//! stages, and writes the selected artifacts only when every stage passed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use codegen_backend::Regeneration;
use config::Config;
use miml_cli::{Result, Selection};
use pipeline::{compile_with, write_artifacts};

/// Command-line interface for mimlc.
#[derive(Parser, Debug)]
#[command(name = "mimlc", about = "Wiring compiler for event-driven C modules", version)]
struct Cli {
    /// Generate the C source
    #[arg(short = 'c', long)]
    code: bool,
    /// Generate the companion header
    #[arg(short = 'H', long)]
    header: bool,
    /// Generate the Makefile fragment
    #[arg(short = 'm', long)]
    make: bool,
    /// Generate the Graphviz wiring graph
    #[arg(short = 'd', long)]
    dot: bool,
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
    /// Configuration file (default: ./cg.toml, then the user config)
    #[arg(short = 'g', long = "config")]
    config: Option<PathBuf>,
    /// Directory the artifacts are written to
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    output_dir: PathBuf,
    /// Print the expanded module table (yaml or json)
    #[arg(
        long,
        value_enum,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "yaml"
    )]
    dump_modules: Option<DumpFormat>,
    /// Top-level wiring document
    miml: PathBuf,
}

/// Serialization used by `--dump-modules`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DumpFormat {
    Yaml,
    Json,
}

impl Cli {
    fn selection(&self) -> Selection {
        Selection { code: self.code, header: self.header, make: self.make, dot: self.dot }
    }

    /// Settings `make` must pass back when it reruns mimlc.
    fn regeneration(&self) -> Regeneration {
        Regeneration {
            config_file: self.config.as_ref().map(|p| p.display().to_string()),
            output_dir: (self.output_dir != Path::new("."))
                .then(|| self.output_dir.display().to_string()),
        }
    }
}

/// Main entry point for mimlc.
fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("mimlc: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the pipeline; `Ok(false)` means diagnostics were reported.
fn run(cli: &Cli) -> Result<bool> {
    let config = Config::load_or_default(cli.config.as_deref())?;
    let level = if cli.verbose > 0 {
        logging::level_for_verbosity(cli.verbose)
    } else {
        logging::level_from_name(&config.logging.level)
    };
    logging::init(level);

    let artifacts = cli.selection().artifacts();
    tracing::info!("compiling {} ({:?})", cli.miml.display(), artifacts);
    let report = compile_with(&cli.miml, &config, &artifacts, cli.regeneration())?;

    if let (Some(format), Some(modules)) = (cli.dump_modules, report.tree.modules()) {
        match format {
            DumpFormat::Yaml => print!("{}", modules.to_yaml()?),
            DumpFormat::Json => println!("{}", modules.to_json_pretty()?),
        }
    }

    if !report.succeeded() {
        return Ok(false);
    }

    let Some(output) = report.output.as_ref() else { return Ok(true) };
    let names = report.tree.filenames().cloned().unwrap_or_default();
    std::fs::create_dir_all(&cli.output_dir)?;
    write_artifacts(output, &names, &cli.output_dir)?;
    Ok(true)
}
