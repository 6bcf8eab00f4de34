//! Glue between the driver and the outside world: loading the wiring
//! document, choosing an extractor, and persisting generated artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use cheader::{Extractor, Preprocessor};
use codegen_backend::{Artifact, LayeredOutput, Regeneration};
use config::Config;
use ir::{DocumentTree, OutputNames, Section};

use crate::{Driver, GenerationStage, Result, RunReport};

/// Load the wiring document at `path` and echo the tool configuration
/// into it. Keys the document sets itself take precedence.
pub fn load_document(path: &Path, config: &Config) -> Result<DocumentTree> {
    let mut tree = DocumentTree::from_file(path)?;
    config.apply_to(&mut tree);
    tree.insert(Section::MainMiml(path.display().to_string()));
    Ok(tree)
}

/// The header extractor the configuration asks for.
pub fn extractor_for(config: &Config) -> Result<Extractor> {
    match &config.cpp {
        Some(args) => Ok(Extractor::with_preprocessor(Preprocessor::locate(args.clone())?)),
        None => Ok(Extractor::builtin()),
    }
}

/// Load, expand, validate and generate `artifacts` for the document at
/// `path`. Nothing is written.
pub fn compile(path: &Path, config: &Config, artifacts: &[Artifact]) -> Result<RunReport> {
    compile_with(path, config, artifacts, Regeneration::default())
}

/// Like [`compile`], with the command-line settings the generated Makefile
/// rule should repeat.
pub fn compile_with(
    path: &Path,
    config: &Config,
    artifacts: &[Artifact],
    regeneration: Regeneration,
) -> Result<RunReport> {
    let tree = load_document(path, config)?;
    let generation = GenerationStage::new(artifacts).with_regeneration(regeneration);
    let driver = Driver::standard_with(extractor_for(config)?, generation)?;
    driver.run(tree)
}

/// Write every artifact in `output` under `dir`, returning the paths
/// written in artifact order.
pub fn write_artifacts(
    output: &LayeredOutput,
    names: &OutputNames,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for artifact in output.artifacts() {
        let Some(contents) = output.render(artifact) else { continue };
        let target = dir.join(artifact.file_name(names));
        fs::write(&target, contents)?;
        tracing::info!("wrote {}", target.display());
        written.push(target);
    }
    Ok(written)
}
