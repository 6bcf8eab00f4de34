//! Optional external C preprocessor.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{display_path, AnnotationKind, ExtractError, Result};

/// The system C preprocessor plus user arguments.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    program: PathBuf,
    args: Vec<String>,
}

impl Preprocessor {
    /// Locate `cpp` on `PATH`.
    pub fn locate(args: Vec<String>) -> Result<Self> {
        let program = which::which("cpp").map_err(|e| ExtractError::Preprocessor {
            file: "cpp".to_string(),
            message: format!("cannot locate cpp: {}", e),
        })?;
        tracing::debug!("using preprocessor {}", program.display());
        Ok(Self { program, args })
    }

    /// Use an explicit preprocessor binary.
    pub fn with_program(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }

    /// `-D` definitions expanding the annotation macros to attributes.
    pub fn annotation_defines() -> Vec<String> {
        AnnotationKind::ALL
            .iter()
            .map(|kind| {
                format!("-D{}=__attribute__((miml({})))", kind.macro_name(), kind.name())
            })
            .collect()
    }

    /// Preprocess `header` and return the output text, line markers
    /// included.
    pub fn run(&self, header: &Path) -> Result<String> {
        let file = display_path(header);
        let output = Command::new(&self.program)
            .args(Self::annotation_defines())
            .args(&self.args)
            .arg(header)
            .output()
            .map_err(|source| ExtractError::Io { file: file.clone(), source })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Preprocessor { file, message: stderr.trim().to_string() });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
