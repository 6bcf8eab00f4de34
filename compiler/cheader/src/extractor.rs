//! Signature extraction over a whole header.

use std::ops::Range;
use std::path::Path;

use crate::lexer::{tokenize, TokenStream};
use crate::parser::{parse_declaration, split_declarations};
use crate::{AnnotationKind, ExtractError, Preprocessor, Result, Signature};

/// Reads headers and yields their annotated signatures.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    preprocessor: Option<Preprocessor>,
}

impl Extractor {
    /// Scan headers directly, without preprocessing.
    pub fn builtin() -> Self { Self::default() }

    /// Run headers through `preprocessor` before scanning.
    pub fn with_preprocessor(preprocessor: Preprocessor) -> Self {
        Self { preprocessor: Some(preprocessor) }
    }

    /// Whether headers go through an external preprocessor.
    pub fn preprocesses(&self) -> bool { self.preprocessor.is_some() }

    /// Read `header` and return its annotated signatures.
    ///
    /// Lexing and declaration splitting happen up front, so syntax errors
    /// surface here; per-declaration errors are yielded by the iterator.
    pub fn signatures(&self, header: &str) -> Result<Signatures> {
        let text = match &self.preprocessor {
            Some(cpp) => cpp.run(Path::new(header))?,
            None => std::fs::read_to_string(header)
                .map_err(|source| ExtractError::Io { file: header.to_string(), source })?,
        };
        Self::signatures_from_str(header, &text)
    }

    /// Extract from header text already in memory.
    pub fn signatures_from_str(header: &str, text: &str) -> Result<Signatures> {
        let stream = tokenize(header, text)?;
        let decls = split_declarations(&stream)?;
        tracing::debug!("{}: {} top-level declarations", header, decls.len());
        Ok(Signatures { stream, decls: decls.into_iter() })
    }
}

/// Lazy sequence of annotated signatures from one header.
///
/// Each item is checked: annotated functions must return `void` and final
/// hooks must take no parameters.
#[derive(Debug)]
pub struct Signatures {
    stream: TokenStream,
    decls: std::vec::IntoIter<Range<usize>>,
}

impl Iterator for Signatures {
    type Item = Result<Signature>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let range = self.decls.next()?;
            match parse_declaration(&self.stream, range) {
                Ok(None) => continue,
                Ok(Some(signature)) => return Some(check(signature)),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn check(signature: Signature) -> Result<Signature> {
    if signature.return_type != "void" {
        return Err(ExtractError::ReturnType {
            file: signature.file,
            line: signature.line,
            kind: signature.kind,
            function: signature.name,
            found: signature.return_type,
        });
    }
    if signature.kind == AnnotationKind::Final && !signature.params.is_empty() {
        return Err(ExtractError::FinalArguments { file: signature.file, function: signature.name });
    }
    Ok(signature)
}
