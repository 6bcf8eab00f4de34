//! Top-level declaration splitting and annotated function parsing.
//!
//! Only the narrow subset of C that can carry a wiring annotation is
//! understood: `[specifiers] <return type> [annotation] name(params)`.
//! Everything else is split off at `;` / brace boundaries and ignored
//! unless it carries an annotation.

use std::ops::Range;

use crate::lexer::{Token, TokenKind, TokenStream};
use crate::{AnnotationKind, ExtractError, ExtractedParam, Result, Signature};

const ANNOTATION_MACROS: [(&str, AnnotationKind); 4] = [
    ("MIML_INIT", AnnotationKind::Init),
    ("MIML_FINAL", AnnotationKind::Final),
    ("MIML_SENDER", AnnotationKind::Sender),
    ("MIML_RECEIVER", AnnotationKind::Receiver),
];

/// Words that can only be part of a type, never a parameter name.
const TYPE_WORDS: [&str; 17] = [
    "void", "char", "short", "int", "long", "float", "double", "signed", "unsigned", "_Bool",
    "bool", "const", "volatile", "struct", "union", "enum", "register",
];

/// Words dropped from rendered types.
const DROPPED_QUALIFIERS: [&str; 5] = ["volatile", "restrict", "__restrict", "__restrict__", "register"];

/// Specifiers dropped from return types.
const FUNCTION_SPECIFIERS: [&str; 6] = ["extern", "static", "inline", "__inline", "__inline__", "_Noreturn"];

/// Split a token stream into top-level declarations.
///
/// Returns token index ranges, each without its terminating `;`. Function
/// definitions end at their body, which is skipped. `extern "C" { ... }`
/// blocks are transparent.
pub(crate) fn split_declarations(stream: &TokenStream) -> Result<Vec<Range<usize>>> {
    let tokens = &stream.tokens;
    let mut decls = Vec::new();
    let mut start = 0;
    let mut braces = 0usize;
    let mut parens = 0usize;
    let mut linkage_blocks = 0usize;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        match token.kind {
            TokenKind::Punct('(') => parens += 1,
            TokenKind::Punct(')') => {
                parens = parens
                    .checked_sub(1)
                    .ok_or_else(|| syntax(stream, token, "unbalanced `)`"))?;
            }
            TokenKind::Punct('{') if braces == 0 && parens == 0 => {
                if is_linkage_spec(&tokens[start..i]) {
                    linkage_blocks += 1;
                    start = i + 1;
                } else if i > start && tokens[i - 1].is_punct(')') {
                    decls.push(start..i);
                    i = matching_brace(stream, i)?;
                    start = i + 1;
                } else {
                    braces += 1;
                }
            }
            TokenKind::Punct('{') => braces += 1,
            TokenKind::Punct('}') => {
                if braces > 0 {
                    braces -= 1;
                } else if linkage_blocks > 0 && parens == 0 {
                    linkage_blocks -= 1;
                    start = i + 1;
                } else {
                    return Err(syntax(stream, token, "unbalanced `}`"));
                }
            }
            TokenKind::Punct(';') if braces == 0 && parens == 0 => {
                if i > start {
                    decls.push(start..i);
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    if braces > 0 || parens > 0 {
        let last = tokens.last().map(|t| t.line).unwrap_or(1);
        return Err(ExtractError::Syntax {
            file: stream.files[0].clone(),
            line: last,
            message: "unexpected end of file inside a declaration".to_string(),
        });
    }
    if start < tokens.len() {
        tracing::debug!(
            "{}: ignoring {} trailing tokens without `;`",
            stream.files[0],
            tokens.len() - start
        );
    }
    Ok(decls)
}

fn is_linkage_spec(tokens: &[Token]) -> bool {
    matches!(tokens, [extern_kw, Token { kind: TokenKind::Literal(_), .. }]
        if extern_kw.ident() == Some("extern"))
}

/// Index of the `}` closing the `{` at `open`.
fn matching_brace(stream: &TokenStream, open: usize) -> Result<usize> {
    let mut depth = 0usize;
    for (offset, token) in stream.tokens[open..].iter().enumerate() {
        if token.is_punct('{') {
            depth += 1;
        } else if token.is_punct('}') {
            depth -= 1;
            if depth == 0 {
                return Ok(open + offset);
            }
        }
    }
    Err(syntax(stream, &stream.tokens[open], "unterminated function body"))
}

/// Index one past the `)` closing the `(` at `open` within `tokens`.
fn group_end(tokens: &[&Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, token) in tokens[open..].iter().enumerate() {
        if token.is_punct('(') {
            depth += 1;
        } else if token.is_punct(')') {
            depth -= 1;
            if depth == 0 {
                return Some(open + offset + 1);
            }
        }
    }
    None
}

/// Split `tokens` at commas outside parentheses and brackets.
fn split_commas<'t>(tokens: &[&'t Token]) -> Vec<Vec<&'t Token>> {
    let mut parts = vec![Vec::new()];
    let mut depth = 0usize;
    for &token in tokens {
        match token.kind {
            TokenKind::Punct('(') | TokenKind::Punct('[') => depth += 1,
            TokenKind::Punct(')') | TokenKind::Punct(']') => depth = depth.saturating_sub(1),
            TokenKind::Punct(',') if depth == 0 => {
                parts.push(Vec::new());
                continue;
            }
            _ => {}
        }
        if let Some(part) = parts.last_mut() {
            part.push(token);
        }
    }
    parts
}

fn syntax(stream: &TokenStream, token: &Token, message: &str) -> ExtractError {
    ExtractError::Syntax {
        file: stream.file_of(token).to_string(),
        line: token.line,
        message: message.to_string(),
    }
}

/// Parse one declaration. Returns `Ok(None)` when it carries no annotation.
pub(crate) fn parse_declaration(
    stream: &TokenStream,
    range: Range<usize>,
) -> Result<Option<Signature>> {
    let tokens = &stream.tokens[range];
    let Some(first) = tokens.first() else {
        return Ok(None);
    };
    let file = stream.file_of(first).to_string();
    let line = first.line;

    let (cleaned, annotations) = strip_attributes(tokens).map_err(|message| {
        ExtractError::MalformedAnnotation { file: file.clone(), line, message }
    })?;
    let kind = match annotations.as_slice() {
        [] => return Ok(None),
        [kind] => *kind,
        _ => {
            return Err(ExtractError::MalformedAnnotation {
                file,
                line,
                message: "more than one miml annotation on one declaration".to_string(),
            })
        }
    };

    let unsupported = |function: &str, message: &str| ExtractError::UnsupportedDeclarator {
        file: file.clone(),
        line,
        function: function.to_string(),
        message: message.to_string(),
    };

    // The declarator name is the identifier in front of the first
    // top-level parameter list.
    let open = cleaned
        .iter()
        .position(|t| t.is_punct('('))
        .ok_or_else(|| unsupported("?", "annotated declaration is not a function"))?;
    let name = match open.checked_sub(1).and_then(|i| cleaned[i].ident()) {
        Some(name) if !TYPE_WORDS.contains(&name) => name.to_string(),
        _ => return Err(unsupported("?", "annotated declaration is not a simple function declarator")),
    };
    let close = group_end(&cleaned, open)
        .ok_or_else(|| unsupported(&name, "unterminated parameter list"))?;
    if close != cleaned.len() {
        return Err(unsupported(&name, "unexpected tokens after the parameter list"));
    }

    let return_tokens: Vec<&Token> = cleaned[..open - 1]
        .iter()
        .copied()
        .filter(|t| !t.ident().is_some_and(|w| FUNCTION_SPECIFIERS.contains(&w)))
        .collect();
    let return_type = render_type(&return_tokens).0;

    let param_tokens = &cleaned[open + 1..close - 1];
    let params = parse_params(param_tokens).map_err(|message| unsupported(&name, &message))?;

    Ok(Some(Signature { name, return_type, params, kind, file, line }))
}

/// Removes `__attribute__((...))`, `__asm__(...)` and annotation macros,
/// returning the remaining tokens and the annotations found.
fn strip_attributes(
    tokens: &[Token],
) -> std::result::Result<(Vec<&Token>, Vec<AnnotationKind>), String> {
    let all: Vec<&Token> = tokens.iter().collect();
    let mut cleaned = Vec::with_capacity(all.len());
    let mut annotations = Vec::new();
    let mut i = 0;

    while i < all.len() {
        let token = all[i];
        match token.ident() {
            Some(word) if ANNOTATION_MACROS.iter().any(|(m, _)| *m == word) => {
                if let Some((_, kind)) = ANNOTATION_MACROS.iter().find(|(m, _)| *m == word) {
                    annotations.push(*kind);
                }
                i += 1;
            }
            Some("__attribute__" | "__attribute") => {
                let open = i + 1;
                let shaped = all.get(open).is_some_and(|t| t.is_punct('('))
                    && all.get(open + 1).is_some_and(|t| t.is_punct('('));
                if !shaped {
                    return Err("expected `((` after __attribute__".to_string());
                }
                let end = group_end(&all, open).ok_or("unterminated __attribute__")?;
                let inner = &all[open + 2..end.saturating_sub(2).max(open + 2)];
                for item in split_commas(inner) {
                    if let Some(kind) = miml_attribute(&item)? {
                        annotations.push(kind);
                    }
                }
                i = end;
            }
            Some("__asm__" | "__asm" | "asm") if all.get(i + 1).is_some_and(|t| t.is_punct('(')) => {
                i = group_end(&all, i + 1).ok_or("unterminated asm label")?;
            }
            Some("__extension__") => i += 1,
            _ => {
                cleaned.push(token);
                i += 1;
            }
        }
    }
    Ok((cleaned, annotations))
}

/// Decodes one attribute item; `Ok(None)` for attributes other than `miml`.
fn miml_attribute(item: &[&Token]) -> std::result::Result<Option<AnnotationKind>, String> {
    if item.first().and_then(|t| t.ident()) != Some("miml") {
        return Ok(None);
    }
    match item {
        [_, open, kind, close] if open.is_punct('(') && close.is_punct(')') => kind
            .ident()
            .and_then(AnnotationKind::from_name)
            .map(Some)
            .ok_or_else(|| {
                "miml annotation expects one of init, final, sender, receiver".to_string()
            }),
        _ => Err("miml annotation expects exactly one argument".to_string()),
    }
}

fn parse_params(tokens: &[&Token]) -> std::result::Result<Vec<ExtractedParam>, String> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    if let [only] = tokens {
        if only.ident() == Some("void") {
            return Ok(Vec::new());
        }
    }

    split_commas(tokens)
        .into_iter()
        .map(|param| {
            if param.is_empty() {
                return Err("empty parameter".to_string());
            }
            if param.iter().any(|t| t.is_punct('.')) {
                return Err("variadic parameters are not supported".to_string());
            }
            if param.iter().any(|t| t.is_punct('(')) {
                return Err("function pointer parameters are not supported".to_string());
            }
            let (ctype, name) = render_type(&param);
            Ok(ExtractedParam { ctype, name })
        })
        .collect()
}

/// Render a type from its tokens.
///
/// Qualifiers other than `const` are dropped, `const` is moved to the
/// front, and any number of pointer or array declarators collapse into a
/// single trailing ` *`. Returns the rendered type and the declared name,
/// when the tokens end in one.
fn render_type(tokens: &[&Token]) -> (String, Option<String>) {
    let mut words: Vec<&str> = Vec::new();
    let mut pointer = false;
    let mut brackets = 0usize;

    for token in tokens {
        match &token.kind {
            TokenKind::Punct('*') => pointer = true,
            TokenKind::Punct('[') => {
                pointer = true;
                brackets += 1;
            }
            TokenKind::Punct(']') => brackets = brackets.saturating_sub(1),
            TokenKind::Ident(word) if brackets == 0 => {
                if !DROPPED_QUALIFIERS.contains(&word.as_str()) {
                    words.push(word);
                }
            }
            _ => {}
        }
    }

    let name = match words.split_last() {
        Some((last, rest))
            if !TYPE_WORDS.contains(last)
                && rest.iter().any(|w| !matches!(*w, "const" | "volatile"))
                && !matches!(rest.last(), Some(&"struct" | &"union" | &"enum")) =>
        {
            let name = last.to_string();
            words.pop();
            Some(name)
        }
        _ => None,
    };

    let is_const = words.contains(&"const");
    let mut rendered: Vec<&str> = Vec::with_capacity(words.len() + 2);
    if is_const {
        rendered.push("const");
    }
    rendered.extend(words.iter().copied().filter(|w| *w != "const"));
    if pointer {
        rendered.push("*");
    }
    (rendered.join(" "), name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn param(src: &str) -> (String, Option<String>) {
        let stream = tokenize("t.h", src).expect("lex");
        let refs: Vec<&Token> = stream.tokens.iter().collect();
        render_type(&refs)
    }

    #[test]
    fn test_render_param_types() {
        assert_eq!(param("int"), ("int".into(), None));
        assert_eq!(param("int count"), ("int".into(), Some("count".into())));
        assert_eq!(param("ADISMessage *"), ("ADISMessage *".into(), None));
        assert_eq!(param("unsigned char *"), ("unsigned char *".into(), None));
        assert_eq!(param("unsigned int length"), ("unsigned int".into(), Some("length".into())));
        assert_eq!(param("char * argv[]"), ("char *".into(), Some("argv".into())));
        assert_eq!(param("char ** argv"), ("char *".into(), Some("argv".into())));
        assert_eq!(param("const Foo"), ("const Foo".into(), None));
        assert_eq!(param("char const * restrict p"), ("const char *".into(), Some("p".into())));
        assert_eq!(param("struct foo"), ("struct foo".into(), None));
        assert_eq!(param("struct foo *f"), ("struct foo *".into(), Some("f".into())));
        assert_eq!(param("int buf[16]"), ("int *".into(), Some("buf".into())));
    }

    #[test]
    fn test_split_skips_bodies_and_linkage_blocks() {
        let src = r#"
            typedef struct { int number; } ADISMessage;
            extern "C" {
            void MIML_SENDER adis_out(ADISMessage *);
            }
            static inline int helper(int x) { if (x) { return 1; } return 0; }
            void MIML_INIT adis_init(void);
        "#;
        let stream = tokenize("adis.h", src).expect("lex");
        let decls = split_declarations(&stream).expect("split");
        let names: Vec<String> = decls
            .into_iter()
            .filter_map(|r| parse_declaration(&stream, r).expect("parse"))
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["adis_out", "adis_init"]);
    }

    #[test]
    fn test_unbalanced_braces_are_syntax_errors() {
        let stream = tokenize("bad.h", "void f(void) ;\n}\n").expect("lex");
        assert!(matches!(split_declarations(&stream), Err(ExtractError::Syntax { line: 2, .. })));

        let stream = tokenize("bad.h", "struct s { int a;\n").expect("lex");
        assert!(matches!(split_declarations(&stream), Err(ExtractError::Syntax { .. })));
    }

    #[test]
    fn test_attribute_forms() {
        let src = "void __attribute__((miml(receiver), unused)) rx(int a) __attribute__((nonnull));";
        let stream = tokenize("a.h", src).expect("lex");
        let range = split_declarations(&stream).expect("split").remove(0);
        let sig = parse_declaration(&stream, range).expect("parse").expect("annotated");
        assert_eq!(sig.kind, AnnotationKind::Receiver);
        assert_eq!(sig.name, "rx");
        assert_eq!(sig.params.len(), 1);
    }

    #[test]
    fn test_unknown_miml_kind_is_malformed() {
        let src = "void __attribute__((miml(sideways))) f(void);";
        let stream = tokenize("a.h", src).expect("lex");
        let range = split_declarations(&stream).expect("split").remove(0);
        assert!(matches!(
            parse_declaration(&stream, range),
            Err(ExtractError::MalformedAnnotation { .. })
        ));
    }

    #[test]
    fn test_function_pointer_params_are_unsupported() {
        let src = "void MIML_RECEIVER on(void (*cb)(int));";
        let stream = tokenize("a.h", src).expect("lex");
        let range = split_declarations(&stream).expect("split").remove(0);
        match parse_declaration(&stream, range) {
            Err(ExtractError::UnsupportedDeclarator { function, .. }) => assert_eq!(function, "on"),
            other => panic!("Expected UnsupportedDeclarator, got {:?}", other),
        }
    }
}
