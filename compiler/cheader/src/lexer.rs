//! Token stream for C headers.
//!
//! This is not a full preprocessor: macros are not expanded and includes
//! are not followed. Comments are dropped, line continuations joined, and
//! conditional groups (`#if`, `#ifdef`, `#else`, ...) honoured against the
//! macros the header defines itself. GNU line markers (`# 12 "file.h"`), as
//! emitted by `cpp`, are followed so every token knows the file it came from.

use crate::conditional::Conditionals;
use crate::{ExtractError, Result};

/// Token kinds the declaration parser cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword.
    Ident(String),
    /// Single punctuation character.
    Punct(char),
    /// Numeric literal, kept as written.
    Number(String),
    /// String or character literal, kept as written.
    Literal(String),
}

/// A token with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What was read.
    pub kind: TokenKind,
    /// Index into [`TokenStream::files`].
    pub file: usize,
    /// 1-based line number.
    pub line: u32,
}

impl Token {
    /// The identifier text, if this is an identifier.
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this is the punctuation character `c`.
    pub fn is_punct(&self, c: char) -> bool { self.kind == TokenKind::Punct(c) }
}

/// Lexed header: tokens plus the table of originating files.
#[derive(Debug, Clone)]
pub struct TokenStream {
    /// Tokens in source order.
    pub tokens: Vec<Token>,
    /// File names referenced by [`Token::file`]; index 0 is the header itself.
    pub files: Vec<String>,
}

impl TokenStream {
    /// File name a token came from.
    pub fn file_of(&self, token: &Token) -> &str { &self.files[token.file] }
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
    file: usize,
    files: Vec<String>,
    tokens: Vec<Token>,
    at_line_start: bool,
    conditionals: Conditionals,
}

/// Tokenize `text`, attributing tokens to `path` until a line marker says
/// otherwise.
pub fn tokenize(path: &str, text: &str) -> Result<TokenStream> {
    let mut lexer = Lexer {
        chars: text.chars().peekable(),
        line: 1,
        file: 0,
        files: vec![path.to_string()],
        tokens: Vec::new(),
        at_line_start: true,
        conditionals: Conditionals::default(),
    };
    lexer.run()?;
    Ok(TokenStream { tokens: lexer.tokens, files: lexer.files })
}

impl Lexer<'_> {
    fn run(&mut self) -> Result<()> {
        while let Some(c) = self.chars.next() {
            match c {
                '\n' => {
                    self.line += 1;
                    self.at_line_start = true;
                }
                '\\' if self.chars.peek() == Some(&'\n') => {
                    self.chars.next();
                    self.line += 1;
                }
                c if c.is_whitespace() => {}
                '#' if self.at_line_start => self.directive()?,
                '/' if self.chars.peek() == Some(&'/') => self.skip_line(),
                '/' if self.chars.peek() == Some(&'*') => {
                    self.chars.next();
                    self.block_comment()?;
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let word = self.take_while(c, |c| c.is_ascii_alphanumeric() || c == '_');
                    self.push(TokenKind::Ident(word));
                }
                c if c.is_ascii_digit() => {
                    let number = self.take_while(c, |c| c.is_ascii_alphanumeric() || c == '.');
                    self.push(TokenKind::Number(number));
                }
                '"' | '\'' if !self.conditionals.active() => self.at_line_start = false,
                '"' | '\'' => {
                    let literal = self.literal(c)?;
                    self.push(TokenKind::Literal(literal));
                }
                c => self.push(TokenKind::Punct(c)),
            }
        }
        match self.conditionals.open_group() {
            Some(line) => Err(self.syntax(line, "unterminated conditional group")),
            None => Ok(()),
        }
    }

    fn push(&mut self, kind: TokenKind) {
        self.at_line_start = false;
        if !self.conditionals.active() {
            return;
        }
        self.tokens.push(Token { kind, file: self.file, line: self.line });
    }

    fn take_while(&mut self, first: char, keep: impl Fn(char) -> bool) -> String {
        let mut out = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if !keep(c) {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        out
    }

    fn skip_line(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.chars.next();
        }
    }

    fn block_comment(&mut self) -> Result<()> {
        let start = self.line;
        let mut prev = '\0';
        for c in self.chars.by_ref() {
            if c == '\n' {
                self.line += 1;
            }
            if prev == '*' && c == '/' {
                return Ok(());
            }
            prev = c;
        }
        Err(self.syntax(start, "unterminated comment"))
    }

    fn literal(&mut self, quote: char) -> Result<String> {
        let start = self.line;
        let mut out = String::from(quote);
        while let Some(c) = self.chars.next() {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = self.chars.next() {
                        out.push(escaped);
                    }
                }
                '\n' => break,
                c if c == quote => return Ok(out),
                _ => {}
            }
        }
        Err(self.syntax(start, "unterminated literal"))
    }

    /// Reads one directive, joining continuation lines, and applies it when
    /// it is a conditional, a macro definition or a line marker.
    fn directive(&mut self) -> Result<()> {
        let start = self.line;
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            match c {
                '\n' => break,
                '\\' => {
                    self.chars.next();
                    if self.chars.peek() == Some(&'\n') {
                        self.chars.next();
                        self.line += 1;
                    } else {
                        text.push('\\');
                    }
                }
                '/' => {
                    self.chars.next();
                    match self.chars.peek().copied() {
                        Some('/') => self.skip_line(),
                        Some('*') => {
                            self.chars.next();
                            self.block_comment()?;
                            text.push(' ');
                        }
                        _ => text.push('/'),
                    }
                }
                _ => {
                    text.push(c);
                    self.chars.next();
                }
            }
        }

        let handled = self
            .conditionals
            .apply(&text, start)
            .map_err(|message| self.syntax(start, &message))?;
        if handled || !self.conditionals.active() {
            return Ok(());
        }
        if let Some((line, file)) = parse_line_marker(&text) {
            // The marker names the line that follows it.
            self.line = line.saturating_sub(1);
            self.file = match self.files.iter().position(|f| *f == file) {
                Some(index) => index,
                None => {
                    self.files.push(file);
                    self.files.len() - 1
                }
            };
            tracing::trace!("line marker at {}: {}:{}", start, self.files[self.file], line);
        }
        Ok(())
    }

    fn syntax(&self, line: u32, message: &str) -> ExtractError {
        ExtractError::Syntax {
            file: self.files[self.file].clone(),
            line,
            message: message.to_string(),
        }
    }
}

/// Recognizes `# 12 "file"` and `#line 12 "file"`.
fn parse_line_marker(directive: &str) -> Option<(u32, String)> {
    let rest = directive.trim_start();
    let rest = rest.strip_prefix("line").unwrap_or(rest).trim_start();
    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let line = rest[..digits_end].parse().ok()?;
    let quoted = rest[digits_end..].trim_start().strip_prefix('"')?;
    let file = &quoted[..quoted.find('"')?];
    Some((line, file.to_string()))
}
