//! Conditional inclusion for the built-in scanner.
//!
//! Tracks `#if`/`#ifdef`/`#ifndef`/`#elif`/`#else`/`#endif` nesting and
//! evaluates `#if` expressions against the object-like macros the header
//! has defined so far. Unknown identifiers evaluate to 0, as in C.

use std::collections::HashMap;

/// One open `#if` group.
#[derive(Debug, Clone)]
struct Group {
    /// Whether the enclosing text is live.
    parent_active: bool,
    /// Whether the current branch is live.
    taking: bool,
    /// Whether some branch of this group has been live.
    taken: bool,
    /// Whether `#else` was seen.
    seen_else: bool,
    /// Line of the opening directive.
    line: u32,
}

/// Nesting state plus the macro table.
#[derive(Debug, Clone, Default)]
pub(crate) struct Conditionals {
    groups: Vec<Group>,
    macros: HashMap<String, String>,
}

impl Conditionals {
    /// Whether text at the current position is live.
    pub(crate) fn active(&self) -> bool {
        self.groups.last().map_or(true, |g| g.parent_active && g.taking)
    }

    /// Line of the innermost unterminated group, if any.
    pub(crate) fn open_group(&self) -> Option<u32> { self.groups.last().map(|g| g.line) }

    /// Apply one directive (the text after `#`). Returns `Ok(true)` when the
    /// directive was a conditional or macro definition and has been handled.
    pub(crate) fn apply(&mut self, directive: &str, line: u32) -> Result<bool, String> {
        let text = directive.trim();
        let name_end = text.find(|c: char| !is_ident_char(c)).unwrap_or(text.len());
        let (name, rest) = (&text[..name_end], text[name_end..].trim());

        match name {
            "if" => {
                let cond = self.active() && self.evaluate(rest)?;
                self.open(cond, line);
            }
            "ifdef" | "ifndef" => {
                let macro_name =
                    first_word(rest).ok_or_else(|| format!("#{} without a macro name", name))?;
                let defined = self.macros.contains_key(macro_name);
                self.open(self.active() && defined == (name == "ifdef"), line);
            }
            "elif" => {
                let group = self.innermost(name)?;
                if group.seen_else {
                    return Err("#elif after #else".to_string());
                }
                let skip = group.taken || !group.parent_active;
                let cond = !skip && self.evaluate(rest)?;
                let group = self.innermost_mut(name)?;
                group.taking = cond;
                group.taken |= cond;
            }
            "else" => {
                let group = self.innermost_mut(name)?;
                if group.seen_else {
                    return Err("#else after #else".to_string());
                }
                group.taking = !group.taken;
                group.taken = true;
                group.seen_else = true;
            }
            "endif" => {
                self.groups.pop().ok_or_else(|| "#endif without #if".to_string())?;
            }
            "define" if self.active() => {
                let macro_name =
                    first_word(rest).ok_or_else(|| "#define without a macro name".to_string())?;
                let value = rest[macro_name.len()..].trim_start();
                // Function-like macros never take part in `#if` arithmetic.
                let value = if value.starts_with('(') { "" } else { value };
                self.macros.insert(macro_name.to_string(), value.trim().to_string());
            }
            "undef" if self.active() => {
                if let Some(macro_name) = first_word(rest) {
                    self.macros.remove(macro_name);
                }
            }
            "define" | "undef" => {}
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn open(&mut self, cond: bool, line: u32) {
        let parent_active = self.active();
        self.groups.push(Group { parent_active, taking: cond, taken: cond, seen_else: false, line });
    }

    fn innermost(&self, directive: &str) -> Result<&Group, String> {
        self.groups.last().ok_or_else(|| format!("#{} without #if", directive))
    }

    fn innermost_mut(&mut self, directive: &str) -> Result<&mut Group, String> {
        self.groups.last_mut().ok_or_else(|| format!("#{} without #if", directive))
    }

    fn evaluate(&self, expr: &str) -> Result<bool, String> {
        let tokens = lex_expr(expr)?;
        let mut parser = ExprParser { tokens: &tokens, pos: 0, macros: &self.macros };
        let value = parser.or()?;
        if parser.pos != tokens.len() {
            return Err(format!("cannot evaluate #if expression '{}'", expr));
        }
        Ok(value != 0)
    }
}

fn is_ident_char(c: char) -> bool { c.is_ascii_alphanumeric() || c == '_' }

fn first_word(text: &str) -> Option<&str> {
    let end = text.find(|c: char| !is_ident_char(c)).unwrap_or(text.len());
    (end > 0).then(|| &text[..end])
}

/// Parse a C integer literal, ignoring `u`/`l` suffixes.
fn parse_int(text: &str) -> Option<i64> {
    let digits = text.trim_end_matches(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L'));
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()
    } else {
        digits.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ExprToken {
    Number(i64),
    Ident(String),
    Op(&'static str),
}

const OPERATORS: [&str; 15] =
    ["&&", "||", "==", "!=", "<=", ">=", "<", ">", "!", "(", ")", "+", "-", "*", "/"];

fn lex_expr(expr: &str) -> Result<Vec<ExprToken>, String> {
    let mut tokens = Vec::new();
    let mut rest = expr.trim_start();
    while !rest.is_empty() {
        let Some(c) = rest.chars().next() else { break };
        if is_ident_char(c) {
            let end = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
            let word = &rest[..end];
            if c.is_ascii_digit() {
                let value =
                    parse_int(word).ok_or_else(|| format!("bad number '{}' in #if", word))?;
                tokens.push(ExprToken::Number(value));
            } else {
                tokens.push(ExprToken::Ident(word.to_string()));
            }
            rest = &rest[end..];
        } else if let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            tokens.push(ExprToken::Op(*op));
            rest = &rest[op.len()..];
        } else {
            return Err(format!("cannot evaluate #if expression '{}'", expr));
        }
        rest = rest.trim_start();
    }
    Ok(tokens)
}

struct ExprParser<'a> {
    tokens: &'a [ExprToken],
    pos: usize,
    macros: &'a HashMap<String, String>,
}

impl ExprParser<'_> {
    fn eat(&mut self, op: &str) -> bool {
        if matches!(self.tokens.get(self.pos), Some(ExprToken::Op(found)) if *found == op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<i64, String> {
        let mut value = self.and()?;
        while self.eat("||") {
            let rhs = self.and()?;
            value = i64::from(value != 0 || rhs != 0);
        }
        Ok(value)
    }

    fn and(&mut self) -> Result<i64, String> {
        let mut value = self.comparison()?;
        while self.eat("&&") {
            let rhs = self.comparison()?;
            value = i64::from(value != 0 && rhs != 0);
        }
        Ok(value)
    }

    fn comparison(&mut self) -> Result<i64, String> {
        let mut value = self.additive()?;
        loop {
            let op = ["==", "!=", "<=", ">=", "<", ">"].into_iter().find(|op| self.eat(op));
            let Some(op) = op else { return Ok(value) };
            let rhs = self.additive()?;
            value = i64::from(match op {
                "==" => value == rhs,
                "!=" => value != rhs,
                "<=" => value <= rhs,
                ">=" => value >= rhs,
                "<" => value < rhs,
                _ => value > rhs,
            });
        }
    }

    fn additive(&mut self) -> Result<i64, String> {
        let mut value = self.multiplicative()?;
        loop {
            if self.eat("+") {
                value = value.wrapping_add(self.multiplicative()?);
            } else if self.eat("-") {
                value = value.wrapping_sub(self.multiplicative()?);
            } else {
                return Ok(value);
            }
        }
    }

    fn multiplicative(&mut self) -> Result<i64, String> {
        let mut value = self.unary()?;
        loop {
            if self.eat("*") {
                value = value.wrapping_mul(self.unary()?);
            } else if self.eat("/") {
                let rhs = self.unary()?;
                value = value.checked_div(rhs).ok_or("division by zero in #if")?;
            } else {
                return Ok(value);
            }
        }
    }

    fn unary(&mut self) -> Result<i64, String> {
        if self.eat("!") {
            return Ok(i64::from(self.unary()? == 0));
        }
        if self.eat("-") {
            return Ok(self.unary()?.wrapping_neg());
        }
        if self.eat("+") {
            return self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<i64, String> {
        let token = self.tokens.get(self.pos).cloned().ok_or("truncated #if expression")?;
        self.pos += 1;
        match token {
            ExprToken::Number(value) => Ok(value),
            ExprToken::Ident(word) if word == "defined" => {
                let parens = self.eat("(");
                let name = match self.tokens.get(self.pos) {
                    Some(ExprToken::Ident(name)) => name.clone(),
                    _ => return Err("defined without a macro name".to_string()),
                };
                self.pos += 1;
                if parens && !self.eat(")") {
                    return Err("missing ')' after defined".to_string());
                }
                Ok(i64::from(self.macros.contains_key(&name)))
            }
            ExprToken::Ident(word) => {
                Ok(self.macros.get(&word).and_then(|value| parse_int(value)).unwrap_or(0))
            }
            ExprToken::Op("(") => {
                let value = self.or()?;
                if !self.eat(")") {
                    return Err("missing ')' in #if expression".to_string());
                }
                Ok(value)
            }
            ExprToken::Op(op) => Err(format!("unexpected '{}' in #if expression", op)),
        }
    }
}
