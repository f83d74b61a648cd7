//! Infix formula parser, building nodes in a [`Context`]
//!
//! The parser is a Pratt (precedence-climbing) parser over a flat token list.
//! Implicit multiplication is inserted by the lexer, so `2x`, `3(x + 1)` and
//! `(x + 1)(x - 1)` all parse as products.
//!
//! ```
//! # use formgraph::context::{Context, parse::parse};
//! # use std::collections::BTreeMap;
//! let mut ctx = Context::new();
//! let n = parse(&mut ctx, "2x^2 + 1", |v| v == "x").unwrap();
//! let vars = BTreeMap::from([("x".to_owned(), 3.0)]);
//! assert_eq!(ctx.eval(n, &vars).unwrap(), 19.0);
//! ```
use super::{BinaryOpcode, Context, Node, UnaryOpcode};
use crate::Error;

use std::collections::BTreeSet;

/// Built-in variables, matched case-insensitively
pub const BUILTIN_VARS: [&str; 4] = ["x", "y", "z", "t"];

/// Named constants, matched exactly
pub const CONSTANTS: [(&str, f64); 2] =
    [("pi", std::f64::consts::PI), ("e", std::f64::consts::E)];

/// Returns the value of a named constant, if `name` is one
pub fn constant_value(name: &str) -> Option<f64> {
    CONSTANTS.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
}

/// Maps `X`, `Y`, `Z`, `T` to their lower-case forms; other names are
/// returned unchanged
pub fn normalize(name: &str) -> &str {
    BUILTIN_VARS
        .iter()
        .find(|v| v.eq_ignore_ascii_case(name))
        .copied()
        .unwrap_or(name)
}

/// Checks whether `name` is a valid identifier
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

impl Token {
    fn starts_operand(&self) -> bool {
        matches!(self, Token::Number(_) | Token::Ident(_) | Token::LParen)
    }
}

#[derive(Clone, Debug)]
struct Lexeme {
    token: Token,
    offset: usize,
    text: String,
}

impl Lexeme {
    fn unexpected(&self) -> Error {
        Error::UnexpectedToken {
            got: self.text.clone(),
            offset: self.offset,
        }
    }
}

/// Splits `text` into tokens, inserting implicit multiplication
fn lex(text: &str) -> Result<Vec<Lexeme>, Error> {
    let bytes = text.as_bytes();
    let mut out: Vec<Lexeme> = vec![];
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        let token = if c.is_ascii_digit() || c == '.' {
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.')
            {
                i += 1;
            }
            // Only consume an exponent if digits follow, so that `2e` is
            // still `2 * e`
            if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                let mut j = i + 1;
                if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                    j += 1;
                }
                if j < bytes.len() && bytes[j].is_ascii_digit() {
                    i = j;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let s = &text[start..i];
            Token::Number(
                s.parse::<f64>()
                    .map_err(|_| Error::BadNumber(s.to_owned()))?,
            )
        } else if c.is_ascii_alphabetic() || c == '_' {
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
            {
                i += 1;
            }
            Token::Ident(text[start..i].to_owned())
        } else {
            i += 1;
            match c {
                '+' | '-' | '*' | '/' | '%' | '^' => Token::Op(c),
                '(' => Token::LParen,
                ')' => Token::RParen,
                ',' => Token::Comma,
                _ => {
                    let end = text[start..]
                        .char_indices()
                        .nth(1)
                        .map(|(k, _)| start + k)
                        .unwrap_or(text.len());
                    return Err(Error::UnexpectedToken {
                        got: text[start..end].to_owned(),
                        offset: start,
                    });
                }
            }
        };

        if let Some(prev) = out.last() {
            if implicit_mul(&prev.token, &token) {
                out.push(Lexeme {
                    token: Token::Op('*'),
                    offset: start,
                    text: String::new(),
                });
            }
        }
        out.push(Lexeme {
            token,
            offset: start,
            text: text[start..i].to_owned(),
        });
    }
    Ok(out)
}

/// Decides whether a `*` belongs between two adjacent tokens
fn implicit_mul(prev: &Token, next: &Token) -> bool {
    match prev {
        Token::Number(_) | Token::RParen => next.starts_operand(),
        // `sin(x)` is a call, `x(x + 1)` is a product
        Token::Ident(name) => {
            *next == Token::LParen && !super::is_function_name(name)
        }
        _ => false,
    }
}

/// Returns every identifier in `text`, with built-in variable names
/// lower-cased
///
/// Unlike [`parse`], this never fails: characters that cannot start a token
/// are skipped.
/// ```
/// # use formgraph::context::parse::identifiers;
/// let ids = identifiers("max(X, 2y) + $");
/// assert!(ids.contains("max"));
/// assert!(ids.contains("x"));
/// assert!(ids.contains("y"));
/// ```
pub fn identifiers(text: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() || bytes[i] == b'.' {
            // Skip numbers (including exponents) so `1e5` is not an `e`
            while i < bytes.len()
                && (bytes[i].is_ascii_digit() || bytes[i] == b'.')
            {
                i += 1;
            }
            if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                let mut j = i + 1;
                if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                    j += 1;
                }
                if j < bytes.len() && bytes[j].is_ascii_digit() {
                    i = j;
                }
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
            }
        } else if bytes[i].is_ascii_alphabetic() || bytes[i] == b'_' {
            let start = i;
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
            {
                i += 1;
            }
            out.insert(normalize(&text[start..i]).to_owned());
        } else {
            i += 1;
        }
    }
    out
}

////////////////////////////////////////////////////////////////////////////////

// Binding powers
const PREC_ADD: u8 = 10;
const PREC_MUL: u8 = 20;
const PREC_NEG: u8 = 25;
const PREC_POW: u8 = 30;

/// Maximum nesting of parentheses, signs, and right-associative operators
pub const MAX_DEPTH: usize = 256;

struct Parser<'a, F> {
    tokens: Vec<Lexeme>,
    pos: usize,
    depth: usize,
    ctx: &'a mut Context,
    is_var: F,
}

impl<F: Fn(&str) -> bool> Parser<'_, F> {
    fn peek(&self) -> Option<&Lexeme> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Lexeme, Error> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t.ok_or(Error::UnexpectedEnd)
    }

    fn expect(&mut self, token: Token) -> Result<(), Error> {
        let t = self.next()?;
        if t.token == token {
            Ok(())
        } else {
            Err(t.unexpected())
        }
    }

    fn parse_expr(&mut self, min_prec: u8) -> Result<Node, Error> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let out = self.parse_binary(min_prec);
        self.depth -= 1;
        out
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Node, Error> {
        let mut lhs = self.parse_prefix()?;
        while let Some(Lexeme {
            token: Token::Op(c),
            ..
        }) = self.peek()
        {
            let c = *c;
            let (prec, right_assoc) = match c {
                '+' | '-' => (PREC_ADD, false),
                '*' | '/' | '%' => (PREC_MUL, false),
                '^' => (PREC_POW, true),
                _ => unreachable!("lexer only emits known operators"),
            };
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            let rhs =
                self.parse_expr(if right_assoc { prec } else { prec + 1 })?;
            lhs = match c {
                '+' => self.ctx.add(lhs, rhs)?,
                '-' => self.ctx.sub(lhs, rhs)?,
                '*' => self.ctx.mul(lhs, rhs)?,
                '/' => self.ctx.div(lhs, rhs)?,
                '%' => self.ctx.binary(lhs, rhs, BinaryOpcode::Mod)?,
                _ => self.ctx.pow(lhs, rhs)?,
            };
        }
        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Node, Error> {
        let t = self.next()?;
        match &t.token {
            Token::Number(v) => Ok(self.ctx.constant(*v)),
            Token::Op('-') => {
                let a = self.parse_expr(PREC_NEG)?;
                self.ctx.neg(a)
            }
            Token::Op('+') => self.parse_expr(PREC_NEG),
            Token::LParen => {
                let a = self.parse_expr(0)?;
                self.expect(Token::RParen)?;
                Ok(a)
            }
            Token::Ident(name) => self.parse_ident(name, &t),
            _ => Err(t.unexpected()),
        }
    }

    fn parse_ident(&mut self, name: &str, t: &Lexeme) -> Result<Node, Error> {
        if super::is_function_name(name) {
            match self.peek() {
                Some(Lexeme {
                    token: Token::LParen,
                    ..
                }) => {
                    self.pos += 1;
                }
                Some(next) => return Err(next.unexpected()),
                None => return Err(Error::UnexpectedEnd),
            }
            let args = self.parse_args()?;
            return self.call(name, args);
        }
        if let Some(v) = constant_value(name) {
            return Ok(self.ctx.constant(v));
        }
        let name = normalize(name);
        if (self.is_var)(name) {
            Ok(self.ctx.var(name))
        } else if matches!(
            self.peek(),
            Some(Lexeme {
                token: Token::Op('*'),
                text,
                ..
            }) if text.is_empty()
        ) {
            // An unknown name directly followed by `(` reads as a call
            Err(Error::UnknownFunction(t.text.clone()))
        } else {
            Err(Error::UnknownVariable(name.to_owned()))
        }
    }

    /// Parses a parenthesized argument list, after the opening `(`
    fn parse_args(&mut self) -> Result<Vec<Node>, Error> {
        let mut args = vec![];
        if let Some(Lexeme {
            token: Token::RParen,
            ..
        }) = self.peek()
        {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr(0)?);
            let t = self.next()?;
            match t.token {
                Token::Comma => continue,
                Token::RParen => break,
                _ => return Err(t.unexpected()),
            }
        }
        Ok(args)
    }

    fn call(&mut self, name: &str, args: Vec<Node>) -> Result<Node, Error> {
        if let Some(op) = UnaryOpcode::from_name(name) {
            match args.as_slice() {
                [a] => self.ctx.unary(*a, op),
                _ => Err(Error::BadArgCount {
                    name: name.to_owned(),
                    expected: 1,
                    got: args.len(),
                }),
            }
        } else if let Some(op) = BinaryOpcode::from_name(name) {
            match args.as_slice() {
                [a, b] if op == BinaryOpcode::Pow => self.ctx.pow(*a, *b),
                [a, b] => self.ctx.binary(*a, *b, op),
                _ => Err(Error::BadArgCount {
                    name: name.to_owned(),
                    expected: 2,
                    got: args.len(),
                }),
            }
        } else {
            Err(Error::UnknownFunction(name.to_owned()))
        }
    }
}

/// Parses `text` into a node in the given context
///
/// `is_var` decides which identifiers are variables; it is called with
/// built-in names already lower-cased.  Function names and constants are
/// resolved before `is_var` is consulted.
pub fn parse<F: Fn(&str) -> bool>(
    ctx: &mut Context,
    text: &str,
    is_var: F,
) -> Result<Node, Error> {
    let tokens = lex(text)?;
    if tokens.is_empty() {
        return Err(Error::EmptyFormula);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        ctx,
        is_var,
    };
    let out = parser.parse_expr(0)?;
    match parser.peek() {
        Some(t) => Err(t.unexpected()),
        None => Ok(out),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn xyz(v: &str) -> bool {
        BUILTIN_VARS.contains(&v)
    }

    fn eval(text: &str, x: f64, y: f64, z: f64) -> f64 {
        let mut ctx = Context::new();
        let n = parse(&mut ctx, text, xyz).unwrap();
        let vars = ["x", "y", "z", "t"]
            .into_iter()
            .map(String::from)
            .zip([x, y, z, 0.0])
            .collect();
        ctx.eval(n, &vars).unwrap()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1 + 2 * 3", 0.0, 0.0, 0.0), 7.0);
        assert_eq!(eval("2 ^ 3 ^ 2", 0.0, 0.0, 0.0), 512.0);
        assert_eq!(eval("-x^2", 3.0, 0.0, 0.0), -9.0);
        assert_eq!(eval("2^-1", 0.0, 0.0, 0.0), 0.5);
        assert_eq!(eval("10 - 4 - 3", 0.0, 0.0, 0.0), 3.0);
        assert_eq!(eval("7 % 4 * 2", 0.0, 0.0, 0.0), 6.0);
    }

    #[test]
    fn test_implicit_mul() {
        assert_eq!(eval("2x", 4.0, 0.0, 0.0), 8.0);
        assert_eq!(eval("3(x + 1)", 1.0, 0.0, 0.0), 6.0);
        assert_eq!(eval("(x + 1)(x - 1)", 3.0, 0.0, 0.0), 8.0);
        assert_eq!(eval("x(y)", 3.0, 2.0, 0.0), 6.0);
        assert_eq!(eval("2e", 0.0, 0.0, 0.0), 2.0 * std::f64::consts::E);
        assert_eq!(eval("2e1", 0.0, 0.0, 0.0), 20.0);
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("sqrt(x)", 16.0, 0.0, 0.0), 4.0);
        assert_eq!(eval("max(x, y)", 1.0, 5.0, 0.0), 5.0);
        assert_eq!(eval("pow(2, x)", 3.0, 0.0, 0.0), 8.0);
        assert_eq!(eval("log(1) + exp(0)", 0.0, 0.0, 0.0), 1.0);
        assert_eq!(eval("X + Y + Z", 1.0, 2.0, 3.0), 6.0);
    }

    #[test]
    fn test_errors() {
        let mut ctx = Context::new();
        assert_eq!(parse(&mut ctx, "  ", xyz), Err(Error::EmptyFormula));
        assert_eq!(parse(&mut ctx, "x +", xyz), Err(Error::UnexpectedEnd));
        assert_eq!(
            parse(&mut ctx, "a + 1", xyz),
            Err(Error::UnknownVariable("a".to_owned()))
        );
        assert_eq!(
            parse(&mut ctx, "foo(x)", xyz),
            Err(Error::UnknownFunction("foo".to_owned()))
        );
        assert_eq!(
            parse(&mut ctx, "sin(x, y)", xyz),
            Err(Error::BadArgCount {
                name: "sin".to_owned(),
                expected: 1,
                got: 2
            })
        );
        assert_eq!(
            parse(&mut ctx, "x $ y", xyz),
            Err(Error::UnexpectedToken {
                got: "$".to_owned(),
                offset: 2
            })
        );
        assert_eq!(
            parse(&mut ctx, "(x))", xyz),
            Err(Error::UnexpectedToken {
                got: ")".to_owned(),
                offset: 3
            })
        );
        assert_eq!(
            parse(&mut ctx, "1..2", xyz),
            Err(Error::BadNumber("1..2".to_owned()))
        );
    }

    #[test]
    fn test_nesting_limit() {
        let mut ctx = Context::new();
        let n = 100_000;
        let deep = format!("{}x{}", "(".repeat(n), ")".repeat(n));
        assert_eq!(
            parse(&mut ctx, &deep, xyz),
            Err(Error::TooDeep(MAX_DEPTH))
        );

        let signs = format!("{}x", "-".repeat(n));
        assert_eq!(
            parse(&mut ctx, &signs, xyz),
            Err(Error::TooDeep(MAX_DEPTH))
        );

        let tower = vec!["x"; n].join("^");
        assert_eq!(
            parse(&mut ctx, &tower, xyz),
            Err(Error::TooDeep(MAX_DEPTH))
        );

        let calls = format!("{}x{}", "sin(".repeat(n), ")".repeat(n));
        assert_eq!(
            parse(&mut ctx, &calls, xyz),
            Err(Error::TooDeep(MAX_DEPTH))
        );

        // Moderate nesting is fine
        let ok = format!("{}x{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(eval(&ok, 2.0, 0.0, 0.0), 2.0);
        let long = vec!["x"; n].join(" + ");
        assert_eq!(eval(&long, 1.0, 0.0, 0.0), n as f64);
    }

    #[test]
    fn test_identifiers() {
        let ids = identifiers("exp(x) + 1e5 * Z - 2e-3");
        assert_eq!(
            ids.into_iter().collect::<Vec<_>>(),
            vec!["exp".to_owned(), "x".to_owned(), "z".to_owned()]
        );
        assert!(identifiers("2 + 3").is_empty());
    }
}
