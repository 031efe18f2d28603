//! Predicates: the atoms facts and rule consequents are made of.
//!
//! A predicate is a name plus an ordered list of arguments, e.g.
//! `fever(Patient)` or `disease(Patient, Flu)`. Equality and hashing are
//! structural and position sensitive.

use std::fmt::{self, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An immutable, optionally parameterized atom (a symptom or a diagnosis).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPredicate")]
pub struct Predicate {
    name: String,
    args: Vec<String>,
}

impl Predicate {
    /// Creates a new predicate.
    ///
    /// The name is trimmed and must not be empty (`Error::InvalidPredicate`).
    /// Arguments are stored verbatim; any string is a valid argument.
    pub fn new<N, I, A>(name: N, args: I) -> Result<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidPredicate(
                "predicate name cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            name,
            args: args.into_iter().map(Into::into).collect(),
        })
    }

    /// Creates a predicate without arguments.
    pub fn atom(name: impl Into<String>) -> Result<Self> {
        Self::new(name, std::iter::empty::<String>())
    }

    /// The predicate name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ordered argument list.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Number of arguments.
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

/// Characters that end a bare token in the literal syntax.
const DELIMITERS: [char; 4] = ['(', ')', ',', '"'];

fn needs_quotes(token: &str) -> bool {
    token.is_empty() || token.trim() != token || token.contains(DELIMITERS)
}

fn write_token(f: &mut fmt::Formatter<'_>, token: &str) -> fmt::Result {
    if !needs_quotes(token) {
        return f.write_str(token);
    }
    f.write_char('"')?;
    for c in token.chars() {
        if c == '"' || c == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_token(f, &self.name)?;
        if self.args.is_empty() {
            return Ok(());
        }
        f.write_char('(')?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_token(f, arg)?;
        }
        f.write_char(')')
    }
}

impl FromStr for Predicate {
    type Err = Error;

    /// Parses `name`, `name()` or `name(arg1, arg2, ...)`.
    ///
    /// Bare tokens are trimmed and cannot contain `(`, `)`, `,` or `"`.
    /// Anything else goes in double quotes, with `\"` and `\\` escaped;
    /// this is how `Display` renders such tokens.
    fn from_str(s: &str) -> Result<Self> {
        let mut lexer = Lexer { input: s, rest: s };

        let (name, _) = lexer.token()?;
        lexer.skip_whitespace();
        if lexer.rest.is_empty() {
            return Self::atom(name);
        }
        if !lexer.eat('(') {
            return Err(lexer.error("expected '('"));
        }

        let mut args = Vec::new();
        lexer.skip_whitespace();
        if !lexer.eat(')') {
            loop {
                let (arg, quoted) = lexer.token()?;
                if arg.is_empty() && !quoted {
                    return Err(lexer.error("empty argument"));
                }
                args.push(arg);

                lexer.skip_whitespace();
                if lexer.eat(',') {
                    continue;
                }
                if lexer.eat(')') {
                    break;
                }
                return Err(lexer.error("expected ',' or ')'"));
            }
        }

        lexer.skip_whitespace();
        if !lexer.rest.is_empty() {
            return Err(lexer.error("unexpected text after ')'"));
        }
        Self::new(name, args)
    }
}

struct Lexer<'a> {
    input: &'a str,
    rest: &'a str,
}

impl Lexer<'_> {
    fn error(&self, problem: &str) -> Error {
        Error::InvalidPredicate(format!("{} in '{}'", problem, self.input.trim()))
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, c: char) -> bool {
        match self.rest.strip_prefix(c) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    /// Reads a bare or quoted token. The flag is `true` for quoted tokens.
    fn token(&mut self) -> Result<(String, bool)> {
        self.skip_whitespace();
        if !self.eat('"') {
            let end = self.rest.find(DELIMITERS).unwrap_or(self.rest.len());
            let (bare, rest) = self.rest.split_at(end);
            self.rest = rest;
            return Ok((bare.trim().to_string(), false));
        }

        let quoted = self.rest;
        let mut token = String::new();
        let mut chars = quoted.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.rest = &quoted[i + 1..];
                    return Ok((token, true));
                }
                '\\' => match chars.next() {
                    Some((_, escaped)) => token.push(escaped),
                    None => break,
                },
                _ => token.push(c),
            }
        }
        Err(self.error("unterminated quote"))
    }
}

/// Unvalidated wire form, checked on the way in.
#[derive(Deserialize)]
struct RawPredicate {
    name: String,
    #[serde(default)]
    args: Vec<String>,
}

impl TryFrom<RawPredicate> for Predicate {
    type Error = Error;

    fn try_from(raw: RawPredicate) -> Result<Self> {
        Predicate::new(raw.name, raw.args)
    }
}
