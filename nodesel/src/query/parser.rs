//! Lexer and recursive-descent compiler for query expressions.
//!
//! ```text
//! expr    ::= and ("or" and)*
//! and     ::= rel ("and" rel)*
//! rel     ::= primary (relop primary)*
//! primary ::= "(" expr ")" | "~" primary | word
//! relop   ::= "<" | "<=" | ">" | ">=" | "="
//! ```
//!
//! A word is a number, a known field, a named operation or a host pattern,
//! and its reading depends on context: numbers and fields are only numbers
//! and fields where a relational operator needs them, and are host patterns
//! everywhere else. `c1* > 5 and 37.5` is meaningful if there is a field
//! `c1*` and a node named `37.5`.
//!
//! Everything is case-sensitive.

use super::expr::{Expr, RelOp, SetOp};
use super::vocabulary::{Resolved, Vocabulary};
use crate::hostglob::HostGlobber;
use crate::{Error, Result};

const OPERATORS: [&str; 6] = ["<", "<=", ">", ">=", "=", "~"];

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn is_delim(c: char) -> bool {
    matches!(c, '(' | ')')
}

fn is_punct(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '~')
}

fn is_word(c: char) -> bool {
    !is_delim(c) && !is_punct(c) && !is_space(c)
}

fn query_error(location: usize, message: impl Into<String>) -> Error {
    Error::Query {
        location: location + 1,
        message: message.into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Delim,
    Operator,
    Word,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    kind: TokenKind,
    /// 0-based character offset of the first character.
    location: usize,
}

struct Lexer<'a> {
    src: &'a str,
    /// Byte position of the next unread character.
    pos: usize,
    /// Character offset of the next unread character.
    offset: usize,
    pending: Option<Token<'a>>,
    /// Character offset of the last token consumed.
    last: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            offset: 0,
            pending: None,
            last: 0,
        }
    }

    fn peek(&mut self) -> Result<Option<Token<'a>>> {
        if self.pending.is_none() {
            self.pending = self.scan()?;
        }
        Ok(self.pending)
    }

    fn next(&mut self) -> Result<Option<Token<'a>>> {
        let token = self.peek()?;
        self.pending = None;
        if let Some(t) = token {
            self.last = t.location;
        }
        Ok(token)
    }

    /// Character offset just past the last token read.
    fn end(&self) -> usize {
        self.offset
    }

    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        for c in self.src[self.pos..].chars() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
            self.offset += 1;
        }
    }

    fn scan(&mut self) -> Result<Option<Token<'a>>> {
        self.advance_while(is_space);
        let Some(probe) = self.src[self.pos..].chars().next() else {
            return Ok(None);
        };
        let start = self.pos;
        let location = self.offset;
        let kind = if is_delim(probe) {
            self.pos += probe.len_utf8();
            self.offset += 1;
            TokenKind::Delim
        } else if is_punct(probe) {
            self.advance_while(is_punct);
            TokenKind::Operator
        } else {
            self.advance_while(is_word);
            TokenKind::Word
        };
        let text = &self.src[start..self.pos];
        if kind == TokenKind::Operator && !OPERATORS.contains(&text) {
            return Err(query_error(location, format!("Unknown operator '{}'", text)));
        }
        Ok(Some(Token {
            text,
            kind,
            location,
        }))
    }
}

/// A parsed subexpression, before context decides how a word is read.
enum Operand {
    Set(Expr),
    Number {
        value: f64,
        text: String,
        location: usize,
    },
    Field {
        name: String,
        text: String,
        location: usize,
    },
}

impl Operand {
    /// Read the operand as a row set; numbers and fields become host patterns.
    fn into_expr(self) -> Result<Expr> {
        match self {
            Operand::Set(e) => Ok(e),
            Operand::Number { text, location, .. } | Operand::Field { text, location, .. } => {
                glob(&text, location)
            }
        }
    }
}

fn glob(pattern: &str, location: usize) -> Result<Expr> {
    HostGlobber::new(pattern, true)
        .map(Expr::Glob)
        .map_err(|e| query_error(location, e.to_string()))
}

struct Parser<'a, 'v> {
    lexer: Lexer<'a>,
    vocabulary: &'v Vocabulary,
}

impl<'a, 'v> Parser<'a, 'v> {
    /// Consume the next token if its text is `t`.
    fn eat(&mut self, t: &str) -> Result<Option<Token<'a>>> {
        match self.lexer.peek()? {
            Some(token) if token.text == t => self.lexer.next(),
            _ => Ok(None),
        }
    }

    fn get(&mut self) -> Result<Token<'a>> {
        self.lexer
            .next()?
            .ok_or_else(|| query_error(self.lexer.end(), "Unexpected end of expression"))
    }

    fn parse(&mut self) -> Result<Expr> {
        let e = self.parse_or()?.into_expr()?;
        if let Some(junk) = self.lexer.next()? {
            return Err(query_error(
                junk.location,
                format!("Junk at end of expression: {}", junk.text),
            ));
        }
        Ok(e)
    }

    fn parse_or(&mut self) -> Result<Operand> {
        let mut e = self.parse_and()?;
        while self.eat(SetOp::Or.as_str())?.is_some() {
            let rhs = self.parse_and()?;
            e = set_operation(SetOp::Or, e, rhs)?;
        }
        Ok(e)
    }

    fn parse_and(&mut self) -> Result<Operand> {
        let mut e = self.parse_rel()?;
        while self.eat(SetOp::And.as_str())?.is_some() {
            let rhs = self.parse_rel()?;
            e = set_operation(SetOp::And, e, rhs)?;
        }
        Ok(e)
    }

    fn parse_rel(&mut self) -> Result<Operand> {
        let mut e = self.parse_primary()?;
        loop {
            let Some(token) = self.lexer.peek()? else {
                break;
            };
            let Some(op) = RelOp::parse(token.text).filter(|_| token.kind == TokenKind::Operator)
            else {
                break;
            };
            self.lexer.next()?;
            let rhs = self.parse_primary()?;
            // Type errors point at the end of the right operand.
            e = Operand::Set(rel_operation(op, e, rhs, self.lexer.last)?);
        }
        Ok(e)
    }

    fn parse_primary(&mut self) -> Result<Operand> {
        if let Some(open) = self.eat("(")? {
            let e = self.parse_or()?;
            if self.eat(")")?.is_none() {
                let location = match self.lexer.peek()? {
                    Some(token) => token.location,
                    None => self.lexer.end(),
                };
                return Err(query_error(
                    location,
                    format!("Expected ')' here to close '(' at {}", open.location + 1),
                ));
            }
            return Ok(e);
        }
        if self.eat("~")?.is_some() {
            let e = self.parse_primary()?.into_expr()?;
            return Ok(Operand::Set(Expr::Not(Box::new(e))));
        }

        let token = self.get()?;
        if token.kind != TokenKind::Word || SetOp::parse(token.text).is_some() {
            return Err(query_error(
                token.location,
                format!("Misplaced operator or punctuation '{}'", token.text),
            ));
        }
        if let Some(value) = token.text.parse::<f64>().ok().filter(|v| v.is_finite()) {
            return Ok(Operand::Number {
                value,
                text: token.text.to_string(),
                location: token.location,
            });
        }
        match self
            .vocabulary
            .resolve(token.text)
            .map_err(|msg| query_error(token.location, msg))?
        {
            Resolved::Field(name) => Ok(Operand::Field {
                name,
                text: token.text.to_string(),
                location: token.location,
            }),
            Resolved::Name(name) => match self.vocabulary.operation(&name) {
                Some(e) => Ok(Operand::Set(e.clone())),
                None => glob(&name, token.location).map(Operand::Set),
            },
        }
    }
}

fn rel_operation(op: RelOp, lhs: Operand, rhs: Operand, location: usize) -> Result<Expr> {
    match (lhs, rhs) {
        (Operand::Field { name, .. }, Operand::Number { value, .. }) => Ok(Expr::Rel {
            op,
            field: name,
            value,
        }),
        _ => Err(query_error(
            location,
            format!("Wrong type of arguments to relational operator {}", op),
        )),
    }
}

fn set_operation(op: SetOp, lhs: Operand, rhs: Operand) -> Result<Operand> {
    Ok(Operand::Set(Expr::Set {
        op,
        left: Box::new(lhs.into_expr()?),
        right: Box::new(rhs.into_expr()?),
    }))
}

/// Compile `query` under `vocabulary`.
///
/// Every failure, whether syntax, type or host pattern, comes back as
/// [`Error::Query`], rendered `Location <n>: <message>` with `n` the 1-based
/// character offset of the offending token.
pub fn compile_query(query: &str, vocabulary: &Vocabulary) -> Result<Expr> {
    let mut parser = Parser {
        lexer: Lexer::new(query),
        vocabulary,
    };
    let result = parser.parse();
    match &result {
        Ok(expr) => tracing::debug!(query, %expr, "compiled query"),
        Err(e) => tracing::debug!(query, error = %e, "query rejected"),
    }
    result
}
