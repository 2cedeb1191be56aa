//! Boolean retrieval: a recursive-descent parser for quoted-term expressions
//! and a set-algebra evaluator over the inverted index.
//!
//! ```text
//! query    := orExpr
//! orExpr   := andExpr ( "OR" andExpr )*
//! andExpr  := notExpr ( "AND" notExpr )*
//! notExpr  := [ "NOT" ] atom
//! atom     := '"' term-text '"' | "(" query ")"
//! ```
//!
//! Keywords are case-sensitive. Error positions are character offsets.

use crate::config::QUERY_DEPTH_CEILING;
use crate::error::{Error, Result};
use crate::index::{DocId, InvertedIndex};
use crate::normalizer::Normalizer;
use std::collections::BTreeSet;
use std::fmt::{self, Display};

/// Parsed boolean query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Quoted literal, as written in the query.
    Term(String),
    /// Flat chain of two or more operands.
    And(Vec<Expr>),
    /// Flat chain of two or more operands.
    Or(Vec<Expr>),
    Not(Box<Expr>),
}

fn write_chain(f: &mut fmt::Formatter<'_>, operands: &[Expr], op: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", op)?;
        }
        write!(f, "{}", operand)?;
    }
    write!(f, ")")
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Term(text) => write!(f, "{:?}", text),
            Expr::Not(inner) => write!(f, "NOT {}", inner),
            Expr::And(operands) => write_chain(f, operands, "AND"),
            Expr::Or(operands) => write_chain(f, operands, "OR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Term(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

fn lex(query: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = query.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '(' => {
                tokens.push(Token { kind: TokenKind::LParen, pos: i });
                i += 1;
            }
            ')' => {
                tokens.push(Token { kind: TokenKind::RParen, pos: i });
                i += 1;
            }
            '"' => {
                let start = i;
                let close = chars[start + 1..]
                    .iter()
                    .position(|&ch| ch == '"')
                    .ok_or_else(|| Error::syntax(start, "unterminated quoted term"))?;
                let text: String = chars[start + 1..start + 1 + close].iter().collect();
                tokens.push(Token { kind: TokenKind::Term(text), pos: start });
                i = start + close + 2;
            }
            _ => {
                let start = i;
                while i < chars.len() && !chars[i].is_whitespace() && !matches!(chars[i], '(' | ')' | '"') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let kind = match word.as_str() {
                    "AND" => TokenKind::And,
                    "OR" => TokenKind::Or,
                    "NOT" => TokenKind::Not,
                    _ => {
                        return Err(Error::syntax(
                            start,
                            format!("unexpected word {:?}, terms must be double-quoted", word),
                        ))
                    }
                };
                tokens.push(Token { kind, pos: start });
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    /// Character length of the query, reported for errors at end of input.
    end: usize,
    max_depth: usize,
    parens: usize,
}

/// Parse `query`. Parentheses nested deeper than `max_depth` are rejected;
/// `max_depth` is clamped to [`QUERY_DEPTH_CEILING`].
pub fn parse(query: &str, max_depth: usize) -> Result<Expr> {
    let tokens = lex(query)?;
    if tokens.is_empty() {
        return Err(Error::syntax(0, "empty query"));
    }
    let max_depth = max_depth.min(QUERY_DEPTH_CEILING);
    let mut parser = Parser { tokens, cursor: 0, end: query.chars().count(), max_depth, parens: 0 };
    let expr = parser.parse_or()?;
    if let Some(tok) = parser.peek() {
        return Err(match tok.kind {
            TokenKind::RParen => Error::syntax(tok.pos, "unbalanced parenthesis, unexpected ')'"),
            _ => Error::syntax(tok.pos, "expected AND or OR"),
        });
    }
    Ok(expr)
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    /// Consume the next token if it is `kind`; returns its position.
    fn eat(&mut self, kind: &TokenKind) -> Option<usize> {
        match self.peek() {
            Some(tok) if &tok.kind == kind => {
                let pos = tok.pos;
                self.cursor += 1;
                Some(pos)
            }
            _ => None,
        }
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut operands = vec![self.parse_and()?];
        while self.eat(&TokenKind::Or).is_some() {
            operands.push(self.parse_and()?);
        }
        Ok(chain(operands, Expr::Or))
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut operands = vec![self.parse_not()?];
        while self.eat(&TokenKind::And).is_some() {
            operands.push(self.parse_not()?);
        }
        Ok(chain(operands, Expr::And))
    }

    fn parse_not(&mut self) -> Result<Expr> {
        match self.eat(&TokenKind::Not) {
            Some(_) => Ok(Expr::Not(Box::new(self.parse_atom()?))),
            None => self.parse_atom(),
        }
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        let tok = match self.peek() {
            Some(tok) => tok.clone(),
            None => return Err(Error::syntax(self.end, "missing operand at end of query")),
        };
        match tok.kind {
            TokenKind::Term(text) => {
                self.cursor += 1;
                Ok(Expr::Term(text))
            }
            TokenKind::LParen => {
                self.cursor += 1;
                self.parens += 1;
                if self.parens > self.max_depth {
                    return Err(Error::syntax(
                        tok.pos,
                        format!("parentheses nested deeper than {}", self.max_depth),
                    ));
                }
                let inner = self.parse_or()?;
                if self.eat(&TokenKind::RParen).is_none() {
                    return Err(Error::syntax(tok.pos, "unbalanced parenthesis, '(' is never closed"));
                }
                self.parens -= 1;
                Ok(inner)
            }
            TokenKind::RParen => Err(Error::syntax(tok.pos, "missing operand before ')'")),
            TokenKind::And => Err(Error::syntax(tok.pos, "missing operand before AND")),
            TokenKind::Or => Err(Error::syntax(tok.pos, "missing operand before OR")),
            TokenKind::Not => Err(Error::syntax(tok.pos, "NOT must be followed by a term or group")),
        }
    }
}

/// A single operand stands for itself rather than a one-element chain.
fn chain(mut operands: Vec<Expr>, node: fn(Vec<Expr>) -> Expr) -> Expr {
    if operands.len() == 1 {
        operands.remove(0)
    } else {
        node(operands)
    }
}

/// Evaluate `expr` against `index`.
///
/// Each literal goes through `normalizer`. A literal that yields several terms
/// matches documents holding all of them; one that yields none matches nothing.
/// Unknown terms match nothing.
pub fn evaluate(expr: &Expr, index: &InvertedIndex, normalizer: &Normalizer) -> BTreeSet<DocId> {
    match expr {
        Expr::Term(text) => lookup(text, index, normalizer),
        Expr::And(operands) => {
            let mut iter = operands.iter();
            let mut acc = match iter.next() {
                Some(first) => evaluate(first, index, normalizer),
                None => return BTreeSet::new(),
            };
            for operand in iter {
                if acc.is_empty() {
                    break;
                }
                let next = evaluate(operand, index, normalizer);
                acc.retain(|d| next.contains(d));
            }
            acc
        }
        Expr::Or(operands) => {
            let mut acc = BTreeSet::new();
            for operand in operands {
                acc.extend(evaluate(operand, index, normalizer));
            }
            acc
        }
        Expr::Not(child) => {
            let excluded = evaluate(child, index, normalizer);
            index.universe().difference(&excluded).copied().collect()
        }
    }
}

fn lookup(text: &str, index: &InvertedIndex, normalizer: &Normalizer) -> BTreeSet<DocId> {
    let terms = normalizer.normalize(text);
    let mut iter = terms.iter();
    let mut acc = match iter.next().and_then(|t| index.postings(t)) {
        Some(docs) => docs.clone(),
        None => return BTreeSet::new(),
    };
    for term in iter {
        match index.postings(term) {
            Some(docs) => acc.retain(|d| docs.contains(d)),
            None => return BTreeSet::new(),
        }
    }
    acc
}
