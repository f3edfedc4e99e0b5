//! Expression lexer
//!
//! Rules are tried in table order at the current position and the first
//! one that matches wins, so `<=` is listed before `<` and hex before
//! octal before decimal literals.

use std::sync::OnceLock;

use log::trace;
use regex::Regex;

use crate::debugger::error::ExprError;
use crate::debugger::precedence::Op;

/// Longest lexeme accepted in a single token
pub const MAX_LEXEME_LEN: usize = 31;

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Operator or bracket. Unary forms are never produced here; the
    /// evaluator assigns them from context.
    Op(Op),
    /// `$name` register reference
    Reg,
    Hex,
    Oct,
    Dec,
}

/// A lexed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact matched text
    pub lexeme: String,
    /// Byte offset of the lexeme in the source
    pub offset: usize,
}

impl Token {
    /// End-of-input sentinel
    fn eos(offset: usize) -> Self {
        Self {
            kind: TokenKind::Op(Op::Eos),
            lexeme: String::new(),
            offset,
        }
    }

    pub fn is_operand(&self) -> bool {
        !matches!(self.kind, TokenKind::Op(_))
    }
}

#[rustfmt::skip]
const RULES: &[(&str, Option<TokenKind>)] = &[
    (r"\s+",             None),
    (r"\(",              Some(TokenKind::Op(Op::LParen))),
    (r"\)",              Some(TokenKind::Op(Op::RParen))),
    (r"\+",              Some(TokenKind::Op(Op::Plus))),
    (r"-",               Some(TokenKind::Op(Op::Sub))),
    (r"\*",              Some(TokenKind::Op(Op::Mul))),
    (r"/",               Some(TokenKind::Op(Op::Div))),
    (r"==",              Some(TokenKind::Op(Op::Eq))),
    (r"!=",              Some(TokenKind::Op(Op::Neq))),
    (r"<=",              Some(TokenKind::Op(Op::Le))),
    (r">=",              Some(TokenKind::Op(Op::Ge))),
    (r">",               Some(TokenKind::Op(Op::Gt))),
    (r"<",               Some(TokenKind::Op(Op::Lt))),
    (r"&&",              Some(TokenKind::Op(Op::And))),
    (r"\|\|",            Some(TokenKind::Op(Op::Or))),
    (r"!",               Some(TokenKind::Op(Op::Not))),
    (r"\$[A-Za-z0-9_]+", Some(TokenKind::Reg)),
    (r"0[xX][0-9a-fA-F]+", Some(TokenKind::Hex)),
    (r"0[0-7]+",         Some(TokenKind::Oct)),
    (r"[0-9]+",          Some(TokenKind::Dec)),
];

/// Rules compiled once, anchored at the start of the remaining input
fn rules() -> &'static [(Regex, Option<TokenKind>)] {
    static COMPILED: OnceLock<Vec<(Regex, Option<TokenKind>)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .map(|(pattern, kind)| {
                let regex = Regex::new(&format!("^(?:{pattern})"))
                    .unwrap_or_else(|e| panic!("lexer rule '{pattern}' does not compile: {e}"));
                (regex, *kind)
            })
            .collect()
    })
}

/// Split an expression into tokens.
///
/// The returned sequence always ends with an `Op::Eos` sentinel. Any
/// position no rule matches fails the whole expression.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut position = 0;

    while position < input.len() {
        let rest = &input[position..];
        let matched = rules()
            .iter()
            .enumerate()
            .find_map(|(i, (regex, kind))| regex.find(rest).map(|m| (i, m.end(), *kind)));

        let Some((rule, len, kind)) = matched else {
            return Err(ExprError::Lex {
                offset: position,
                remainder: rest.to_string(),
            });
        };

        let lexeme = &rest[..len];
        trace!("match rule {} '{}' at position {}: {}", rule, RULES[rule].0, position, lexeme);

        if let Some(kind) = kind {
            if lexeme.len() > MAX_LEXEME_LEN {
                return Err(ExprError::LexemeTooLong {
                    offset: position,
                    lexeme: lexeme.to_string(),
                    max: MAX_LEXEME_LEN,
                });
            }
            tokens.push(Token {
                kind,
                lexeme: lexeme.to_string(),
                offset: position,
            });
        }
        position += len;
    }

    tokens.push(Token::eos(input.len()));
    Ok(tokens)
}
