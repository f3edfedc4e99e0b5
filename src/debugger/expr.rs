//! Expression evaluator
//!
//! Evaluates lexed expressions directly with an operator stack and an
//! operand stack, no syntax tree. Every value is a `u32`; arithmetic wraps
//! and relational/logical operators yield 0 or 1.

use log::debug;

use crate::debugger::error::ExprError;
use crate::debugger::lexer::{tokenize, Token, TokenKind};
use crate::debugger::memory::{read_word, MemoryBus};
use crate::debugger::precedence::{relation, Op, Relation};
use crate::debugger::registers::RegisterFile;

/// Depth of the operator and operand stacks
pub const STACK_DEPTH: usize = 32;

/// Fixed-capacity stack that reports overflow instead of growing
struct BoundedStack<T> {
    items: Vec<T>,
    name: &'static str,
}

impl<T: Copy> BoundedStack<T> {
    fn new(name: &'static str) -> Self {
        Self {
            items: Vec::with_capacity(STACK_DEPTH),
            name,
        }
    }

    fn push(&mut self, item: T) -> Result<(), ExprError> {
        if self.items.len() >= STACK_DEPTH {
            return Err(ExprError::StackOverflow {
                stack: self.name,
                capacity: STACK_DEPTH,
            });
        }
        self.items.push(item);
        Ok(())
    }

    fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    fn top(&self) -> Option<T> {
        self.items.last().copied()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// The debuggee state an expression can see
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    registers: &'a dyn RegisterFile,
    memory: &'a dyn MemoryBus,
}

impl<'a> EvalContext<'a> {
    pub fn new(registers: &'a dyn RegisterFile, memory: &'a dyn MemoryBus) -> Self {
        Self { registers, memory }
    }

    /// Lex and evaluate an expression
    pub fn evaluate(&self, text: &str) -> Result<u32, ExprError> {
        let result = tokenize(text).and_then(|tokens| self.evaluate_tokens(&tokens));
        if let Err(e) = &result {
            debug!("Failed to evaluate '{}': {}", text, e);
        }
        result
    }

    /// Evaluate an already lexed, `Eos`-terminated token sequence
    pub fn evaluate_tokens(&self, tokens: &[Token]) -> Result<u32, ExprError> {
        let mut ops: BoundedStack<Op> = BoundedStack::new("operator");
        let mut values: BoundedStack<u32> = BoundedStack::new("operand");
        ops.push(Op::Eos)?;

        // True when the next token must start an operand: at the start,
        // after an operator and after '('
        let mut expect_operand = true;
        // Operator reading of the current token, fixed when first seen so
        // retries after a reduction use the same unary/binary decision
        let mut pending: Option<Op> = None;
        let mut i = 0;

        loop {
            let token = tokens
                .get(i)
                .ok_or_else(|| ExprError::malformed("token stream is not terminated"))?;
            let top = ops
                .top()
                .ok_or_else(|| ExprError::malformed("operator stack underflow"))?;

            let TokenKind::Op(lexed) = token.kind else {
                if !expect_operand {
                    return Err(ExprError::malformed(format!(
                        "missing operator before '{}'",
                        token.lexeme
                    )));
                }
                values.push(self.operand(token)?)?;
                expect_operand = false;
                i += 1;
                continue;
            };

            let incoming = match pending {
                Some(op) => op,
                None => {
                    let op = classify(lexed, expect_operand)?;
                    pending = Some(op);
                    op
                }
            };

            if top == Op::Eos && incoming == Op::Eos {
                break;
            }

            match relation(top, incoming) {
                Relation::Shift => {
                    ops.push(incoming)?;
                    expect_operand = true;
                    pending = None;
                    i += 1;
                }
                Relation::Reduce => {
                    ops.pop();
                    let value = self.apply(top, &mut values)?;
                    values.push(value)?;
                }
                Relation::Match => {
                    ops.pop();
                    expect_operand = false;
                    pending = None;
                    i += 1;
                }
                Relation::Error => {
                    return Err(if top == Op::LParen || incoming == Op::RParen {
                        ExprError::UnbalancedParen
                    } else {
                        ExprError::malformed(format!("unexpected '{}' after '{}'", incoming, top))
                    });
                }
            }
        }

        match values.len() {
            1 => values.pop().ok_or_else(|| ExprError::malformed("empty expression")),
            0 => Err(ExprError::malformed("empty expression")),
            _ => Err(ExprError::malformed("missing operator between operands")),
        }
    }

    /// Resolve a literal or register token to its value
    fn operand(&self, token: &Token) -> Result<u32, ExprError> {
        let lexeme = token.lexeme.as_str();
        match token.kind {
            TokenKind::Dec => parse_digits(lexeme, 10),
            TokenKind::Hex => parse_digits(&lexeme[2..], 16),
            TokenKind::Oct => parse_digits(&lexeme[1..], 8),
            TokenKind::Reg => {
                let name = &lexeme[1..];
                self.registers
                    .read_register(name)
                    .ok_or_else(|| ExprError::unknown_register(name))
            }
            TokenKind::Op(op) => Err(ExprError::malformed(format!("'{}' is not an operand", op))),
        }
    }

    /// Pop the operands of `op`, apply it and return the result
    fn apply(&self, op: Op, values: &mut BoundedStack<u32>) -> Result<u32, ExprError> {
        let missing = || ExprError::MissingOperand { op: op.symbol() };

        if op.is_unary() {
            let a = values.pop().ok_or_else(missing)?;
            return match op {
                Op::Neg => Ok(a.wrapping_neg()),
                Op::Not => Ok(u32::from(a == 0)),
                Op::Deref => Ok(read_word(self.memory, a)?),
                _ => unreachable!("{op:?} is not unary"),
            };
        }

        let b = values.pop().ok_or_else(missing)?;
        let a = values.pop().ok_or_else(missing)?;
        let result = match op {
            Op::Plus => a.wrapping_add(b),
            Op::Sub => a.wrapping_sub(b),
            Op::Mul => a.wrapping_mul(b),
            Op::Div => a.checked_div(b).ok_or(ExprError::DivisionByZero)?,
            Op::Eq => u32::from(a == b),
            Op::Neq => u32::from(a != b),
            Op::Le => u32::from(a <= b),
            Op::Ge => u32::from(a >= b),
            Op::Lt => u32::from(a < b),
            Op::Gt => u32::from(a > b),
            Op::And => u32::from(a != 0 && b != 0),
            Op::Or => u32::from(a != 0 || b != 0),
            Op::Deref | Op::Neg | Op::Not | Op::LParen | Op::RParen | Op::Eos => {
                return Err(ExprError::malformed(format!("cannot apply '{}'", op)));
            }
        };
        Ok(result)
    }
}

/// Decide the operator a lexed operator token stands for at this point
fn classify(lexed: Op, expect_operand: bool) -> Result<Op, ExprError> {
    if lexed == Op::Not {
        return Ok(Op::Not);
    }
    if !expect_operand {
        return Ok(lexed);
    }
    if let Some(unary) = lexed.unary_form() {
        return Ok(unary);
    }
    match lexed {
        Op::LParen | Op::RParen | Op::Eos => Ok(lexed),
        _ => Err(ExprError::MissingOperand { op: lexed.symbol() }),
    }
}

/// Parse digits in `radix`, wrapping on overflow
fn parse_digits(digits: &str, radix: u32) -> Result<u32, ExprError> {
    if digits.is_empty() {
        return Err(ExprError::malformed("empty number"));
    }
    digits.chars().try_fold(0u32, |acc, c| {
        c.to_digit(radix)
            .map(|d| acc.wrapping_mul(radix).wrapping_add(d))
            .ok_or_else(|| ExprError::malformed(format!("invalid digit '{}' in '{}'", c, digits)))
    })
}

/// Parse a standalone number in any literal form the lexer accepts
/// (`0x` hex, leading-zero octal, decimal). Used for command arguments.
pub fn parse_number(text: &str) -> Option<u32> {
    let text = text.trim();
    let (digits, radix) = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (hex, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text, 10)
    };
    parse_digits(digits, radix).ok()
}

/// Evaluate `text` against the given registers and memory
pub fn evaluate(
    text: &str,
    registers: &dyn RegisterFile,
    memory: &dyn MemoryBus,
) -> Result<u32, ExprError> {
    EvalContext::new(registers, memory).evaluate(text)
}
