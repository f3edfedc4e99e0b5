//! Operator kinds and the operator precedence relation.
//!
//! The evaluator never compares numeric ranks. Instead, for every pair of
//! (operator on top of the stack, incoming operator) the table below says
//! whether to shift the incoming operator, reduce the one on the stack,
//! match a bracket pair, or give up. Parentheses and the end-of-input
//! sentinel only make sense as special transitions, which a rank
//! comparison cannot express.
//!
//! Binding strength, tightest first:
//!
//! ```text
//! !  -(neg)  *(deref)
//! *  /
//! +  -
//! ==  !=  <=  >=  <  >
//! &&
//! ||
//! ```

use std::fmt;

/// Operator kinds, in table order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Deref,
    Neg,
    Eq,
    Neq,
    Le,
    Ge,
    Lt,
    Gt,
    And,
    Or,
    Plus,
    Sub,
    LParen,
    RParen,
    Mul,
    Div,
    Not,
    /// End of input; also the bottom of the operator stack
    Eos,
}

/// Number of operator kinds (rows and columns in the table)
pub const OP_COUNT: usize = 18;

impl Op {
    /// Operators that take a single operand
    pub fn is_unary(self) -> bool {
        matches!(self, Op::Deref | Op::Neg | Op::Not)
    }

    /// Source spelling, for diagnostics
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Deref => "*",
            Op::Neg => "-",
            Op::Eq => "==",
            Op::Neq => "!=",
            Op::Le => "<=",
            Op::Ge => ">=",
            Op::Lt => "<",
            Op::Gt => ">",
            Op::And => "&&",
            Op::Or => "||",
            Op::Plus => "+",
            Op::Sub => "-",
            Op::LParen => "(",
            Op::RParen => ")",
            Op::Mul => "*",
            Op::Div => "/",
            Op::Not => "!",
            Op::Eos => "end of input",
        }
    }

    /// The unary reading of an operator appearing where an operand is
    /// expected, if it has one
    pub fn unary_form(self) -> Option<Op> {
        match self {
            Op::Sub | Op::Neg => Some(Op::Neg),
            Op::Mul | Op::Deref => Some(Op::Deref),
            Op::Not => Some(Op::Not),
            _ => None,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// What to do with the incoming operator given the stack top
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Push the incoming operator
    Shift,
    /// Apply the operator on top of the stack, then retry
    Reduce,
    /// Pop the stack top and consume the incoming bracket
    Match,
    /// No valid transition
    Error,
}

use Relation::{Error as X, Match as E, Reduce as G, Shift as L};

#[rustfmt::skip]
static TABLE: [[Relation; OP_COUNT]; OP_COUNT] = [
    //            *  -  == != <= >= <  >  && || +  -  (  )  *  /  !  $
    /* deref */ [ L, L, G, G, G, G, G, G, G, G, G, G, L, G, G, G, L, G ],
    /* neg   */ [ L, L, G, G, G, G, G, G, G, G, G, G, L, G, G, G, L, G ],
    /* ==    */ [ L, L, G, G, G, G, G, G, G, G, L, L, L, G, L, L, L, G ],
    /* !=    */ [ L, L, G, G, G, G, G, G, G, G, L, L, L, G, L, L, L, G ],
    /* <=    */ [ L, L, G, G, G, G, G, G, G, G, L, L, L, G, L, L, L, G ],
    /* >=    */ [ L, L, G, G, G, G, G, G, G, G, L, L, L, G, L, L, L, G ],
    /* <     */ [ L, L, G, G, G, G, G, G, G, G, L, L, L, G, L, L, L, G ],
    /* >     */ [ L, L, G, G, G, G, G, G, G, G, L, L, L, G, L, L, L, G ],
    /* &&    */ [ L, L, L, L, L, L, L, L, G, G, L, L, L, G, L, L, L, G ],
    /* ||    */ [ L, L, L, L, L, L, L, L, L, G, L, L, L, G, L, L, L, G ],
    /* +     */ [ L, L, G, G, G, G, G, G, G, G, G, G, L, G, L, L, L, G ],
    /* -     */ [ L, L, G, G, G, G, G, G, G, G, G, G, L, G, L, L, L, G ],
    /* (     */ [ L, L, L, L, L, L, L, L, L, L, L, L, L, E, L, L, L, X ],
    /* )     */ [ G, G, G, G, G, G, G, G, G, G, G, G, E, G, G, G, G, G ],
    /* *     */ [ L, L, G, G, G, G, G, G, G, G, G, G, L, G, G, G, L, G ],
    /* /     */ [ L, L, G, G, G, G, G, G, G, G, G, G, L, G, G, G, L, G ],
    /* !     */ [ L, L, G, G, G, G, G, G, G, G, G, G, L, G, G, G, L, G ],
    /* $     */ [ L, L, L, L, L, L, L, L, L, L, L, L, L, X, L, L, L, E ],
];

/// Look up the relation between the stack top and the incoming operator
pub fn relation(top: Op, incoming: Op) -> Relation {
    TABLE[top as usize][incoming as usize]
}
