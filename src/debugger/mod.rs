pub mod core;
pub mod commands;
pub mod error;
pub mod expr;
pub mod lexer;
pub mod memory;
pub mod precedence;
pub mod registers;
pub mod watchpoint;
