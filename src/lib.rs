//! EMUMON - expression evaluator and watchpoint monitor for an emulator
//!
//! This library provides the core of the monitor: a lexer and
//! operator-precedence evaluator for small C-like integer expressions over
//! emulated registers and memory, a fixed-size watchpoint pool, and the
//! step/check loop that ties them to a CPU.

pub mod debugger;
pub mod platform;

/// Re-export key types for easier access in tests
pub use debugger::commands::{parse_command, Command, Flow};
pub use debugger::core::{Monitor, MonitorConfig, MonitorState, StopReason};
pub use debugger::error::ExprError;
pub use debugger::expr::{evaluate, EvalContext};
pub use debugger::watchpoint::{WatchChange, Watchpoint, WatchpointPool, NR_WATCHPOINTS};
pub use platform::{Cpu, CpuEvent, Machine, NopCpu};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Initialize the logging system
pub fn init_logging(level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .filter_module("emumon", level)
        .format_timestamp_secs()
        .init();
}
