//! Emulated machine state and the CPU stepping capability.
//!
//! Instruction execution belongs to the emulator. The monitor only needs
//! something that can advance a `Machine` by one instruction.

pub mod nop;

use anyhow::Result;

use crate::debugger::expr::EvalContext;
use crate::debugger::memory::GuestMemory;
use crate::debugger::registers::Registers;

pub use nop::NopCpu;

/// Register file plus physical memory
pub struct Machine {
    pub registers: Registers,
    pub memory: GuestMemory,
}

impl Machine {
    pub fn new(memory_size: usize) -> Self {
        Self {
            registers: Registers::new(),
            memory: GuestMemory::new(memory_size),
        }
    }

    /// Evaluation view of the current state
    pub fn eval_context(&self) -> EvalContext<'_> {
        EvalContext::new(&self.registers, &self.memory)
    }
}

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuEvent {
    /// The instruction executed and the CPU can keep going
    Running,
    /// The CPU stopped for good (halt instruction, end of memory, ...)
    Halted,
}

/// Executes one instruction at a time
#[cfg_attr(test, mockall::automock)]
pub trait Cpu {
    fn step(&mut self, machine: &mut Machine) -> Result<CpuEvent>;
}
