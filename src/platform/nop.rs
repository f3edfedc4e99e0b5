use anyhow::Result;
use log::trace;

use super::{Cpu, CpuEvent, Machine};

/// Stand-in CPU that treats every byte as a one-byte no-op.
///
/// Each step advances `eip` by one; reaching the end of guest memory halts.
#[derive(Debug, Default)]
pub struct NopCpu {
    /// Instructions executed so far
    executed: u64,
}

impl NopCpu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executed(&self) -> u64 {
        self.executed
    }
}

impl Cpu for NopCpu {
    fn step(&mut self, machine: &mut Machine) -> Result<CpuEvent> {
        let eip = machine.registers.eip();
        if eip as usize >= machine.memory.size() {
            return Ok(CpuEvent::Halted);
        }

        trace!("nop at 0x{:08x}", eip);
        self.executed += 1;
        let next = eip.wrapping_add(1);
        machine.registers.set_eip(next);

        if next as usize >= machine.memory.size() || next == 0 {
            Ok(CpuEvent::Halted)
        } else {
            Ok(CpuEvent::Running)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_until_end_of_memory() {
        let mut machine = Machine::new(4);
        machine.registers.set_eip(1);
        let mut cpu = NopCpu::new();

        assert_eq!(cpu.step(&mut machine).unwrap(), CpuEvent::Running);
        assert_eq!(cpu.step(&mut machine).unwrap(), CpuEvent::Running);
        assert_eq!(machine.registers.eip(), 3);
        assert_eq!(cpu.step(&mut machine).unwrap(), CpuEvent::Halted);
        assert_eq!(cpu.step(&mut machine).unwrap(), CpuEvent::Halted);
        assert_eq!(cpu.executed(), 3);
    }
}
