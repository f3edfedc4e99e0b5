use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::debugger::error::ExprError;
use crate::debugger::memory::{read_word, DEFAULT_MEMORY_SIZE};
use crate::debugger::watchpoint::{WatchChange, Watchpoint, WatchpointPool, NR_WATCHPOINTS};
use crate::platform::{Cpu, CpuEvent, Machine};

/// Default physical address raw images are loaded at
pub const DEFAULT_LOAD_ADDRESS: u32 = 0x10_0000;

/// Monitor settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Guest physical memory size in bytes
    pub memory_size: usize,
    /// Where `load_image` places a raw image and points `eip`
    pub load_address: u32,
    /// Most instructions `c` executes before giving control back
    pub step_budget: u64,
    /// Watchpoint slots
    pub watchpoints: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            load_address: DEFAULT_LOAD_ADDRESS,
            step_budget: u64::MAX,
            watchpoints: NR_WATCHPOINTS,
        }
    }
}

/// Monitor state
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum MonitorState {
    /// Machine can execute
    Stopped,
    /// CPU reported it cannot continue
    Halted,
}

/// Why `run` returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// At least one watchpoint changed value
    Watchpoint(Vec<WatchChange>),
    /// The CPU halted
    Halted,
    /// The step budget ran out
    BudgetExhausted,
}

/// Expression evaluation, watchpoints and the step/check loop around an
/// emulated machine
pub struct Monitor<C: Cpu> {
    /// Emulated registers and memory
    machine: Machine,
    /// Stepping capability
    cpu: C,
    /// Active and free watchpoints
    watchpoints: WatchpointPool,
    /// Current state
    state: MonitorState,
    /// Settings the monitor was created with
    config: MonitorConfig,
    /// Instructions executed since creation
    steps: u64,
}

impl<C: Cpu> Monitor<C> {
    /// Create a monitor over a fresh machine
    pub fn new(config: MonitorConfig, cpu: C) -> Self {
        info!(
            "Initialized monitor: {} bytes of memory, {} watchpoint slots",
            config.memory_size, config.watchpoints
        );

        Self {
            machine: Machine::new(config.memory_size),
            cpu,
            watchpoints: WatchpointPool::with_capacity(config.watchpoints),
            state: MonitorState::Stopped,
            config,
            steps: 0,
        }
    }

    /// Copy a raw image into memory at the configured load address and
    /// start execution there
    pub fn load_image(&mut self, path: &Path) -> Result<()> {
        let image = fs::read(path).with_context(|| format!("Failed to read image {}", path.display()))?;
        self.load_bytes(self.config.load_address, &image)
            .with_context(|| format!("Failed to load image {}", path.display()))?;
        self.machine.registers.set_eip(self.config.load_address);

        info!(
            "Loaded {} bytes from {} at 0x{:08x}",
            image.len(),
            path.display(),
            self.config.load_address
        );
        Ok(())
    }

    /// Copy bytes into guest memory
    pub fn load_bytes(&mut self, address: u32, bytes: &[u8]) -> Result<()> {
        self.machine.memory.load_image(address, bytes)?;
        Ok(())
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Instructions executed so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Evaluate an expression against the current machine state
    pub fn evaluate(&self, text: &str) -> Result<u32, ExprError> {
        self.machine.eval_context().evaluate(text)
    }

    /// Create a watchpoint on `text`, remembering its current value.
    ///
    /// # Panics
    ///
    /// Panics if every watchpoint slot is in use.
    pub fn create_watch(&mut self, text: &str) -> Result<usize, ExprError> {
        let value = self.evaluate(text)?;
        let id = self.watchpoints.allocate(text, value);
        info!("Watchpoint {} on '{}' = {}", id, text, value);
        Ok(id)
    }

    /// Delete a watchpoint; `false` if it does not exist
    pub fn delete_watch(&mut self, id: usize) -> bool {
        self.watchpoints.release(id)
    }

    /// Find an active watchpoint
    pub fn lookup_watch(&self, id: usize) -> Option<&Watchpoint> {
        self.watchpoints.lookup(id)
    }

    /// `(id, expression)` for every watchpoint, most recent first
    pub fn list_watches(&self) -> Vec<(usize, &str)> {
        self.watchpoints.entries()
    }

    /// Re-evaluate every watchpoint and return the ones that changed.
    ///
    /// # Panics
    ///
    /// Panics if a watchpoint expression no longer evaluates.
    pub fn check_watches(&mut self) -> Vec<WatchChange> {
        let ctx = self.machine.eval_context();
        self.watchpoints.check_all(&ctx)
    }

    /// Evaluate `expression` as a base address and read `count` words from it
    pub fn examine(&self, count: u32, expression: &str) -> Result<Vec<(u32, u32)>, ExprError> {
        let base = self.evaluate(expression)?;
        (0..count)
            .map(|i| -> Result<(u32, u32), ExprError> {
                let address = base.wrapping_add(i.wrapping_mul(4));
                Ok((address, read_word(&self.machine.memory, address)?))
            })
            .collect()
    }

    /// Execute up to `budget` instructions, checking watchpoints after each
    pub fn run(&mut self, budget: u64) -> Result<StopReason> {
        if self.state == MonitorState::Halted {
            warn!("Machine has halted; nothing to run");
            return Ok(StopReason::Halted);
        }

        debug!("Running for at most {} steps", budget);
        for _ in 0..budget {
            let event = self.cpu.step(&mut self.machine)?;
            self.steps += 1;

            let changes = self.check_watches();
            if event == CpuEvent::Halted {
                info!("Machine halted at eip 0x{:08x} after {} steps", self.machine.registers.eip(), self.steps);
                self.state = MonitorState::Halted;
            }

            if !changes.is_empty() {
                return Ok(StopReason::Watchpoint(changes));
            }
            if self.state == MonitorState::Halted {
                return Ok(StopReason::Halted);
            }
        }

        Ok(StopReason::BudgetExhausted)
    }

    /// Run with the configured budget, the `c` command
    pub fn cont(&mut self) -> Result<StopReason> {
        self.run(self.config.step_budget)
    }
}
