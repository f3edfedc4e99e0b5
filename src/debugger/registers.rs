use std::fmt;

/// i386 general purpose register IDs, in encoding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Eax, Ecx, Edx, Ebx, Esp, Ebp, Esi, Edi,
}

impl Register {
    /// All general purpose registers in encoding order
    pub const ALL: [Register; 8] = [
        Register::Eax, Register::Ecx, Register::Edx, Register::Ebx,
        Register::Esp, Register::Ebp, Register::Esi, Register::Edi,
    ];

    /// 32-bit name
    pub fn name(self) -> &'static str {
        REG_NAMES_32[self as usize]
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const REG_NAMES_32: [&str; 8] = ["eax", "ecx", "edx", "ebx", "esp", "ebp", "esi", "edi"];
const REG_NAMES_16: [&str; 8] = ["ax", "cx", "dx", "bx", "sp", "bp", "si", "di"];
const REG_NAMES_8: [&str; 8] = ["al", "cl", "dl", "bl", "ah", "ch", "dh", "bh"];

/// Name-based register lookup, the only view the evaluator has of the CPU
#[cfg_attr(test, mockall::automock)]
pub trait RegisterFile {
    /// Value of the named register, `None` if no such register exists
    fn read_register(&self, name: &str) -> Option<u32>;

    /// Every name `read_register` accepts
    fn register_names(&self) -> Vec<&'static str>;
}

/// Register values for the emulated CPU
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers {
    /// General purpose registers, indexed by `Register`
    gpr: [u32; 8],
    /// Instruction pointer
    eip: u32,
}

impl Registers {
    /// Create a register set with everything zeroed
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a register value
    pub fn set(&mut self, reg: Register, value: u32) {
        self.gpr[reg as usize] = value;
    }

    /// Get a register value
    pub fn get(&self, reg: Register) -> u32 {
        self.gpr[reg as usize]
    }

    pub fn eip(&self) -> u32 {
        self.eip
    }

    pub fn set_eip(&mut self, value: u32) {
        self.eip = value;
    }

    /// Low 16 bits of a register
    pub fn get_word(&self, reg: Register) -> u16 {
        self.get(reg) as u16
    }

    /// 8-bit view: indices 0-3 are al..bl, 4-7 are ah..bh
    fn get_byte(&self, index: usize) -> u8 {
        let value = self.gpr[index & 0x3];
        if index < 4 {
            value as u8
        } else {
            (value >> 8) as u8
        }
    }

    /// Update multiple registers at once
    pub fn update(&mut self, updates: impl IntoIterator<Item = (Register, u32)>) {
        for (reg, value) in updates {
            self.set(reg, value);
        }
    }

    /// Clear all register values
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl RegisterFile for Registers {
    fn read_register(&self, name: &str) -> Option<u32> {
        if name == "eip" {
            return Some(self.eip);
        }
        if let Some(i) = REG_NAMES_32.iter().position(|n| *n == name) {
            return Some(self.gpr[i]);
        }
        if let Some(i) = REG_NAMES_16.iter().position(|n| *n == name) {
            return Some(u32::from(self.get_word(Register::ALL[i])));
        }
        REG_NAMES_8
            .iter()
            .position(|n| *n == name)
            .map(|i| u32::from(self.get_byte(i)))
    }

    fn register_names(&self) -> Vec<&'static str> {
        REG_NAMES_32
            .iter()
            .chain(REG_NAMES_16.iter())
            .chain(REG_NAMES_8.iter())
            .copied()
            .chain(std::iter::once("eip"))
            .collect()
    }
}
