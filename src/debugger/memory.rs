use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

/// Default size of guest physical memory (128 MiB)
pub const DEFAULT_MEMORY_SIZE: usize = 128 * 1024 * 1024;

/// Errors raised by guest memory accesses
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("address 0x{address:08x} (+{len} bytes) is outside guest memory (size 0x{size:x})")]
    OutOfBounds { address: u32, len: usize, size: usize },

    #[error("short read at 0x{address:08x}: wanted {wanted} bytes, got {got}")]
    ShortRead { address: u32, wanted: usize, got: usize },
}

/// Read access to emulated memory, as seen by the expression evaluator
#[cfg_attr(test, mockall::automock)]
pub trait MemoryBus {
    /// Read `len` bytes starting at `address`
    fn read_bytes(&self, address: u32, len: usize) -> Result<Vec<u8>, MemoryError>;
}

/// Read a little-endian 32-bit word through any memory bus
pub fn read_word(bus: &dyn MemoryBus, address: u32) -> Result<u32, MemoryError> {
    let bytes = bus.read_bytes(address, 4)?;
    if bytes.len() < 4 {
        return Err(MemoryError::ShortRead {
            address,
            wanted: 4,
            got: bytes.len(),
        });
    }
    Ok(LittleEndian::read_u32(&bytes))
}

/// Flat, fixed-size guest physical memory
pub struct GuestMemory {
    /// Backing bytes, index == guest physical address
    bytes: Vec<u8>,
}

impl GuestMemory {
    /// Create zeroed guest memory of `size` bytes
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    /// Size of guest memory in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    fn range(&self, address: u32, len: usize) -> Result<std::ops::Range<usize>, MemoryError> {
        let start = address as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            _ => Err(MemoryError::OutOfBounds {
                address,
                len,
                size: self.bytes.len(),
            }),
        }
    }

    /// Borrow a slice of guest memory
    pub fn slice(&self, address: u32, len: usize) -> Result<&[u8], MemoryError> {
        let range = self.range(address, len)?;
        Ok(&self.bytes[range])
    }

    /// Copy `data` into guest memory at `address`
    pub fn write(&mut self, address: u32, data: &[u8]) -> Result<(), MemoryError> {
        let range = self.range(address, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    /// Store a little-endian 32-bit word
    pub fn write_word(&mut self, address: u32, value: u32) -> Result<(), MemoryError> {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        self.write(address, &buf)
    }

    /// Load a raw image at `address`
    pub fn load_image(&mut self, address: u32, image: &[u8]) -> Result<(), MemoryError> {
        self.write(address, image)
    }
}

impl Default for GuestMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_SIZE)
    }
}

impl MemoryBus for GuestMemory {
    fn read_bytes(&self, address: u32, len: usize) -> Result<Vec<u8>, MemoryError> {
        self.slice(address, len).map(<[u8]>::to_vec)
    }
}
