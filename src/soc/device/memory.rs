use log::trace;

use crate::soc::device::{DeviceError, DeviceResult, HardwareBackend};

/// In-memory word store standing in for a mapped register file.
pub struct WordMemory {
    name: String,
    words: Vec<u32>,
}

impl WordMemory {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            words: vec![0_u32; len],
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Side-effect free view of the backing words.
    pub fn peek(&self, address: u32) -> Option<u32> {
        self.words.get(address as usize).copied()
    }

    fn slot(&mut self, address: u32) -> DeviceResult<&mut u32> {
        let capacity = self.words.len();
        self.words
            .get_mut(address as usize)
            .ok_or(DeviceError::OutOfRange { address, capacity })
    }
}

impl HardwareBackend for WordMemory {
    fn read_word(&mut self, address: u32) -> DeviceResult<u32> {
        let value = *self.slot(address)?;
        trace!("{}[{address:03X}] => {value:08X}", self.name);
        Ok(value)
    }

    fn write_word(&mut self, address: u32, value: u32) -> DeviceResult<()> {
        *self.slot(address)? = value;
        trace!("{}[{address:03X}] <= {value:08X}", self.name);
        Ok(())
    }
}
