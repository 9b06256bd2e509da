//! Re-bases a backend onto a contiguous sub-range so a register map can be
//! bound to one block of a larger register file.
use std::ops::Range;

use crate::soc::device::{DeviceError, DeviceResult, HardwareBackend};

pub struct WordWindow<B> {
    inner: B,
    base: u32,
    len: u32,
}

impl<B: HardwareBackend> WordWindow<B> {
    pub fn new(inner: B, range: Range<u32>) -> Self {
        Self {
            inner,
            base: range.start,
            len: range.end.saturating_sub(range.start),
        }
    }

    pub fn into_inner(self) -> B {
        self.inner
    }

    fn translate(&self, address: u32) -> DeviceResult<u32> {
        if address >= self.len {
            return Err(DeviceError::OutOfRange {
                address,
                capacity: self.len as usize,
            });
        }
        Ok(self.base + address)
    }
}

impl<B: HardwareBackend> HardwareBackend for WordWindow<B> {
    fn read_word(&mut self, address: u32) -> DeviceResult<u32> {
        let address = self.translate(address)?;
        self.inner.read_word(address)
    }

    fn write_word(&mut self, address: u32, value: u32) -> DeviceResult<()> {
        let address = self.translate(address)?;
        self.inner.write_word(address, value)
    }
}
