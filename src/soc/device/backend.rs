//! Defines the `HardwareBackend` trait consumed by both register engines.
//! A backend exposes blocking word reads and writes addressed by register
//! number; sizing, mapping and retry policy all live behind it.
use super::error::DeviceResult;

pub trait HardwareBackend {
    /// Reads one 32-bit word. Reads may have side effects on real hardware.
    fn read_word(&mut self, address: u32) -> DeviceResult<u32>;

    /// Writes one 32-bit word.
    fn write_word(&mut self, address: u32, value: u32) -> DeviceResult<()>;
}

impl<B: HardwareBackend + ?Sized> HardwareBackend for &mut B {
    #[inline(always)]
    fn read_word(&mut self, address: u32) -> DeviceResult<u32> {
        (**self).read_word(address)
    }

    #[inline(always)]
    fn write_word(&mut self, address: u32, value: u32) -> DeviceResult<()> {
        (**self).write_word(address, value)
    }
}

impl<B: HardwareBackend + ?Sized> HardwareBackend for Box<B> {
    #[inline(always)]
    fn read_word(&mut self, address: u32) -> DeviceResult<u32> {
        (**self).read_word(address)
    }

    #[inline(always)]
    fn write_word(&mut self, address: u32, value: u32) -> DeviceResult<()> {
        (**self).write_word(address, value)
    }
}
