use std::ops::{Deref, DerefMut};

use log::error;

use super::FieldWriter;
use crate::soc::device::HardwareBackend;
use crate::soc::regs::RegResult;

/// Holds a [`FieldWriter`] in cached mode. Leaving the scope, by `commit` or
/// by drop, switches it back to live mode and flushes every dirty register.
pub struct Batch<'a, B: HardwareBackend> {
    writer: &'a mut FieldWriter<B>,
    done: bool,
}

impl<'a, B: HardwareBackend> Batch<'a, B> {
    pub(super) fn new(writer: &'a mut FieldWriter<B>) -> Self {
        writer.enable_write(false);
        Self {
            writer,
            done: false,
        }
    }

    /// Ends the batch, reporting a failed flush instead of logging it.
    pub fn commit(mut self) -> RegResult<()> {
        self.done = true;
        self.writer.enable_write(true);
        self.writer.flush_all()
    }
}

impl<B: HardwareBackend> Deref for Batch<'_, B> {
    type Target = FieldWriter<B>;

    fn deref(&self) -> &Self::Target {
        self.writer
    }
}

impl<B: HardwareBackend> DerefMut for Batch<'_, B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.writer
    }
}

impl<B: HardwareBackend> Drop for Batch<'_, B> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        self.writer.enable_write(true);
        if let Err(err) = self.writer.flush_all() {
            error!("flush at end of batch failed: {err}");
        }
    }
}
