use std::path::PathBuf;

use regmap::soc::device::{DeviceResult, HardwareBackend, WordMemory};

/// Echoing word store that records every access in order.
pub struct Recorder {
    memory: WordMemory,
    pub reads: Vec<u32>,
    pub writes: Vec<(u32, u32)>,
}

impl Recorder {
    pub fn new(len: usize) -> Self {
        Self {
            memory: WordMemory::new("recorder", len),
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Sets a word without recording it, as if the device changed it.
    pub fn poke(&mut self, address: u32, value: u32) {
        self.memory
            .write_word(address, value)
            .expect("poke inside recorder bounds");
    }

    // Only the register map tests inspect memory directly.
    #[allow(dead_code)]
    pub fn peek(&self, address: u32) -> u32 {
        self.memory.peek(address).expect("peek inside recorder bounds")
    }
}

impl HardwareBackend for Recorder {
    fn read_word(&mut self, address: u32) -> DeviceResult<u32> {
        self.reads.push(address);
        self.memory.read_word(address)
    }

    fn write_word(&mut self, address: u32, value: u32) -> DeviceResult<()> {
        self.writes.push((address, value));
        self.memory.write_word(address, value)
    }
}

pub fn defs_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("defs").join(name)
}
