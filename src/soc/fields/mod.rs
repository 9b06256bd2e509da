//! Field cache for devices programmed through packed register fields.
//!
//! Writes are staged in a register cache while the writer is in cached mode
//! and go straight to the backend in live mode. Dirty registers are written
//! out in ascending address order by [`FieldWriter::flush`].

mod batch;
pub mod bitfield;

pub use batch::Batch;
pub use bitfield::{BitFieldSpec, BitFieldSpecBuilder, FieldSegment};

use std::collections::BTreeSet;

use ahash::AHashMap;
use log::trace;

use crate::loader::fielddefs::{self, FieldDef, NamedDef};
use crate::soc::device::HardwareBackend;
use crate::soc::regs::bits;
use crate::soc::regs::{RegError, RegResult};

pub struct FieldWriter<B: HardwareBackend> {
    backend: B,
    live: bool,
    registers: AHashMap<u32, u32>,
    dirty: BTreeSet<u32>,
    fields: AHashMap<String, BitFieldSpec>,
    names: Vec<String>,
}

impl<B: HardwareBackend> FieldWriter<B> {
    /// Builds a writer in cached mode and seeds the cache: every writable
    /// field receives its default and every constant its value, in
    /// definition order. Nothing reaches the backend until a flush.
    pub fn new(backend: B, defs: &[NamedDef]) -> RegResult<Self> {
        let mut writer = Self {
            backend,
            live: false,
            registers: AHashMap::new(),
            dirty: BTreeSet::new(),
            fields: AHashMap::with_capacity(defs.len()),
            names: Vec::new(),
        };
        for def in defs {
            match &def.def {
                FieldDef::Field(subs) => {
                    let spec = BitFieldSpec::from_sub_fields(subs);
                    if spec.total_width() > 64 {
                        return Err(RegError::parse(
                            format!("field {} wider than 64 bits", def.name),
                            def.line,
                        ));
                    }
                    let seed = (!spec.read_only).then_some(spec.default);
                    writer.names.push(def.name.clone());
                    writer.fields.insert(def.name.clone(), spec);
                    if let Some(default) = seed {
                        writer.write(&def.name, default)?;
                    }
                }
                FieldDef::Constant { register, value } => {
                    writer.write_register(*register, *value)?;
                }
            }
        }
        Ok(writer)
    }

    /// Parses `src` in the flat field format and builds a writer from it.
    pub fn from_source(backend: B, src: &str) -> RegResult<Self> {
        Self::new(backend, &fielddefs::parse_field_file(src)?)
    }

    /// Switches between live and cached mode. Does not flush.
    pub fn enable_write(&mut self, live: bool) {
        self.live = live;
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn write_register(&mut self, register: u32, value: u32) -> RegResult<()> {
        self.registers.insert(register, value);
        if self.live {
            self.backend.write_word(register, value)?;
            self.dirty.remove(&register);
        } else {
            trace!("cache[{register:#04x}] <= {value:#x}");
            self.dirty.insert(register);
        }
        Ok(())
    }

    pub fn read_register(&mut self, register: u32) -> RegResult<u32> {
        if self.live {
            let value = self.backend.read_word(register)?;
            self.registers.insert(register, value);
            self.dirty.remove(&register);
            Ok(value)
        } else {
            Ok(*self.registers.entry(register).or_insert(0))
        }
    }

    fn spec(&self, name: &str) -> RegResult<&BitFieldSpec> {
        self.field(name).ok_or_else(|| RegError::NoSuchField {
            register: "field writer".to_string(),
            field: name.to_string(),
        })
    }

    /// Writes a named field, consuming `value` low bits first across its
    /// registers. Each register is read back first to preserve its other bits.
    pub fn write(&mut self, name: &str, value: u64) -> RegResult<()> {
        let spec = self.spec(name)?;
        if spec.read_only {
            return Err(RegError::ReadOnly {
                name: name.to_string(),
            });
        }
        let width = spec.total_width();
        if !bits::fits(value, width) {
            return Err(RegError::ValueTooWide {
                name: name.to_string(),
                value,
                width,
            });
        }
        let segments = spec.segments.clone();
        let mut rest = value;
        for segment in segments {
            let current = self.read_register(segment.register)?;
            let updated = bits::insert(current, segment.offset, segment.width, rest);
            rest = rest.checked_shr(segment.width).unwrap_or(0);
            self.write_register(segment.register, updated)?;
        }
        Ok(())
    }

    /// Reads a named field, most significant register first.
    pub fn read(&mut self, name: &str) -> RegResult<u64> {
        let segments = self.spec(name)?.segments.clone();
        let mut value = 0u64;
        for segment in segments.iter().rev() {
            let word = self.read_register(segment.register)?;
            let part = bits::extract(word, segment.offset, segment.width);
            value = value.checked_shl(segment.width).unwrap_or(0) | u64::from(part);
        }
        Ok(value)
    }

    /// Writes every dirty register in `first..=last`, ascending. Live mode
    /// only. An inverted range selects nothing.
    pub fn flush(&mut self, first: u32, last: u32) -> RegResult<()> {
        if !self.live {
            return Err(RegError::NotLive);
        }
        if first > last {
            return Ok(());
        }
        let pending: Vec<u32> = self.dirty.range(first..=last).copied().collect();
        for register in pending {
            let value = self.registers.get(&register).copied().unwrap_or(0);
            self.write_register(register, value)?;
        }
        Ok(())
    }

    pub fn flush_all(&mut self) -> RegResult<()> {
        self.flush(u32::MIN, u32::MAX)
    }

    /// Enters cached mode until the returned guard is committed or dropped.
    pub fn begin_batch(&mut self) -> Batch<'_, B> {
        Batch::new(self)
    }

    /// Runs `f` in cached mode, then returns to live mode and flushes. The
    /// flush happens even when `f` fails; `f`'s error wins over a flush error.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> RegResult<R>) -> RegResult<R> {
        let mut guard = self.begin_batch();
        let result = f(&mut *guard);
        match result {
            Ok(value) => guard.commit().map(|()| value),
            Err(err) => {
                drop(guard);
                Err(err)
            }
        }
    }

    pub fn dirty(&self) -> impl Iterator<Item = u32> + '_ {
        self.dirty.iter().copied()
    }

    /// Last known value of `register`, without touching the backend.
    pub fn cached(&self, register: u32) -> Option<u32> {
        self.registers.get(&register).copied()
    }

    pub fn field(&self, name: &str) -> Option<&BitFieldSpec> {
        self.fields.get(name)
    }

    /// Field names in definition order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}
