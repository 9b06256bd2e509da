use std::sync::Arc;

use super::layout::FieldTable;
use crate::soc::regs::bits;
use crate::soc::regs::{RegError, RegResult};

/// Detached image of one register value. Field updates compose here and
/// reach hardware in a single write through
/// [`RegisterMap::commit`](super::RegisterMap::commit).
#[derive(Clone, Debug)]
pub struct FieldSet {
    register: String,
    layout: Arc<FieldTable>,
    value: u32,
}

impl FieldSet {
    pub(super) fn new(register: &str, layout: Arc<FieldTable>, value: u32) -> Self {
        Self {
            register: register.to_string(),
            layout,
            value,
        }
    }

    pub fn register(&self) -> &str {
        &self.register
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn get(&self, field: &str) -> RegResult<u32> {
        let info = self.layout.get(field).ok_or_else(|| self.no_such_field(field))?;
        Ok(bits::extract(self.value, info.offset, info.width))
    }

    pub fn set(&mut self, field: &str, value: u64) -> RegResult<&mut Self> {
        let info = self.layout.get(field).ok_or_else(|| self.no_such_field(field))?;
        if !info.mode.is_writable() {
            return Err(RegError::ReadOnly {
                name: format!("{}.{}", self.register, field),
            });
        }
        if !bits::fits(value, info.width) {
            return Err(RegError::ValueTooWide {
                name: format!("{}.{}", self.register, field),
                value,
                width: info.width,
            });
        }
        self.value = bits::insert(self.value, info.offset, info.width, value);
        Ok(self)
    }

    /// `(name, value)` for every field in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.layout
            .iter()
            .map(|info| (info.name.as_str(), bits::extract(self.value, info.offset, info.width)))
    }

    fn no_such_field(&self, field: &str) -> RegError {
        RegError::NoSuchField {
            register: self.register.clone(),
            field: field.to_string(),
        }
    }
}
