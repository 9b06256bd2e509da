//! Register accessors bound to a hardware backend.
//!
//! A [`RegisterMap`] mirrors one flattened top level group. Navigation
//! returns lightweight [`Accessor`] values; register and field access goes
//! through the map, which owns the backend and the values cached for
//! write-only registers.
//!
//! | mode | read                      | write                    |
//! |------|---------------------------|--------------------------|
//! | `R`  | hardware                  | rejected                 |
//! | `RW` | hardware                  | hardware                 |
//! | `W`  | last written value, or 0  | hardware, value cached   |
//! | `WP` | always 0                  | hardware                 |

mod fieldset;
pub mod layout;
pub mod path;

pub use fieldset::FieldSet;
pub use layout::{FieldInfo, FieldTable, Layout, Node, NodeId};
pub use path::{PathSegment, RegisterPath};

use std::fmt::Write;
use std::sync::Arc;

use ahash::AHashMap;
use log::trace;

use crate::soc::device::HardwareBackend;
use crate::soc::regs::ast::{FlatDefinitions, Group, Mode};
use crate::soc::regs::bits;
use crate::soc::regs::{RegError, RegResult};

/// One concrete register: a register node, or an array element with its own address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterHandle {
    node: NodeId,
    address: u32,
}

impl RegisterHandle {
    pub fn address(self) -> u32 {
        self.address
    }

    pub fn node(self) -> NodeId {
        self.node
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accessor {
    Register(RegisterHandle),
    Array(NodeId),
    Group(NodeId),
    Overlay(NodeId),
    Union(NodeId),
}

impl Accessor {
    pub fn node(self) -> NodeId {
        match self {
            Accessor::Register(handle) => handle.node,
            Accessor::Array(id)
            | Accessor::Group(id)
            | Accessor::Overlay(id)
            | Accessor::Union(id) => id,
        }
    }
}

/// Starting value of a [`FieldSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Seed {
    Zero,
    /// Read the register first. Costs a hardware read for `R` and `RW`.
    Current,
}

pub struct RegisterMap<B: HardwareBackend> {
    layout: Arc<Layout>,
    backend: B,
    write_cache: AHashMap<u32, u32>,
}

impl<B: HardwareBackend> RegisterMap<B> {
    /// Builds accessors for a flattened group. Fails when a name is defined
    /// twice in one namespace.
    pub fn new(group: &Group, backend: B) -> RegResult<Self> {
        Ok(Self::with_layout(Arc::new(Layout::build(group)?), backend))
    }

    /// Reuses an already built layout, e.g. for several instances of one device.
    pub fn with_layout(layout: Arc<Layout>, backend: B) -> Self {
        Self {
            layout,
            backend,
            write_cache: AHashMap::new(),
        }
    }

    /// One map per top level group, each bound to the backend `backend_for`
    /// returns for it.
    pub fn load_all(
        defs: &FlatDefinitions,
        mut backend_for: impl FnMut(&Group) -> B,
    ) -> RegResult<Vec<Self>> {
        defs.groups
            .iter()
            .map(|group| Self::new(group, backend_for(group)))
            .collect()
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    pub fn name(&self) -> &str {
        self.layout.node(self.layout.root()).name()
    }

    pub fn root(&self) -> Accessor {
        Accessor::Group(self.layout.root())
    }

    fn accessor_for(&self, id: NodeId) -> Accessor {
        match self.layout.node(id) {
            Node::Register { address, .. } => Accessor::Register(RegisterHandle {
                node: id,
                address: *address,
            }),
            Node::Array { .. } => Accessor::Array(id),
            Node::Group { .. } => Accessor::Group(id),
            Node::Overlay { .. } => Accessor::Overlay(id),
            Node::Union { .. } => Accessor::Union(id),
        }
    }

    fn wrong_kind(&self, accessor: Accessor, expected: &'static str) -> RegError {
        RegError::WrongKind {
            name: self.layout.node(accessor.node()).name().to_string(),
            expected,
        }
    }

    /// Child `name` of a group, overlay or union.
    pub fn member(&self, scope: Accessor, name: &str) -> RegResult<Accessor> {
        let node = self.layout.node(scope.node());
        let members = match scope {
            Accessor::Register(_) | Accessor::Array(_) => None,
            _ => node.members(),
        }
        .ok_or_else(|| self.wrong_kind(scope, "a group"))?;
        let id = members.get(name).ok_or_else(|| RegError::NoSuchMember {
            scope: node.name().to_string(),
            name: name.to_string(),
        })?;
        Ok(self.accessor_for(id))
    }

    /// Element `index` of a register array.
    pub fn index(&self, array: Accessor, index: usize) -> RegResult<Accessor> {
        let Accessor::Array(id) = array else {
            return Err(self.wrong_kind(array, "a register array"));
        };
        let Node::Array {
            name, base, count, ..
        } = self.layout.node(id)
        else {
            return Err(self.wrong_kind(array, "a register array"));
        };
        if index >= *count as usize {
            return Err(RegError::IndexOutOfRange {
                name: name.clone(),
                index,
                count: *count as usize,
            });
        }
        let address = u32::try_from(index)
            .ok()
            .and_then(|index| base.checked_add(index))
            .ok_or_else(|| RegError::AddressOverflow {
                name: format!("{name}[{index}]"),
            })?;
        Ok(Accessor::Register(RegisterHandle { node: id, address }))
    }

    /// Overlay member by selection index.
    pub fn select(&self, overlay: Accessor, index: usize) -> RegResult<Accessor> {
        let Node::Overlay {
            name, selection, ..
        } = self.layout.node(overlay.node())
        else {
            return Err(self.wrong_kind(overlay, "an overlay"));
        };
        let id = selection
            .get(index)
            .copied()
            .ok_or_else(|| RegError::IndexOutOfRange {
                name: name.clone(),
                index,
                count: selection.len(),
            })?;
        Ok(self.accessor_for(id))
    }

    /// Resolves a dotted path from the root group. `[n]` indexes arrays and
    /// selects overlay members.
    pub fn resolve(&self, path: &str) -> RegResult<Accessor> {
        let parsed = RegisterPath::parse(path)?;
        let mut current = self.root();
        for segment in parsed.segments() {
            current = match *segment {
                PathSegment::Member(name) => self.member(current, name)?,
                PathSegment::Index(index) => match current {
                    Accessor::Overlay(_) => self.select(current, index)?,
                    _ => self.index(current, index)?,
                },
            };
        }
        Ok(current)
    }

    /// Resolves `path` and insists it names a single register.
    pub fn register(&self, path: &str) -> RegResult<RegisterHandle> {
        match self.resolve(path)? {
            Accessor::Register(handle) => Ok(handle),
            other => Err(self.wrong_kind(other, "a register")),
        }
    }

    fn register_parts(&self, reg: RegisterHandle) -> (&str, Mode, &Arc<FieldTable>) {
        match self.layout.node(reg.node) {
            Node::Register {
                name, mode, layout, ..
            }
            | Node::Array {
                name, mode, layout, ..
            } => (name.as_str(), *mode, layout),
            // handles are only minted for registers and array elements
            other => unreachable!("register handle on {}", other.kind()),
        }
    }

    pub fn register_name(&self, reg: RegisterHandle) -> &str {
        self.register_parts(reg).0
    }

    pub fn mode(&self, reg: RegisterHandle) -> Mode {
        self.register_parts(reg).1
    }

    pub fn fields_of(&self, reg: RegisterHandle) -> &FieldTable {
        self.register_parts(reg).2
    }

    pub fn read(&mut self, reg: RegisterHandle) -> RegResult<u32> {
        let value = match self.mode(reg) {
            Mode::R | Mode::RW => {
                let value = self.backend.read_word(reg.address)?;
                trace!(
                    "{}[{:03X}] => {value:08X}",
                    self.register_name(reg),
                    reg.address
                );
                value
            }
            Mode::W => self.write_cache.get(&reg.address).copied().unwrap_or(0),
            Mode::WP => 0,
        };
        Ok(value)
    }

    pub fn write(&mut self, reg: RegisterHandle, value: u32) -> RegResult<()> {
        let mode = self.mode(reg);
        if !mode.is_writable() {
            return Err(RegError::ReadOnly {
                name: self.register_name(reg).to_string(),
            });
        }
        trace!(
            "{}[{:03X}] <= {value:08X}",
            self.register_name(reg),
            reg.address
        );
        self.backend.write_word(reg.address, value)?;
        if mode == Mode::W {
            self.write_cache.insert(reg.address, value);
        }
        Ok(())
    }

    fn field_info(&self, reg: RegisterHandle, field: &str) -> RegResult<&FieldInfo> {
        let (name, _, layout) = self.register_parts(reg);
        layout.get(field).ok_or_else(|| RegError::NoSuchField {
            register: name.to_string(),
            field: field.to_string(),
        })
    }

    pub fn read_field(&mut self, reg: RegisterHandle, field: &str) -> RegResult<u32> {
        let info = self.field_info(reg, field)?;
        let (offset, width) = (info.offset, info.width);
        Ok(bits::extract(self.read(reg)?, offset, width))
    }

    /// Field value read as two's complement of the field width.
    pub fn read_field_signed(&mut self, reg: RegisterHandle, field: &str) -> RegResult<i64> {
        let width = self.field_info(reg, field)?.width;
        let raw = self.read_field(reg, field)?;
        Ok(bits::to_signed(u64::from(raw), width))
    }

    /// Read-modify-write of one field. For `W` and `WP` registers the
    /// "read" comes from the cache, so only the write reaches hardware.
    pub fn write_field(&mut self, reg: RegisterHandle, field: &str, value: u64) -> RegResult<()> {
        let mut set = self.fields(reg, Seed::Current)?;
        set.set(field, value)?;
        self.commit(reg, &set)
    }

    /// Snapshot of every field, to be updated and written back with [`commit`](Self::commit).
    pub fn fields(&mut self, reg: RegisterHandle, seed: Seed) -> RegResult<FieldSet> {
        let value = match seed {
            Seed::Zero => 0,
            Seed::Current => self.read(reg)?,
        };
        let (name, _, layout) = self.register_parts(reg);
        Ok(FieldSet::new(name, Arc::clone(layout), value))
    }

    pub fn commit(&mut self, reg: RegisterHandle, set: &FieldSet) -> RegResult<()> {
        self.write(reg, set.value())
    }

    /// Updates several fields with a single register write.
    pub fn write_fields(
        &mut self,
        reg: RegisterHandle,
        seed: Seed,
        updates: &[(&str, u64)],
    ) -> RegResult<()> {
        let mut set = self.fields(reg, seed)?;
        for (field, value) in updates {
            set.set(field, *value)?;
        }
        self.commit(reg, &set)
    }

    /// `<Reg NAME @addr A = 1, B = 2>`, or the raw value when the register has no fields.
    pub fn describe(&mut self, reg: RegisterHandle) -> RegResult<String> {
        let set = self.fields(reg, Seed::Current)?;
        let mut out = format!("<Reg {} @{}", set.register(), reg.address);
        if self.fields_of(reg).is_empty() {
            let _ = write!(out, " {}", set.value());
        } else {
            for (position, (name, value)) in set.iter().enumerate() {
                let sep = if position == 0 { " " } else { ", " };
                let _ = write!(out, "{sep}{name} = {value}");
            }
        }
        out.push('>');
        Ok(out)
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
