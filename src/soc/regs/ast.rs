//! Definition records produced by the register grammar parser and consumed
//! by the flattener and the runtime model.

use std::fmt;

use ahash::AHashMap;

/// Access mode of a register or field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Read only.
    R,
    /// Write only; reads are served from the last written value.
    W,
    /// Read/write.
    RW,
    /// Write pulse; self clearing, reads always observe zero.
    WP,
}

impl Mode {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "R" => Some(Mode::R),
            "W" => Some(Mode::W),
            "RW" => Some(Mode::RW),
            "WP" => Some(Mode::WP),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::R => "R",
            Mode::W => "W",
            Mode::RW => "RW",
            Mode::WP => "WP",
        }
    }

    pub fn is_writable(self) -> bool {
        !matches!(self, Mode::R)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index into the shared definition table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DefId(u32);

impl DefId {
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub offset: u32,
    pub width: u32,
    pub is_bit: bool,
    /// Per-field override; `None` inherits the register mode.
    pub mode: Option<Mode>,
    pub doc: Vec<String>,
    pub line: usize,
}

impl Field {
    pub fn end(&self) -> u32 {
        self.offset + self.width
    }

    pub fn overlaps(&self, other: &Field) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Register {
    pub name: String,
    pub offset: u32,
    pub mode: Mode,
    pub fields: Vec<Field>,
    pub template: Option<DefId>,
    pub doc: Vec<String>,
    pub line: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterArray {
    pub name: String,
    pub base: u32,
    pub count: u32,
    pub mode: Mode,
    pub fields: Vec<Field>,
    pub doc: Vec<String>,
}

/// Two registers sharing one address: the read port then the write port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RwPair {
    pub read: Register,
    pub write: Register,
}

/// Registers multiplexed onto one address. Each register's `offset` holds
/// its selection index, never an address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Overlay {
    pub name: String,
    pub offset: u32,
    pub mode: Mode,
    pub registers: Vec<Register>,
    pub doc: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Union {
    pub name: Option<String>,
    pub base: u32,
    pub size: u32,
    pub content: Vec<Entry>,
    pub doc: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub base: u32,
    pub span: u32,
    pub hidden: bool,
    pub content: Vec<Entry>,
    pub template: Option<DefId>,
    pub doc: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    Group(Group),
    Register(Register),
    Array(RegisterArray),
    RwPair(RwPair),
    Overlay(Overlay),
    Union(Union),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constant {
    pub name: String,
    pub value: u64,
    pub doc: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SharedDef {
    Group(Group),
    Register(Register),
}

impl SharedDef {
    pub fn name(&self) -> &str {
        match self {
            SharedDef::Group(group) => &group.name,
            SharedDef::Register(reg) => &reg.name,
        }
    }
}

/// Shared `:name` definitions, stored by id with a name index on the side.
#[derive(Clone, Debug, Default)]
pub struct SharedTable {
    defs: Vec<SharedDef>,
    index: AHashMap<String, DefId>,
}

impl SharedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` when the name is already taken.
    pub fn insert(&mut self, def: SharedDef) -> Option<DefId> {
        if self.index.contains_key(def.name()) {
            return None;
        }
        let id = DefId::from_index(self.defs.len());
        self.index.insert(def.name().to_string(), id);
        self.defs.push(def);
        Some(id)
    }

    pub fn lookup(&self, name: &str) -> Option<DefId> {
        self.index.get(name).copied()
    }

    pub fn get(&self, id: DefId) -> &SharedDef {
        &self.defs[id.index()]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SharedDef> {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Result of parsing one or more definition sources.
#[derive(Clone, Debug, Default)]
pub struct Definitions {
    pub shared: SharedTable,
    pub groups: Vec<Group>,
    pub constants: Vec<Constant>,
}

impl Definitions {
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.name == name)
    }

    pub fn constant(&self, name: &str) -> Option<u64> {
        self.constants
            .iter()
            .find(|constant| constant.name == name)
            .map(|constant| constant.value)
    }
}

/// Definitions with every shared reference inlined and every address absolute.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlatDefinitions {
    pub groups: Vec<Group>,
    pub constants: Vec<Constant>,
}

impl FlatDefinitions {
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.name == name)
    }

    pub fn constant(&self, name: &str) -> Option<u64> {
        self.constants
            .iter()
            .find(|constant| constant.name == name)
            .map(|constant| constant.value)
    }
}
