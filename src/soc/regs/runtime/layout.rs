//! Accessor arena built from a flattened group.

use std::sync::Arc;

use ahash::AHashMap;

use crate::soc::regs::ast::{Entry, Field, Group, Mode, Overlay, Register, Union};
use crate::soc::regs::{RegError, RegResult};

/// Index into the accessor arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A field with its mode already resolved against the owning register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub offset: u32,
    pub width: u32,
    pub is_bit: bool,
    pub mode: Mode,
    pub doc: Vec<String>,
}

/// Name to field lookup for one register layout. Array elements share one table.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FieldTable {
    fields: Vec<FieldInfo>,
    index: AHashMap<String, usize>,
}

impl FieldTable {
    pub fn new(register: &str, fields: &[Field], mode: Mode) -> RegResult<Self> {
        let mut table = Self::default();
        for field in fields {
            if table.index.contains_key(&field.name) {
                return Err(RegError::DuplicateName {
                    scope: register.to_string(),
                    name: field.name.clone(),
                });
            }
            table.index.insert(field.name.clone(), table.fields.len());
            table.fields.push(FieldInfo {
                name: field.name.clone(),
                offset: field.offset,
                width: field.width,
                is_bit: field.is_bit,
                mode: field.mode.unwrap_or(mode),
                doc: field.doc.clone(),
            });
        }
        Ok(table)
    }

    pub fn get(&self, name: &str) -> Option<&FieldInfo> {
        self.index.get(name).map(|&slot| &self.fields[slot])
    }

    /// Fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Named children of a scope, in declaration order.
#[derive(Debug, Default)]
pub struct Members {
    index: AHashMap<String, NodeId>,
    order: Vec<(String, NodeId)>,
}

impl Members {
    fn insert(&mut self, scope: &str, name: &str, id: NodeId) -> RegResult<()> {
        if self.index.insert(name.to_string(), id).is_some() {
            return Err(RegError::DuplicateName {
                scope: scope.to_string(),
                name: name.to_string(),
            });
        }
        self.order.push((name.to_string(), id));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.order.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug)]
pub enum Node {
    Register {
        name: String,
        address: u32,
        mode: Mode,
        layout: Arc<FieldTable>,
        doc: Vec<String>,
    },
    Array {
        name: String,
        base: u32,
        count: u32,
        mode: Mode,
        layout: Arc<FieldTable>,
    },
    Group {
        name: String,
        base: u32,
        span: u32,
        members: Members,
    },
    /// Every member sits at `address`; `selection` lists them by index.
    Overlay {
        name: String,
        address: u32,
        mode: Mode,
        members: Members,
        selection: Vec<NodeId>,
    },
    Union {
        name: Option<String>,
        base: u32,
        size: u32,
        members: Members,
    },
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Register { name, .. }
            | Node::Array { name, .. }
            | Node::Group { name, .. }
            | Node::Overlay { name, .. } => name,
            Node::Union { name, .. } => name.as_deref().unwrap_or("<union>"),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Register { .. } => "a register",
            Node::Array { .. } => "a register array",
            Node::Group { .. } => "a group",
            Node::Overlay { .. } => "an overlay",
            Node::Union { .. } => "a union",
        }
    }

    pub fn members(&self) -> Option<&Members> {
        match self {
            Node::Group { members, .. }
            | Node::Overlay { members, .. }
            | Node::Union { members, .. } => Some(members),
            _ => None,
        }
    }
}

/// Arena of accessor nodes for one top level group; the root is pushed last.
#[derive(Debug)]
pub struct Layout {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Layout {
    pub fn build(group: &Group) -> RegResult<Self> {
        let mut nodes = Vec::new();
        let root = build_group(&mut nodes, group)?;
        Ok(Self { nodes, root })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn push(nodes: &mut Vec<Node>, node: Node) -> NodeId {
    let id = NodeId::from_index(nodes.len());
    nodes.push(node);
    id
}

fn register_node(reg: &Register, address: u32, mode: Mode) -> RegResult<Node> {
    Ok(Node::Register {
        name: reg.name.clone(),
        address,
        mode,
        layout: Arc::new(FieldTable::new(&reg.name, &reg.fields, mode)?),
        doc: reg.doc.clone(),
    })
}

fn build_group(nodes: &mut Vec<Node>, group: &Group) -> RegResult<NodeId> {
    let mut members = Members::default();
    add_entries(nodes, &mut members, &group.name, &group.content)?;
    Ok(push(
        nodes,
        Node::Group {
            name: group.name.clone(),
            base: group.base,
            span: group.span,
            members,
        },
    ))
}

/// Adds `entries` to `members`. Hidden groups, register pairs and unions
/// contribute their children directly.
fn add_entries(
    nodes: &mut Vec<Node>,
    members: &mut Members,
    scope: &str,
    entries: &[Entry],
) -> RegResult<()> {
    for entry in entries {
        match entry {
            Entry::Register(reg) => {
                let id = push(nodes, register_node(reg, reg.offset, reg.mode)?);
                members.insert(scope, &reg.name, id)?;
            }
            Entry::Array(array) => {
                let layout = FieldTable::new(&array.name, &array.fields, array.mode)?;
                let id = push(
                    nodes,
                    Node::Array {
                        name: array.name.clone(),
                        base: array.base,
                        count: array.count,
                        mode: array.mode,
                        layout: Arc::new(layout),
                    },
                );
                members.insert(scope, &array.name, id)?;
            }
            Entry::Group(group) if group.hidden => {
                add_entries(nodes, members, scope, &group.content)?;
            }
            Entry::Group(group) => {
                let id = build_group(nodes, group)?;
                members.insert(scope, &group.name, id)?;
            }
            Entry::RwPair(pair) => {
                for reg in [&pair.read, &pair.write] {
                    let id = push(nodes, register_node(reg, reg.offset, reg.mode)?);
                    members.insert(scope, &reg.name, id)?;
                }
            }
            Entry::Overlay(overlay) => {
                let id = build_overlay(nodes, overlay)?;
                members.insert(scope, &overlay.name, id)?;
            }
            Entry::Union(union) => {
                let id = build_union(nodes, union)?;
                if let Node::Union { members: spliced, .. } = &nodes[id.index()] {
                    for (name, child) in spliced.iter() {
                        members.insert(scope, name, child)?;
                    }
                }
                if let Some(name) = &union.name {
                    members.insert(scope, name, id)?;
                }
            }
        }
    }
    Ok(())
}

fn build_overlay(nodes: &mut Vec<Node>, overlay: &Overlay) -> RegResult<NodeId> {
    let mut members = Members::default();
    let mut selection = Vec::with_capacity(overlay.registers.len());
    for reg in &overlay.registers {
        let id = push(nodes, register_node(reg, overlay.offset, overlay.mode)?);
        members.insert(&overlay.name, &reg.name, id)?;
        selection.push(id);
    }
    Ok(push(
        nodes,
        Node::Overlay {
            name: overlay.name.clone(),
            address: overlay.offset,
            mode: overlay.mode,
            members,
            selection,
        },
    ))
}

fn build_union(nodes: &mut Vec<Node>, union: &Union) -> RegResult<NodeId> {
    let scope = union.name.as_deref().unwrap_or("<union>");
    let mut members = Members::default();
    add_entries(nodes, &mut members, scope, &union.content)?;
    Ok(push(
        nodes,
        Node::Union {
            name: union.name.clone(),
            base: union.base,
            size: union.size,
            members,
        },
    ))
}
