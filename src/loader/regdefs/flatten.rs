//! Inlines shared references and turns group relative offsets into absolute
//! addresses. The input definitions are left untouched.

use super::fields::ensure_disjoint;
use crate::soc::regs::ast::{
    Definitions, Entry, FlatDefinitions, Group, Overlay, Register, RegisterArray, RwPair,
    SharedDef, SharedTable, Union,
};
use crate::soc::regs::{RegError, RegResult};

pub fn flatten(defs: &Definitions) -> RegResult<FlatDefinitions> {
    let groups = defs
        .groups
        .iter()
        .map(|group| flatten_group(&defs.shared, group, 0))
        .collect::<RegResult<Vec<_>>>()?;
    Ok(FlatDefinitions {
        groups,
        constants: defs.constants.clone(),
    })
}

/// Flattens `group` as if its enclosing scope started at address `shift`.
pub fn flatten_group(shared: &SharedTable, group: &Group, shift: u32) -> RegResult<Group> {
    let base = rebase(shift, group.base, &group.name)?;
    let (content, doc, hidden) = match group.template {
        Some(id) => {
            let SharedDef::Group(template) = shared.get(id) else {
                return Err(RegError::WrongKind {
                    name: group.name.clone(),
                    expected: "a group",
                });
            };
            let doc = prefer(&group.doc, &template.doc);
            (flatten_entries(shared, &template.content, base)?, doc, false)
        }
        None => (
            flatten_entries(shared, &group.content, shift)?,
            group.doc.clone(),
            group.hidden,
        ),
    };
    Ok(Group {
        name: group.name.clone(),
        base,
        span: group.span,
        hidden,
        content,
        template: None,
        doc,
    })
}

fn flatten_entries(shared: &SharedTable, entries: &[Entry], shift: u32) -> RegResult<Vec<Entry>> {
    entries
        .iter()
        .map(|entry| flatten_entry(shared, entry, shift))
        .collect()
}

fn flatten_entry(shared: &SharedTable, entry: &Entry, shift: u32) -> RegResult<Entry> {
    Ok(match entry {
        Entry::Group(group) => Entry::Group(flatten_group(shared, group, shift)?),
        Entry::Register(reg) => Entry::Register(flatten_register(shared, reg, shift)?),
        Entry::Array(array) => Entry::Array(RegisterArray {
            base: rebase(shift, array.base, &array.name)?,
            ..array.clone()
        }),
        Entry::RwPair(pair) => Entry::RwPair(RwPair {
            read: flatten_register(shared, &pair.read, shift)?,
            write: flatten_register(shared, &pair.write, shift)?,
        }),
        Entry::Overlay(overlay) => Entry::Overlay(Overlay {
            name: overlay.name.clone(),
            offset: rebase(shift, overlay.offset, &overlay.name)?,
            mode: overlay.mode,
            // selection indices, not addresses
            registers: overlay
                .registers
                .iter()
                .map(|reg| flatten_register(shared, reg, 0))
                .collect::<RegResult<_>>()?,
            doc: overlay.doc.clone(),
        }),
        Entry::Union(union) => Entry::Union(Union {
            name: union.name.clone(),
            base: rebase(shift, union.base, union.name.as_deref().unwrap_or("<union>"))?,
            size: union.size,
            content: flatten_entries(shared, &union.content, shift)?,
            doc: union.doc.clone(),
        }),
    })
}

fn flatten_register(shared: &SharedTable, reg: &Register, shift: u32) -> RegResult<Register> {
    let offset = rebase(shift, reg.offset, &reg.name)?;
    let Some(id) = reg.template else {
        return Ok(Register {
            offset,
            ..reg.clone()
        });
    };
    let SharedDef::Register(template) = shared.get(id) else {
        return Err(RegError::WrongKind {
            name: reg.name.clone(),
            expected: "a register",
        });
    };
    let mut fields = template.fields.clone();
    for field in &reg.fields {
        ensure_disjoint(&fields, field)?;
        fields.push(field.clone());
    }
    Ok(Register {
        name: reg.name.clone(),
        offset,
        mode: reg.mode,
        fields,
        template: None,
        doc: prefer(&reg.doc, &template.doc),
        line: reg.line,
    })
}

fn rebase(shift: u32, address: u32, name: &str) -> RegResult<u32> {
    shift
        .checked_add(address)
        .ok_or_else(|| RegError::AddressOverflow {
            name: name.to_string(),
        })
}

fn prefer(local: &[String], shared: &[String]) -> Vec<String> {
    if local.is_empty() {
        shared.to_vec()
    } else {
        local.to_vec()
    }
}
