//! Group level entries. Every parser here returns the entry together with the
//! number of register addresses it occupies, so the enclosing group can lay
//! its entries out one after another.

use super::fields::parse_field_defs;
use super::{check_args, check_body, check_name, parse_int, parse_mode, tokens_of};
use crate::loader::indent::ParseNode;
use crate::loader::literals::is_int;
use crate::soc::regs::ast::{
    Entry, Group, Mode, Overlay, Register, RegisterArray, RwPair, SharedDef, SharedTable, Union,
};
use crate::soc::regs::{RegError, RegResult};

/// `name [mode]` followed by field lines.
pub(super) fn parse_reg_def(
    offset: u32,
    node: &ParseNode,
    expect: &[Mode],
    default_mode: Option<Mode>,
) -> RegResult<Register> {
    let line = node.line_no;
    let tokens = tokens_of(node)?;
    check_args(&tokens, 1, 2, line)?;
    let name = tokens[0];
    check_name(name, line)?;
    let mode = match tokens.get(1) {
        Some(text) => parse_mode(text, line)?,
        None => default_mode.ok_or_else(|| RegError::parse("missing R/W specification", line))?,
    };
    check_expected(mode, expect, line)?;
    Ok(Register {
        name: name.to_string(),
        offset,
        mode,
        fields: parse_field_defs(&node.children)?,
        template: None,
        doc: node.doc.clone(),
        line,
    })
}

fn check_expected(mode: Mode, expect: &[Mode], line: usize) -> RegResult<()> {
    if expect.is_empty() || expect.contains(&mode) {
        return Ok(());
    }
    let wanted: Vec<&str> = expect.iter().map(|mode| mode.as_str()).collect();
    Err(RegError::parse(
        format!("expected {} register", wanted.join(" or ")),
        line,
    ))
}

fn parse_reg_def_or_name(
    offset: u32,
    node: &ParseNode,
    shared: &SharedTable,
    expect: &[Mode],
    default_mode: Option<Mode>,
) -> RegResult<Register> {
    if !node.line.starts_with(':') {
        return parse_reg_def(offset, node, expect, default_mode);
    }
    match parse_shared_name(offset, node, shared)? {
        (Entry::Register(register), _) => {
            check_expected(register.mode, expect, node.line_no)?;
            Ok(register)
        }
        (Entry::Group(group), _) => Err(RegError::parse(
            format!("name {} is not a register", group.name),
            node.line_no,
        )),
        _ => Err(RegError::parse("expected register", node.line_no)),
    }
}

fn is_reg_array(tokens: &[&str]) -> bool {
    tokens.len() > 2 && is_int(tokens[2])
}

/// `name mode count` followed by field lines shared by every element.
fn parse_reg_array(offset: u32, node: &ParseNode, tokens: &[&str]) -> RegResult<(Entry, u32)> {
    let line = node.line_no;
    check_args(tokens, 3, 3, line)?;
    let name = tokens[0];
    check_name(name, line)?;
    let mode = parse_mode(tokens[1], line)?;
    let count = parse_int(tokens[2], line)?;
    let array = RegisterArray {
        name: name.to_string(),
        base: offset,
        count,
        mode,
        fields: parse_field_defs(&node.children)?,
        doc: node.doc.clone(),
    };
    Ok((Entry::Array(array), count))
}

/// `*RW` with a read register and a write register at one address.
fn parse_reg_pair(
    offset: u32,
    node: &ParseNode,
    tokens: &[&str],
    shared: &SharedTable,
) -> RegResult<(Entry, u32)> {
    check_args(tokens, 1, 1, node.line_no)?;
    let [read, write] = node.children.as_slice() else {
        return Err(RegError::parse("must have two registers", node.line_no));
    };
    let pair = RwPair {
        read: parse_reg_def_or_name(offset, read, shared, &[Mode::R], None)?,
        write: parse_reg_def_or_name(offset, write, shared, &[Mode::W, Mode::WP], None)?,
    };
    Ok((Entry::RwPair(pair), 1))
}

/// `*OVERLAY name mode`; children are numbered from zero rather than addressed.
fn parse_reg_overlay(
    offset: u32,
    node: &ParseNode,
    tokens: &[&str],
    shared: &SharedTable,
) -> RegResult<(Entry, u32)> {
    let line = node.line_no;
    check_args(tokens, 3, 3, line)?;
    let name = tokens[1];
    check_name(name, line)?;
    let mode = parse_mode(tokens[2], line)?;

    let mut registers = Vec::with_capacity(node.children.len());
    for (index, child) in node.children.iter().enumerate() {
        if is_reg_array(&tokens_of(child)?) {
            return Err(RegError::parse(
                "register arrays are not supported in an overlay",
                child.line_no,
            ));
        }
        registers.push(parse_reg_def_or_name(
            index as u32,
            child,
            shared,
            &[],
            Some(mode),
        )?);
    }
    let overlay = Overlay {
        name: name.to_string(),
        offset,
        mode,
        registers,
        doc: node.doc.clone(),
    };
    Ok((Entry::Overlay(overlay), 1))
}

/// `*UNION [name]`; every child starts at the same address.
fn parse_reg_union(
    offset: u32,
    node: &ParseNode,
    tokens: &[&str],
    shared: &SharedTable,
) -> RegResult<(Entry, u32)> {
    let line = node.line_no;
    check_args(tokens, 1, 2, line)?;
    let name = match tokens.get(1) {
        Some(name) => {
            check_name(name, line)?;
            Some(name.to_string())
        }
        None => None,
    };

    let mut size = 0;
    let mut content = Vec::with_capacity(node.children.len());
    for child in &node.children {
        let (entry, span) = parse_group_entry(offset, child, shared)?;
        if matches!(entry, Entry::Array(_)) {
            return Err(RegError::parse(
                "register arrays are not supported in a union",
                child.line_no,
            ));
        }
        size = size.max(span);
        content.push(entry);
    }
    let union = Union {
        name,
        base: offset,
        size,
        content,
        doc: node.doc.clone(),
    };
    Ok((Entry::Union(union), size))
}

fn parse_special(
    offset: u32,
    node: &ParseNode,
    tokens: &[&str],
    shared: &SharedTable,
) -> RegResult<(Entry, u32)> {
    match tokens[0] {
        "*RW" => parse_reg_pair(offset, node, tokens, shared),
        "*OVERLAY" => parse_reg_overlay(offset, node, tokens, shared),
        "*UNION" => parse_reg_union(offset, node, tokens, shared),
        _ => Err(RegError::parse("unexpected special directive", node.line_no)),
    }
}

/// `:key [new_name|-] [mode]`, instantiating a shared definition at `offset`.
pub(super) fn parse_shared_name(
    offset: u32,
    node: &ParseNode,
    shared: &SharedTable,
) -> RegResult<(Entry, u32)> {
    let line = node.line_no;
    let tokens = tokens_of(node)?;
    check_args(&tokens, 1, 3, line)?;
    let key = tokens[0].trim_start_matches(':');
    let name = match tokens.get(1) {
        Some(&name) if name != "-" => name,
        _ => key,
    };
    check_name(name, line)?;
    let id = shared
        .lookup(key)
        .ok_or_else(|| RegError::parse(format!("unknown shared name {key}"), line))?;

    match shared.get(id) {
        SharedDef::Group(template) => {
            if tokens.len() > 2 {
                return Err(RegError::parse("cannot specify rw for group", line));
            }
            check_body(node)?;
            let group = Group {
                name: name.to_string(),
                base: offset,
                span: template.span,
                hidden: false,
                content: Vec::new(),
                template: Some(id),
                doc: node.doc.clone(),
            };
            Ok((Entry::Group(group), template.span))
        }
        SharedDef::Register(template) => {
            let mode = match tokens.get(2) {
                Some(text) => parse_mode(text, line)?,
                None => template.mode,
            };
            let register = Register {
                name: name.to_string(),
                offset,
                mode,
                fields: parse_field_defs(&node.children)?,
                template: Some(id),
                doc: node.doc.clone(),
                line,
            };
            Ok((Entry::Register(register), 1))
        }
    }
}

pub(super) fn parse_group_entry(
    offset: u32,
    node: &ParseNode,
    shared: &SharedTable,
) -> RegResult<(Entry, u32)> {
    let tokens = tokens_of(node)?;
    match tokens[0].chars().next() {
        Some('.' | '-') => Err(RegError::parse(
            "field definition not allowed here",
            node.line_no,
        )),
        Some(':') => parse_shared_name(offset, node, shared),
        Some('*') => parse_special(offset, node, &tokens, shared),
        Some('!') => {
            let (group, span) = parse_group_def(offset, node, shared)?;
            Ok((Entry::Group(group), span))
        }
        _ if is_reg_array(&tokens) => parse_reg_array(offset, node, &tokens),
        _ => Ok((Entry::Register(parse_reg_def(offset, node, &[], None)?), 1)),
    }
}

/// `!name` or `!!name` (hidden) followed by group entries laid out from `offset`.
pub(super) fn parse_group_def(
    offset: u32,
    node: &ParseNode,
    shared: &SharedTable,
) -> RegResult<(Group, u32)> {
    let line = node.line_no;
    let tokens = tokens_of(node)?;
    let (name, hidden) = match tokens[0].strip_prefix("!!") {
        Some(name) => (name, true),
        None => (tokens[0].trim_start_matches('!'), false),
    };
    check_name(name, line)?;
    check_args(&tokens, 1, 1, line)?;

    let mut content = Vec::with_capacity(node.children.len());
    let mut count = 0u32;
    for child in &node.children {
        let overflow = || RegError::parse("address space overflow", child.line_no);
        let at = offset.checked_add(count).ok_or_else(overflow)?;
        let (entry, span) = parse_group_entry(at, child, shared)?;
        count = count
            .checked_add(span)
            .filter(|&end| offset.checked_add(end).is_some())
            .ok_or_else(overflow)?;
        content.push(entry);
    }
    let group = Group {
        name: name.to_string(),
        base: offset,
        span: count,
        hidden,
        content,
        template: None,
        doc: node.doc.clone(),
    };
    Ok((group, count))
}
