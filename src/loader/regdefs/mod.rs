//! Register definition grammar.
//!
//! ```text
//! register_defs    = { group_def | shared_def | constant_def }*
//! constant_def     = name "=" value
//! shared_def       = ":" reg_def | ":" group_def
//! group_def        = "!" ["!"] name { group_entry }*
//! group_entry      = group_def | reg_def | reg_pair | reg_array
//!                  | shared_name | reg_overlay | reg_union
//! reg_def          = name rw { field_def | field_skip }*
//! reg_array        = name rw count { field_def | field_skip }*
//! field_def        = "." name [ width ] [ "@" offset ] [ rw ]
//! field_skip       = "-" [ width ]
//! reg_pair         = "*RW" { reg_def_or_name }2
//! reg_overlay      = "*OVERLAY" name rw { reg_def_or_name }
//! reg_union        = "*UNION" [ name ] { group_entry }
//! reg_def_or_name  = reg_def | shared_name
//! shared_name      = ":" saved_name [ { new_name | "-" } [ rw ] ]
//! rw               = "R" | "W" | "RW" | "WP"
//! ```
//!
//! Braces denote the indented children of a line.

mod entries;
mod fields;
pub mod flatten;

pub use fields::REGISTER_BITS;
pub use flatten::{flatten, flatten_group};

use super::indent::ParseNode;
use super::literals::{is_valid_name, parse_numeric_literal};
use crate::soc::regs::ast::{Constant, Definitions, Mode, SharedDef};
use crate::soc::regs::{RegError, RegResult};

use entries::{parse_group_def, parse_reg_def};

pub(crate) fn tokens_of(node: &ParseNode) -> RegResult<Vec<&str>> {
    let tokens = node.tokens();
    if tokens.is_empty() {
        return Err(RegError::parse("empty definition", node.line_no));
    }
    Ok(tokens)
}

pub(crate) fn check_args(args: &[&str], min: usize, max: usize, line: usize) -> RegResult<()> {
    if args.len() < min {
        return Err(RegError::parse("expected more arguments", line));
    }
    if args.len() > max {
        return Err(RegError::parse("unexpected extra arguments", line));
    }
    Ok(())
}

pub(crate) fn check_name(name: &str, line: usize) -> RegResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(RegError::parse(format!("invalid name \"{name}\""), line))
    }
}

pub(crate) fn check_body(node: &ParseNode) -> RegResult<()> {
    if node.children.is_empty() {
        Ok(())
    } else {
        Err(RegError::parse(
            "no sub-definitions allowed here",
            node.line_no,
        ))
    }
}

pub(crate) fn parse_int(text: &str, line: usize) -> RegResult<u32> {
    let value = parse_numeric_literal(text)
        .map_err(|err| RegError::parse(format!("expected integer, {err}: {text}"), line))?;
    u32::try_from(value).map_err(|_| RegError::parse(format!("integer {text} too large"), line))
}

pub(crate) fn parse_mode(text: &str, line: usize) -> RegResult<Mode> {
    Mode::parse(text)
        .ok_or_else(|| RegError::parse(format!("invalid R/W specification {text}"), line))
}

/// Parses one definition source on top of `prior`.
///
/// Everything `prior` defined stays visible: its shared definitions, and its
/// top level groups which become shared definitions in turn. Only groups from
/// this source are returned as top level groups; constants accumulate.
pub fn parse_register_defs(nodes: &[ParseNode], prior: Definitions) -> RegResult<Definitions> {
    let Definitions {
        mut shared,
        groups: included,
        constants,
    } = prior;
    for group in included {
        let name = group.name.clone();
        if shared.insert(SharedDef::Group(group)).is_none() {
            return Err(RegError::DuplicateName {
                scope: "shared definitions".to_string(),
                name,
            });
        }
    }

    let mut defs = Definitions {
        shared,
        groups: Vec::new(),
        constants,
    };
    for node in nodes {
        parse_register_def_entry(node, &mut defs)?;
    }
    Ok(defs)
}

fn parse_register_def_entry(node: &ParseNode, defs: &mut Definitions) -> RegResult<()> {
    if node.line.starts_with(':') {
        parse_shared_def(node, defs)
    } else if node.line.starts_with('!') {
        let (group, _) = parse_group_def(0, node, &defs.shared)?;
        if defs.group(&group.name).is_some() || defs.shared.contains(&group.name) {
            return Err(RegError::parse(
                format!("repeated group \"{}\"", group.name),
                node.line_no,
            ));
        }
        defs.groups.push(group);
        Ok(())
    } else if node.line.contains('=') {
        parse_constant_def(node, defs)
    } else {
        Err(RegError::parse(
            "ungrouped register definition not expected here",
            node.line_no,
        ))
    }
}

fn parse_shared_def(node: &ParseNode, defs: &mut Definitions) -> RegResult<()> {
    let stripped = ParseNode {
        line: node.line[1..].to_string(),
        ..node.clone()
    };
    let def = if stripped.line.starts_with('!') {
        SharedDef::Group(parse_group_def(0, &stripped, &defs.shared)?.0)
    } else {
        SharedDef::Register(parse_reg_def(0, &stripped, &[], None)?)
    };
    let name = def.name().to_string();
    defs.shared.insert(def).ok_or_else(|| {
        RegError::parse(format!("repeated definition for \"{name}\""), node.line_no)
    })?;
    Ok(())
}

fn parse_constant_def(node: &ParseNode, defs: &mut Definitions) -> RegResult<()> {
    let line = node.line_no;
    check_body(node)?;
    let Some((name, value)) = node.line.split_once('=') else {
        return Err(RegError::parse("expected constant definition", line));
    };
    let name = name.trim();
    check_name(name, line)?;
    let value = parse_numeric_literal(value.trim())
        .map_err(|err| RegError::parse(format!("expected integer, {err}"), line))?;
    if defs.constant(name).is_some() {
        return Err(RegError::parse(format!("repeated constant \"{name}\""), line));
    }
    defs.constants.push(Constant {
        name: name.to_string(),
        value,
        doc: node.doc.clone(),
    });
    Ok(())
}
