//! Flat field list read by [`FieldWriter`](crate::soc::fields::FieldWriter).
//!
//! ```text
//! NAME        REGISTER  BIT-RANGE  DEFAULT  [R]     field
//!             REGISTER  BIT-RANGE  DEFAULT  [R]     continuation: next sub-register
//! NAME        REGISTER  VALUE                       constant
//! REGISTER =  VALUE                                 constant named by its register
//! ```
//!
//! `BIT-RANGE` is either `bit` or `high:low`. `#` comments run to the end of
//! the line. The first sub-register of a multi-register field holds its most
//! significant bits.

use std::fmt::Write;

use ahash::AHashSet;

use super::literals::parse_numeric_literal;
use crate::soc::regs::{RegError, RegResult};

/// One register slice of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubField {
    pub register: u32,
    pub offset: u32,
    pub width: u32,
    pub default: u64,
    pub read_only: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldDef {
    /// Sub-registers in declaration order; a plain field has exactly one.
    Field(Vec<SubField>),
    Constant { register: u32, value: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedDef {
    pub name: String,
    pub def: FieldDef,
    pub line: usize,
}

/// A named line together with its continuation lines, already split.
struct RawDef<'a> {
    name: &'a str,
    line: usize,
    rows: Vec<(usize, Vec<&'a str>)>,
}

fn gather_lines(src: &str) -> RegResult<Vec<RawDef<'_>>> {
    let mut defs: Vec<RawDef<'_>> = Vec::new();
    for (index, raw) in src.split_inclusive('\n').enumerate() {
        let line_no = index + 1;
        let Some(line) = raw.strip_suffix('\n') else {
            return Err(RegError::parse("missing newline", line_no));
        };
        let line = match line.find('#') {
            Some(hash) => &line[..hash],
            None => line,
        }
        .trim_end();
        if line.trim_start().is_empty() {
            continue;
        }

        let mut tokens: Vec<&str> = line.split_whitespace().collect();
        if line.starts_with(char::is_whitespace) {
            let Some(last) = defs.last_mut() else {
                return Err(RegError::parse("no line to continue", line_no));
            };
            last.rows.push((line_no, tokens));
        } else {
            let name = tokens.remove(0);
            defs.push(RawDef {
                name,
                line: line_no,
                rows: vec![(line_no, tokens)],
            });
        }
    }
    Ok(defs)
}

fn parse_value(text: &str, line: usize) -> RegResult<u64> {
    parse_numeric_literal(text)
        .map_err(|err| RegError::parse(format!("{err}: {text}"), line))
}

fn parse_u32(text: &str, line: usize) -> RegResult<u32> {
    u32::try_from(parse_value(text, line)?)
        .map_err(|_| RegError::parse(format!("{text} does not fit in 32 bits"), line))
}

fn parse_sub_field(tokens: &[&str], line: usize) -> RegResult<SubField> {
    let [register, range, default, rest @ ..] = tokens else {
        return Err(RegError::parse("malformed register definition", line));
    };
    let read_only = match rest {
        [] => false,
        ["R"] => true,
        [marker] => {
            return Err(RegError::parse(format!("invalid register marker {marker}"), line));
        }
        _ => return Err(RegError::parse("unexpected extra arguments", line)),
    };

    let register = parse_u32(register, line)?;
    let (offset, width) = match range.split_once(':') {
        Some((high, low)) => {
            let high = parse_u32(high, line)?;
            let low = parse_u32(low, line)?;
            if high < low {
                return Err(RegError::parse(format!("invalid register width in {range}"), line));
            }
            (low, high - low + 1)
        }
        None => (parse_u32(range, line)?, 1),
    };
    if u64::from(offset) + u64::from(width) > 32 {
        return Err(RegError::parse(format!("bit range {range} outside register"), line));
    }
    let default = parse_value(default, line)?;
    if default >> width != 0 {
        return Err(RegError::parse(
            format!("default {default:#x} too wide for {width} bits"),
            line,
        ));
    }
    Ok(SubField {
        register,
        offset,
        width,
        default,
        read_only,
    })
}

fn parse_constant(name: &str, tokens: &[&str], line: usize) -> RegResult<FieldDef> {
    let (register, value) = match tokens {
        ["=", value] => (name, *value),
        [register, value] => (*register, *value),
        _ => return Err(RegError::parse("malformed register definition", line)),
    };
    Ok(FieldDef::Constant {
        register: parse_u32(register, line)?,
        value: parse_u32(value, line)?,
    })
}

fn parse_raw(raw: &RawDef<'_>) -> RegResult<FieldDef> {
    if let [(line, tokens)] = raw.rows.as_slice() {
        if tokens.len() == 2 {
            return parse_constant(raw.name, tokens, *line);
        }
    }
    let subs = raw
        .rows
        .iter()
        .map(|(line, tokens)| parse_sub_field(tokens, *line))
        .collect::<RegResult<Vec<_>>>()?;
    Ok(FieldDef::Field(subs))
}

/// Parses a definition file. Names must be unique; order is preserved.
pub fn parse_field_file(src: &str) -> RegResult<Vec<NamedDef>> {
    let mut seen = AHashSet::new();
    let mut defs = Vec::new();
    for raw in gather_lines(src)? {
        if !seen.insert(raw.name) {
            return Err(RegError::parse(format!("duplicate name {}", raw.name), raw.line));
        }
        defs.push(NamedDef {
            name: raw.name.to_string(),
            def: parse_raw(&raw)?,
            line: raw.line,
        });
    }
    Ok(defs)
}

const NAME_COLUMN: usize = 36;

fn emit_sub_field(out: &mut String, sub: &SubField) {
    let _ = if sub.width > 1 {
        write!(
            out,
            "0x{:02X} {}:{} 0x{:X}",
            sub.register,
            sub.offset + sub.width - 1,
            sub.offset,
            sub.default
        )
    } else {
        write!(out, "0x{:02X} {} 0x{:X}", sub.register, sub.offset, sub.default)
    };
    if sub.read_only {
        out.push_str(" R");
    }
    out.push('\n');
}

/// Renders definitions in the column layout [`parse_field_file`] reads.
pub fn emit(defs: &[NamedDef]) -> String {
    let mut out = String::new();
    for def in defs {
        let _ = write!(out, "{:<width$}", def.name, width = NAME_COLUMN - 1);
        out.push(' ');
        match &def.def {
            FieldDef::Constant { register, value } => {
                let _ = writeln!(out, "0x{register:02X} 0x{value:08X}");
            }
            FieldDef::Field(subs) => {
                for (index, sub) in subs.iter().enumerate() {
                    if index > 0 {
                        out.push_str(&" ".repeat(NAME_COLUMN));
                    }
                    emit_sub_field(&mut out, sub);
                }
            }
        }
    }
    out
}
