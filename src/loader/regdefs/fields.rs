//! Field lists beneath a register: `.name [width] [@offset] [mode]` and `- [width]`.

use super::{check_args, check_body, check_name, parse_int, parse_mode, tokens_of};
use crate::loader::indent::ParseNode;
use crate::soc::regs::ast::Field;
use crate::soc::regs::{RegError, RegResult};

/// Registers are 32 bits wide.
pub const REGISTER_BITS: u32 = 32;

pub(super) fn parse_field_defs(nodes: &[ParseNode]) -> RegResult<Vec<Field>> {
    let mut fields: Vec<Field> = Vec::new();
    let mut cursor = 0u32;
    for node in nodes {
        let tokens = tokens_of(node)?;
        if tokens[0] == "-" {
            cursor = cursor
                .checked_add(parse_field_skip(node, &tokens)?)
                .filter(|&end| end <= REGISTER_BITS)
                .ok_or_else(|| RegError::parse("skip falls outside of register", node.line_no))?;
            continue;
        }
        let field = parse_field_def(cursor, node, &tokens)?;
        ensure_disjoint(&fields, &field)?;
        cursor = field.end();
        fields.push(field);
    }
    Ok(fields)
}

/// Explicit `@offset` placements may not land on bits another field already owns.
pub(crate) fn ensure_disjoint(existing: &[Field], field: &Field) -> RegResult<()> {
    if let Some(other) = existing.iter().find(|other| other.overlaps(field)) {
        return Err(RegError::parse(
            format!("field {} overlaps field {}", field.name, other.name),
            field.line,
        ));
    }
    Ok(())
}

fn parse_field_skip(node: &ParseNode, tokens: &[&str]) -> RegResult<u32> {
    check_body(node)?;
    check_args(tokens, 1, 2, node.line_no)?;
    match tokens.get(1) {
        Some(width) => parse_int(width, node.line_no),
        None => Ok(1),
    }
}

fn parse_field_def(cursor: u32, node: &ParseNode, tokens: &[&str]) -> RegResult<Field> {
    let line = node.line_no;
    check_body(node)?;
    let Some(name) = tokens[0].strip_prefix('.') else {
        return Err(RegError::parse("expected field definition", line));
    };
    check_name(name, line)?;

    let mut args = &tokens[1..];
    let (width, is_bit) = match args.first() {
        Some(first) if crate::loader::literals::is_int(first) => {
            let width = parse_int(first, line)?;
            args = &args[1..];
            (width, false)
        }
        _ => (1, true),
    };
    let offset = match args.first().and_then(|arg| arg.strip_prefix('@')) {
        Some(offset) => {
            args = &args[1..];
            parse_int(offset, line)?
        }
        None => cursor,
    };

    if width == 0 {
        return Err(RegError::parse("invalid field width 0", line));
    }
    if u64::from(offset) + u64::from(width) > u64::from(REGISTER_BITS) {
        return Err(RegError::parse(
            format!("field ({offset},{width}) falls outside of register"),
            line,
        ));
    }

    check_args(args, 0, 1, line)?;
    let mode = args
        .first()
        .map(|text| parse_mode(text, line))
        .transpose()?;

    Ok(Field {
        name: name.to_string(),
        offset,
        width,
        is_bit,
        mode,
        doc: node.doc.clone(),
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::indent::parse_indented;
    use crate::loader::ParseOptions;
    use crate::soc::regs::ast::Mode;

    fn fields_of(body: &str) -> RegResult<Vec<Field>> {
        let src = format!("REG RW\n{body}");
        let nodes = parse_indented(&src, ParseOptions { warn: false }).expect("indentation");
        parse_field_defs(&nodes[0].children)
    }

    fn layout(fields: &[Field]) -> Vec<(&str, u32, u32, bool)> {
        fields
            .iter()
            .map(|f| (f.name.as_str(), f.offset, f.width, f.is_bit))
            .collect()
    }

    #[test]
    fn fields_pack_from_running_cursor() {
        let fields = fields_of("    .EN\n    .MODE 3\n    - 4\n    .COUNT 8 R\n    .TOP 4 @28\n")
            .expect("valid fields");
        assert_eq!(
            layout(&fields),
            vec![
                ("EN", 0, 1, true),
                ("MODE", 1, 3, false),
                ("COUNT", 8, 8, false),
                ("TOP", 28, 4, false),
            ]
        );
        assert_eq!(fields[2].mode, Some(Mode::R), "per-field mode override");
        assert_eq!(fields[0].mode, None, "fields inherit by default");
    }

    #[test]
    fn explicit_offset_moves_cursor() {
        let fields = fields_of("    .A 2 @8\n    .B\n").expect("valid fields");
        assert_eq!(layout(&fields), vec![("A", 8, 2, false), ("B", 10, 1, true)]);
    }

    #[test]
    fn field_outside_register_is_rejected() {
        let err = fields_of("    .A 30\n    .B 4\n").expect_err("34 bits do not fit");
        assert!(
            matches!(err, RegError::Parse { line: 3, ref message } if message.contains("outside")),
            "unexpected error {err:?}"
        );
        assert!(fields_of("    .A 33 @0\n").is_err());
        assert!(fields_of("    .A 0\n").is_err(), "zero width is invalid");
    }

    #[test]
    fn skips_past_the_register_end_are_rejected() {
        let err = fields_of("    - 0xFFFFFFFF\n    - 1\n    .F\n").expect_err("skip overflows");
        assert!(
            matches!(err, RegError::Parse { line: 2, .. }),
            "unexpected error {err:?}"
        );
        assert!(fields_of("    - 33\n").is_err(), "a single skip may not leave the register");
        let fields = fields_of("    - 31\n    .TOP\n").expect("skip up to the last bit");
        assert_eq!(layout(&fields), vec![("TOP", 31, 1, true)]);
    }

    #[test]
    fn overlapping_explicit_placement_is_rejected() {
        let err = fields_of("    .A 8\n    .B 4 @4\n").expect_err("B lands inside A");
        assert!(
            matches!(err, RegError::Parse { line: 3, ref message } if message == "field B overlaps field A"),
            "unexpected error {err:?}"
        );
    }

    #[test]
    fn malformed_fields_are_rejected() {
        assert!(fields_of("    NAME 3\n").is_err(), "missing leading dot");
        assert!(fields_of("    .A 3 @1 RW extra\n").is_err(), "too many arguments");
        assert!(fields_of("    .A 3 RO\n").is_err(), "bad mode");
        assert!(fields_of("    - 2 3\n").is_err(), "skip takes one width");
        assert!(fields_of("    .A\n        .B\n").is_err(), "fields take no children");
    }
}
