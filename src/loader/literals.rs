//! Token helpers shared by both definition grammars.

pub(crate) fn parse_numeric_literal(text: &str) -> Result<u64, &'static str> {
    if text.starts_with('-') {
        return Err("negative values are not supported here");
    }
    let cleaned = text.replace('_', "");
    let lowered = cleaned.to_ascii_lowercase();
    let (radix, digits) = if let Some(stripped) = lowered.strip_prefix("0x") {
        (16, stripped)
    } else if let Some(stripped) = lowered.strip_prefix("0b") {
        (2, stripped)
    } else if let Some(stripped) = lowered.strip_prefix("0o") {
        (8, stripped)
    } else {
        (10, lowered.as_str())
    };
    if digits.is_empty() {
        return Err("numeric literal missing digits");
    }
    u64::from_str_radix(digits, radix).map_err(|_| "invalid numeric literal")
}

/// True when the token starts like an integer, which is how the grammar tells
/// widths and counts apart from names and modes.
pub(crate) fn is_int(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Names follow `[A-Za-z][A-Za-z0-9_]*`.
pub(crate) fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixed_literals() {
        assert_eq!(parse_numeric_literal("0x10").unwrap(), 16);
        assert_eq!(parse_numeric_literal("0X1f").unwrap(), 31);
        assert_eq!(parse_numeric_literal("0b101").unwrap(), 5);
        assert_eq!(parse_numeric_literal("0o17").unwrap(), 15);
        assert_eq!(parse_numeric_literal("1_000").unwrap(), 1000);
    }

    #[test]
    fn rejects_negative_and_garbage() {
        assert!(parse_numeric_literal("-1").is_err());
        assert!(parse_numeric_literal("0x").is_err());
        assert!(parse_numeric_literal("12ab").is_err());
    }

    #[test]
    fn name_rules() {
        assert!(is_valid_name("CTRL_2"));
        assert!(is_valid_name("a"));
        assert!(!is_valid_name("2CTRL"));
        assert!(!is_valid_name("_CTRL"));
        assert!(!is_valid_name("CT-RL"));
        assert!(!is_valid_name(""));
    }
}
