//! Date detection for cell number formats.

/// Whether a built-in number format id displays a date or time.
pub fn is_builtin_date(id: u32) -> bool {
    matches!(id, 14..=22 | 27..=36 | 45..=47 | 50..=58)
}

/// Whether a custom format code displays a date or time.
///
/// Only the first section (up to `;`) is inspected. Quoted literals,
/// escaped characters and bracketed modifiers are ignored, and elapsed-time
/// codes such as `[h]:mm` are durations rather than dates.
pub fn is_date_format(code: &str) -> bool {
    let mut chars = code.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ';' => return false,
            '\\' | '_' | '*' => {
                chars.next();
            },
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                }
            },
            '[' => {
                let mut inner = String::new();
                for b in chars.by_ref() {
                    if b == ']' {
                        break;
                    }
                    inner.push(b);
                }
                let elapsed = !inner.is_empty()
                    && inner
                        .chars()
                        .all(|ch| matches!(ch.to_ascii_lowercase(), 'h' | 'm' | 's'));
                if elapsed {
                    return false;
                }
            },
            'd' | 'D' | 'm' | 'M' | 'y' | 'Y' | 'h' | 'H' | 's' | 'S' => return true,
            _ => {},
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_date_format() {
        assert!(is_date_format("DD/MM/YY"));
        assert!(is_date_format("yyyy-mm-dd h:mm"));
        assert!(is_date_format("[$-409]mmmm d, yyyy;@"));
        assert!(is_date_format("m\"M\"d\"D\";@"));

        assert!(!is_date_format("0.00"));
        assert!(!is_date_format("#,##0.0####\" YMD\""));
        assert!(!is_date_format("\"$\"#,##0_);[Red](\"$\"#,##0)"));
        assert!(!is_date_format("\\Y000000"));
        assert!(!is_date_format("[h]:mm:ss"));
        assert!(!is_date_format("General"));
    }

    #[test]
    fn test_builtin_ids() {
        assert!(is_builtin_date(14));
        assert!(is_builtin_date(22));
        assert!(!is_builtin_date(0));
        assert!(!is_builtin_date(49));
    }
}
