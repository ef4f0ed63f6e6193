/// Derive a config/filesystem-safe identifier from a variant display name.
///
/// Lowercases, drops parentheses, collapses every other run of characters
/// outside `[a-z0-9]` to one underscore and trims underscores at both ends.
/// Empty or entirely non-alphanumeric input yields an empty string.
///
/// `"Altmill Mk2 (4x4) — ATC Firmware"` becomes `altmill_mk2_4x4_atc_firmware`.
pub fn sanitize_identifier(name: &str) -> String {
    let mut ident = String::with_capacity(name.len());
    let mut pending_sep = false;

    for c in name.to_lowercase().chars() {
        if c == '(' || c == ')' {
            continue;
        }
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_sep && !ident.is_empty() {
                ident.push('_');
            }
            ident.push(c);
            pending_sep = false;
        } else {
            pending_sep = true;
        }
    }

    ident
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_display_name() {
        assert_eq!(
            sanitize_identifier("Altmill Mk2 (4x4) — ATC Firmware"),
            "altmill_mk2_4x4_atc_firmware"
        );
    }

    #[test]
    fn test_sanitize_parentheses_are_dropped_not_separators() {
        assert_eq!(sanitize_identifier("Test (A)"), "test_a");
        assert_eq!(sanitize_identifier("Rev(B)2"), "revb2");
    }

    #[test]
    fn test_sanitize_trims_and_collapses() {
        assert_eq!(sanitize_identifier("  --LongMill__MK2--  "), "longmill_mk2");
        assert_eq!(sanitize_identifier("a...b"), "a_b");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for name in [
            "Altmill Mk2 (4x4) — ATC Firmware",
            "Test (A)",
            "LongMill MK2 30x30",
            "already_clean_123",
        ] {
            let once = sanitize_identifier(name);
            assert_eq!(sanitize_identifier(&once), once);
        }
    }

    #[test]
    fn test_sanitize_empty_results() {
        assert_eq!(sanitize_identifier(""), "");
        assert_eq!(sanitize_identifier("()"), "");
        assert_eq!(sanitize_identifier(" — !! "), "");
    }
}
