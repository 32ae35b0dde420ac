//! String predicates for identifiers, person names, and search terms.

/// Upper bound, in characters, for names and search terms.
pub const MAX_INPUT_LEN: usize = 100;

/// Non-empty and made only of ASCII decimal digits.
///
/// Used for order and product identifiers.
pub fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Non-empty, at most [`MAX_INPUT_LEN`] characters, and made only of ASCII
/// letters, whitespace, hyphens, and apostrophes.
pub fn is_valid_person_name(s: &str) -> bool {
    if s.is_empty() || s.chars().count() > MAX_INPUT_LEN {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || c == '-' || c == '\'')
}

/// Non-empty, at most [`MAX_INPUT_LEN`] characters, and free of `;`, `"`,
/// `\`, and control characters U+0000..=U+001F.
///
/// This is a blocklist: anything else (accents, digits, `%`, `&`) is allowed
/// so fuzzy product search keeps working.
pub fn is_valid_search_term(s: &str) -> bool {
    if s.is_empty() || s.chars().count() > MAX_INPUT_LEN {
        return false;
    }
    !s.chars()
        .any(|c| matches!(c, ';' | '"' | '\\') || (c as u32) < 0x20)
}
