use unicode_normalization::UnicodeNormalization;

/// Canonical comparison form of a course name: NFC, lower case, trimmed,
/// inner whitespace runs collapsed to one space.
pub fn normalize(name: &str) -> String {
    let folded: String = name.nfc().flat_map(char::to_lowercase).nfc().collect();
    collapse_ws(&folded)
}

fn collapse_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Splits `"Name (N credits)"` into the bare name and the credit count.
///
/// Any trailing parenthetical group is removed; the count is the first run
/// of ASCII digits inside it, or 0. A label that is nothing but a
/// parenthetical keeps its text.
pub fn split_label(label: &str) -> (String, u32) {
    let trimmed = label.trim();
    let Some(open) = trailing_group_start(trimmed) else {
        return (trimmed.to_string(), 0);
    };
    let name = trimmed[..open].trim_end();
    if name.is_empty() {
        return (trimmed.to_string(), 0);
    }
    let inner = &trimmed[open + 1..trimmed.len() - 1];
    (name.to_string(), first_number(inner).unwrap_or(0))
}

/// Course name used for matching: suffix stripped, then normalized.
pub fn match_key(name: &str) -> String {
    normalize(&split_label(name).0)
}

fn trailing_group_start(s: &str) -> Option<usize> {
    if !s.ends_with(')') {
        return None;
    }
    let mut depth = 0usize;
    for (i, ch) in s.char_indices().rev() {
        match ch {
            ')' => depth += 1,
            '(' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn first_number(s: &str) -> Option<u32> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
