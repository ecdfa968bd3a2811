use std::cmp::Ordering;

/// Case-insensitive substring test.
/// `needle` should already be lowercased; the haystack is compared without allocating
/// when it is pure ASCII.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    if haystack.is_ascii() && needle.is_ascii() {
        let hay = haystack.as_bytes();
        let pat = needle.as_bytes();
        if pat.len() > hay.len() {
            return false;
        }
        return hay
            .windows(pat.len())
            .any(|w| w.eq_ignore_ascii_case(pat));
    }
    haystack.to_lowercase().contains(needle)
}

/// Case-insensitive ordering without allocation
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
