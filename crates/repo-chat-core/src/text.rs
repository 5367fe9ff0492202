//! UTF-8 safe text bounding.

/// Snap a byte index back to the nearest valid UTF-8 char boundary.
pub fn snap_to_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Return the longest prefix of `s` that is at most `max_bytes` long and
/// ends on a char boundary.
pub fn truncate_to_boundary(s: &str, max_bytes: usize) -> &str {
    &s[..snap_to_char_boundary(s, max_bytes)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate_to_boundary("hello", 10), "hello");
        assert_eq!(truncate_to_boundary("hello", 5), "hello");
    }

    #[test]
    fn test_ascii_cut() {
        assert_eq!(truncate_to_boundary("hello world", 5), "hello");
    }

    #[test]
    fn test_multibyte_never_split() {
        let s = "┌──┐";
        // '┌' is three bytes; cutting at 4 must back off to 3.
        assert_eq!(truncate_to_boundary(s, 4), "┌");
        assert_eq!(truncate_to_boundary(s, 2), "");
    }

    #[test]
    fn test_snap_past_end() {
        assert_eq!(snap_to_char_boundary("abc", 99), 3);
    }
}
