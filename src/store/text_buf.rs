use std::fmt;

/// Inline UTF-8 string of at most `N - 1` bytes.
///
/// Mirrors a NUL-terminated buffer of capacity `N`: writes longer than that
/// are cut at the last character boundary that fits, never mid-codepoint.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FixedText<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> FixedText<N> {
    pub const CAPACITY: usize = N;

    pub const fn new() -> Self {
        Self { buf: [0; N], len: 0 }
    }

    pub fn from_str_truncated(text: &str) -> Self {
        let mut out = Self::new();
        out.set(text);
        out
    }

    /// Replaces the contents, returning whether `text` had to be truncated.
    pub fn set(&mut self, text: &str) -> bool {
        let limit = N.saturating_sub(1);
        let mut end = text.len().min(limit);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        self.buf[..end].copy_from_slice(&text.as_bytes()[..end]);
        self.len = end;
        end < text.len()
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn as_str(&self) -> &str {
        // `set` only ever copies whole characters.
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<const N: usize> Default for FixedText<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for FixedText<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl<const N: usize> fmt::Display for FixedText<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_short_text() {
        let text = FixedText::<16>::from_str_truncated("hello");
        assert_eq!(text.as_str(), "hello");
        assert_eq!(text.len(), 5);
    }

    #[test]
    fn truncates_to_capacity_minus_one() {
        let mut text = FixedText::<4>::new();
        assert!(text.set("abcdef"));
        assert_eq!(text.as_str(), "abc");
        assert!(!text.set("abc"));
    }

    #[test]
    fn never_splits_a_codepoint() {
        // "é" is two bytes; only 4 bytes fit.
        let text = FixedText::<5>::from_str_truncated("aaaé");
        assert_eq!(text.as_str(), "aaa");
        let text = FixedText::<6>::from_str_truncated("aaaé");
        assert_eq!(text.as_str(), "aaaé");
    }

    #[test]
    fn clear_empties() {
        let mut text = FixedText::<8>::from_str_truncated("x");
        text.clear();
        assert!(text.is_empty());
        assert_eq!(text.as_str(), "");
    }
}
