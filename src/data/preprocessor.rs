// ============================================================
// Layer 4 — Cell Preprocessor
// ============================================================
// Cleans one CSV cell before it becomes part of an Utterance.
//
// Dataset exports often carry:
//   - Non-breaking spaces (U+00A0) from spreadsheet tools
//   - Zero-width spaces (U+200B) and byte order marks
//   - Embedded newlines or tabs inside quoted cells
//   - Leading, trailing, or doubled spaces
//
// Left in place these change the token sequence, so two rows
// a human reads as identical would encode differently.
//
// Cleaning steps (applied in order):
//   1. Map whitespace variants and control characters to ' '
//   2. Collapse runs of spaces into one
//   3. Trim both ends
//
// Utterances are single-line, so newlines are treated like
// any other whitespace.
//
// Reference: Rust Book §8 (Strings in Rust)
//            Rust Book §13 (Iterators)

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean a raw cell value.
    pub fn clean(&self, text: &str) -> String {
        let mut out        = String::with_capacity(text.len());
        let mut last_space = true; // drops leading spaces

        for c in text.chars() {
            // ── Step 1: Normalise the character ───────────────────────────────
            let c = match c {
                '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_whitespace() || c.is_control() => ' ',
                c => c,
            };

            // ── Step 2: Collapse repeated spaces ──────────────────────────────
            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        // ── Step 3: Trim ──────────────────────────────────────────────────────
        out.truncate(out.trim_end().len());
        out
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("what   is  my balance"), "what is my balance");
    }

    #[test]
    fn test_trims_edges() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  hello world  "), "hello world");
    }

    #[test]
    fn test_removes_control_and_invisible_chars() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("hello\x01world"), "hello world");
        assert_eq!(p.clean("\u{FEFF}pay\u{00A0}bill"), "pay bill");
    }

    #[test]
    fn test_flattens_newlines() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("book a\r\n\ttable"), "book a table");
    }

    #[test]
    fn test_empty_string() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(""), "");
        assert_eq!(p.clean("   "), "");
    }
}
