use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Escape resolved to a newline before literals are extracted.
pub const NEWLINE_ESCAPE: &str = "\\n";

fn literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]*)""#).expect("valid literal regex"))
}

/// Replaces every `"…"` literal with commands that print it.
///
/// Each lowered literal clears the current cell first and leaves it at zero with the
/// head unmoved, so code after a literal can rely on a clean cell.
pub fn lower(text: &str) -> String {
    let text = text.replace(NEWLINE_ESCAPE, "\n");
    literal_re()
        .replace_all(&text, |caps: &Captures<'_>| lower_literal(&caps[1]))
        .into_owned()
}

/// Lowers the UTF-8 bytes of `literal`: `[-]`, then per byte `+`×b `.` `-`×b.
pub fn lower_literal(literal: &str) -> String {
    let bytes = literal.as_bytes();
    let per_byte: usize = bytes.iter().map(|&b| 2 * b as usize + 1).sum();
    let mut out = String::with_capacity(3 + per_byte);
    out.push_str("[-]");
    for &b in bytes {
        let n = b as usize;
        out.extend(std::iter::repeat('+').take(n));
        out.push('.');
        out.extend(std::iter::repeat('-').take(n));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf8_vm::{run_source, Status};

    #[test]
    fn literal_prints_its_text() {
        let lowered = lower("\"Hi!\"");
        let r = run_source(&lowered, b"");
        assert_eq!(r.status, Status::Ok);
        assert_eq!(r.output_text(), "Hi!");
        assert_eq!(r.tape, vec![0]);
        assert_eq!(r.head, 0);
    }

    #[test]
    fn literal_leaves_clean_cell() {
        let lowered = lower("\"AB\"+.");
        let r = run_source(&lowered, b"");
        assert_eq!(r.output, b"AB\x01".to_vec());
    }

    #[test]
    fn literal_clears_dirty_cell_first() {
        let lowered = lower("+++++\"a\"");
        let r = run_source(&lowered, b"");
        assert_eq!(r.output_text(), "a");
        assert_eq!(r.tape, vec![0]);
    }

    #[test]
    fn newline_escape_is_resolved() {
        let lowered = lower("\"a\\nb\"");
        let r = run_source(&lowered, b"");
        assert_eq!(r.output_text(), "a\nb");
    }

    #[test]
    fn repeated_literals_lower_identically() {
        let lowered = lower("\"x\" > \"x\"");
        let one = lower_literal("x");
        assert_eq!(lowered, format!("{one} > {one}"));
    }

    #[test]
    fn empty_literal_only_clears() {
        assert_eq!(lower("\"\""), "[-]");
    }

    #[test]
    fn non_ascii_literal_emits_utf8() {
        let lowered = lower("\"é\"");
        let r = run_source(&lowered, b"");
        assert_eq!(r.output_text(), "é");
    }

    #[test]
    fn unterminated_quote_is_left_alone() {
        assert_eq!(lower("+\"abc"), "+\"abc");
    }
}
