//! Escaping for identifiers that may carry obfuscated or hostile bytes.
//! Anything outside printable ASCII becomes a `\xHH` escape so evidence
//! strings and diagram labels stay renderable.

use std::fmt::Write;

pub fn sanitize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        let code = c as u32;
        if (0x20..0x7f).contains(&code) {
            out.push(c);
        } else if code <= 0xff {
            let _ = write!(out, "\\x{code:02X}");
        } else {
            let _ = write!(out, "\\u{{{code:04X}}}");
        }
    }
    out
}

/// Type names keep their compiler-generated angle markers readable.
pub fn sanitize_type_name(s: &str) -> String {
    sanitize(s)
}

pub fn sanitize_method_name(s: &str) -> String {
    sanitize(s)
}
