use crate::model::{MethodDef, Module};

/// Decompose a type name into the names it mentions: the type itself with
/// array/by-ref/pointer suffixes stripped, plus every generic argument,
/// recursively. `List`1<My.Foo[]>` yields `List`1` and `My.Foo`.
pub fn type_constituents(name: &str) -> Vec<String> {
    let mut out = Vec::new();
    constituents(name, &mut out);
    out
}

fn constituents(name: &str, out: &mut Vec<String>) {
    let s = strip_element_suffixes(name.trim());
    if let Some(lt) = s.find('<') {
        if s.ends_with('>') {
            out.push(s[..lt].to_string());
            for part in split_top_level(&s[lt + 1..s.len() - 1]) {
                constituents(part, out);
            }
            return;
        }
    }
    if !s.is_empty() {
        out.push(s.to_string());
    }
}

fn strip_element_suffixes(mut s: &str) -> &str {
    loop {
        if let Some(rest) = s.strip_suffix("[]") {
            s = rest;
        } else if let Some(rest) = s.strip_suffix('&').or_else(|| s.strip_suffix('*')) {
            s = rest;
        } else {
            return s;
        }
    }
}

/// Split on commas at angle-bracket depth zero.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// True when `name` mentions `target` directly or through a generic
/// instantiation, array, by-ref, or pointer form.
pub fn mentions_type(name: &str, target: &str) -> bool {
    type_constituents(name).iter().any(|c| c == target)
}

/// Normalized native module name: file extension and a `lib` prefix removed,
/// lowercased. `libSQLite.DLL` and `sqlite` compare equal.
pub fn normalize_native_module(name: &str) -> String {
    let lower = name.to_lowercase();
    let stem = lower
        .strip_suffix(".dll")
        .or_else(|| lower.strip_suffix(".so"))
        .or_else(|| lower.strip_suffix(".dylib"))
        .unwrap_or(&lower);
    stem.strip_prefix("lib").unwrap_or(stem).to_string()
}

/// Native import identity of a P/Invoke method: entry point (defaulting to
/// the method name) plus normalized module.
pub fn pinvoke_identity(method: &MethodDef) -> Option<(String, String)> {
    let info = method.pinvoke.as_ref()?;
    let entry = info
        .entry_point
        .clone()
        .unwrap_or_else(|| method.name.clone());
    Some((entry, normalize_native_module(&info.module)))
}

/// Whether a call-site operand naming `referenced` resolves to the same
/// native import as the P/Invoke `target`.
pub fn matches_pinvoke_target(
    module: &Module,
    target: &MethodDef,
    referenced_type: &str,
    referenced_name: &str,
) -> bool {
    let Some(target_id) = pinvoke_identity(target) else {
        return false;
    };
    let Some(referenced) = module.find_method(referenced_type, referenced_name) else {
        return false;
    };
    pinvoke_identity(referenced).is_some_and(|id| id == target_id)
}

/// Parameter/return signature equality by full type name, in order.
pub fn signatures_match(a: &MethodDef, b: &MethodDef) -> bool {
    a.return_type == b.return_type && a.parameter_types() == b.parameter_types()
}
