//! Cross-reference queries with access-scope pruning: before scanning, the
//! target's effective access (member access capped by its declaring type's
//! visibility chain) shrinks the set of types whose bodies are visited.

pub mod scanner;
pub mod scope;

use crate::analysis::call_graph::TypeHierarchy;
use crate::analysis::context::CancellationToken;
use crate::errors::{AnalysisError, AnalysisResult};
use crate::model::{Module, TypeDef};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XrefKind {
    Inheritance,
    InterfaceImpl,
    FieldType,
    ReturnType,
    ParamType,
    LocalVar,
    MethodCall,
    FieldRead,
    FieldWrite,
    TypeReference,
    Override,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossReference {
    pub source_type: String,
    pub source_member: Option<String>,
    pub kind: XrefKind,
    pub target: String,
    pub il_offset: Option<u32>,
}

/// Insertion-ordered sink deduplicating on
/// `(source_type, source_member, kind, il_offset)`.
#[derive(Debug, Default)]
struct XrefSink {
    seen: HashSet<(String, Option<String>, XrefKind, Option<u32>)>,
    results: Vec<CrossReference>,
}

impl XrefSink {
    fn push(&mut self, r: CrossReference) {
        let key = (
            r.source_type.clone(),
            r.source_member.clone(),
            r.kind,
            r.il_offset,
        );
        if self.seen.insert(key) {
            self.results.push(r);
        }
    }

    fn into_results(self) -> Vec<CrossReference> {
        self.results
    }
}

fn scope_types<'a>(module: &'a Module, names: &[String]) -> Vec<&'a TypeDef> {
    let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
    module
        .types_recursive()
        .into_iter()
        .filter(|t| wanted.contains(t.full_name.as_str()))
        .collect()
}

/// Every reference to a type: inheritance, interface implementation, field
/// and signature types, local-variable types, and TypeRef operands.
pub fn find_references_to_type(
    module: &Module,
    type_name: &str,
    cancel: &CancellationToken,
) -> AnalysisResult<Vec<CrossReference>> {
    let target = module
        .find_type(type_name)
        .ok_or_else(|| AnalysisError::NotFound(type_name.to_string()))?;

    let access = scope::effective_type_access(module);
    let effective = access
        .get(&target.full_name)
        .copied()
        .unwrap_or(crate::model::MemberAccess::Public);
    let scope = scope::reference_scope(module, &target.full_name, effective);
    debug!(
        "xref: scanning {} types for references to {type_name}",
        scope.types.len()
    );

    let mut sink = XrefSink::default();
    for t in scope_types(module, &scope.types) {
        cancel.ensure_live()?;
        scan_type_for_type_refs(t, type_name, &mut sink);
    }
    Ok(sink.into_results())
}

fn scan_type_for_type_refs(t: &TypeDef, target: &str, sink: &mut XrefSink) {
    if let Some(base) = &t.base_type {
        if scanner::mentions_type(base, target) {
            sink.push(CrossReference {
                source_type: t.full_name.clone(),
                source_member: None,
                kind: XrefKind::Inheritance,
                target: target.to_string(),
                il_offset: None,
            });
        }
    }
    for iface in &t.interfaces {
        if scanner::mentions_type(iface, target) {
            sink.push(CrossReference {
                source_type: t.full_name.clone(),
                source_member: None,
                kind: XrefKind::InterfaceImpl,
                target: target.to_string(),
                il_offset: None,
            });
        }
    }
    for f in &t.fields {
        if scanner::mentions_type(&f.field_type, target) {
            sink.push(CrossReference {
                source_type: t.full_name.clone(),
                source_member: Some(f.name.clone()),
                kind: XrefKind::FieldType,
                target: target.to_string(),
                il_offset: None,
            });
        }
    }
    for m in &t.methods {
        if scanner::mentions_type(&m.return_type, target) {
            sink.push(CrossReference {
                source_type: t.full_name.clone(),
                source_member: Some(m.name.clone()),
                kind: XrefKind::ReturnType,
                target: target.to_string(),
                il_offset: None,
            });
        }
        for p in &m.parameters {
            if scanner::mentions_type(&p.param_type, target) {
                sink.push(CrossReference {
                    source_type: t.full_name.clone(),
                    source_member: Some(m.name.clone()),
                    kind: XrefKind::ParamType,
                    target: target.to_string(),
                    il_offset: None,
                });
            }
        }
        let Some(body) = &m.body else {
            continue;
        };
        for local in &body.local_variables {
            if scanner::mentions_type(&local.var_type, target) {
                sink.push(CrossReference {
                    source_type: t.full_name.clone(),
                    source_member: Some(m.name.clone()),
                    kind: XrefKind::LocalVar,
                    target: target.to_string(),
                    il_offset: None,
                });
            }
        }
        for instr in &body.instructions {
            if let Some(tr) = instr.type_operand() {
                if scanner::mentions_type(&tr.full_name, target) {
                    sink.push(CrossReference {
                        source_type: t.full_name.clone(),
                        source_member: Some(m.name.clone()),
                        kind: XrefKind::TypeReference,
                        target: target.to_string(),
                        il_offset: Some(instr.offset),
                    });
                }
            }
        }
    }
}

/// Call sites referencing `type_name.method_name` through `call`, `callvirt`,
/// `newobj`, `ldftn`, or `ldvirtftn`. For P/Invoke targets the match extends
/// to any stub with the same native entry point and module.
pub fn find_calls_to_method(
    module: &Module,
    type_name: &str,
    method_name: &str,
    cancel: &CancellationToken,
) -> AnalysisResult<Vec<CrossReference>> {
    let target = module
        .find_method(type_name, method_name)
        .ok_or_else(|| AnalysisError::NotFound(format!("{type_name}.{method_name}")))?;

    let access = scope::effective_type_access(module);
    let effective = scope::effective_member_access(&access, type_name, target.access);
    let scope = scope::reference_scope(module, type_name, effective);
    let qualified = format!("{type_name}.{method_name}");

    let mut sink = XrefSink::default();
    for t in scope_types(module, &scope.types) {
        cancel.ensure_live()?;
        for m in &t.methods {
            let Some(body) = &m.body else {
                continue;
            };
            for instr in &body.instructions {
                let call_like = instr.is_call()
                    || instr.is_newobj()
                    || instr.is_load_function_pointer();
                if !call_like {
                    continue;
                }
                let Some(mref) = instr.method_operand() else {
                    continue;
                };
                let direct = mref.qualified_name() == qualified;
                let native = !direct
                    && target.is_pinvoke
                    && scanner::matches_pinvoke_target(
                        module,
                        target,
                        &mref.declaring_type,
                        &mref.name,
                    );
                if direct || native {
                    sink.push(CrossReference {
                        source_type: t.full_name.clone(),
                        source_member: Some(m.name.clone()),
                        kind: XrefKind::MethodCall,
                        target: qualified.clone(),
                        il_offset: Some(instr.offset),
                    });
                }
            }
        }
    }
    Ok(sink.into_results())
}

/// Field reads (`ldfld`/`ldflda`/`ldsfld`/`ldsflda`) and writes
/// (`stfld`/`stsfld`) of one field.
pub fn find_field_usages(
    module: &Module,
    type_name: &str,
    field_name: &str,
    cancel: &CancellationToken,
) -> AnalysisResult<Vec<CrossReference>> {
    let target = module
        .find_type(type_name)
        .and_then(|t| t.find_field(field_name))
        .ok_or_else(|| AnalysisError::NotFound(format!("{type_name}.{field_name}")))?;

    let access = scope::effective_type_access(module);
    let effective = scope::effective_member_access(&access, type_name, target.access);
    let scope = scope::reference_scope(module, type_name, effective);
    let qualified = format!("{type_name}.{field_name}");

    let mut sink = XrefSink::default();
    for t in scope_types(module, &scope.types) {
        cancel.ensure_live()?;
        for m in &t.methods {
            let Some(body) = &m.body else {
                continue;
            };
            for instr in &body.instructions {
                let Some(fref) = instr.field_operand() else {
                    continue;
                };
                if fref.declaring_type != type_name || fref.name != field_name {
                    continue;
                }
                let kind = if instr.is_field_write() {
                    XrefKind::FieldWrite
                } else if instr.is_field_read() {
                    XrefKind::FieldRead
                } else {
                    continue;
                };
                sink.push(CrossReference {
                    source_type: t.full_name.clone(),
                    source_member: Some(m.name.clone()),
                    kind,
                    target: qualified.clone(),
                    il_offset: Some(instr.offset),
                });
            }
        }
    }
    Ok(sink.into_results())
}

/// Overriding methods in transitive subtypes: virtual, same name, same
/// parameter types by full name in order, same return type.
pub fn find_method_overrides(
    module: &Module,
    hierarchy: &TypeHierarchy,
    type_name: &str,
    method_name: &str,
    cancel: &CancellationToken,
) -> AnalysisResult<Vec<CrossReference>> {
    let base = module
        .find_method(type_name, method_name)
        .ok_or_else(|| AnalysisError::NotFound(format!("{type_name}.{method_name}")))?;
    let qualified = format!("{type_name}.{method_name}");

    let mut sink = XrefSink::default();
    for subtype in hierarchy.transitive_subtypes(type_name) {
        cancel.ensure_live()?;
        let Some(t) = module.find_type(&subtype) else {
            continue;
        };
        for m in &t.methods {
            if m.is_virtual && m.name == method_name && scanner::signatures_match(base, m) {
                sink.push(CrossReference {
                    source_type: t.full_name.clone(),
                    source_member: Some(m.name.clone()),
                    kind: XrefKind::Override,
                    target: qualified.clone(),
                    il_offset: None,
                });
            }
        }
    }
    Ok(sink.into_results())
}

/// Implementations of an interface method: explicit (listed in the method's
/// `overrides`) or implicit (public method with matching name and signature
/// on a type implementing the interface).
pub fn find_interface_impls(
    module: &Module,
    iface_name: &str,
    method_name: &str,
    cancel: &CancellationToken,
) -> AnalysisResult<Vec<CrossReference>> {
    let iface = module
        .find_type(iface_name)
        .ok_or_else(|| AnalysisError::NotFound(iface_name.to_string()))?;
    if !iface.is_interface {
        return Err(AnalysisError::InvalidInput(format!(
            "{iface_name} is not an interface"
        )));
    }
    let iface_method = iface.find_method(method_name);
    let qualified = format!("{iface_name}.{method_name}");

    let mut sink = XrefSink::default();
    for t in module.types_recursive() {
        cancel.ensure_live()?;
        if !t.interfaces.iter().any(|i| scanner::mentions_type(i, iface_name)) {
            continue;
        }
        for m in &t.methods {
            let explicit = m.overrides.iter().any(|o| o == &qualified);
            let implicit = m.access == crate::model::MemberAccess::Public
                && m.name == method_name
                && iface_method.is_none_or(|im| scanner::signatures_match(im, m));
            if explicit || implicit {
                sink.push(CrossReference {
                    source_type: t.full_name.clone(),
                    source_member: Some(m.name.clone()),
                    kind: XrefKind::InterfaceImpl,
                    target: qualified.clone(),
                    il_offset: None,
                });
            }
        }
    }
    Ok(sink.into_results())
}
