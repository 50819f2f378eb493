use crate::analysis::call_graph::hierarchy::TypeHierarchy;
use crate::analysis::call_graph::{CallEdge, CallGraph, CallKind, CallNode};
use crate::analysis::context::{AnalysisConfig, CancellationToken};
use crate::analysis::identity;
use crate::errors::AnalysisResult;
use crate::model::{Instruction, MethodDef, MethodRef, Module, TypeDef};
use log::debug;
#[cfg(feature = "parallel_analysis")]
use rayon::prelude::*;

/// Reflection entry points whose call sites get a pattern and a best-effort
/// backward target scan.
const REFLECTION_APIS: &[(&str, &str)] = &[
    ("System.Type", "GetMethod"),
    ("System.Type", "GetProperty"),
    ("System.Type", "GetField"),
    ("System.Type", "GetMember"),
    ("System.Type", "InvokeMember"),
    ("System.Type", "GetType"),
    ("System.Reflection.MethodInfo", "Invoke"),
    ("System.Reflection.MethodBase", "Invoke"),
    ("System.Reflection.PropertyInfo", "GetValue"),
    ("System.Reflection.PropertyInfo", "SetValue"),
    ("System.Reflection.FieldInfo", "GetValue"),
    ("System.Reflection.FieldInfo", "SetValue"),
    ("System.Activator", "CreateInstance"),
];

const CLOSURE_MARKERS: &[&str] = &["<>c", "<>c__DisplayClass", "d__"];

/// Well-known BCL delegate types that resolve as delegates even though they
/// are not defined in the module under analysis.
const BCL_DELEGATE_PREFIXES: &[&str] = &[
    "System.Action",
    "System.Func",
    "System.Predicate",
    "System.Comparison",
    "System.EventHandler",
];

/// Build the module call graph. Parallelizes over types when the
/// `parallel_analysis` feature is enabled; per-caller edge lists stay local
/// and the merge preserves module order, so both modes agree.
pub fn build(
    module: &Module,
    hierarchy: &TypeHierarchy,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
) -> AnalysisResult<CallGraph> {
    let types = module.types_recursive();

    #[cfg(feature = "parallel_analysis")]
    let per_type: Vec<Vec<CallEdge>> = {
        let results: Vec<AnalysisResult<Vec<CallEdge>>> = types
            .par_iter()
            .map(|t| extract_type_edges(t, hierarchy, config, cancel))
            .collect();
        let mut merged = Vec::with_capacity(results.len());
        for r in results {
            merged.push(r?);
        }
        merged
    };

    #[cfg(not(feature = "parallel_analysis"))]
    let per_type: Vec<Vec<CallEdge>> = {
        let mut merged = Vec::with_capacity(types.len());
        for t in &types {
            merged.push(extract_type_edges(t, hierarchy, config, cancel)?);
        }
        merged
    };

    let mut graph = CallGraph {
        module_guid: module.guid,
        ..CallGraph::default()
    };
    for edges in per_type {
        for edge in edges {
            ensure_node(&mut graph, &edge.caller, module, hierarchy);
            ensure_node(&mut graph, &edge.callee, module, hierarchy);
            graph.edges.push(edge);
        }
    }
    debug!(
        "call graph: {} nodes, {} edges",
        graph.nodes.len(),
        graph.edges.len()
    );
    Ok(graph)
}

fn ensure_node(graph: &mut CallGraph, id: &str, module: &Module, hierarchy: &TypeHierarchy) {
    if graph.nodes.contains_key(id) {
        return;
    }
    let (declaring_type, name) = split_qualified(id);
    let defined = hierarchy.is_defined(&declaring_type);
    let member_id = if defined {
        module
            .find_type(&declaring_type)
            .and_then(|t| t.methods.iter().find(|m| m.name == name))
            .map(|m| identity::member_id(module.guid, &identity::method_signature(m)))
    } else {
        None
    };
    graph.nodes.insert(
        id.to_string(),
        CallNode {
            id: id.to_string(),
            name,
            declaring_type,
            member_id,
            is_external: !defined,
        },
    );
}

fn split_qualified(id: &str) -> (String, String) {
    // Constructor names start with a dot themselves.
    for ctor in ["..ctor", "..cctor"] {
        if let Some(declaring) = id.strip_suffix(ctor) {
            return (declaring.to_string(), ctor[1..].to_string());
        }
    }
    match id.rfind('.') {
        Some(dot) => (id[..dot].to_string(), id[dot + 1..].to_string()),
        None => (String::new(), id.to_string()),
    }
}

fn extract_type_edges(
    t: &TypeDef,
    hierarchy: &TypeHierarchy,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
) -> AnalysisResult<Vec<CallEdge>> {
    let mut edges = Vec::new();
    for method in &t.methods {
        cancel.ensure_live()?;
        let Some(body) = &method.body else {
            continue;
        };
        extract_method_edges(method, &body.instructions, hierarchy, config, &mut edges);
    }
    Ok(edges)
}

fn extract_method_edges(
    method: &MethodDef,
    instructions: &[Instruction],
    hierarchy: &TypeHierarchy,
    config: &AnalysisConfig,
    edges: &mut Vec<CallEdge>,
) {
    let caller = format!("{}.{}", method.declaring_type, method.name);
    for (idx, instr) in instructions.iter().enumerate() {
        match instr.opcode.as_str() {
            "call" | "callvirt" => {
                let Some(target) = instr.method_operand() else {
                    continue;
                };
                if let Some(pattern) = reflection_pattern(target) {
                    push_reflection_edges(
                        &caller,
                        instr,
                        idx,
                        instructions,
                        target,
                        pattern,
                        hierarchy,
                        config,
                        edges,
                    );
                    continue;
                }
                let virtual_call = instr.opcode == "callvirt";
                let kind = if virtual_call {
                    if hierarchy.is_interface(&target.declaring_type) {
                        CallKind::Interface
                    } else {
                        CallKind::Virtual
                    }
                } else {
                    CallKind::Direct
                };
                let mut edge = base_edge(&caller, target.qualified_name(), instr.offset, kind);
                edge.is_external = !hierarchy.is_defined(&target.declaring_type);
                if virtual_call {
                    edge.requires_resolution = true;
                    edge.possible_targets =
                        hierarchy.virtual_candidates(&target.declaring_type, &target.name);
                    edge.is_polymorphic = edge.possible_targets.len() > 1;
                }
                edges.push(edge);
            }
            "newobj" => {
                let Some(ctor) = instr.method_operand() else {
                    continue;
                };
                push_newobj_edges(&caller, instr, idx, instructions, ctor, hierarchy, config, edges);
            }
            _ => {}
        }
    }
}

fn base_edge(caller: &str, callee: String, il_offset: u32, kind: CallKind) -> CallEdge {
    CallEdge {
        caller: caller.to_string(),
        callee,
        il_offset,
        kind,
        is_external: false,
        requires_resolution: false,
        possible_targets: Vec::new(),
        is_polymorphic: false,
        delegate_type: None,
        reflection_pattern: None,
        is_compiler_generated: false,
    }
}

fn is_closure_marked(name: &str) -> bool {
    CLOSURE_MARKERS.iter().any(|m| name.contains(m))
}

fn looks_like_delegate(full_name: &str, hierarchy: &TypeHierarchy) -> bool {
    if hierarchy.is_defined(full_name) {
        return hierarchy.is_delegate(full_name);
    }
    BCL_DELEGATE_PREFIXES
        .iter()
        .any(|p| full_name == *p || full_name.starts_with(&format!("{p}`")))
}

/// `newobj` classification: lambda-closure construction, delegate
/// construction over a loaded function pointer, or a plain constructor call.
fn push_newobj_edges(
    caller: &str,
    instr: &Instruction,
    idx: usize,
    instructions: &[Instruction],
    ctor: &MethodRef,
    hierarchy: &TypeHierarchy,
    config: &AnalysisConfig,
    edges: &mut Vec<CallEdge>,
) {
    let target_type = &ctor.declaring_type;

    if is_closure_marked(target_type) {
        if let Some(ftn) =
            preceding_function_pointer(instructions, idx, instr.offset, config.lambda_ldftn_window)
        {
            let mut edge = base_edge(caller, ftn.qualified_name(), instr.offset, CallKind::Lambda);
            edge.is_compiler_generated = true;
            edge.is_external = !hierarchy.is_defined(&ftn.declaring_type);
            edges.push(edge);
            return;
        }
    }

    if looks_like_delegate(target_type, hierarchy) {
        // The delegate constructor itself is noise; the edge goes to the
        // method whose pointer was loaded right before.
        if let Some(ftn) = preceding_function_pointer(instructions, idx, instr.offset, 8) {
            let mut edge =
                base_edge(caller, ftn.qualified_name(), instr.offset, CallKind::Delegate);
            edge.delegate_type = Some(target_type.clone());
            edge.is_external = !hierarchy.is_defined(&ftn.declaring_type);
            edge.is_compiler_generated = ftn.name.starts_with('<');
            edges.push(edge);
            return;
        }
    }

    let mut edge = base_edge(
        caller,
        ctor.qualified_name(),
        instr.offset,
        CallKind::Constructor,
    );
    edge.is_external = !hierarchy.is_defined(target_type);
    edges.push(edge);
}

/// Nearest `ldftn`/`ldvirtftn` within `window` bytes before `offset`.
fn preceding_function_pointer<'a>(
    instructions: &'a [Instruction],
    idx: usize,
    offset: u32,
    window: u32,
) -> Option<&'a MethodRef> {
    instructions[..idx]
        .iter()
        .rev()
        .take_while(|i| offset.saturating_sub(i.offset) <= window)
        .find(|i| i.is_load_function_pointer())
        .and_then(|i| i.method_operand())
}

fn reflection_pattern(target: &MethodRef) -> Option<String> {
    REFLECTION_APIS
        .iter()
        .find(|(ty, name)| target.declaring_type == *ty && target.name == *name)
        .map(|(ty, name)| {
            let short = ty.rsplit('.').next().unwrap_or(ty);
            format!("{short}.{name}")
        })
}

/// Record the reflection call itself and, when the backward scan resolves a
/// concrete target, a second resolved reflection edge.
fn push_reflection_edges(
    caller: &str,
    instr: &Instruction,
    idx: usize,
    instructions: &[Instruction],
    api: &MethodRef,
    pattern: String,
    hierarchy: &TypeHierarchy,
    config: &AnalysisConfig,
    edges: &mut Vec<CallEdge>,
) {
    let mut call_edge = base_edge(
        caller,
        api.qualified_name(),
        instr.offset,
        CallKind::Reflection,
    );
    call_edge.is_external = true;
    call_edge.requires_resolution = true;
    call_edge.reflection_pattern = Some(pattern.clone());

    let window = config.reflection_scan_window;
    let mut nearest_string: Option<&str> = None;
    let mut nearest_type: Option<&str> = None;
    for prior in instructions[..idx]
        .iter()
        .rev()
        .take_while(|i| instr.offset.saturating_sub(i.offset) <= window)
    {
        if nearest_string.is_none() && prior.is_load_string() {
            if let crate::model::Operand::String(s) = &prior.operand {
                nearest_string = Some(s);
            }
        }
        if nearest_type.is_none() && prior.opcode == "ldtoken" {
            if let Some(t) = prior.type_operand() {
                nearest_type = Some(&t.full_name);
            }
        }
    }

    let resolved = match (nearest_type, nearest_string) {
        (Some(t), Some(s)) => Some(format!("{t}.{s}")),
        (Some(t), None) if pattern.ends_with("CreateInstance") => Some(format!("{t}..ctor")),
        (None, Some(s)) if s.contains('.') => Some(s.to_string()),
        _ => None,
    };

    if let Some(target) = resolved {
        let mut edge = base_edge(caller, target, instr.offset, CallKind::Reflection);
        edge.reflection_pattern = Some(pattern);
        let (declaring, _) = split_qualified(&edge.callee);
        edge.is_external = !hierarchy.is_defined(&declaring);
        call_edge.possible_targets = vec![edge.callee.clone()];
        edges.push(call_edge);
        edges.push(edge);
    } else {
        edges.push(call_edge);
    }
}
