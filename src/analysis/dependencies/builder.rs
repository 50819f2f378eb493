use crate::analysis::context::{AnalysisConfig, CancellationToken};
use crate::analysis::dependencies::{
    DependencyGraph, DependencyKind, DependencyLevel, NodeKind,
};
use crate::analysis::xref::scanner;
use crate::errors::{AnalysisError, AnalysisResult};
use crate::model::{Module, TypeDef};
use log::debug;
use std::collections::{BTreeSet, HashSet, VecDeque};

/// One primitive type-to-type relation before aggregation.
struct Relation {
    from: String,
    to: String,
    kind: DependencyKind,
}

fn is_system_type(name: &str) -> bool {
    name.starts_with("System.") || name.starts_with("Microsoft.")
}

/// Build a dependency graph at the requested granularity. `root_type` narrows
/// the type-level graph to the reachable neighborhood of one type, expanded
/// breadth-first up to `max_depth` (defaulting to the configured cap).
pub fn build(
    module: &Module,
    config: &AnalysisConfig,
    level: DependencyLevel,
    root_type: Option<&str>,
    max_depth: Option<usize>,
    cancel: &CancellationToken,
) -> AnalysisResult<DependencyGraph> {
    if level == DependencyLevel::Assembly {
        return Ok(build_assembly_graph(module));
    }

    let defined: HashSet<&str> = module
        .types_recursive()
        .iter()
        .map(|t| t.full_name.as_str())
        .collect();

    let relations = match root_type {
        None => {
            let mut all = Vec::new();
            for t in module.types_recursive() {
                cancel.ensure_live()?;
                collect_type_relations(t, &mut all);
            }
            all
        }
        Some(root) => {
            let depth_cap = max_depth.unwrap_or(config.max_type_depth);
            expand_from_root(module, root, depth_cap, &defined, cancel)?
        }
    };
    debug!("dependency graph: {} primitive relations", relations.len());

    let mut graph = DependencyGraph::new(level);
    match level {
        DependencyLevel::Type => {
            for r in &relations {
                graph.add_node(&r.from, NodeKind::Type, !defined.contains(r.from.as_str()));
                graph.add_node(&r.to, NodeKind::Type, !defined.contains(r.to.as_str()));
                graph.add_relation(&r.from, &r.to, r.kind);
            }
        }
        DependencyLevel::Namespace => {
            for r in &relations {
                let from = namespace_of(module, &r.from);
                let to = namespace_of(module, &r.to);
                if from == to {
                    continue;
                }
                graph.add_node(&from, NodeKind::Namespace, !namespace_defined(module, &from));
                graph.add_node(&to, NodeKind::Namespace, !namespace_defined(module, &to));
                graph.add_relation(&from, &to, r.kind);
            }
        }
        DependencyLevel::Assembly => unreachable!("handled above"),
    }
    Ok(graph)
}

fn build_assembly_graph(module: &Module) -> DependencyGraph {
    let mut graph = DependencyGraph::new(DependencyLevel::Assembly);
    let own = module.assembly.name.clone();
    graph.add_node(&own, NodeKind::Assembly, false);
    for r in &module.assembly.references {
        graph.add_node(&r.name, NodeKind::Assembly, true);
        graph.add_relation(&own, &r.name, DependencyKind::AssemblyReference);
    }
    graph
}

/// Type-level relations of one type. System types are kept for inheritance
/// and implementation but dropped from usage relations.
fn collect_type_relations(t: &TypeDef, out: &mut Vec<Relation>) {
    let from = &t.full_name;
    let mut push = |to: &str, kind: DependencyKind, out: &mut Vec<Relation>| {
        if to == from {
            return;
        }
        let usage = !matches!(
            kind,
            DependencyKind::Inheritance | DependencyKind::Implementation
        );
        if usage && is_system_type(to) {
            return;
        }
        out.push(Relation {
            from: from.clone(),
            to: to.to_string(),
            kind,
        });
    };

    if let Some(base) = &t.base_type {
        if base != "System.Object" && base != "System.ValueType" && base != "System.Enum" {
            for c in scanner::type_constituents(base) {
                push(&c, DependencyKind::Inheritance, out);
            }
        }
    }
    for iface in &t.interfaces {
        for c in scanner::type_constituents(iface) {
            push(&c, DependencyKind::Implementation, out);
        }
    }
    for f in &t.fields {
        for c in scanner::type_constituents(&f.field_type) {
            push(&c, DependencyKind::FieldType, out);
        }
    }
    for m in &t.methods {
        for c in scanner::type_constituents(&m.return_type) {
            if c != "System.Void" {
                push(&c, DependencyKind::ReturnType, out);
            }
        }
        for p in &m.parameters {
            for c in scanner::type_constituents(&p.param_type) {
                push(&c, DependencyKind::ParameterType, out);
            }
        }
        let Some(body) = &m.body else {
            continue;
        };
        for local in &body.local_variables {
            for c in scanner::type_constituents(&local.var_type) {
                push(&c, DependencyKind::LocalVariable, out);
            }
        }
        for instr in &body.instructions {
            if let Some(mref) = instr.method_operand() {
                push(&mref.declaring_type, DependencyKind::MethodCall, out);
            }
            if let Some(fref) = instr.field_operand() {
                push(&fref.declaring_type, DependencyKind::FieldAccess, out);
            }
            if let Some(tref) = instr.type_operand() {
                for c in scanner::type_constituents(&tref.full_name) {
                    push(&c, DependencyKind::TypeReference, out);
                }
            }
        }
    }
}

/// Breadth-first neighborhood expansion from one root type.
fn expand_from_root(
    module: &Module,
    root: &str,
    depth_cap: usize,
    defined: &HashSet<&str>,
    cancel: &CancellationToken,
) -> AnalysisResult<Vec<Relation>> {
    if !defined.contains(root) {
        return Err(AnalysisError::NotFound(root.to_string()));
    }
    let mut relations = Vec::new();
    let mut visited: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<(String, usize)> = VecDeque::new();
    queue.push_back((root.to_string(), 0));
    visited.insert(root.to_string());

    while let Some((name, depth)) = queue.pop_front() {
        cancel.ensure_live()?;
        let Some(t) = module.find_type(&name) else {
            continue;
        };
        let before = relations.len();
        collect_type_relations(t, &mut relations);
        if depth + 1 > depth_cap {
            continue;
        }
        for r in &relations[before..] {
            if defined.contains(r.to.as_str()) && visited.insert(r.to.clone()) {
                queue.push_back((r.to.clone(), depth + 1));
            }
        }
    }
    Ok(relations)
}

fn namespace_of(module: &Module, type_name: &str) -> String {
    if let Some(t) = module.find_type(type_name) {
        if t.namespace.is_empty() {
            return "<global>".to_string();
        }
        return t.namespace.clone();
    }
    match type_name.rsplit_once('.') {
        Some((ns, _)) => ns.to_string(),
        None => "<global>".to_string(),
    }
}

fn namespace_defined(module: &Module, ns: &str) -> bool {
    module
        .types_recursive()
        .iter()
        .any(|t| t.namespace == ns)
}
