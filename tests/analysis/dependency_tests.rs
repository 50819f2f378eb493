use crate::fixtures;
use cilscope::analysis::dependencies::{DependencyKind, DependencyLevel, NodeKind};
use cilscope::model::MemberAccess;
use cilscope::{AnalysisError, AnalysisSession, CancellationToken};

fn cancel() -> CancellationToken {
    CancellationToken::new()
}

fn layered_module() -> cilscope::model::Module {
    let mut repo = fixtures::class("Data", "Repository");
    repo.methods = vec![fixtures::method(
        "Data.Repository",
        "Save",
        "System.Void",
        Some(fixtures::body(vec![fixtures::ret(0)])),
    )];

    let mut service = fixtures::class("Core", "Service");
    service.base_type = Some("Core.ServiceBase".to_string());
    service.fields = vec![
        fixtures::field("primary", "Data.Repository", MemberAccess::Private, false),
        fixtures::field("fallback", "Data.Repository", MemberAccess::Private, false),
        // System usage is excluded from usage edges.
        fixtures::field("cache", "System.Collections.Generic.List`1", MemberAccess::Private, false),
    ];
    service.methods = vec![fixtures::method(
        "Core.Service",
        "Flush",
        "System.Void",
        Some(fixtures::body(vec![
            fixtures::call(0, "Data.Repository", "Save", "System.Void"),
            fixtures::ret(5),
        ])),
    )];

    let mut base = fixtures::class("Core", "ServiceBase");
    base.is_abstract = true;

    fixtures::module("Layers", vec![base, service, repo])
}

#[test]
fn duplicate_relations_aggregate_into_weight() {
    let session = AnalysisSession::new(layered_module());
    let graph = session
        .build_dependency_graph(DependencyLevel::Type, None, None, &cancel())
        .expect("graph");

    let field_edge = graph
        .edges
        .iter()
        .find(|e| {
            e.from == "Core.Service"
                && e.to == "Data.Repository"
                && e.kind == DependencyKind::FieldType
        })
        .expect("field edge");
    // Two fields of the same type fold into one weighted edge.
    assert_eq!(field_edge.weight, 2);
}

#[test]
fn type_level_edges_are_kind_discriminated() {
    let session = AnalysisSession::new(layered_module());
    let graph = session
        .build_dependency_graph(DependencyLevel::Type, None, None, &cancel())
        .expect("graph");

    let pair_kinds: Vec<DependencyKind> = graph
        .edges
        .iter()
        .filter(|e| e.from == "Core.Service" && e.to == "Data.Repository")
        .map(|e| e.kind)
        .collect();
    assert!(pair_kinds.contains(&DependencyKind::FieldType));
    assert!(pair_kinds.contains(&DependencyKind::MethodCall));
    assert_eq!(pair_kinds.len(), 2);
}

#[test]
fn system_types_are_excluded_from_usage_but_kept_for_inheritance() {
    let mut derived = fixtures::class("App", "Special");
    derived.base_type = Some("System.EventArgs".to_string());
    derived.fields = vec![fixtures::field(
        "buffer",
        "System.Text.StringBuilder",
        MemberAccess::Private,
        false,
    )];
    let session = AnalysisSession::new(fixtures::module("App", vec![derived]));
    let graph = session
        .build_dependency_graph(DependencyLevel::Type, None, None, &cancel())
        .expect("graph");

    assert!(graph.edges.iter().any(|e| {
        e.to == "System.EventArgs" && e.kind == DependencyKind::Inheritance
    }));
    assert!(!graph
        .edges
        .iter()
        .any(|e| e.to == "System.Text.StringBuilder"));

    let node = graph.nodes.get("System.EventArgs").expect("external node");
    assert!(node.is_external);
    assert_eq!(node.kind, NodeKind::Type);
}

#[test]
fn namespace_level_merges_kinds_and_accumulates_weight() {
    let session = AnalysisSession::new(layered_module());
    let graph = session
        .build_dependency_graph(DependencyLevel::Namespace, None, None, &cancel())
        .expect("graph");

    let edges: Vec<_> = graph
        .edges
        .iter()
        .filter(|e| e.from == "Core" && e.to == "Data")
        .collect();
    // One merged edge; weight counts both field relations and the call.
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].weight, 3);
    // First discovered kind wins.
    assert_eq!(edges[0].kind, DependencyKind::FieldType);
}

#[test]
fn assembly_level_lists_references() {
    let mut m = layered_module();
    m.assembly.references = vec![
        cilscope::model::AssemblyRef {
            name: "System.Runtime".to_string(),
            version: "8.0.0.0".to_string(),
        },
        cilscope::model::AssemblyRef {
            name: "Newtonsoft.Json".to_string(),
            version: "13.0.0.0".to_string(),
        },
    ];
    let session = AnalysisSession::new(m);
    let graph = session
        .build_dependency_graph(DependencyLevel::Assembly, None, None, &cancel())
        .expect("graph");

    assert_eq!(graph.edges.len(), 2);
    assert!(graph
        .edges
        .iter()
        .all(|e| e.kind == DependencyKind::AssemblyReference && e.from == "Layers"));
    assert!(graph.nodes["Newtonsoft.Json"].is_external);
    assert!(!graph.nodes["Layers"].is_external);
}

#[test]
fn root_expansion_honors_depth_cap() {
    // A -> B -> C: depth 1 from A must not pull in C's own relations.
    let mut a = fixtures::class("Chain", "A");
    a.fields = vec![fixtures::field("b", "Chain.B", MemberAccess::Private, false)];
    let mut b = fixtures::class("Chain", "B");
    b.fields = vec![fixtures::field("c", "Chain.C", MemberAccess::Private, false)];
    let mut c = fixtures::class("Chain", "C");
    c.fields = vec![fixtures::field("a", "Chain.A", MemberAccess::Private, false)];

    let session = AnalysisSession::new(fixtures::module("Chain", vec![a, b, c]));
    let graph = session
        .build_dependency_graph(DependencyLevel::Type, Some("Chain.A"), Some(1), &cancel())
        .expect("graph");

    assert!(graph.edges.iter().any(|e| e.from == "Chain.A" && e.to == "Chain.B"));
    assert!(graph.edges.iter().any(|e| e.from == "Chain.B" && e.to == "Chain.C"));
    assert!(!graph.edges.iter().any(|e| e.from == "Chain.C"));

    let unknown = session.build_dependency_graph(
        DependencyLevel::Type,
        Some("Chain.Nope"),
        None,
        &cancel(),
    );
    assert!(matches!(unknown, Err(AnalysisError::NotFound(_))));
}

#[test]
fn cycles_are_detected_across_the_aggregated_graph() {
    let mut a = fixtures::class("Chain", "A");
    a.fields = vec![fixtures::field("b", "Chain.B", MemberAccess::Private, false)];
    let mut b = fixtures::class("Chain", "B");
    b.fields = vec![fixtures::field("a", "Chain.A", MemberAccess::Private, false)];

    let session = AnalysisSession::new(fixtures::module("Chain", vec![a, b]));
    let graph = session
        .build_dependency_graph(DependencyLevel::Type, None, None, &cancel())
        .expect("graph");

    let cycles = graph.find_cycles();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0], vec!["Chain.A".to_string(), "Chain.B".to_string()]);
}
