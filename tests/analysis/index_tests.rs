use crate::fixtures;
use cilscope::AnalysisSession;
use cilscope::analysis::index::{MemberKind, TypeKind};
use cilscope::model::{MemberAccess, MethodDef, TypeDef};

fn indexed_module() -> cilscope::model::Module {
    let mut visible = fixtures::class("App.Core", "OrderService");
    visible.methods = vec![
        fixtures::method("App.Core.OrderService", "Submit", "System.Void", None),
        MethodDef {
            is_constructor: true,
            ..fixtures::method("App.Core.OrderService", ".ctor", "System.Void", None)
        },
        // Static constructors never reach the index.
        MethodDef {
            is_constructor: true,
            is_static: true,
            ..fixtures::method("App.Core.OrderService", ".cctor", "System.Void", None)
        },
    ];
    visible.fields = vec![fixtures::field(
        "_queue",
        "System.Int32",
        MemberAccess::Private,
        false,
    )];
    visible.properties = vec![cilscope::model::PropertyDef {
        name: "Count".to_string(),
        property_type: "System.Int32".to_string(),
        access: MemberAccess::Public,
        is_static: false,
        has_getter: true,
        has_setter: false,
        metadata_token: 0,
    }];

    let module_type = TypeDef {
        full_name: "<Module>".to_string(),
        name: "<Module>".to_string(),
        ..TypeDef::default()
    };
    let closure = fixtures::class("App.Core", "<>c__DisplayClass1_0");
    let marker = fixtures::class("App.Core", "Helper__Generated");

    let mut other = fixtures::class("App.Web", "OrderController");
    other.methods = vec![fixtures::method(
        "App.Web.OrderController",
        "Submit",
        "System.Void",
        None,
    )];

    fixtures::module(
        "AppLib",
        vec![module_type, visible, closure, marker, other],
    )
}

#[test]
fn compiler_artifacts_are_filtered_on_build() {
    let session = AnalysisSession::new(indexed_module());
    let types = session.type_index();

    let names: Vec<&str> = types.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["OrderService", "OrderController"]);
}

#[test]
fn member_index_keeps_discovery_order_and_drops_cctor() {
    let session = AnalysisSession::new(indexed_module());
    let members = session.member_index();

    let names: Vec<&str> = members.entries().iter().map(|e| e.name.as_str()).collect();
    // Fields, then methods, then properties, per type in module order.
    assert_eq!(names, vec!["_queue", "Submit", ".ctor", "Count", "Submit"]);

    let kinds: Vec<MemberKind> = members.entries().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            MemberKind::Field,
            MemberKind::Method,
            MemberKind::Constructor,
            MemberKind::Property,
            MemberKind::Method,
        ]
    );
}

#[test]
fn simple_name_lookup_is_case_insensitive_and_multivalued() {
    let session = AnalysisSession::new(indexed_module());
    let members = session.member_index();

    let hits = members.by_simple_name("submit");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].declaring_type, "App.Core.OrderService");
    assert_eq!(hits[1].declaring_type, "App.Web.OrderController");
}

#[test]
fn ids_are_unique_and_stable_across_rebuilds() {
    let module = indexed_module();
    let a = AnalysisSession::new(module.clone());
    let b = AnalysisSession::new(module);

    let ids_a: Vec<String> = a
        .member_index()
        .entries()
        .iter()
        .map(|e| e.id.clone())
        .collect();
    let ids_b: Vec<String> = b
        .member_index()
        .entries()
        .iter()
        .map(|e| e.id.clone())
        .collect();
    assert_eq!(ids_a, ids_b);

    let mut unique = ids_a.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids_a.len());
}

#[test]
fn substring_search_honors_limit() {
    let session = AnalysisSession::new(indexed_module());
    let types = session.type_index();

    let (hits, has_more) = types.search("order", 1);
    assert_eq!(hits.len(), 1);
    assert!(has_more);

    let (hits, has_more) = types.search("order", 10);
    assert_eq!(hits.len(), 2);
    assert!(!has_more);
}

#[test]
fn type_detail_joins_members() {
    let session = AnalysisSession::new(indexed_module());
    let types = session.type_index();
    let id = types
        .by_full_name("App.Core.OrderService")
        .expect("entry")
        .id
        .clone();

    let detail = session.get_type_detail(&id).expect("detail");
    assert_eq!(detail.entry.kind, TypeKind::Class);
    assert_eq!(detail.members.len(), 4);

    assert!(session.get_type_detail("missing-id").is_err());
}

#[test]
fn browse_namespace_lists_children_and_types() {
    let session = AnalysisSession::new(indexed_module());

    let root = session.browse_namespace("App");
    assert_eq!(root.child_namespaces, vec!["App.Core", "App.Web"]);
    assert!(root.types.is_empty());

    let core = session.browse_namespace("App.Core");
    assert_eq!(core.types.len(), 1);
    assert_eq!(core.types[0].name, "OrderService");
    assert!(core.child_namespaces.is_empty());
}
