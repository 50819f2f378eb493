use crate::fixtures;
use cilscope::analysis::patterns::PatternKind;
use cilscope::model::{MemberAccess, MethodDef};
use cilscope::{AnalysisSession, CancellationToken};

fn cancel() -> CancellationToken {
    CancellationToken::new()
}

#[test]
fn singleton_is_detected_with_strong_confidence() {
    let session = AnalysisSession::new(fixtures::module(
        "Diag",
        vec![fixtures::logger_singleton_type()],
    ));
    let patterns = session
        .detect_patterns(Some("Diag.Logger"), &cancel())
        .expect("patterns");

    let singleton = patterns
        .iter()
        .find(|p| p.kind == PatternKind::Singleton)
        .expect("singleton detected");
    assert!(singleton.confidence >= 0.8);
    assert!(singleton
        .evidence
        .iter()
        .any(|e| e.contains("Private constructor")));
    assert!(singleton
        .evidence
        .iter()
        .any(|e| e.contains("Static instance field")));
}

#[test]
fn factory_scores_with_method_count_and_name() {
    let mut factory = fixtures::class("App", "WidgetFactory");
    factory.methods = vec![
        fixtures::method("App.WidgetFactory", "CreateButton", "App.Button", None),
        fixtures::method("App.WidgetFactory", "CreateLabel", "App.Label", None),
    ];
    let session = AnalysisSession::new(fixtures::module("App", vec![factory]));
    let patterns = session.detect_patterns(None, &cancel()).expect("patterns");

    let p = patterns
        .iter()
        .find(|p| p.kind == PatternKind::Factory)
        .expect("factory");
    // 0.4 base + 0.2 for two creators + 0.3 for the name.
    assert!((p.confidence - 0.9).abs() < 1e-9);
}

#[test]
fn builder_requires_build_and_fluent_setters() {
    let mut builder = fixtures::class("App", "RequestBuilder");
    builder.methods = vec![
        fixtures::method("App.RequestBuilder", "Build", "App.Request", None),
        fixtures::method("App.RequestBuilder", "WithUrl", "App.RequestBuilder", None),
        fixtures::method("App.RequestBuilder", "WithBody", "App.RequestBuilder", None),
    ];
    let session = AnalysisSession::new(fixtures::module("App", vec![builder]));
    let patterns = session.detect_patterns(None, &cancel()).expect("patterns");

    assert!(patterns.iter().any(|p| p.kind == PatternKind::Builder));

    // Without fluent setters there is no builder.
    let mut plain = fixtures::class("App", "Plain");
    plain.methods = vec![fixtures::method("App.Plain", "Build", "App.Request", None)];
    let session = AnalysisSession::new(fixtures::module("App", vec![plain]));
    let patterns = session.detect_patterns(None, &cancel()).expect("patterns");
    assert!(!patterns.iter().any(|p| p.kind == PatternKind::Builder));
}

#[test]
fn strategy_interface_with_single_method() {
    let mut strategy = fixtures::interface("App", "ICompressionStrategy");
    strategy.methods = vec![fixtures::method(
        "App.ICompressionStrategy",
        "Compress",
        "System.Byte[]",
        None,
    )];
    let session = AnalysisSession::new(fixtures::module("App", vec![strategy]));
    let patterns = session.detect_patterns(None, &cancel()).expect("patterns");

    let p = patterns
        .iter()
        .find(|p| p.kind == PatternKind::Strategy)
        .expect("strategy");
    assert!(p.confidence >= 0.8);
}

#[test]
fn observer_signals_compose() {
    let mut hub = fixtures::class("App", "EventHub");
    hub.events = vec![cilscope::model::EventDef {
        name: "Changed".to_string(),
        event_type: "System.EventHandler".to_string(),
        metadata_token: 0,
    }];
    hub.methods = vec![
        fixtures::method("App.EventHub", "Subscribe", "System.Void", None),
        fixtures::method("App.EventHub", "Unsubscribe", "System.Void", None),
    ];
    let session = AnalysisSession::new(fixtures::module("App", vec![hub]));
    let patterns = session.detect_patterns(None, &cancel()).expect("patterns");

    let p = patterns
        .iter()
        .find(|p| p.kind == PatternKind::Observer)
        .expect("observer");
    assert!(p.confidence >= 0.7);
    assert!(p.evidence.iter().any(|e| e.contains("Subscribe")));
}

#[test]
fn decorator_wraps_its_own_interface() {
    let mut iface = fixtures::interface("App", "IStream");
    iface.methods = vec![fixtures::method("App.IStream", "Read", "System.Int32", None)];

    let mut decorator = fixtures::class("App", "BufferedStream");
    decorator.interfaces = vec!["App.IStream".to_string()];
    decorator.fields = vec![fixtures::field(
        "inner",
        "App.IStream",
        MemberAccess::Private,
        false,
    )];
    decorator.methods = vec![MethodDef {
        is_constructor: true,
        parameters: vec![fixtures::param("inner", "App.IStream")],
        ..fixtures::method("App.BufferedStream", ".ctor", "System.Void", None)
    }];

    let session = AnalysisSession::new(fixtures::module("App", vec![iface, decorator]));
    let patterns = session.detect_patterns(None, &cancel()).expect("patterns");

    let p = patterns
        .iter()
        .find(|p| p.kind == PatternKind::Decorator)
        .expect("decorator");
    assert!((p.confidence - 0.7).abs() < 1e-9);
}

#[test]
fn template_method_needs_hooks_and_a_skeleton() {
    let mut base = fixtures::class("App", "ImportJobBase");
    base.is_abstract = true;
    base.methods = vec![
        fixtures::method(
            "App.ImportJobBase",
            "Run",
            "System.Void",
            Some(fixtures::body(vec![fixtures::ret(0)])),
        ),
        MethodDef {
            is_abstract: true,
            is_virtual: true,
            access: MemberAccess::Family,
            ..fixtures::method("App.ImportJobBase", "Extract", "System.Void", None)
        },
        MethodDef {
            is_abstract: true,
            is_virtual: true,
            access: MemberAccess::Family,
            ..fixtures::method("App.ImportJobBase", "Load", "System.Void", None)
        },
    ];
    let session = AnalysisSession::new(fixtures::module("App", vec![base]));
    let patterns = session.detect_patterns(None, &cancel()).expect("patterns");

    assert!(patterns
        .iter()
        .any(|p| p.kind == PatternKind::TemplateMethod));
}

#[test]
fn compiler_generated_types_are_skipped() {
    let mut closure = fixtures::class("App", "<>c__DisplayClass0_0");
    closure.fields = vec![fixtures::field(
        "_instance",
        "App.<>c__DisplayClass0_0",
        MemberAccess::Private,
        true,
    )];
    let session = AnalysisSession::new(fixtures::module("App", vec![closure]));
    let patterns = session.detect_patterns(None, &cancel()).expect("patterns");
    assert!(patterns.is_empty());
}

#[test]
fn confidence_is_always_clamped() {
    let session = AnalysisSession::new(fixtures::shapes_module());
    let patterns = session.detect_patterns(None, &cancel()).expect("patterns");
    for p in &patterns {
        assert!((0.0..=1.0).contains(&p.confidence), "{:?}", p.kind);
    }
}

#[test]
fn unknown_type_is_not_found() {
    let session = AnalysisSession::new(fixtures::shapes_module());
    assert!(matches!(
        session.detect_patterns(Some("App.Nope"), &cancel()),
        Err(cilscope::AnalysisError::NotFound(_))
    ));
}
