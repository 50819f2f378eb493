use crate::fixtures;
use cilscope::analysis::xref::XrefKind;
use cilscope::model::{FieldRef, FlowControl, MemberAccess, Operand, TypeRef};
use cilscope::{AnalysisError, AnalysisSession, CancellationToken};

fn cancel() -> CancellationToken {
    CancellationToken::new()
}

fn sample_module() -> cilscope::model::Module {
    let mut widget = fixtures::class("Ui", "Widget");
    widget.methods = vec![fixtures::method(
        "Ui.Widget",
        "Draw",
        "System.Void",
        Some(fixtures::body(vec![fixtures::ret(0)])),
    )];

    let mut panel = fixtures::class("Ui", "Panel");
    panel.base_type = Some("Ui.Widget".to_string());
    panel.fields = vec![fixtures::field(
        "children",
        "System.Collections.Generic.List`1<Ui.Widget>",
        MemberAccess::Private,
        false,
    )];
    let mut render = fixtures::method(
        "Ui.Panel",
        "Render",
        "Ui.Widget",
        Some(fixtures::body(vec![
            fixtures::instr(
                0,
                "isinst",
                FlowControl::Next,
                Operand::Type(TypeRef {
                    full_name: "Ui.Widget".to_string(),
                }),
            ),
            fixtures::call(5, "Ui.Widget", "Draw", "System.Void"),
            fixtures::call(10, "Ui.Widget", "Draw", "System.Void"),
            fixtures::ret(15),
        ])),
    );
    render.parameters = vec![fixtures::param("w", "Ui.Widget[]")];
    panel.methods = vec![render];

    fixtures::module("UiLib", vec![widget, panel])
}

#[test]
fn type_references_cover_every_use_site_kind() {
    let session = AnalysisSession::new(sample_module());
    let refs = session
        .find_references_to_type("Ui.Widget", &cancel())
        .expect("refs");

    let kinds_of = |kind: XrefKind| refs.iter().filter(|r| r.kind == kind).count();
    assert_eq!(kinds_of(XrefKind::Inheritance), 1);
    // Generic instantiation in the field type unwraps to the target.
    assert_eq!(kinds_of(XrefKind::FieldType), 1);
    assert_eq!(kinds_of(XrefKind::ReturnType), 1);
    // Array parameter dereferences to the element type.
    assert_eq!(kinds_of(XrefKind::ParamType), 1);
    assert_eq!(kinds_of(XrefKind::TypeReference), 1);
}

#[test]
fn reference_results_are_deduplicated() {
    let session = AnalysisSession::new(sample_module());
    let refs = session
        .find_references_to_type("Ui.Widget", &cancel())
        .expect("refs");

    let mut keys: Vec<_> = refs
        .iter()
        .map(|r| (r.source_type.clone(), r.source_member.clone(), r.kind, r.il_offset))
        .collect();
    let before = keys.len();
    keys.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));
    keys.dedup();
    assert_eq!(before, keys.len());
}

#[test]
fn call_sites_found_per_offset() {
    let session = AnalysisSession::new(sample_module());
    let calls = session
        .find_calls_to_method("Ui.Widget", "Draw", &cancel())
        .expect("calls");

    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.kind == XrefKind::MethodCall));
    let offsets: Vec<Option<u32>> = calls.iter().map(|c| c.il_offset).collect();
    assert_eq!(offsets, vec![Some(5), Some(10)]);
}

#[test]
fn private_target_scope_is_pruned_to_the_declaring_type() {
    let mut owner = fixtures::class("App", "Owner");
    owner.fields = vec![fixtures::field(
        "_secret",
        "System.Int32",
        MemberAccess::Private,
        false,
    )];
    owner.methods = vec![fixtures::method(
        "App.Owner",
        "Bump",
        "System.Void",
        Some(fixtures::body(vec![
            fixtures::instr(
                0,
                "ldfld",
                FlowControl::Next,
                Operand::Field(FieldRef {
                    declaring_type: "App.Owner".to_string(),
                    name: "_secret".to_string(),
                    field_type: "System.Int32".to_string(),
                }),
            ),
            fixtures::ret(5),
        ])),
    )];

    // An outsider body that (illegally) touches the private field; the
    // pruned scope must never visit it.
    let mut outsider = fixtures::class("App", "Outsider");
    outsider.methods = vec![fixtures::method(
        "App.Outsider",
        "Poke",
        "System.Void",
        Some(fixtures::body(vec![
            fixtures::instr(
                0,
                "stfld",
                FlowControl::Next,
                Operand::Field(FieldRef {
                    declaring_type: "App.Owner".to_string(),
                    name: "_secret".to_string(),
                    field_type: "System.Int32".to_string(),
                }),
            ),
            fixtures::ret(5),
        ])),
    )];

    let session = AnalysisSession::new(fixtures::module("App", vec![owner, outsider]));
    let usages = session
        .find_field_usages("App.Owner", "_secret", &cancel())
        .expect("usages");

    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].source_type, "App.Owner");
    assert_eq!(usages[0].kind, XrefKind::FieldRead);
}

#[test]
fn field_reads_and_writes_are_distinguished() {
    let mut t = fixtures::class("App", "Counter");
    t.fields = vec![fixtures::field(
        "count",
        "System.Int32",
        MemberAccess::Public,
        false,
    )];
    let fref = || {
        Operand::Field(FieldRef {
            declaring_type: "App.Counter".to_string(),
            name: "count".to_string(),
            field_type: "System.Int32".to_string(),
        })
    };
    t.methods = vec![fixtures::method(
        "App.Counter",
        "Increment",
        "System.Void",
        Some(fixtures::body(vec![
            fixtures::instr(0, "ldfld", FlowControl::Next, fref()),
            fixtures::op(5, "ldc.i4.1"),
            fixtures::op(6, "add"),
            fixtures::instr(7, "stfld", FlowControl::Next, fref()),
            fixtures::ret(12),
        ])),
    )];
    let session = AnalysisSession::new(fixtures::module("App", vec![t]));
    let usages = session
        .find_field_usages("App.Counter", "count", &cancel())
        .expect("usages");

    let reads = usages.iter().filter(|u| u.kind == XrefKind::FieldRead).count();
    let writes = usages.iter().filter(|u| u.kind == XrefKind::FieldWrite).count();
    assert_eq!((reads, writes), (1, 1));
}

#[test]
fn overrides_require_matching_signatures() {
    let mut base = fixtures::class("App", "Shape");
    base.methods = vec![cilscope::model::MethodDef {
        is_virtual: true,
        ..fixtures::method("App.Shape", "Area", "System.Double", None)
    }];

    let mut good = fixtures::class("App", "Circle");
    good.base_type = Some("App.Shape".to_string());
    good.methods = vec![cilscope::model::MethodDef {
        is_virtual: true,
        ..fixtures::method("App.Circle", "Area", "System.Double", None)
    }];

    // Same name, different return type: not an override.
    let mut bad = fixtures::class("App", "Blob");
    bad.base_type = Some("App.Shape".to_string());
    bad.methods = vec![cilscope::model::MethodDef {
        is_virtual: true,
        ..fixtures::method("App.Blob", "Area", "System.Single", None)
    }];

    let session = AnalysisSession::new(fixtures::module("App", vec![base, good, bad]));
    let overrides = session
        .find_method_overrides("App.Shape", "Area", &cancel())
        .expect("overrides");

    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides[0].source_type, "App.Circle");
    assert_eq!(overrides[0].kind, XrefKind::Override);
}

#[test]
fn interface_impls_cover_explicit_and_implicit() {
    let mut iface = fixtures::interface("App", "IRun");
    iface.methods = vec![fixtures::method("App.IRun", "Run", "System.Void", None)];

    let mut implicit = fixtures::class("App", "Runner");
    implicit.interfaces = vec!["App.IRun".to_string()];
    implicit.methods = vec![fixtures::method(
        "App.Runner",
        "Run",
        "System.Void",
        Some(fixtures::body(vec![fixtures::ret(0)])),
    )];

    let mut explicit = fixtures::class("App", "Job");
    explicit.interfaces = vec!["App.IRun".to_string()];
    let mut m = fixtures::method("App.Job", "App.IRun.Run", "System.Void", None);
    m.access = MemberAccess::Private;
    m.overrides = vec!["App.IRun.Run".to_string()];
    explicit.methods = vec![m];

    let session = AnalysisSession::new(fixtures::module("App", vec![iface, implicit, explicit]));
    let impls = session
        .find_interface_impls("App.IRun", "Run", &cancel())
        .expect("impls");

    let sources: Vec<&str> = impls.iter().map(|i| i.source_type.as_str()).collect();
    assert!(sources.contains(&"App.Runner"));
    assert!(sources.contains(&"App.Job"));
    assert!(impls.iter().all(|i| i.kind == XrefKind::InterfaceImpl));
}

#[test]
fn unknown_targets_are_not_found() {
    let session = AnalysisSession::new(sample_module());
    assert!(matches!(
        session.find_references_to_type("Ui.Nope", &cancel()),
        Err(AnalysisError::NotFound(_))
    ));
    assert!(matches!(
        session.find_calls_to_method("Ui.Widget", "Nope", &cancel()),
        Err(AnalysisError::NotFound(_))
    ));
}

#[test]
fn pinvoke_targets_match_by_native_identity() {
    use cilscope::model::PInvokeInfo;

    let mut native = fixtures::class("App", "Native");
    let mut target = fixtures::method("App.Native", "Beep", "System.Void", None);
    target.is_pinvoke = true;
    target.pinvoke = Some(PInvokeInfo {
        entry_point: None,
        module: "libkernel32.dll".to_string(),
    });
    // A second stub importing the same native function under another name.
    let mut alias = fixtures::method("App.Native", "BeepAlias", "System.Void", None);
    alias.is_pinvoke = true;
    alias.pinvoke = Some(PInvokeInfo {
        entry_point: Some("Beep".to_string()),
        module: "KERNEL32".to_string(),
    });
    native.methods = vec![target, alias];

    let mut caller = fixtures::class("App", "Sound");
    caller.methods = vec![fixtures::method(
        "App.Sound",
        "Play",
        "System.Void",
        Some(fixtures::body(vec![
            fixtures::call(0, "App.Native", "BeepAlias", "System.Void"),
            fixtures::ret(5),
        ])),
    )];

    let session = AnalysisSession::new(fixtures::module("App", vec![native, caller]));
    let calls = session
        .find_calls_to_method("App.Native", "Beep", &cancel())
        .expect("calls");

    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].source_type, "App.Sound");
}
