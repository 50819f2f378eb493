use crate::fixtures;
use cilscope::AnalysisSession;
use cilscope::analysis::dependencies::DependencyLevel;
use cilscope::model::MemberAccess;
use cilscope::CancellationToken;

#[test]
fn cfg_mermaid_export_is_stable() {
    let session = AnalysisSession::new(fixtures::math_module());
    let cfg = session.build_cfg("Math.Ops", "Abs").expect("cfg");

    insta::assert_snapshot!(cfg.to_mermaid(), @r###"
graph TD
    B0["B0: IL_0000..IL_0003 (cond_branch)"]
    B1["B1: IL_0003..IL_0006 (return)"]
    B2["B2: IL_0006..IL_0008 (return)"]
    B0 -->|true| B2
    B0 -->|false| B1
"###);
}

#[test]
fn dependency_mermaid_export_is_stable() {
    let mut a = fixtures::class("Chain", "A");
    a.fields = vec![fixtures::field("b", "Chain.B", MemberAccess::Private, false)];
    let b = fixtures::class("Chain", "B");
    let session = AnalysisSession::new(fixtures::module("Chain", vec![a, b]));
    let graph = session
        .build_dependency_graph(DependencyLevel::Type, None, None, &CancellationToken::new())
        .expect("graph");

    insta::assert_snapshot!(graph.to_mermaid(), @r###"
graph TD
    n0["Chain.A"]
    n1["Chain.B"]
    n0 -->|field_type| n1
"###);
}
