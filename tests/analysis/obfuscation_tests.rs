use crate::fixtures;
use cilscope::analysis::obfuscation::{Confidence, IndicatorCategory};
use cilscope::{AnalysisSession, CancellationToken};

fn cancel() -> CancellationToken {
    CancellationToken::new()
}

#[test]
fn clean_module_scores_low() {
    let session = AnalysisSession::new(fixtures::shapes_module());
    let result = session.detect_obfuscation(&cancel()).expect("result");

    assert!(result.score < 30.0);
    assert!(!result.is_obfuscated);
    assert_eq!(result.confidence, Confidence::Low);
    assert!(result.detected_tools.is_empty());
}

#[test]
fn confuserex_triage_scenario() {
    let session = AnalysisSession::new(fixtures::obfuscated_module());
    let result = session.detect_obfuscation(&cancel()).expect("result");

    assert!(result.is_obfuscated);
    assert!(result.score >= 70.0);
    assert_eq!(result.confidence, Confidence::High);
    assert!(result
        .detected_tools
        .iter()
        .any(|t| t == "ConfuserEx"));

    let categories: Vec<IndicatorCategory> =
        result.indicators.iter().map(|i| i.category).collect();
    assert!(categories.contains(&IndicatorCategory::ToolMarker));
    assert!(categories.contains(&IndicatorCategory::SuspiciousNaming));
    assert!(categories.contains(&IndicatorCategory::ProxyMethods));
}

#[test]
fn score_is_clamped_and_confidence_total() {
    let session = AnalysisSession::new(fixtures::obfuscated_module());
    let result = session.detect_obfuscation(&cancel()).expect("result");

    assert!((0.0..=100.0).contains(&result.score));
    assert_eq!(result.is_obfuscated, result.score >= 30.0);
    let expected = if result.score >= 70.0 {
        Confidence::High
    } else if result.score >= 40.0 {
        Confidence::Medium
    } else {
        Confidence::Low
    };
    assert_eq!(result.confidence, expected);
}

#[test]
fn invalid_identifiers_raise_the_ratio_term() {
    let mut types = Vec::new();
    for i in 0..4 {
        // Names with control bytes: invalid for any compiler.
        types.push(fixtures::class("", &format!("bad\u{1}{i}")));
    }
    types.push(fixtures::class("", "Fine"));
    let session = AnalysisSession::new(fixtures::module("Mangled", types));
    let result = session.detect_obfuscation(&cancel()).expect("result");

    // 4 of 5 types invalid: the 50-point term alone crosses the threshold.
    assert!(result.score >= 40.0);
    assert!(result.is_obfuscated);
    let indicator = result
        .indicators
        .iter()
        .find(|i| i.category == IndicatorCategory::InvalidIdentifier)
        .expect("invalid identifier indicator");
    // Evidence must be sanitized: the control byte shows as an escape.
    assert!(indicator.evidence.iter().all(|e| !e.contains('\u{1}')));
    assert!(indicator.evidence.iter().any(|e| e.contains("\\x01")));
}

#[test]
fn flattened_dispatcher_method_is_flagged() {
    let mut instructions = Vec::new();
    let mut offset = 0u32;
    // A big dispatcher: one switch plus a pile of conditional branches.
    instructions.push(fixtures::op(offset, "ldloc.0"));
    offset += 1;
    instructions.push(fixtures::instr(
        offset,
        "switch",
        cilscope::model::FlowControl::CondBranch,
        cilscope::model::Operand::Switch(vec![2, 3, 4]),
    ));
    offset += 1;
    for _ in 0..25 {
        instructions.push(fixtures::cond_br(offset, "brtrue.s", offset + 1));
        offset += 1;
    }
    for _ in 0..80 {
        instructions.push(fixtures::op(offset, "nop"));
        offset += 1;
    }
    instructions.push(fixtures::ret(offset));

    let locals: Vec<(u16, &str)> = (0..6).map(|i| (i as u16, "System.Int32")).collect();
    let mut t = fixtures::class("Flat", "Dispatcher");
    t.methods = vec![fixtures::static_method(
        "Flat.Dispatcher",
        "Run",
        "System.Void",
        Some(fixtures::body_with_locals(instructions, &locals)),
    )];

    let session = AnalysisSession::new(fixtures::module("Flat", vec![t]));
    let result = session.detect_obfuscation(&cancel()).expect("result");

    assert!(result
        .indicators
        .iter()
        .any(|i| i.category == IndicatorCategory::ControlFlowFlattening));
}

#[test]
fn anti_debug_calls_are_reported() {
    let mut t = fixtures::class("App", "Guard");
    t.methods = vec![fixtures::static_method(
        "App.Guard",
        "Check",
        "System.Boolean",
        Some(fixtures::body(vec![
            fixtures::call(
                0,
                "System.Diagnostics.Debugger",
                "get_IsAttached",
                "System.Boolean",
            ),
            fixtures::ret(5),
        ])),
    )];
    let session = AnalysisSession::new(fixtures::module("App", vec![t]));
    let result = session.detect_obfuscation(&cancel()).expect("result");

    assert!(result
        .indicators
        .iter()
        .any(|i| i.category == IndicatorCategory::AntiDebug));
    assert!(result.score >= 15.0);
}

#[test]
fn decrypt_helpers_count_as_encryption_indicators() {
    let mut t = fixtures::class("App", "Strings");
    t.methods = vec![fixtures::static_method(
        "App.Strings",
        "DecryptString",
        "System.String",
        Some(fixtures::body(vec![fixtures::ret(0)])),
    )];
    let session = AnalysisSession::new(fixtures::module("App", vec![t]));
    let result = session.detect_obfuscation(&cancel()).expect("result");

    assert!(result
        .indicators
        .iter()
        .any(|i| i.category == IndicatorCategory::StringEncryption));
    assert!(result.score >= 5.0);
}

#[test]
fn cancelled_scan_returns_cancelled() {
    let session = AnalysisSession::new(fixtures::obfuscated_module());
    let token = CancellationToken::new();
    token.cancel();
    assert!(matches!(
        session.detect_obfuscation(&token),
        Err(cilscope::AnalysisError::Cancelled)
    ));
}
