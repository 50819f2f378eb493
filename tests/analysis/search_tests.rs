use crate::fixtures;
use cilscope::analysis::search::{SearchHitKind, SearchMode, SearchRequest};
use cilscope::model::{ConstantValue, FlowControl, MemberAccess, Operand};
use cilscope::{AnalysisError, AnalysisSession, CancellationToken};

fn cancel() -> CancellationToken {
    CancellationToken::new()
}

fn request(query: &str) -> SearchRequest {
    SearchRequest {
        query: query.to_string(),
        mode: SearchMode::Auto,
        namespace_filter: None,
        limit: None,
    }
}

fn searchable_module() -> cilscope::model::Module {
    let mut logger = fixtures::class("Diag", "Logger");
    logger.metadata_token = 0x0200_0002;
    logger.methods = vec![fixtures::method(
        "Diag.Logger",
        "LogMessage",
        "System.Void",
        Some(fixtures::body(vec![
            fixtures::instr(
                0,
                "ldstr",
                FlowControl::Next,
                Operand::String("connection failed".to_string()),
            ),
            fixtures::instr(5, "ldc.i4", FlowControl::Next, Operand::I4(42)),
            fixtures::ret(10),
        ])),
    )];
    let mut timeout = fixtures::field("DefaultTimeout", "System.Int32", MemberAccess::Public, true);
    timeout.is_literal = true;
    timeout.constant = Some(ConstantValue::I4(30));
    logger.fields = vec![timeout];

    let mut log_sink = fixtures::class("Diag", "LogSink");
    log_sink.metadata_token = 0x0200_0003;

    let mut other = fixtures::class("Net", "Connection");
    other.methods = vec![fixtures::method(
        "Net.Connection",
        "Open",
        "System.Void",
        Some(fixtures::body(vec![fixtures::ret(0)])),
    )];

    fixtures::module("SearchLib", vec![logger, log_sink, other])
}

#[test]
fn substring_search_hits_types_and_members() {
    let session = AnalysisSession::new(searchable_module());
    let response = session.search(&request("log"), &cancel()).expect("search");

    let names: Vec<&str> = response.hits.iter().map(|h| h.name.as_str()).collect();
    assert!(names.contains(&"Logger"));
    assert!(names.contains(&"LogSink"));
    assert!(names.contains(&"LogMessage"));
}

#[test]
fn exact_match_outranks_substring_matches() {
    let session = AnalysisSession::new(searchable_module());
    let response = session
        .search(&request("=logger"), &cancel())
        .expect("search");

    assert_eq!(response.hits[0].name, "Logger");
    assert!(response.hits[0].relevance > 1.9);
}

#[test]
fn exclusion_prunes_results() {
    let session = AnalysisSession::new(searchable_module());
    let response = session
        .search(&request("log -sink"), &cancel())
        .expect("search");

    assert!(response.hits.iter().all(|h| !h.name.contains("Sink")));
    assert!(response.hits.iter().any(|h| h.name == "Logger"));
}

#[test]
fn regex_query_replaces_substring_semantics() {
    let session = AnalysisSession::new(searchable_module());
    let response = session
        .search(&request("/^log(ger|sink)$/"), &cancel())
        .expect("search");

    let names: Vec<&str> = response.hits.iter().map(|h| h.name.as_str()).collect();
    assert!(names.contains(&"Logger"));
    assert!(names.contains(&"LogSink"));
    assert!(!names.contains(&"LogMessage"));
}

#[test]
fn quoted_query_auto_detects_literal_mode() {
    let session = AnalysisSession::new(searchable_module());
    let response = session
        .search(&request("\"connection failed\""), &cancel())
        .expect("search");

    assert_eq!(response.hits.len(), 1);
    let hit = &response.hits[0];
    assert_eq!(hit.kind, SearchHitKind::StringLiteral);
    assert_eq!(hit.il_offset, Some(0));
    assert_eq!(hit.declaring_type.as_deref(), Some("Diag.Logger"));
}

#[test]
fn numeric_query_finds_constants_and_loads() {
    let session = AnalysisSession::new(searchable_module());

    let value = session.search(&request("42"), &cancel()).expect("search");
    assert!(value
        .hits
        .iter()
        .any(|h| h.kind == SearchHitKind::NumericLiteral && h.il_offset == Some(5)));

    let constant = session.search(&request("30"), &cancel()).expect("search");
    assert!(constant
        .hits
        .iter()
        .any(|h| h.full_name == "Diag.Logger.DefaultTimeout"));
}

#[test]
fn token_query_returns_the_unique_owner() {
    let session = AnalysisSession::new(searchable_module());
    let response = session
        .search(&request("0x02000003"), &cancel())
        .expect("search");

    assert_eq!(response.hits.len(), 1);
    assert_eq!(response.hits[0].full_name, "Diag.LogSink");

    let bad = session.search(&request("0xZZZ"), &cancel());
    assert!(matches!(bad, Err(AnalysisError::InvalidInput(_))));
}

#[test]
fn limit_truncates_and_reports_more() {
    let session = AnalysisSession::new(searchable_module());
    let mut req = request("o"); // matches nearly everything
    req.limit = Some(2);
    let response = session.search(&req, &cancel()).expect("search");

    assert_eq!(response.hits.len(), 2);
    assert!(response.has_more);
    assert!(response.total > 2);
}

#[test]
fn search_is_idempotent_with_unique_ids() {
    let session = AnalysisSession::new(searchable_module());
    let a = session.search(&request("log"), &cancel()).expect("search");
    let b = session.search(&request("log"), &cancel()).expect("search");

    let ids_a: Vec<&str> = a.hits.iter().map(|h| h.id.as_str()).collect();
    let ids_b: Vec<&str> = b.hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids_a, ids_b);

    let mut unique = ids_a.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), ids_a.len());
}

#[test]
fn namespace_filter_restricts_hits() {
    let session = AnalysisSession::new(searchable_module());
    let mut req = request("o");
    req.namespace_filter = Some("Net".to_string());
    let response = session.search(&req, &cancel()).expect("search");

    assert!(!response.hits.is_empty());
    assert!(response
        .hits
        .iter()
        .all(|h| h.full_name.starts_with("Net.")));
}

#[test]
fn explicit_mode_overrides_auto_detection() {
    let session = AnalysisSession::new(searchable_module());
    let mut req = request("Logger");
    req.mode = SearchMode::Members;
    let response = session.search(&req, &cancel()).expect("search");

    // Members only: the Logger type itself is not reported.
    assert!(!response
        .hits
        .iter()
        .any(|h| h.kind == SearchHitKind::Class));
}

#[test]
fn empty_query_is_invalid_input() {
    let session = AnalysisSession::new(searchable_module());
    assert!(matches!(
        session.search(&request("   "), &cancel()),
        Err(AnalysisError::InvalidInput(_))
    ));
}
