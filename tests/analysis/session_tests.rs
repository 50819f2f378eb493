use crate::fixtures;
use cilscope::analysis::search::{SearchMode, SearchRequest};
use cilscope::{AnalysisConfig, AnalysisError, AnalysisSession, CancellationToken};
use std::sync::Arc;

#[test]
fn shared_artifacts_are_built_once() {
    let session = AnalysisSession::new(fixtures::shapes_module());
    let first = session.type_index();
    let second = session.type_index();
    assert!(Arc::ptr_eq(&first, &second));

    let h1 = session.hierarchy();
    let h2 = session.hierarchy();
    assert!(Arc::ptr_eq(&h1, &h2));
}

#[test]
fn indexes_are_readable_across_threads() {
    let session = Arc::new(AnalysisSession::new(fixtures::shapes_module()));
    let index = session.type_index();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let index = index.clone();
            std::thread::spawn(move || index.by_simple_name("circle").len())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().expect("thread"), 1);
    }
}

#[test]
fn cancellation_never_returns_partial_results() {
    let session = AnalysisSession::new(fixtures::shapes_module());
    let token = CancellationToken::new();
    token.cancel();

    assert!(matches!(
        session.find_references_to_type("Shapes.IShape", &token),
        Err(AnalysisError::Cancelled)
    ));
    assert!(matches!(
        session.detect_patterns(None, &token),
        Err(AnalysisError::Cancelled)
    ));
    let request = SearchRequest {
        query: "shape".to_string(),
        mode: SearchMode::Auto,
        namespace_filter: None,
        limit: None,
    };
    assert!(matches!(
        session.search(&request, &token),
        Err(AnalysisError::Cancelled)
    ));
}

#[test]
fn config_overrides_load_from_toml_and_json() {
    // Partial files override only the named fields; the rest keep defaults.
    let from_toml: AnalysisConfig =
        toml::from_str("reflection_scan_window = 80\nmax_type_depth = 2\n").expect("toml config");
    assert_eq!(from_toml.reflection_scan_window, 80);
    assert_eq!(from_toml.max_type_depth, 2);
    assert_eq!(
        from_toml.lambda_ldftn_window,
        AnalysisConfig::default().lambda_ldftn_window
    );

    let from_json: AnalysisConfig =
        serde_json::from_str(r#"{ "default_search_limit": 5 }"#).expect("json config");
    assert_eq!(from_json.default_search_limit, 5);

    // The loaded limit becomes the session default when a request sets none.
    let session = AnalysisSession::with_config(fixtures::obfuscated_module(), from_json);
    let request = SearchRequest {
        query: "a".to_string(),
        mode: SearchMode::Auto,
        namespace_filter: None,
        limit: None,
    };
    let response = session
        .search(&request, &CancellationToken::new())
        .expect("search");
    assert_eq!(response.hits.len(), 5);
    assert!(response.has_more);
}

#[test]
fn error_codes_are_stable() {
    assert_eq!(AnalysisError::NotFound("x".into()).code(), "not_found");
    assert_eq!(AnalysisError::NoBody("x".into()).code(), "no_body");
    assert_eq!(AnalysisError::InvalidInput("x".into()).code(), "invalid_input");
    assert_eq!(AnalysisError::Cancelled.code(), "cancelled");
    assert_eq!(AnalysisError::Internal("x".into()).code(), "internal");
}
