use crate::analysis::CancellationToken;
use crate::analysis::search::{SearchMode, SearchRequest};
use crate::cli::OutputFormat;
use crate::cli::commands::{Envelope, load_session, print_envelope};
use crate::errors::AnalysisError;
use anyhow::Result;
use std::path::PathBuf;

fn parse_mode(raw: &str) -> Result<SearchMode, AnalysisError> {
    match raw.to_lowercase().as_str() {
        "auto" => Ok(SearchMode::Auto),
        "types" => Ok(SearchMode::Types),
        "members" => Ok(SearchMode::Members),
        "literals" => Ok(SearchMode::Literals),
        "token" => Ok(SearchMode::Token),
        other => Err(AnalysisError::InvalidInput(format!(
            "unknown search mode '{other}'"
        ))),
    }
}

pub fn execute(
    module: PathBuf,
    config: Option<PathBuf>,
    query: String,
    mode: Option<String>,
    namespace: Option<String>,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let session = load_session(&module, config.as_deref())?;
    let cancel = CancellationToken::new();

    let result = mode
        .as_deref()
        .map_or(Ok(SearchMode::Auto), parse_mode)
        .and_then(|mode| {
            let request = SearchRequest {
                query,
                mode,
                namespace_filter: namespace,
                limit,
            };
            session.search(&request, &cancel)
        });
    print_envelope(&Envelope::from_result(result), format)
}
